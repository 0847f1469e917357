//! Course waypoints and boundary-crossing records.

use fieldcourse_core::Point;
use std::collections::BTreeSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifies the polygon a row crossing belongs to.
///
/// Crossings never hold references into the polygons they crossed;
/// identity is ID equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum HeadlandId {
    /// The innermost field headland (or the bare boundary when no
    /// headland passes exist).
    Field,
    /// The outermost headland around the island with this id.
    Island(u32),
}

impl HeadlandId {
    /// The island id, if this refers to an island headland.
    pub fn island(self) -> Option<u32> {
        match self {
            HeadlandId::Island(id) => Some(id),
            HeadlandId::Field => None,
        }
    }
}

/// A polygon edge identified by its endpoint vertex indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeadlandEdge {
    pub from_ix: usize,
    pub to_ix: usize,
}

/// A crossing between a row and the boundary or an island headland.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Intersection {
    /// The crossing point.
    pub point: Point,
    /// Tangent angle of the crossed edge, radians.
    pub angle: f64,
    /// Which polygon was crossed.
    pub headland: HeadlandId,
    /// Which edge of that polygon was crossed.
    pub edge: HeadlandEdge,
    /// The row the crossing belongs to.
    pub original_row_number: usize,
}

/// Which side of the implement leaves a visible ridge mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RidgeMarker {
    #[default]
    None,
    Left,
    Right,
}

/// A single point of the generated course with its per-point tags.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Waypoint {
    pub point: Point,
    /// A headland turn begins after this point.
    pub turn_start: bool,
    /// A headland turn ends at this point.
    pub turn_end: bool,
    /// Position of the row within its block's working order.
    pub row_number: Option<usize>,
    /// Row index as generated, before any reordering.
    pub original_row_number: Option<usize>,
    /// On the first worked row of a block.
    pub first_track: bool,
    /// On the last worked row of a block.
    pub last_track: bool,
    /// Part of a transition along a headland, not of a row.
    pub connecting_track: bool,
    /// First waypoint of the up/down work.
    pub up_down_row_start: bool,
    pub ridge_marker: RidgeMarker,
    /// Islands bordering the row this waypoint belongs to.
    pub adjacent_islands: BTreeSet<u32>,
}

impl Waypoint {
    /// Creates an untagged waypoint.
    pub fn new(point: Point) -> Self {
        Self {
            point,
            ..Self::default()
        }
    }

    /// Creates an untagged waypoint from coordinates.
    pub fn at(x: f64, y: f64) -> Self {
        Self::new(Point::new(x, y))
    }

    /// Returns true if this waypoint lies on a worked row.
    pub fn is_row_waypoint(&self) -> bool {
        self.row_number.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headland_identity() {
        assert_eq!(HeadlandId::Island(3).island(), Some(3));
        assert_eq!(HeadlandId::Field.island(), None);
        assert_ne!(HeadlandId::Field, HeadlandId::Island(0));
    }

    #[test]
    fn test_waypoint_defaults() {
        let wp = Waypoint::at(1.0, 2.0);
        assert!(!wp.turn_start);
        assert!(!wp.is_row_waypoint());
        assert_eq!(wp.ridge_marker, RidgeMarker::None);
    }
}
