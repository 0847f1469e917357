//! Generator configuration.

use fieldcourse_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Distance between consecutive waypoints on a row, metres.
pub const WAYPOINT_DISTANCE: f64 = 5.0;

/// A row end closer than this to the last sampled waypoint is not worth
/// an extra point.
pub const MIN_WAYPOINT_DISTANCE: f64 = 0.25 * WAYPOINT_DISTANCE;

/// Blocks with fewer rows than this are penalized during angle selection.
pub const SMALL_BLOCK_TRACK_COUNT_LIMIT: usize = 5;

/// Traversal pattern for the rows within a block.
///
/// The numeric encodings are stable and shared with external tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum RowPattern {
    /// Plain up/down rows, optionally skipping rows for wider turns.
    #[default]
    UpDown = 1,
    /// Outside-in interleave ending in the middle.
    Spiral = 2,
    /// Wide circular loops with a fill-in tail.
    Circular = 3,
    /// Fixed-size bands worked in an outward spiral.
    Lands = 4,
}

/// Corner of a block's bounding quadrilateral.
///
/// The numeric encodings are stable; the lands permutation tables and the
/// exit-corner lookup are keyed on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Corner {
    BottomLeft = 1,
    BottomRight = 2,
    TopRight = 3,
    TopLeft = 4,
}

impl Corner {
    /// All corners in encoding order.
    pub const ALL: [Corner; 4] = [
        Corner::BottomLeft,
        Corner::BottomRight,
        Corner::TopRight,
        Corner::TopLeft,
    ];

    /// True for the two left-hand corners.
    pub fn is_left(self) -> bool {
        matches!(self, Corner::BottomLeft | Corner::TopLeft)
    }

    /// True for the two bottom corners.
    pub fn is_bottom(self) -> bool {
        matches!(self, Corner::BottomLeft | Corner::BottomRight)
    }

    /// The corner on the other side of the same horizontal edge.
    pub fn mirrored_side(self) -> Corner {
        match self {
            Corner::BottomLeft => Corner::BottomRight,
            Corner::BottomRight => Corner::BottomLeft,
            Corner::TopRight => Corner::TopLeft,
            Corner::TopLeft => Corner::TopRight,
        }
    }

    /// The corner on the same side of the other horizontal edge.
    pub fn mirrored_edge(self) -> Corner {
        match self {
            Corner::BottomLeft => Corner::TopLeft,
            Corner::BottomRight => Corner::TopRight,
            Corner::TopRight => Corner::BottomRight,
            Corner::TopLeft => Corner::BottomLeft,
        }
    }
}

/// Settings for the up/down center of the field.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CenterSettings {
    /// How rows are ordered within a block.
    pub pattern: RowPattern,
    /// Fixed row direction, radians. Used when neither angle search flag
    /// is set.
    pub row_angle: f64,
    /// Sweep candidate angles and keep the cheapest.
    pub use_best_angle: bool,
    /// Align rows with the longest boundary edge.
    pub use_longest_edge_angle: bool,
    /// Rows skipped between consecutive passes for wider turns.
    pub rows_to_skip: usize,
    /// Leave the skipped rows unworked instead of returning for them.
    pub leave_skipped_rows_unworked: bool,
    /// Rows per land for [`RowPattern::Lands`], 1..=24.
    pub rows_per_land: usize,
    /// Unloading pipe is on the left side of the implement.
    pub pipe_on_left_side: bool,
    /// Keep the full row spacing on the last row even when it overshoots
    /// the work area.
    pub use_same_width: bool,
}

impl Default for CenterSettings {
    fn default() -> Self {
        Self {
            pattern: RowPattern::UpDown,
            row_angle: 0.0,
            use_best_angle: false,
            use_longest_edge_angle: false,
            rows_to_skip: 0,
            leave_skipped_rows_unworked: false,
            rows_per_land: 6,
            pipe_on_left_side: true,
            use_same_width: false,
        }
    }
}

impl CenterSettings {
    /// Creates settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the traversal pattern.
    pub fn with_pattern(mut self, pattern: RowPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Sets a fixed row angle in radians and disables the angle search.
    pub fn with_row_angle(mut self, angle: f64) -> Self {
        self.row_angle = angle;
        self.use_best_angle = false;
        self.use_longest_edge_angle = false;
        self
    }

    /// Enables the candidate-angle sweep.
    pub fn with_best_angle(mut self) -> Self {
        self.use_best_angle = true;
        self
    }

    /// Aligns rows with the longest boundary edge.
    pub fn with_longest_edge_angle(mut self) -> Self {
        self.use_longest_edge_angle = true;
        self
    }

    /// Sets the number of rows skipped between passes.
    pub fn with_rows_to_skip(mut self, rows: usize) -> Self {
        self.rows_to_skip = rows;
        self
    }

    /// Leaves skipped rows unworked.
    pub fn with_leave_skipped_rows_unworked(mut self, leave: bool) -> Self {
        self.leave_skipped_rows_unworked = leave;
        self
    }

    /// Sets the rows per land, clamped to 1..=24.
    pub fn with_rows_per_land(mut self, rows: usize) -> Self {
        self.rows_per_land = rows.clamp(1, 24);
        self
    }

    /// Sets the unloading pipe side.
    pub fn with_pipe_on_left_side(mut self, left: bool) -> Self {
        self.pipe_on_left_side = left;
        self
    }

    /// Keeps the full row spacing on the overshooting last row.
    pub fn with_same_width(mut self, same: bool) -> Self {
        self.use_same_width = same;
        self
    }

    /// Rejects out-of-range values.
    pub fn validate(&self) -> Result<()> {
        if !(1..=24).contains(&self.rows_per_land) {
            return Err(Error::InvalidSettings(format!(
                "rows_per_land must be 1..=24, got {}",
                self.rows_per_land
            )));
        }
        if !self.row_angle.is_finite() {
            return Err(Error::InvalidSettings("row_angle is not finite".into()));
        }
        Ok(())
    }
}

/// Settings describing the externally generated headland.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeadlandSettings {
    /// Number of headland passes around the field. Zero means the rows
    /// run all the way to the boundary.
    pub n_passes: usize,
}

impl HeadlandSettings {
    /// Creates settings for the given number of passes.
    pub fn new(n_passes: usize) -> Self {
        Self { n_passes }
    }

    /// Distance kept between the boundary and the first row.
    pub fn distance_from_boundary(&self, width: f64) -> f64 {
        if self.n_passes > 0 {
            width
        } else {
            width / 2.0
        }
    }
}
