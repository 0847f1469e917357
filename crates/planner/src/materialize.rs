//! Turning block rows into waypoint sequences.
//!
//! Row ends are pulled in or pushed out depending on how obliquely the
//! row crosses the boundary: without a headland the row must reach far
//! enough to cover the corner it leaves behind; with one it stops short
//! and lets the headland pass cover the rest.

use crate::blocks::Block;
use crate::settings::{Corner, MIN_WAYPOINT_DISTANCE, WAYPOINT_DISTANCE};
use crate::waypoint::{Intersection, Waypoint};
use std::collections::BTreeSet;

/// Crossing angles flatter than this are treated as this steep.
const MIN_CROSSING_ANGLE: f64 = std::f64::consts::PI / 12.0;

/// Fraction of the working width worked into the headland at row ends.
const HEADLAND_OVERLAP: f64 = 0.05;

/// A row ready to be driven: waypoints from the left end, plus the two
/// crossings that delimit it.
#[derive(Debug, Clone)]
pub struct WorkRow {
    pub left: Intersection,
    pub right: Intersection,
    /// Waypoints in left-to-right order.
    pub waypoints: Vec<Waypoint>,
    pub original_row_number: usize,
    pub adjacent_islands: BTreeSet<u32>,
}

/// A block whose rows have been materialized, bottom row first.
#[derive(Debug, Clone)]
pub struct WorkBlock {
    pub id: usize,
    pub rows: Vec<WorkRow>,
}

impl WorkBlock {
    /// Number of rows in the block.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// The boundary crossing at a corner of the block.
    pub fn corner(&self, corner: Corner) -> &Intersection {
        let row = if corner.is_bottom() {
            self.rows.first().expect("block has rows")
        } else {
            self.rows.last().expect("block has rows")
        };
        if corner.is_left() {
            &row.left
        } else {
            &row.right
        }
    }

    /// Diagnostic quadrilateral over the four corners.
    pub fn corner_polygon(&self) -> fieldcourse_core::Polygon {
        fieldcourse_core::Polygon::new(vec![
            self.corner(Corner::BottomLeft).point,
            self.corner(Corner::BottomRight).point,
            self.corner(Corner::TopRight).point,
            self.corner(Corner::TopLeft).point,
        ])
    }
}

/// Distance from the boundary crossing at which a row of the given width
/// still covers the corner between row and boundary.
pub fn distance_to_full_cover(width: f64, angle: f64) -> f64 {
    let angle = clamp_crossing_angle(angle);
    (width / (2.0 * angle.tan())).abs()
}

/// Distance between the row end and the headland needed so the headland
/// pass and the row just meet.
pub fn distance_between_row_end_and_headland(width: f64, angle: f64) -> f64 {
    let clamped = clamp_crossing_angle(angle);
    (width / (2.0 * clamped.sin())).abs() - distance_to_full_cover(width, angle)
}

fn clamp_crossing_angle(angle: f64) -> f64 {
    if angle.abs() < MIN_CROSSING_ANGLE {
        if angle < 0.0 {
            -MIN_CROSSING_ANGLE
        } else {
            MIN_CROSSING_ANGLE
        }
    } else {
        angle
    }
}

fn end_offset(width: f64, angle: f64, n_headland_passes: usize) -> f64 {
    if n_headland_passes == 0 {
        -distance_to_full_cover(width, angle)
    } else {
        distance_between_row_end_and_headland(width, angle)
    }
}

/// Materializes the rows of a block. Rows that shrink to nothing or
/// produce fewer than two waypoints are dropped; `None` when nothing
/// drivable remains.
pub fn materialize_block(block: Block, width: f64, n_headland_passes: usize) -> Option<WorkBlock> {
    let mut rows = Vec::with_capacity(block.rows.len());
    for row in block.rows {
        let left = row.intersections[0].clone();
        let right = row.intersections[1].clone();

        let new_from =
            left.point.x + end_offset(width, left.angle, n_headland_passes) - HEADLAND_OVERLAP * width;
        let new_to =
            right.point.x - end_offset(width, right.angle, n_headland_passes) + HEADLAND_OVERLAP * width;
        if new_to <= new_from {
            log::debug!(
                "row {}: no drivable length left, dropping",
                row.original_row_number
            );
            continue;
        }

        let y = row.from.y;
        let mut waypoints = Vec::new();
        let mut x = new_from;
        while x < new_to {
            waypoints.push(row_waypoint(x, y, &row.adjacent_islands, row.original_row_number));
            x += WAYPOINT_DISTANCE;
        }
        if let Some(last) = waypoints.last() {
            if new_to - last.point.x > MIN_WAYPOINT_DISTANCE {
                waypoints.push(row_waypoint(
                    new_to,
                    y,
                    &row.adjacent_islands,
                    row.original_row_number,
                ));
            }
        }
        if waypoints.len() < 2 {
            continue;
        }

        rows.push(WorkRow {
            left,
            right,
            waypoints,
            original_row_number: row.original_row_number,
            adjacent_islands: row.adjacent_islands,
        });
    }

    if rows.is_empty() {
        None
    } else {
        Some(WorkBlock { id: block.id, rows })
    }
}

fn row_waypoint(x: f64, y: f64, islands: &BTreeSet<u32>, original_row_number: usize) -> Waypoint {
    let mut wp = Waypoint::at(x, y);
    wp.original_row_number = Some(original_row_number);
    wp.adjacent_islands = islands.clone();
    wp
}
