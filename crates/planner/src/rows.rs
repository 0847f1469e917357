//! Parallel row generation and boundary crossings.
//!
//! Rows are horizontal segments spanning the rotated boundary's bounding
//! box; they are trimmed to the boundary later, once their crossings are
//! known.

use crate::waypoint::{HeadlandEdge, HeadlandId, Intersection};
use fieldcourse_core::{segment_intersection, Point, Polygon};
use std::collections::BTreeSet;

/// Two rows closer than this in y collapse into one.
const MIN_ROW_SEPARATION: f64 = 0.1;

/// Crossings closer than this in x are duplicates of the same vertex.
const DUPLICATE_X_EPS: f64 = 1e-9;

/// One straight pass across the field, before trimming.
#[derive(Debug, Clone)]
pub struct Row {
    pub from: Point,
    pub to: Point,
    /// Crossings with the boundary and island headlands, ascending in x.
    pub intersections: Vec<Intersection>,
    /// Index of this row as generated, bottom to top.
    pub original_row_number: usize,
    /// Set when the row crosses an island headland.
    pub on_island: Option<u32>,
    /// Islands bordering this row without crossing it.
    pub adjacent_islands: BTreeSet<u32>,
}

impl Row {
    fn new(y: f64, min_x: f64, max_x: f64, original_row_number: usize) -> Self {
        Self {
            from: Point::new(min_x, y),
            to: Point::new(max_x, y),
            intersections: Vec::new(),
            original_row_number,
            on_island: None,
            adjacent_islands: BTreeSet::new(),
        }
    }

    /// The row's constant y coordinate.
    pub fn y(&self) -> f64 {
        self.from.y
    }
}

/// Result of row generation.
#[derive(Debug)]
pub struct GeneratedRows {
    pub rows: Vec<Row>,
    /// How far the last row overshoots the work area when the full row
    /// spacing is kept.
    pub offset: f64,
}

/// Emits horizontal rows inside the boundary's bounding box, spaced by
/// `width` and kept `distance` away from the top and bottom extents.
pub fn generate_rows(
    boundary: &Polygon,
    width: f64,
    distance: f64,
    use_same_width: bool,
) -> GeneratedRows {
    let bbox = boundary.bbox();
    let y_min = bbox.min_y + distance;
    let y_max = bbox.max_y - distance;
    if y_min > y_max || bbox.is_empty() {
        return GeneratedRows {
            rows: Vec::new(),
            offset: 0.0,
        };
    }

    let mut ys = Vec::new();
    let mut y = y_min;
    while y < y_max {
        ys.push(y);
        y += width;
    }
    // one more row; with same-width spacing it may overshoot the work area
    let mut offset = 0.0;
    if use_same_width {
        ys.push(y);
        offset = distance - (bbox.max_y - y);
    } else {
        ys.push(y.min(y_max));
    }
    if ys.len() >= 2 && ys[ys.len() - 1] - ys[ys.len() - 2] < MIN_ROW_SEPARATION {
        ys.pop();
    }

    let rows = ys
        .into_iter()
        .enumerate()
        .map(|(i, y)| Row::new(y, bbox.min_x, bbox.max_x, i))
        .collect();
    GeneratedRows { rows, offset }
}

/// Records every crossing between the rows and the polygon.
///
/// Crossings keep the tangent angle and the edge indices of the crossed
/// edge; they are inserted in ascending x with exact-x duplicates (a row
/// passing through a vertex) collapsed.
pub fn find_intersections(rows: &mut [Row], headland: &Polygon, id: HeadlandId) {
    let n = headland.len();
    for row in rows.iter_mut() {
        for i in 0..n {
            let from = headland.at(i as isize);
            let to = headland.at(i as isize + 1);
            if let Some(point) = segment_intersection(from, to, &row.from, &row.to) {
                let crossing = Intersection {
                    point,
                    angle: headland.tangent(i),
                    headland: id,
                    edge: HeadlandEdge {
                        from_ix: i,
                        to_ix: (i + 1) % n,
                    },
                    original_row_number: row.original_row_number,
                };
                insert_sorted(&mut row.intersections, crossing);
                if let Some(island) = id.island() {
                    row.on_island = Some(island);
                }
            }
        }
    }
}

/// Marks the neighbours of rows crossing an island: for each consecutive
/// pair where exactly one row is on the island, the other row borders it.
pub fn mark_adjacent_rows(rows: &mut [Row], island_id: u32) {
    for i in 1..rows.len() {
        let prev_on = rows[i - 1].on_island.is_some();
        let cur_on = rows[i].on_island.is_some();
        if prev_on != cur_on {
            let other = if prev_on { i } else { i - 1 };
            rows[other].adjacent_islands.insert(island_id);
        }
    }
}

fn insert_sorted(intersections: &mut Vec<Intersection>, crossing: Intersection) {
    if intersections
        .iter()
        .any(|is| (is.point.x - crossing.point.x).abs() < DUPLICATE_X_EPS)
    {
        return;
    }
    let pos = intersections
        .iter()
        .position(|is| is.point.x > crossing.point.x)
        .unwrap_or(intersections.len());
    intersections.insert(pos, crossing);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_row_spacing_in_square() {
        // 40 m square, 4 m width, boundary distance 2: rows at 2, 6, .. 38
        let square = Polygon::rectangle(40.0, 40.0);
        let generated = generate_rows(&square, 4.0, 2.0, false);
        assert_eq!(generated.rows.len(), 10);
        assert_relative_eq!(generated.rows[0].y(), 2.0);
        assert_relative_eq!(generated.rows[9].y(), 38.0);
    }

    #[test]
    fn test_last_row_clamped() {
        // 10 m tall: rows at 2, 6, then the final row clamped to 8
        let rect = Polygon::rectangle(100.0, 10.0);
        let generated = generate_rows(&rect, 4.0, 2.0, false);
        let ys: Vec<f64> = generated.rows.iter().map(|t| t.y()).collect();
        assert_eq!(ys.len(), 3);
        assert_relative_eq!(ys[2], 8.0);
    }

    #[test]
    fn test_same_width_keeps_overshoot() {
        let rect = Polygon::rectangle(100.0, 10.0);
        let generated = generate_rows(&rect, 4.0, 2.0, true);
        let last = generated.rows.last().unwrap().y();
        assert_relative_eq!(last, 10.0);
        assert_relative_eq!(generated.offset, 2.0);
    }

    #[test]
    fn test_near_duplicate_last_row_dropped() {
        // 12.05 m tall, distance 2: rows at 2, 6, 10 and a clamp to 10.05
        let rect = Polygon::rectangle(100.0, 12.05);
        let generated = generate_rows(&rect, 4.0, 2.0, false);
        let ys: Vec<f64> = generated.rows.iter().map(|t| t.y()).collect();
        assert_eq!(ys.len(), 3);
    }

    #[test]
    fn test_no_room_for_rows() {
        let rect = Polygon::rectangle(100.0, 3.0);
        let generated = generate_rows(&rect, 4.0, 2.0, false);
        assert!(generated.rows.is_empty());
    }

    #[test]
    fn test_intersections_sorted_and_tagged() {
        let square = Polygon::rectangle(40.0, 40.0);
        let mut generated = generate_rows(&square, 4.0, 2.0, false);
        find_intersections(&mut generated.rows, &square, HeadlandId::Field);
        for row in &generated.rows {
            assert_eq!(row.intersections.len(), 2);
            assert!(row.intersections[0].point.x < row.intersections[1].point.x);
            assert_eq!(row.intersections[0].headland, HeadlandId::Field);
        }
        // left crossings are on the left edge (vertex 3 -> 0)
        assert_eq!(generated.rows[0].intersections[0].edge.from_ix, 3);
    }

    #[test]
    fn test_island_crossing_marks_row() {
        let square = Polygon::rectangle(40.0, 40.0);
        let island = Polygon::new(vec![
            Point::new(15.0, 15.0),
            Point::new(25.0, 15.0),
            Point::new(25.0, 25.0),
            Point::new(15.0, 25.0),
        ]);
        let mut generated = generate_rows(&square, 4.0, 2.0, false);
        find_intersections(&mut generated.rows, &square, HeadlandId::Field);
        find_intersections(&mut generated.rows, &island, HeadlandId::Island(1));
        mark_adjacent_rows(&mut generated.rows, 1);

        let crossing: Vec<&Row> = generated
            .rows
            .iter()
            .filter(|t| t.on_island.is_some())
            .collect();
        assert!(!crossing.is_empty());
        for row in &crossing {
            assert_eq!(row.intersections.len(), 4);
        }
        // rows immediately outside the island remember it
        let adjacent: Vec<&Row> = generated
            .rows
            .iter()
            .filter(|t| t.adjacent_islands.contains(&1))
            .collect();
        assert_eq!(adjacent.len(), 2);
    }
}
