//! Decomposition of the center into blocks.
//!
//! A block is a maximal run of consecutive rows whose spans lie on the
//! same stretch of boundary. Non-convex fields and islands produce rows
//! with more than two crossings; their sub-segments open parallel blocks.

use crate::rows::Row;
use crate::settings::Corner;
use crate::waypoint::Intersection;
use fieldcourse_core::Point;

/// A maximal contiguous group of rows, bottom row first. After splitting
/// every row has exactly two crossings.
#[derive(Debug, Clone)]
pub struct Block {
    pub id: usize,
    pub rows: Vec<Row>,
}

impl Block {
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
        let ix = if corner.is_left() { 0 } else { 1 };
        &row.intersections[ix]
    }
}

/// Deletes stray crossing pairs left by an island headland poking across
/// the field boundary.
///
/// Island crossings toggle an on-island state while walking left to
/// right; hitting a field-boundary crossing in that state means the
/// island sticks out of the field, so that crossing and the island
/// crossing before it are spurious.
pub fn cleanup_intersections(row: &mut Row) {
    let mut keep = vec![true; row.intersections.len()];
    let mut on_island = false;
    for i in 0..row.intersections.len() {
        if row.intersections[i].headland.island().is_some() {
            on_island = !on_island;
        } else if on_island {
            keep[i] = false;
            if i > 0 {
                keep[i - 1] = false;
            }
            on_island = false;
        }
    }
    if keep.iter().any(|k| !k) {
        log::debug!(
            "row {}: removing stray boundary crossings",
            row.original_row_number
        );
        let mut it = keep.iter();
        row.intersections.retain(|_| *it.next().unwrap());
    }
}

/// Splits a row into one sub-segment per crossing pair.
pub fn split_row(row: &Row) -> Vec<Row> {
    row.intersections
        .chunks(2)
        .filter(|pair| pair.len() == 2)
        .map(|pair| Row {
            from: Point::new(pair[0].point.x, row.y()),
            to: Point::new(pair[1].point.x, row.y()),
            intersections: pair.to_vec(),
            original_row_number: row.original_row_number,
            on_island: row.on_island,
            adjacent_islands: row.adjacent_islands.clone(),
        })
        .collect()
}

/// Groups rows into blocks, scanning bottom to top.
///
/// A row extends the open blocks when it has as many crossings as the
/// previous row and each sub-segment overlaps its block's latest row in
/// x; any other row closes all open blocks and starts a fresh set.
pub fn split_into_blocks(rows: Vec<Row>) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut open: Vec<Vec<Row>> = Vec::new();
    let mut previous_count: Option<usize> = None;

    let mut close_all = |open: &mut Vec<Vec<Row>>, blocks: &mut Vec<Block>| {
        for rows in open.drain(..) {
            let id = blocks.len();
            blocks.push(Block { id, rows });
        }
    };

    for mut row in rows {
        cleanup_intersections(&mut row);
        if row.intersections.len() % 2 == 1 {
            log::debug!(
                "row {}: odd crossing count, dropping the last",
                row.original_row_number
            );
            row.intersections.pop();
        }
        if row.intersections.len() < 2 {
            close_all(&mut open, &mut blocks);
            previous_count = None;
            continue;
        }

        let segments = split_row(&row);
        let extends = previous_count == Some(row.intersections.len())
            && segments.len() == open.len()
            && segments
                .iter()
                .zip(open.iter())
                .all(|(segment, block)| overlaps(segment, block.last().expect("open block")));

        if extends {
            for (segment, block) in segments.into_iter().zip(open.iter_mut()) {
                block.push(segment);
            }
        } else {
            close_all(&mut open, &mut blocks);
            open = segments.into_iter().map(|s| vec![s]).collect();
        }
        previous_count = Some(row.intersections.len());
    }
    close_all(&mut open, &mut blocks);
    blocks
}

fn overlaps(a: &Row, b: &Row) -> bool {
    a.from.x <= b.to.x && b.from.x <= a.to.x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::{find_intersections, generate_rows};
    use crate::waypoint::{HeadlandEdge, HeadlandId};
    use fieldcourse_core::Polygon;

    fn crossing(x: f64, headland: HeadlandId, row: usize) -> Intersection {
        Intersection {
            point: Point::new(x, 0.0),
            angle: std::f64::consts::FRAC_PI_2,
            headland,
            edge: HeadlandEdge { from_ix: 0, to_ix: 1 },
            original_row_number: row,
        }
    }

    fn row_with(intersections: Vec<Intersection>, n: usize) -> Row {
        Row {
            from: Point::new(0.0, 0.0),
            to: Point::new(100.0, 0.0),
            intersections,
            original_row_number: n,
            on_island: None,
            adjacent_islands: Default::default(),
        }
    }

    #[test]
    fn test_cleanup_removes_stray_pair() {
        // island headland crossed before entering the field
        let mut row = row_with(
            vec![
                crossing(5.0, HeadlandId::Island(1), 0),
                crossing(10.0, HeadlandId::Field, 0),
                crossing(60.0, HeadlandId::Field, 0),
            ],
            0,
        );
        cleanup_intersections(&mut row);
        assert_eq!(row.intersections.len(), 1);
        assert_eq!(row.intersections[0].point.x, 60.0);
    }

    #[test]
    fn test_cleanup_keeps_contained_island() {
        let mut row = row_with(
            vec![
                crossing(0.0, HeadlandId::Field, 0),
                crossing(30.0, HeadlandId::Island(1), 0),
                crossing(40.0, HeadlandId::Island(1), 0),
                crossing(100.0, HeadlandId::Field, 0),
            ],
            0,
        );
        cleanup_intersections(&mut row);
        assert_eq!(row.intersections.len(), 4);
    }

    #[test]
    fn test_split_row_pairs() {
        let row = row_with(
            vec![
                crossing(0.0, HeadlandId::Field, 0),
                crossing(30.0, HeadlandId::Island(1), 0),
                crossing(40.0, HeadlandId::Island(1), 0),
                crossing(100.0, HeadlandId::Field, 0),
            ],
            0,
        );
        let segments = split_row(&row);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].to.x, 30.0);
        assert_eq!(segments[1].from.x, 40.0);
    }

    #[test]
    fn test_convex_field_is_one_block() {
        let square = Polygon::rectangle(40.0, 40.0);
        let mut generated = generate_rows(&square, 4.0, 2.0, false);
        find_intersections(&mut generated.rows, &square, HeadlandId::Field);
        let blocks = split_into_blocks(generated.rows);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].n_rows(), 10);
    }

    #[test]
    fn test_island_splits_into_two_blocks() {
        // island column crossing every row splits the center left/right
        let square = Polygon::rectangle(60.0, 60.0);
        let island = Polygon::new(vec![
            Point::new(28.0, -10.0),
            Point::new(32.0, -10.0),
            Point::new(32.0, 70.0),
            Point::new(28.0, 70.0),
        ]);
        let mut generated = generate_rows(&square, 4.0, 2.0, false);
        find_intersections(&mut generated.rows, &square, HeadlandId::Field);
        find_intersections(&mut generated.rows, &island, HeadlandId::Island(1));
        let blocks = split_into_blocks(generated.rows);
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| b.n_rows() > 0));
    }

    #[test]
    fn test_corners() {
        let square = Polygon::rectangle(40.0, 40.0);
        let mut generated = generate_rows(&square, 4.0, 2.0, false);
        find_intersections(&mut generated.rows, &square, HeadlandId::Field);
        let blocks = split_into_blocks(generated.rows);
        let block = &blocks[0];
        assert!(block.corner(Corner::BottomLeft).point.x.abs() < 1e-9);
        assert!((block.corner(Corner::TopRight).point.x - 40.0).abs() < 1e-9);
        assert!(block.corner(Corner::TopRight).point.y > block.corner(Corner::BottomRight).point.y);
    }
}
