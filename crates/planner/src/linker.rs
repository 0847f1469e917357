//! Final course assembly.
//!
//! Walks the sequenced blocks, emits the connecting headland slices
//! between them, orders each block's rows for the configured pattern and
//! concatenates everything into one polyline with turn tags.

use crate::materialize::WorkRow;
use crate::ordering::order_rows;
use crate::sequence::{exit_corner, SequencedBlock};
use crate::settings::CenterSettings;
use crate::waypoint::{HeadlandEdge, HeadlandId, Waypoint};
use fieldcourse_core::{Point, Polygon};
use std::collections::BTreeMap;

/// The assembled course before the world transform back.
#[derive(Debug, Default)]
pub struct LinkedCourse {
    pub track: Vec<Waypoint>,
    /// Index of the first up/down row waypoint.
    pub up_down_row_start: Option<usize>,
}

/// Vertex slice of `polygon` between two edges, inclusive, walking in
/// `step`. The walk starts and ends inside the two edges so the
/// connector never overshoots a row end.
pub fn slice_between_edges(
    polygon: &Polygon,
    from: HeadlandEdge,
    to: HeadlandEdge,
    step: i32,
) -> Vec<Point> {
    let (start, end) = if step >= 0 {
        (from.to_ix, to.from_ix)
    } else {
        (from.from_ix, to.to_ix)
    };
    polygon.slice(start, end, step)
}

/// Concatenates connectors and ordered block rows into the course.
pub fn link_course(
    sequenced: &[SequencedBlock],
    entry_direction: i32,
    headland: &Polygon,
    islands: &BTreeMap<u32, Polygon>,
    circle_start: usize,
    settings: &CenterSettings,
    n_headland_passes: usize,
) -> LinkedCourse {
    let mut course = LinkedCourse::default();
    let mut previous_exit: Option<(HeadlandEdge, HeadlandId, usize, i32)> = None;

    for (block_ix, sequenced_block) in sequenced.iter().enumerate() {
        let block = &sequenced_block.block;
        let entry = sequenced_block.entry;
        let entry_crossing = block.corner(entry);

        // rows indexed from the entry corner's edge
        let mut rows: Vec<&WorkRow> = block.rows.iter().collect();
        if !entry.is_bottom() {
            rows.reverse();
        }
        let order = order_rows(rows.len(), settings, entry);
        let first_row_original = rows[order[0]].original_row_number;

        let connector = if block_ix == 0 {
            if n_headland_passes > 0 && entry_crossing.headland == HeadlandId::Field {
                headland.slice(
                    circle_start,
                    if entry_direction >= 0 {
                        entry_crossing.edge.from_ix
                    } else {
                        entry_crossing.edge.to_ix
                    },
                    entry_direction,
                )
            } else {
                Vec::new()
            }
        } else {
            let (exit_edge, exit_headland, exit_row_original, direction) =
                previous_exit.expect("previous block recorded");
            if exit_row_original.abs_diff(first_row_original) == 1 {
                // originally adjacent rows connect with a plain turn
                Vec::new()
            } else if exit_headland != entry_crossing.headland {
                log::warn!(
                    "blocks {} and {} share no headland, omitting connector",
                    block_ix - 1,
                    block_ix
                );
                Vec::new()
            } else {
                match polygon_for(entry_crossing.headland, headland, islands) {
                    Some(polygon) => {
                        slice_between_edges(polygon, exit_edge, entry_crossing.edge, direction)
                    }
                    None => Vec::new(),
                }
            }
        };

        if !connector.is_empty() {
            course.track.extend(connector.iter().map(|&point| {
                let mut wp = Waypoint::new(point);
                wp.connecting_track = true;
                wp
            }));
            if let Some(last) = course.track.last_mut() {
                last.turn_start = true;
            }
        }

        append_block_rows(
            &mut course,
            &rows,
            &order,
            entry.is_left(),
            block_ix == 0,
            block_ix == sequenced.len() - 1,
        );

        let exit = exit_corner(entry, block.n_rows(), settings.rows_to_skip);
        let exit_crossing = block.corner(exit);
        let last_row_original = rows[order[order.len() - 1]].original_row_number;
        previous_exit = Some((
            exit_crossing.edge,
            exit_crossing.headland,
            last_row_original,
            sequenced_block.direction_to_next,
        ));
    }
    course
}

fn polygon_for<'a>(
    id: HeadlandId,
    headland: &'a Polygon,
    islands: &'a BTreeMap<u32, Polygon>,
) -> Option<&'a Polygon> {
    match id {
        HeadlandId::Field => Some(headland),
        HeadlandId::Island(island) => islands.get(&island),
    }
}

fn append_block_rows(
    course: &mut LinkedCourse,
    rows: &[&WorkRow],
    order: &[usize],
    enter_from_left: bool,
    first_block: bool,
    last_block: bool,
) {
    for (position, &row_ix) in order.iter().enumerate() {
        let row = rows[row_ix];
        let mut waypoints = row.waypoints.clone();
        let leftward = if position % 2 == 0 {
            !enter_from_left
        } else {
            enter_from_left
        };
        if leftward {
            waypoints.reverse();
        }

        let first_row_of_course = first_block && position == 0;
        let last_row_of_course = last_block && position == order.len() - 1;
        let n = waypoints.len();
        for (i, wp) in waypoints.iter_mut().enumerate() {
            wp.row_number = Some(position);
            wp.first_track = position == 0;
            wp.last_track = position == order.len() - 1;
            if i == 0 && !first_row_of_course {
                wp.turn_end = true;
            }
            if i == n - 1 && !last_row_of_course {
                wp.turn_start = true;
            }
        }
        if first_row_of_course {
            course.up_down_row_start = Some(course.track.len());
            waypoints[0].up_down_row_start = true;
        }
        course.track.extend(waypoints);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::split_into_blocks;
    use crate::materialize::materialize_block;
    use crate::rows::{find_intersections, generate_rows};
    use crate::sequence::sequence_blocks;
    use rand::prelude::*;

    fn square_course(settings: &CenterSettings) -> LinkedCourse {
        let square = Polygon::rectangle(40.0, 40.0);
        let mut generated = generate_rows(&square, 4.0, 2.0, false);
        find_intersections(&mut generated.rows, &square, HeadlandId::Field);
        let blocks: Vec<_> = split_into_blocks(generated.rows)
            .into_iter()
            .filter_map(|b| materialize_block(b, 4.0, 0))
            .collect();
        let islands = BTreeMap::new();
        let mut rng = StdRng::seed_from_u64(1);
        let (sequenced, entry_direction, _) =
            sequence_blocks(blocks, &square, &islands, 0, 1, 0, 0, &mut rng);
        link_course(&sequenced, entry_direction, &square, &islands, 0, settings, 0)
    }

    #[test]
    fn test_zig_zag_reverses_every_second_row() {
        let course = square_course(&CenterSettings::default());
        let rows: Vec<Vec<&Waypoint>> = (0..10)
            .map(|r| {
                course
                    .track
                    .iter()
                    .filter(|wp| wp.row_number == Some(r))
                    .collect()
            })
            .collect();
        for pair in rows.windows(2) {
            let end = pair[0].last().unwrap().point;
            let start = pair[1].first().unwrap().point;
            // consecutive rows connect end to start on the same side
            assert!((end.x - start.x).abs() < 10.0);
        }
    }

    #[test]
    fn test_turn_tags() {
        let course = square_course(&CenterSettings::default());
        let track = &course.track;
        assert!(!track[0].turn_end);
        assert!(!track.last().unwrap().turn_start);
        let turn_starts = track.iter().filter(|wp| wp.turn_start).count();
        let turn_ends = track.iter().filter(|wp| wp.turn_end).count();
        assert_eq!(turn_starts, 9);
        assert_eq!(turn_ends, 9);
    }

    #[test]
    fn test_up_down_row_start_points_at_first_row() {
        let course = square_course(&CenterSettings::default());
        let start = course.up_down_row_start.unwrap();
        assert!(course.track[start].up_down_row_start);
        assert_eq!(course.track[start].row_number, Some(0));
    }

    #[test]
    fn test_slice_between_edges_direction() {
        let square = Polygon::rectangle(10.0, 10.0);
        let from = HeadlandEdge { from_ix: 0, to_ix: 1 };
        let to = HeadlandEdge { from_ix: 2, to_ix: 3 };
        let fwd = slice_between_edges(&square, from, to, 1);
        assert_eq!(fwd.len(), 2); // vertices 1 and 2
        let back = slice_between_edges(&square, from, to, -1);
        assert_eq!(back.len(), 2); // vertices 0 and 3
    }
}
