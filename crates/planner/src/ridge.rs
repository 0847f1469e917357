//! Course post-passes: ridge markers and long-turn midpoints.

use crate::settings::WAYPOINT_DISTANCE;
use crate::waypoint::{RidgeMarker, Waypoint};
use fieldcourse_core::Point;

/// Inserts a midpoint into turns longer than two waypoint distances and
/// moves the turn start onto it, so the turn maneuver begins closer to
/// the next row.
pub fn insert_turn_midpoints(track: &mut Vec<Waypoint>) {
    let mut i = 1;
    while i < track.len() {
        if track[i].turn_end && track[i - 1].turn_start {
            let from = track[i - 1].point;
            let to = track[i].point;
            if from.distance_to(&to) > 2.0 * WAYPOINT_DISTANCE {
                let mut midpoint =
                    Waypoint::new(Point::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0));
                midpoint.turn_start = true;
                track[i - 1].turn_start = false;
                track.insert(i, midpoint);
                i += 1;
            }
        }
        i += 1;
    }
}

/// Marks which implement side ridges each row, from the direction of the
/// turn that follows it. The first and last worked row of every block
/// stay unmarked, as does the last-worked row of the course and the
/// waypoint right after each turn.
pub fn apply_ridge_markers(track: &mut [Waypoint]) {
    let n = track.len();
    let mut row_start = 0;
    for i in 0..n {
        if !track[i].is_row_waypoint() {
            row_start = i + 1;
            continue;
        }
        if track[i].turn_end {
            row_start = i;
        }
        if track[i].turn_start && !track[i].first_track && !track[i].last_track {
            let marker = if turn_delta_angle(track, i) >= 0.0 {
                RidgeMarker::Right
            } else {
                RidgeMarker::Left
            };
            for wp in track.iter_mut().take(i + 1).skip(row_start) {
                wp.ridge_marker = marker;
            }
        }
    }

    // the last-worked row leaves no ridge
    if let Some(last_row) = track
        .iter()
        .rev()
        .find_map(|wp| wp.original_row_number)
    {
        for wp in track.iter_mut().rev() {
            match wp.original_row_number {
                Some(row) if row == last_row => wp.ridge_marker = RidgeMarker::None,
                Some(_) => break,
                None => continue,
            }
        }
    }
    for i in 0..n.saturating_sub(1) {
        if track[i].turn_end {
            track[i + 1].ridge_marker = RidgeMarker::None;
        }
    }
}

/// Signed direction change between the row entering the turn at `i` and
/// the row leaving it.
fn turn_delta_angle(track: &[Waypoint], i: usize) -> f64 {
    let dir_in = if i > 0 {
        direction(&track[i - 1].point, &track[i].point)
    } else {
        0.0
    };
    let dir_out = track[i..]
        .iter()
        .position(|wp| wp.turn_end)
        .map(|offset| i + offset)
        .and_then(|end| {
            (end + 1 < track.len()).then(|| direction(&track[end].point, &track[end + 1].point))
        })
        .unwrap_or(dir_in);
    normalize_angle(dir_out - dir_in)
}

fn direction(from: &Point, to: &Point) -> f64 {
    (to.y - from.y).atan2(to.x - from.x)
}

fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % std::f64::consts::TAU;
    if a > std::f64::consts::PI {
        a -= std::f64::consts::TAU;
    } else if a < -std::f64::consts::PI {
        a += std::f64::consts::TAU;
    }
    a
}
