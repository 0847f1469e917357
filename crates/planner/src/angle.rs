//! Row-angle selection.
//!
//! Candidate angles are scored by running the row generator and block
//! splitter and weighting row count, block count, fragmentation into
//! small blocks and the deviation from the field's dominant axis. The
//! sweep is a parallel map; ties keep the first candidate.

use crate::blocks::split_into_blocks;
use crate::rows::{find_intersections, generate_rows};
use crate::settings::{CenterSettings, SMALL_BLOCK_TRACK_COUNT_LIMIT};
use crate::waypoint::HeadlandId;
use fieldcourse_core::Polygon;
use rayon::prelude::*;
use std::collections::BTreeMap;

const ANGLE_STEP_DEG: f64 = 2.0;
const SMALL_BLOCK_WEIGHT: f64 = 50.0;
const BLOCK_WEIGHT: f64 = 10.0;
const ANGLE_DEVIATION_WEIGHT: f64 = 3.0;

/// A scored candidate angle.
#[derive(Debug, Clone, Copy)]
pub struct AngleChoice {
    /// Row direction, degrees.
    pub angle_deg: f64,
    /// Worked rows at this angle, counted after block splitting.
    pub n_tracks: usize,
    /// Blocks the center decomposes into at this angle.
    pub n_blocks: usize,
    /// Composite cost; lower is better.
    pub score: f64,
}

/// Scores a single candidate angle.
pub fn score_angle(
    boundary: &Polygon,
    islands: &BTreeMap<u32, Polygon>,
    width: f64,
    distance: f64,
    use_same_width: bool,
    angle_deg: f64,
) -> AngleChoice {
    let rotated = boundary.rotated(angle_deg.to_radians());
    let mut generated = generate_rows(&rotated, width, distance, use_same_width);
    find_intersections(&mut generated.rows, &rotated, HeadlandId::Field);
    for (&id, island) in islands {
        let rotated_island = island.rotated(angle_deg.to_radians());
        find_intersections(&mut generated.rows, &rotated_island, HeadlandId::Island(id));
    }
    let blocks = split_into_blocks(generated.rows);
    let n_tracks: usize = blocks.iter().map(|b| b.n_rows()).sum();
    let n_blocks = blocks.len();

    let small_block_score: usize = if n_blocks > 1 {
        blocks
            .iter()
            .filter(|b| b.n_rows() < SMALL_BLOCK_TRACK_COUNT_LIMIT)
            .map(|b| SMALL_BLOCK_TRACK_COUNT_LIMIT - b.n_rows())
            .sum()
    } else {
        0
    };
    let angle_score = ANGLE_DEVIATION_WEIGHT
        * (angle_deg - boundary.best_direction_deg())
            .to_radians()
            .sin()
            .abs();

    AngleChoice {
        angle_deg,
        n_tracks,
        n_blocks,
        score: SMALL_BLOCK_WEIGHT * small_block_score as f64
            + BLOCK_WEIGHT * n_blocks as f64
            + n_tracks as f64
            + angle_score,
    }
}

/// Picks the cheapest row angle for the boundary and islands.
pub fn find_best_angle(
    boundary: &Polygon,
    islands: &BTreeMap<u32, Polygon>,
    width: f64,
    distance: f64,
    settings: &CenterSettings,
) -> AngleChoice {
    let candidates: Vec<f64> = if settings.use_longest_edge_angle {
        vec![-boundary.best_direction_deg()]
    } else if settings.use_best_angle {
        let steps = (180.0 / ANGLE_STEP_DEG) as usize;
        (0..=steps).map(|i| i as f64 * ANGLE_STEP_DEG).collect()
    } else {
        vec![settings.row_angle.to_degrees()]
    };

    let scored: Vec<AngleChoice> = candidates
        .par_iter()
        .map(|&deg| {
            score_angle(
                boundary,
                islands,
                width,
                distance,
                settings.use_same_width,
                deg,
            )
        })
        .collect();

    // strict comparison keeps the first candidate on ties
    let best = scored
        .into_iter()
        .reduce(|best, candidate| {
            if candidate.score < best.score {
                candidate
            } else {
                best
            }
        })
        .expect("at least one candidate angle");
    log::debug!(
        "best angle {:.1} deg: {} rows in {} blocks, score {:.2}",
        best.angle_deg,
        best.n_tracks,
        best.n_blocks,
        best.score
    );
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fieldcourse_core::Point;

    #[test]
    fn test_long_rectangle_prefers_long_axis() {
        let rect = Polygon::rectangle(100.0, 10.0);
        let settings = CenterSettings::new().with_best_angle();
        let choice = find_best_angle(&rect, &BTreeMap::new(), 4.0, 2.0, &settings);
        assert!(choice.angle_deg == 0.0 || choice.angle_deg == 180.0);
        assert_eq!(choice.n_tracks, 3);
        assert_eq!(choice.n_blocks, 1);
    }

    #[test]
    fn test_longest_edge_candidate() {
        let rect = Polygon::rectangle(100.0, 10.0);
        let settings = CenterSettings::new().with_longest_edge_angle();
        let choice = find_best_angle(&rect, &BTreeMap::new(), 4.0, 2.0, &settings);
        assert_relative_eq!(choice.angle_deg, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_scores_are_symmetric_under_half_turn() {
        let square = Polygon::rectangle(40.0, 40.0);
        for deg in [0.0, 14.0, 30.0, 90.0, 145.0] {
            let a = score_angle(&square, &BTreeMap::new(), 4.0, 2.0, false, deg);
            let b = score_angle(&square, &BTreeMap::new(), 4.0, 2.0, false, deg + 180.0);
            assert_relative_eq!(a.score, b.score, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_island_candidate_counts_split_tracks() {
        // an island column splits every row in two, doubling the track
        // count the score sees
        let square = Polygon::rectangle(60.0, 60.0);
        let island = Polygon::new(vec![
            Point::new(28.0, -10.0),
            Point::new(32.0, -10.0),
            Point::new(32.0, 70.0),
            Point::new(28.0, 70.0),
        ]);
        let mut islands = BTreeMap::new();
        islands.insert(1, island);

        let open = score_angle(&square, &BTreeMap::new(), 4.0, 2.0, false, 0.0);
        assert_eq!(open.n_blocks, 1);
        assert_eq!(open.n_tracks, 15);

        let split = score_angle(&square, &islands, 4.0, 2.0, false, 0.0);
        assert_eq!(split.n_blocks, 2);
        assert_eq!(split.n_tracks, 2 * open.n_tracks);
    }

    #[test]
    fn test_fixed_angle_used_verbatim() {
        let square = Polygon::rectangle(40.0, 40.0);
        let settings = CenterSettings::new().with_row_angle(std::f64::consts::FRAC_PI_2);
        let choice = find_best_angle(&square, &BTreeMap::new(), 4.0, 2.0, &settings);
        assert_relative_eq!(choice.angle_deg, 90.0, epsilon = 1e-9);
    }
}
