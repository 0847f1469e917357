//! Course generation orchestrator.
//!
//! Transforms the field into the row-aligned frame, runs angle search,
//! row generation, block splitting, sequencing and linking, then maps
//! the course back into world coordinates.

use crate::angle::find_best_angle;
use crate::blocks::split_into_blocks;
use crate::linker::link_course;
use crate::materialize::materialize_block;
use crate::ridge::{apply_ridge_markers, insert_turn_midpoints};
use crate::rows::{find_intersections, generate_rows, mark_adjacent_rows};
use crate::sequence::sequence_blocks;
use crate::settings::{CenterSettings, HeadlandSettings};
use crate::waypoint::{HeadlandId, Waypoint};
use fieldcourse_core::{Error, Polygon, Result};
use rand::prelude::*;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An obstacle inside the field, described by the headland tracks
/// generated around it.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Island {
    pub id: u32,
    /// Headland polygons around the obstacle, innermost first.
    pub headland_tracks: Vec<Polygon>,
    /// Index of the outermost headland track; rows are cut against it.
    pub outermost_headland_ix: usize,
}

impl Island {
    /// Creates an island with a single headland track.
    pub fn new(id: u32, headland: Polygon) -> Self {
        Self {
            id,
            headland_tracks: vec![headland],
            outermost_headland_ix: 0,
        }
    }

    /// The headland polygon the rows are trimmed against.
    pub fn outer_headland(&self) -> &Polygon {
        &self.headland_tracks[self.outermost_headland_ix]
    }

    fn validate(&self) -> Result<()> {
        if self.outermost_headland_ix >= self.headland_tracks.len() {
            return Err(Error::InvalidIsland(format!(
                "island {}: outermost headland index {} out of range",
                self.id, self.outermost_headland_ix
            )));
        }
        self.outer_headland()
            .validate()
            .map_err(|e| Error::InvalidIsland(format!("island {}: {e}", self.id)))
    }
}

/// The field to cover: its headland polygons and islands.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Field {
    /// Headland passes, outermost first; the last one bounds the center.
    /// With no headland passes this holds the bare field boundary.
    pub headlands: Vec<Polygon>,
    /// Vertex index on the innermost headland where the headland track
    /// ends and the center work begins.
    pub circle_start: usize,
    /// Driving direction of the headland track, `-1` or `+1`.
    pub circle_step: i32,
    pub islands: Vec<Island>,
    /// Working width of the implement, metres.
    pub width: f64,
}

impl Field {
    /// Creates a field from its boundary with no headlands or islands.
    pub fn new(boundary: Polygon, width: f64) -> Self {
        Self {
            headlands: vec![boundary],
            circle_start: 0,
            circle_step: 1,
            islands: Vec::new(),
            width,
        }
    }

    /// Replaces the headland polygons, outermost first.
    pub fn with_headlands(mut self, headlands: Vec<Polygon>) -> Self {
        self.headlands = headlands;
        self
    }

    /// Sets where and in which direction the headland track ends.
    pub fn with_circle(mut self, start: usize, step: i32) -> Self {
        self.circle_start = start;
        self.circle_step = step;
        self
    }

    /// Adds an island.
    pub fn with_island(mut self, island: Island) -> Self {
        self.islands.push(island);
        self
    }

    /// The polygon bounding the center work area.
    pub fn innermost_headland(&self) -> &Polygon {
        self.headlands.last().expect("field has a boundary")
    }

    /// Rejects unusable fields.
    pub fn validate(&self) -> Result<()> {
        if self.headlands.is_empty() {
            return Err(Error::InvalidBoundary("field has no boundary".into()));
        }
        self.innermost_headland().validate()?;
        if self.circle_start >= self.innermost_headland().len() {
            return Err(Error::InvalidBoundary(format!(
                "circle start {} out of range for {} vertices",
                self.circle_start,
                self.innermost_headland().len()
            )));
        }
        if self.width <= 0.0 || !self.width.is_finite() {
            return Err(Error::InvalidSettings(format!(
                "working width must be positive, got {}",
                self.width
            )));
        }
        for island in &self.islands {
            island.validate()?;
        }
        Ok(())
    }
}

/// The generated course.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Course {
    /// Waypoints in world coordinates.
    pub track: Vec<Waypoint>,
    /// The chosen row direction, degrees.
    pub best_angle_deg: f64,
    /// Number of worked rows.
    pub n_tracks: usize,
    /// Diagnostic quadrilaterals of the blocks, in traversal order.
    pub blocks: Vec<Polygon>,
    /// False when the decomposition looks implausible.
    pub result_is_ok: bool,
    /// Index into `track` where the up/down work begins.
    pub up_down_row_start: Option<usize>,
    /// Generations the sequencing GA ran.
    pub generations: Option<u32>,
    /// Best sequencing fitness reached.
    pub best_fitness: Option<f64>,
    /// Best fitness per generation.
    pub fitness_history: Option<Vec<f64>>,
}

impl Course {
    fn empty() -> Self {
        Self {
            result_is_ok: true,
            ..Self::default()
        }
    }

    /// Summary counts and distances.
    pub fn summary(&self) -> CourseSummary {
        let mut total = 0.0;
        let mut connecting = 0.0;
        for pair in self.track.windows(2) {
            let d = pair[0].point.distance_to(&pair[1].point);
            total += d;
            if pair[0].connecting_track || pair[1].connecting_track {
                connecting += d;
            }
        }
        CourseSummary {
            n_waypoints: self.track.len(),
            n_tracks: self.n_tracks,
            n_blocks: self.blocks.len(),
            total_distance: total,
            connecting_distance: connecting,
            row_distance: total - connecting,
            result_is_ok: self.result_is_ok,
        }
    }
}

/// Summary statistics for a generated course.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CourseSummary {
    pub n_waypoints: usize,
    pub n_tracks: usize,
    pub n_blocks: usize,
    pub total_distance: f64,
    pub connecting_distance: f64,
    pub row_distance: f64,
    pub result_is_ok: bool,
}

/// Generates up/down courses for field centers.
pub struct CourseGenerator {
    center: CenterSettings,
    headland: HeadlandSettings,
    seed: Option<u64>,
}

impl CourseGenerator {
    /// Creates a generator with the given settings.
    pub fn new(center: CenterSettings, headland: HeadlandSettings) -> Self {
        Self {
            center,
            headland,
            seed: None,
        }
    }

    /// Seeds the sequencing GA for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Generates the center course for the field.
    pub fn generate(&self, field: &Field) -> Result<Course> {
        field.validate()?;
        self.center.validate()?;

        let innermost = field.innermost_headland();
        let centroid = innermost.centroid();
        let boundary = innermost.translated(-centroid.x, -centroid.y);
        let islands: BTreeMap<u32, Polygon> = field
            .islands
            .iter()
            .map(|island| {
                (
                    island.id,
                    island.outer_headland().translated(-centroid.x, -centroid.y),
                )
            })
            .collect();
        let distance = self.headland.distance_from_boundary(field.width);

        let choice = find_best_angle(&boundary, &islands, field.width, distance, &self.center);
        let angle = choice.angle_deg.to_radians();
        let rotated_boundary = boundary.rotated(angle);
        let rotated_islands: BTreeMap<u32, Polygon> = islands
            .iter()
            .map(|(&id, polygon)| (id, polygon.rotated(angle)))
            .collect();

        let mut generated = generate_rows(
            &rotated_boundary,
            field.width,
            distance,
            self.center.use_same_width,
        );
        if generated.rows.is_empty() {
            log::debug!("no room for center rows");
            return Ok(Course::empty());
        }
        find_intersections(&mut generated.rows, &rotated_boundary, HeadlandId::Field);
        for (&id, island) in &rotated_islands {
            find_intersections(&mut generated.rows, island, HeadlandId::Island(id));
            mark_adjacent_rows(&mut generated.rows, id);
        }

        let blocks: Vec<_> = split_into_blocks(generated.rows)
            .into_iter()
            .filter_map(|block| materialize_block(block, field.width, self.headland.n_passes))
            .collect();
        if blocks.is_empty() {
            log::debug!("no drivable rows left after trimming");
            return Ok(Course::empty());
        }

        let n_blocks = blocks.len();
        let n_tracks: usize = blocks.iter().map(|b| b.n_rows()).sum();
        let result_is_ok = n_blocks <= 30
            && !(n_blocks > 1 && (n_tracks as f64 / n_blocks as f64) < 2.0);

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (sequenced, entry_direction, stats) = sequence_blocks(
            blocks,
            &rotated_boundary,
            &rotated_islands,
            field.circle_start,
            field.circle_step,
            self.headland.n_passes,
            self.center.rows_to_skip,
            &mut rng,
        );

        let mut linked = link_course(
            &sequenced,
            entry_direction,
            &rotated_boundary,
            &rotated_islands,
            field.circle_start,
            &self.center,
            self.headland.n_passes,
        );
        if self.center.rows_to_skip == 0 {
            apply_ridge_markers(&mut linked.track);
        }
        insert_turn_midpoints(&mut linked.track);
        // inserted midpoints shift indices, the tag does not move
        let up_down_row_start = linked.track.iter().position(|wp| wp.up_down_row_start);

        // back into world coordinates
        for wp in linked.track.iter_mut() {
            wp.point = wp.point.rotated(-angle).translated(centroid.x, centroid.y);
        }
        let block_polygons = sequenced
            .iter()
            .map(|s| {
                s.block
                    .corner_polygon()
                    .rotated(-angle)
                    .translated(centroid.x, centroid.y)
            })
            .collect();

        Ok(Course {
            track: linked.track,
            best_angle_deg: choice.angle_deg,
            n_tracks,
            blocks: block_polygons,
            result_is_ok,
            up_down_row_start,
            generations: Some(stats.generations),
            best_fitness: Some(stats.best_fitness),
            fitness_history: Some(stats.history),
        })
    }
}
