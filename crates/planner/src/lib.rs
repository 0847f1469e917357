//! # Fieldcourse Planner
//!
//! Generates the up/down course covering the center of an agricultural
//! field: parallel rows inside the innermost headland, grouped into
//! blocks where the boundary is non-convex or islands are in the way,
//! sequenced by a genetic algorithm and linked along the headland.
//!
//! ## Pipeline
//!
//! 1. **Angle search** — sweep candidate row directions, score each by
//!    row count, block count and deviation from the field's long axis
//! 2. **Row generation** — emit parallel rows in the rotated frame and
//!    record every boundary and island crossing
//! 3. **Block splitting** — group rows into blocks by crossing count and
//!    x-overlap
//! 4. **Materialization** — trim rows at their crossings and sample
//!    waypoints
//! 5. **Sequencing** — a GA picks the block order and entry corners
//! 6. **Linking** — connect blocks along the headland, order rows per
//!    the configured pattern, tag turns and ridge markers
//!
//! ## Quick Start
//!
//! ```rust
//! use fieldcourse_planner::{
//!     CenterSettings, CourseGenerator, Field, HeadlandSettings, Polygon,
//! };
//!
//! let boundary = Polygon::rectangle(40.0, 40.0);
//! let field = Field::new(boundary, 4.0);
//! let generator = CourseGenerator::new(
//!     CenterSettings::new().with_best_angle(),
//!     HeadlandSettings::new(0),
//! )
//! .with_seed(42);
//!
//! let course = generator.generate(&field).unwrap();
//! assert_eq!(course.n_tracks, 10);
//! assert!(course.result_is_ok);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: enable serialization/deserialization support

pub mod angle;
pub mod blocks;
pub mod generator;
pub mod linker;
pub mod materialize;
pub mod ordering;
pub mod ridge;
pub mod rows;
pub mod sequence;
pub mod settings;
pub mod waypoint;

// Re-exports
pub use angle::{find_best_angle, score_angle, AngleChoice};
pub use generator::{Course, CourseGenerator, CourseSummary, Field, Island};
pub use sequence::{exit_corner, SequenceChromosome, SequencedBlock};
pub use settings::{
    CenterSettings, Corner, HeadlandSettings, RowPattern, MIN_WAYPOINT_DISTANCE,
    SMALL_BLOCK_TRACK_COUNT_LIMIT, WAYPOINT_DISTANCE,
};
pub use waypoint::{HeadlandEdge, HeadlandId, Intersection, RidgeMarker, Waypoint};

pub use fieldcourse_core::{Aabb, Error, Point, Polygon, Result};
