//! # Fieldcourse Core
//!
//! Shared primitives for the fieldcourse course planner.
//!
//! This crate provides the foundational pieces used by the planner crate:
//!
//! - **Geometry**: [`Point`], [`Polygon`] with cyclic indexing and eagerly
//!   computed edge data, [`Aabb`], segment intersection
//! - **GA framework**: [`GaRunner`], [`GaProblem`], [`Individual`] — a
//!   generational loop with tournament selection, elitism and a
//!   caller-supplied RNG
//! - **Errors**: [`Error`] and the crate-wide [`Result`] alias
//!
//! ## Feature Flags
//!
//! - `serde`: enable serialization/deserialization support

pub mod error;
pub mod ga;
pub mod polygon;
pub mod transform;

// Re-exports
pub use error::{Error, Result};
pub use ga::{GaConfig, GaProblem, GaResult, GaRunner, Individual};
pub use polygon::{segment_intersection, CyclicIter, Point, Polygon};
pub use transform::{rotate, Aabb};
