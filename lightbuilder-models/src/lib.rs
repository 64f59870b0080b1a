//! Common structs and algorithms used by the light builder's tracer.
//!
//! Nothing in here knows about scenes, tiles or threads - it's just rays,
//! boxes, triangles and the bits of math shared by all of the integrators.

#![allow(clippy::len_without_is_empty)]
#![allow(clippy::manual_range_contains)]

mod bounding_box;
mod fresnel;
mod noise;
mod ray;
mod triangle;
mod utils;

pub use self::bounding_box::*;
pub use self::fresnel::*;
pub use self::noise::*;
pub use self::ray::*;
pub use self::triangle::*;
pub use self::utils::*;

/// Smallest value treated as non-zero by the tracer's guards.
pub const TRACER_EPSILON: f32 = 0.000001;
