//! Offline light builder: bakes lighting of a static scene into an image,
//! either as seen through a camera or unwrapped into the scene's lightmap.
//!
//! The pipeline goes:
//!
//! - [`GeometryCollector`] flattens a [`Scene`] into world-space triangles,
//! - [`BvhBuilder`] compiles them into a roped [`Bvh`],
//! - [`Scheduler`] splits the image into tiles and keeps a pool of workers
//!   busy with them, each worker running an [`Integrator`].
//!
//! [`BakeSession`] glues all of that together for the common case.

#![allow(clippy::len_without_is_empty)]
#![allow(clippy::too_many_arguments)]

mod bvh;
mod camera;
mod error;
mod framebuffer;
mod geometry;
mod geometry_collector;
mod integrator;
mod light;
mod material;
mod mesh;
mod photons;
mod scene;
mod scheduler;
mod session;
mod settings;
mod task;
mod utils;
mod worker;

pub use lightbuilder_models::*;

pub use self::bvh::*;
pub use self::camera::*;
pub use self::error::*;
pub use self::framebuffer::*;
pub use self::geometry::*;
pub use self::geometry_collector::*;
pub use self::integrator::*;
pub use self::light::*;
pub use self::material::*;
pub use self::mesh::*;
pub use self::photons::*;
pub use self::scene::*;
pub use self::scheduler::*;
pub use self::session::*;
pub use self::settings::*;
pub use self::task::*;
