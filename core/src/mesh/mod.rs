//! CPU-side mesh types and generators.
//!
//! - [`PrimitiveTopology`] and [`IndexFormat`] - How indices are read
//! - [`MeshArrays`] - Raw attribute arrays handed to geometry construction
//! - [`normals`] - Area-weighted vertex normals for meshes that lack them
//! - [`generators`] - Box, quad and sphere meshes
//!
//! These types are re-exported by `quartz-graphics` for convenience.

mod data;
pub mod generators;
pub mod normals;

pub use data::{IndexFormat, MeshArrays, PrimitiveTopology};
