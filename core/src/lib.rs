//! # Quartz Core
//!
//! GPU-agnostic geometry processing for the Quartz engine.
//!
//! This crate holds everything about a mesh that can be computed without a
//! graphics device:
//!
//! - [`compression`] - 16-bit quantization of positions/UVs and oct-encoding of normals
//! - [`bounds`] - Axis-aligned and oriented bounding boxes
//! - [`edges`] - Ghost-edge (wireframe) index derivation
//! - [`pick`] - Color-coded picking geometry
//! - [`kdtree`] - Triangle KD-tree for CPU-side spatial queries
//! - [`mesh`] - Primitive topology, index formats, raw mesh arrays and generators
//!
//! GPU buffers built from these live in `quartz-graphics`.

pub mod bounds;
pub mod compression;
pub mod edges;
pub mod kdtree;
pub mod math;
pub mod mesh;
pub mod pick;
pub mod profiling;
pub mod scratch;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the core library version.
pub fn init() {
    log::info!("Quartz Core v{} initialized", VERSION);
}
