//! # Quartz Graphics
//!
//! GPU geometry buffers for the Quartz engine.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`GraphicsInstance`] / [`GraphicsDevice`] - Backend selection, buffer
//!   creation and rendering-context loss/restore notification
//! - [`GeometryRecord`] - Compressed mesh storage with lazily derived
//!   bounds, ghost edges, pick buffers and a KD-tree
//! - [`CombinedBufferRegistry`] - Batching of small meshes into shared buffers
//! - Multiple backend support: wgpu and Dummy (for testing)
//!
//! ## Example
//!
//! ```ignore
//! use quartz_graphics::{CombinedBufferRegistry, GeometryDescriptor, GeometryRecord, GraphicsInstance};
//!
//! let instance = GraphicsInstance::new()?;
//! let device = instance.create_device()?;
//! let registry = CombinedBufferRegistry::new(device.clone());
//!
//! let geometry = GeometryRecord::new(
//!     &device,
//!     &registry,
//!     GeometryDescriptor::new()
//!         .with_positions(positions)
//!         .with_indices(indices)
//!         .with_combined(true),
//! )?;
//! ```

pub mod backend;
pub mod device;
pub mod error;
pub mod geometry;
pub mod instance;
pub mod profiling;
pub mod resources;
pub mod types;

// Re-export main types for convenience
pub use backend::{BackendType, GpuBackend};
pub use device::{ContextEvent, ContextObserverId, DeviceCapabilities, GraphicsDevice};
pub use error::{GeometryError, GraphicsError};
pub use geometry::{
    AttributeKind, AttributeSignature, CombinedBufferPool, CombinedBufferRegistry, GeometryData,
    GeometryDescriptor, GeometryEvent, GeometryId, GeometryRecord, PickBuffers, PoolConfig,
    VertexBufs,
};
pub use instance::{AdapterInfo, GraphicsInstance, InstanceParameters};
pub use resources::Buffer;
pub use types::{BufferDescriptor, BufferUsage};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// Logs the library versions; call once at startup.
pub fn init() {
    quartz_core::init();
    log::info!("Quartz Graphics v{} initialized", VERSION);
}
