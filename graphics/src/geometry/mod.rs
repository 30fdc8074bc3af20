//! Geometry records and combined buffer pools.
//!
//! - [`GeometryDescriptor`] - Arrays and flags a record is built from
//! - [`GeometryData`] - Raw or compressed attribute storage
//! - [`GeometryRecord`] - One mesh with its GPU buffers and derived data
//! - [`CombinedBufferPool`] - Shared vertex buffers for records with one layout
//! - [`CombinedBufferRegistry`] - Pools per [`AttributeSignature`]

mod data;
mod descriptor;
mod events;
pub mod pool;
mod record;

pub use data::{AttributeKind, AttributeSignature, GeometryData, NormalData, PositionData, UvData};
pub use descriptor::GeometryDescriptor;
pub use events::{GeometryEvent, GeometryObserverId};
pub use pool::{CombinedBufferPool, CombinedBufferRegistry, PoolConfig, VertexBufs};
pub use record::{GeometryId, GeometryRecord, PickBuffers};
