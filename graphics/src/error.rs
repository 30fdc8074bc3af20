//! Graphics and geometry error types.

use thiserror::Error;

use quartz_core::mesh::IndexFormat;

use crate::geometry::AttributeKind;

/// Errors that can occur in the graphics system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// Failed to initialize the graphics system.
    #[error("initialization failed: {0}")]
    InitializationFailed(String),
    /// Failed to create a resource.
    #[error("resource creation failed: {0}")]
    ResourceCreationFailed(String),
    /// A requested feature is not supported.
    #[error("feature not supported: {0}")]
    FeatureNotSupported(String),
    /// Out of GPU memory.
    #[error("out of GPU memory")]
    OutOfMemory,
    /// The rendering context is lost; resources cannot be created until it is restored.
    #[error("rendering context lost")]
    ContextLost,
    /// An invalid parameter was provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Errors reported by geometry records and combined buffer pools.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// A required attribute array was not supplied.
    #[error("geometry is missing its {0} array")]
    MissingAttribute(AttributeKind),
    /// The primitive name is not one of the supported topologies.
    #[error("unsupported primitive '{0}'")]
    UnsupportedPrimitive(String),
    /// Quantized attributes cannot be replaced after construction.
    #[error("cannot update {0} of a quantized geometry")]
    QuantizedAttributeImmutable(AttributeKind),
    /// A replacement array does not match the length of the existing one.
    #[error("{kind} length mismatch: expected {expected} values, got {actual}")]
    LengthMismatch {
        /// Attribute being replaced.
        kind: AttributeKind,
        /// Current number of values.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },
    /// An index points outside the geometry or beyond what its chunk can address.
    #[error("index {index} out of range (limit {limit})")]
    IndexOutOfRange {
        /// Offending (offset-adjusted) index.
        index: u32,
        /// Largest valid value.
        limit: u32,
    },
    /// The geometry alone has more vertices than one chunk can hold.
    #[error("geometry with {vertices} vertices exceeds chunk capacity {capacity}")]
    ChunkCapacityExceeded {
        /// Vertex count of the geometry.
        vertices: u32,
        /// Chunk capacity in vertices.
        capacity: u32,
    },
    /// The indices need a wider format than the device supports.
    #[error("max index {max_index} needs {required:?} indices, which the device does not support")]
    WideIndicesUnsupported {
        /// Largest index in the geometry.
        max_index: u32,
        /// Format that would be needed.
        required: IndexFormat,
    },
    /// The geometry's attribute layout differs from the pool it was added to.
    #[error("geometry layout {found} does not match pool layout {expected}")]
    LayoutMismatch {
        /// Topology hash of the pool.
        expected: String,
        /// Topology hash of the geometry.
        found: String,
    },
    /// A GPU resource operation failed.
    #[error(transparent)]
    Graphics(#[from] GraphicsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphicsError::OutOfMemory;
        assert_eq!(err.to_string(), "out of GPU memory");

        let err = GraphicsError::InitializationFailed("no GPU found".to_string());
        assert_eq!(err.to_string(), "initialization failed: no GPU found");
    }

    #[test]
    fn test_geometry_error_display() {
        let err = GeometryError::LengthMismatch {
            kind: AttributeKind::Positions,
            expected: 9,
            actual: 6,
        };
        assert_eq!(
            err.to_string(),
            "positions length mismatch: expected 9 values, got 6"
        );

        let err = GeometryError::QuantizedAttributeImmutable(AttributeKind::Normals);
        assert_eq!(err.to_string(), "cannot update normals of a quantized geometry");
    }

    #[test]
    fn test_graphics_error_converts() {
        let err: GeometryError = GraphicsError::ContextLost.into();
        assert_eq!(err.to_string(), "rendering context lost");
    }
}
