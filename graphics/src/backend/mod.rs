//! GPU backend abstraction layer.
//!
//! Geometry code only needs buffers: create them, write ranges into them and
//! read them back. Each backend implements [`GpuBackend`] for exactly that.
//!
//! # Available Backends
//!
//! - `dummy` (default): CPU-side byte storage, used by tests and headless tools
//! - `wgpu-backend`: Cross-platform backend using wgpu

#[cfg(feature = "wgpu-backend")]
pub mod wgpu_backend;

pub mod dummy;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::GraphicsError;
use crate::types::BufferDescriptor;

/// Which backend a [`GraphicsInstance`](crate::GraphicsInstance) should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendType {
    /// Pick the best available backend, falling back to the dummy backend.
    #[default]
    Auto,
    /// CPU-side dummy backend.
    Dummy,
    /// wgpu backend (requires the `wgpu-backend` feature).
    Wgpu,
}

/// Handle to a GPU buffer resource.
#[derive(Clone)]
pub enum GpuBuffer {
    /// Dummy backend storage.
    Dummy(Arc<Mutex<Vec<u8>>>),
    /// wgpu backend buffer
    #[cfg(feature = "wgpu-backend")]
    Wgpu(Arc<wgpu::Buffer>),
}

impl std::fmt::Debug for GpuBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dummy(bytes) => f
                .debug_struct("GpuBuffer::Dummy")
                .field("len", &bytes.lock().len())
                .finish(),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(buffer) => f.debug_tuple("GpuBuffer::Wgpu").field(buffer).finish(),
        }
    }
}

/// GPU backend trait for abstracting different GPU APIs.
pub trait GpuBackend: Send + Sync + 'static {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Create a buffer resource.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, GraphicsError>;

    /// Write data to a buffer at a byte offset.
    ///
    /// The caller has already checked that the range fits the buffer.
    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]);

    /// Read data from a buffer.
    ///
    /// This is a blocking operation that waits for the GPU to finish.
    fn read_buffer(&self, buffer: &GpuBuffer, offset: u64, size: u64) -> Vec<u8>;
}

/// Create the backend requested by `backend_type`.
///
/// # Errors
///
/// Returns an error if an explicitly requested backend is not compiled in or
/// fails to initialize. [`BackendType::Auto`] never fails.
pub fn create_backend(backend_type: BackendType) -> Result<Arc<dyn GpuBackend>, GraphicsError> {
    match backend_type {
        BackendType::Dummy => Ok(Arc::new(dummy::DummyBackend::new())),
        BackendType::Wgpu => create_wgpu_backend(),
        BackendType::Auto => {
            #[cfg(feature = "wgpu-backend")]
            {
                match wgpu_backend::WgpuBackend::new() {
                    Ok(backend) => {
                        log::info!("Using wgpu backend");
                        return Ok(Arc::new(backend));
                    }
                    Err(e) => {
                        log::warn!("Failed to create wgpu backend: {}", e);
                    }
                }
            }

            log::info!("Using dummy backend");
            Ok(Arc::new(dummy::DummyBackend::new()))
        }
    }
}

#[cfg(feature = "wgpu-backend")]
fn create_wgpu_backend() -> Result<Arc<dyn GpuBackend>, GraphicsError> {
    Ok(Arc::new(wgpu_backend::WgpuBackend::new()?))
}

#[cfg(not(feature = "wgpu-backend"))]
fn create_wgpu_backend() -> Result<Arc<dyn GpuBackend>, GraphicsError> {
    Err(GraphicsError::FeatureNotSupported(
        "wgpu backend not compiled in (enable the `wgpu-backend` feature)".to_string(),
    ))
}

/// Check if a real GPU backend is available.
pub fn has_gpu_backend() -> bool {
    cfg!(feature = "wgpu-backend")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dummy_backend_explicit() {
        let backend = create_backend(BackendType::Dummy).unwrap();
        assert_eq!(backend.name(), "Dummy Backend");
    }

    #[cfg(not(feature = "wgpu-backend"))]
    #[test]
    fn test_wgpu_unavailable_without_feature() {
        assert!(matches!(
            create_backend(BackendType::Wgpu),
            Err(GraphicsError::FeatureNotSupported(_))
        ));
        assert!(!has_gpu_backend());
    }
}
