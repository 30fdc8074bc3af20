//! Dummy GPU backend for testing and development.
//!
//! Buffers are plain byte vectors. Writes and reads behave like a real GPU
//! buffer would, so geometry uploads can be verified without hardware.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::GraphicsError;
use crate::types::BufferDescriptor;

use super::{GpuBackend, GpuBuffer};

/// Dummy GPU backend.
#[derive(Debug, Default)]
pub struct DummyBackend;

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, GraphicsError> {
        log::trace!(
            "DummyBackend: creating buffer {:?} (size: {})",
            descriptor.label,
            descriptor.size
        );
        let size = usize::try_from(descriptor.size).map_err(|_| {
            GraphicsError::InvalidParameter(format!(
                "buffer size {} does not fit in memory",
                descriptor.size
            ))
        })?;
        Ok(GpuBuffer::Dummy(Arc::new(Mutex::new(vec![0; size]))))
    }

    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]) {
        #[allow(irrefutable_let_patterns)]
        if let GpuBuffer::Dummy(bytes) = buffer {
            let mut bytes = bytes.lock();
            let start = (offset as usize).min(bytes.len());
            let end = (start + data.len()).min(bytes.len());
            bytes[start..end].copy_from_slice(&data[..end - start]);
        }
    }

    fn read_buffer(&self, buffer: &GpuBuffer, offset: u64, size: u64) -> Vec<u8> {
        #[allow(irrefutable_let_patterns)]
        if let GpuBuffer::Dummy(bytes) = buffer {
            let bytes = bytes.lock();
            let start = (offset as usize).min(bytes.len());
            let end = (start + size as usize).min(bytes.len());
            bytes[start..end].to_vec()
        } else {
            vec![0u8; size as usize]
        }
    }
}
