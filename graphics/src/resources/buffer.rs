//! GPU buffer resource.

use std::sync::{Arc, Weak};

use crate::backend::GpuBuffer;
use crate::device::GraphicsDevice;
use crate::types::BufferDescriptor;

/// A GPU buffer resource.
///
/// Buffers are created by [`GraphicsDevice::create_buffer`] and are reference-counted.
/// They hold a weak reference back to their parent device and remember the
/// context generation they were created in; after a context loss and
/// restore, older buffers are stale and must be rebuilt.
///
/// # Example
///
/// ```ignore
/// let buffer = device.create_buffer(&BufferDescriptor::new(1024, BufferUsage::VERTEX))?;
/// println!("Buffer size: {}", buffer.size());
/// ```
pub struct Buffer {
    device: Weak<GraphicsDevice>,
    descriptor: BufferDescriptor,
    gpu: GpuBuffer,
    generation: u64,
}

impl Buffer {
    /// Create a new buffer (called by GraphicsDevice).
    pub(crate) fn new(
        device: Weak<GraphicsDevice>,
        descriptor: BufferDescriptor,
        gpu: GpuBuffer,
        generation: u64,
    ) -> Self {
        Self {
            device,
            descriptor,
            gpu,
            generation,
        }
    }

    /// Get the parent device, if it still exists.
    pub fn device(&self) -> Option<Arc<GraphicsDevice>> {
        self.device.upgrade()
    }

    /// Get the buffer descriptor.
    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.descriptor
    }

    /// Get the buffer size in bytes.
    pub fn size(&self) -> u64 {
        self.descriptor.size
    }

    /// Get the buffer label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }

    /// Backend handle.
    pub fn gpu_handle(&self) -> &GpuBuffer {
        &self.gpu
    }

    /// Context generation this buffer was created in.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the buffer belongs to the device's current, live context.
    pub fn is_current(&self) -> bool {
        self.device().is_some_and(|device| {
            !device.is_context_lost() && device.context_generation() == self.generation
        })
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("size", &self.descriptor.size)
            .field("usage", &self.descriptor.usage)
            .field("label", &self.descriptor.label)
            .field("generation", &self.generation)
            .finish()
    }
}

// Ensure Buffer is Send + Sync
static_assertions::assert_impl_all!(Buffer: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BufferUsage;

    fn detached(desc: BufferDescriptor) -> Buffer {
        Buffer::new(Weak::new(), desc, GpuBuffer::Dummy(Default::default()), 0)
    }

    #[test]
    fn test_buffer_debug() {
        let buffer = detached(BufferDescriptor::new(1024, BufferUsage::VERTEX));
        let debug = format!("{:?}", buffer);
        assert!(debug.contains("Buffer"));
        assert!(debug.contains("1024"));
    }

    #[test]
    fn test_buffer_size() {
        let buffer = detached(BufferDescriptor::new(2048, BufferUsage::INDEX).with_label("ib"));
        assert_eq!(buffer.size(), 2048);
        assert_eq!(buffer.label(), Some("ib"));
    }

    #[test]
    fn test_detached_buffer_is_not_current() {
        let buffer = detached(BufferDescriptor::new(16, BufferUsage::VERTEX));
        assert!(buffer.device().is_none());
        assert!(!buffer.is_current());
    }
}
