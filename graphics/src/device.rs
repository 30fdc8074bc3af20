//! Graphics device.
//!
//! The [`GraphicsDevice`] is the main interface for creating GPU resources.
//! It is created by [`GraphicsInstance::create_device`].
//!
//! The device also owns the notion of a rendering context. A context can be
//! lost (all GPU resources become invalid) and later restored; observers
//! registered with [`GraphicsDevice::observe_context`] are told about both,
//! and geometry uses the restore notification to rebuild its buffers.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use quartz_core::mesh::IndexFormat;

use crate::error::GraphicsError;
use crate::instance::GraphicsInstance;
use crate::resources::Buffer;
use crate::types::{BufferDescriptor, BufferUsage};

/// Capabilities of a graphics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceCapabilities {
    /// Maximum buffer size.
    pub max_buffer_size: u64,
    /// Whether 32-bit index buffers are supported.
    pub wide_indices: bool,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            max_buffer_size: 1 << 30, // 1 GB
            wide_indices: true,
        }
    }
}

impl DeviceCapabilities {
    /// Capabilities of a device limited to 16-bit indices.
    pub fn without_wide_indices() -> Self {
        Self {
            wide_indices: false,
            ..Self::default()
        }
    }

    /// Widest index format the device can draw with.
    pub fn widest_index_format(&self) -> IndexFormat {
        if self.wide_indices {
            IndexFormat::Uint32
        } else {
            IndexFormat::Uint16
        }
    }

    /// Narrowest supported format able to hold `max_index`, if any.
    pub fn index_format_for(&self, max_index: u32) -> Option<IndexFormat> {
        let format = IndexFormat::for_max_index(max_index);
        (format != IndexFormat::Uint32 || self.wide_indices).then_some(format)
    }
}

/// Rendering context state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextEvent {
    /// Every GPU resource of the device became invalid.
    Lost,
    /// The context is usable again; resources must be recreated.
    Restored,
}

/// Handle returned by [`GraphicsDevice::observe_context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextObserverId(u64);

type ContextObserver = Arc<dyn Fn(ContextEvent) + Send + Sync>;

/// A graphics device for creating GPU resources.
///
/// # Thread Safety
///
/// `GraphicsDevice` is `Send + Sync` and can be safely shared across threads.
/// All resource creation methods use interior mutability where needed.
///
/// # Example
///
/// ```ignore
/// let instance = GraphicsInstance::new()?;
/// let device = instance.create_device()?;
///
/// let buffer = device.create_buffer_with_data(
///     BufferUsage::GEOMETRY_VERTEX,
///     Some("positions"),
///     bytemuck::cast_slice(&positions),
/// )?;
/// ```
pub struct GraphicsDevice {
    instance: Arc<GraphicsInstance>,
    self_ref: Weak<GraphicsDevice>,
    name: String,
    capabilities: DeviceCapabilities,
    // Track allocated resources (weak references for cleanup/debugging)
    buffers: RwLock<Vec<Weak<Buffer>>>,
    context_generation: AtomicU64,
    context_lost: AtomicBool,
    next_observer_id: AtomicU64,
    observers: RwLock<Vec<(ContextObserverId, ContextObserver)>>,
}

impl GraphicsDevice {
    /// Create a new graphics device (called by GraphicsInstance).
    pub(crate) fn new(
        instance: Arc<GraphicsInstance>,
        name: String,
        capabilities: DeviceCapabilities,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            instance,
            self_ref: self_ref.clone(),
            name,
            capabilities,
            buffers: RwLock::new(Vec::new()),
            context_generation: AtomicU64::new(0),
            context_lost: AtomicBool::new(false),
            next_observer_id: AtomicU64::new(0),
            observers: RwLock::new(Vec::new()),
        })
    }

    /// Get the parent instance.
    pub fn instance(&self) -> &Arc<GraphicsInstance> {
        &self.instance
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the device capabilities.
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Create a GPU buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the context is lost, the buffer size is zero or
    /// exceeds device limits, or allocation fails.
    pub fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<Arc<Buffer>, GraphicsError> {
        if self.is_context_lost() {
            return Err(GraphicsError::ContextLost);
        }

        if descriptor.size > self.capabilities.max_buffer_size {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer size {} exceeds maximum {}",
                descriptor.size, self.capabilities.max_buffer_size
            )));
        }

        if descriptor.size == 0 {
            return Err(GraphicsError::InvalidParameter(
                "buffer size cannot be zero".to_string(),
            ));
        }

        let gpu = self.instance.backend().create_buffer(descriptor)?;
        let buffer = Arc::new(Buffer::new(
            self.self_ref.clone(),
            descriptor.clone(),
            gpu,
            self.context_generation(),
        ));

        // Track it
        if let Ok(mut buffers) = self.buffers.write() {
            buffers.push(Arc::downgrade(&buffer));
        }

        log::trace!(
            "GraphicsDevice: created buffer {:?}, size={}",
            descriptor.label,
            descriptor.size
        );

        Ok(buffer)
    }

    /// Create a buffer sized to `data` and upload it.
    ///
    /// # Errors
    ///
    /// Same conditions as [`create_buffer`](Self::create_buffer).
    pub fn create_buffer_with_data(
        &self,
        usage: BufferUsage,
        label: Option<&str>,
        data: &[u8],
    ) -> Result<Arc<Buffer>, GraphicsError> {
        let mut descriptor = BufferDescriptor::new(data.len() as u64, usage);
        descriptor.label = label.map(str::to_owned);

        let buffer = self.create_buffer(&descriptor)?;
        self.instance
            .backend()
            .write_buffer(buffer.gpu_handle(), 0, data);
        Ok(buffer)
    }

    /// Write `data` into `buffer` at a byte offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the context is lost or the range does not fit the buffer.
    pub fn write_buffer(&self, buffer: &Buffer, offset: u64, data: &[u8]) -> Result<(), GraphicsError> {
        if self.is_context_lost() {
            return Err(GraphicsError::ContextLost);
        }
        let end = offset.checked_add(data.len() as u64);
        if end.is_none_or(|end| end > buffer.size()) {
            return Err(GraphicsError::InvalidParameter(format!(
                "write of {} bytes at offset {offset} overflows buffer of {} bytes",
                data.len(),
                buffer.size()
            )));
        }

        self.instance
            .backend()
            .write_buffer(buffer.gpu_handle(), offset, data);
        Ok(())
    }

    /// Read `size` bytes of `buffer` starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the context is lost or the range does not fit the buffer.
    pub fn read_buffer(&self, buffer: &Buffer, offset: u64, size: u64) -> Result<Vec<u8>, GraphicsError> {
        if self.is_context_lost() {
            return Err(GraphicsError::ContextLost);
        }
        if offset.checked_add(size).is_none_or(|end| end > buffer.size()) {
            return Err(GraphicsError::InvalidParameter(format!(
                "read of {size} bytes at offset {offset} overflows buffer of {} bytes",
                buffer.size()
            )));
        }

        Ok(self
            .instance
            .backend()
            .read_buffer(buffer.gpu_handle(), offset, size))
    }

    /// Get the number of live buffers created by this device.
    pub fn buffer_count(&self) -> usize {
        self.buffers
            .read()
            .map(|b| b.iter().filter(|w| w.strong_count() > 0).count())
            .unwrap_or(0)
    }

    /// Total size in bytes of all live buffers.
    pub fn buffer_memory(&self) -> u64 {
        self.buffers
            .read()
            .map(|b| b.iter().filter_map(Weak::upgrade).map(|b| b.size()).sum())
            .unwrap_or(0)
    }

    /// Clean up dead weak references to released resources.
    pub fn cleanup_dead_resources(&self) {
        if let Ok(mut buffers) = self.buffers.write() {
            buffers.retain(|w| w.strong_count() > 0);
        }
    }

    /// Generation counter of the current context, bumped by every restore.
    pub fn context_generation(&self) -> u64 {
        self.context_generation.load(Ordering::Acquire)
    }

    /// Whether the context is currently lost.
    pub fn is_context_lost(&self) -> bool {
        self.context_lost.load(Ordering::Acquire)
    }

    /// Register an observer for context loss and restore.
    pub fn observe_context(
        &self,
        observer: impl Fn(ContextEvent) + Send + Sync + 'static,
    ) -> ContextObserverId {
        let id = ContextObserverId(self.next_observer_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut observers) = self.observers.write() {
            observers.push((id, Arc::new(observer)));
        }
        id
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unobserve_context(&self, id: ContextObserverId) -> bool {
        self.observers
            .write()
            .map(|mut observers| {
                let before = observers.len();
                observers.retain(|(oid, _)| *oid != id);
                observers.len() != before
            })
            .unwrap_or(false)
    }

    /// Mark the context as lost and notify observers.
    ///
    /// Called by the embedding layer when the platform reports a loss.
    pub fn lose_context(&self) {
        if self.context_lost.swap(true, Ordering::AcqRel) {
            return;
        }
        log::warn!("GraphicsDevice '{}': rendering context lost", self.name);
        self.notify(ContextEvent::Lost);
    }

    /// Start a new context generation and notify observers.
    ///
    /// Buffers from earlier generations are stale afterwards.
    pub fn restore_context(&self) {
        self.context_generation.fetch_add(1, Ordering::AcqRel);
        self.context_lost.store(false, Ordering::Release);
        log::info!(
            "GraphicsDevice '{}': rendering context restored (generation {})",
            self.name,
            self.context_generation()
        );
        self.notify(ContextEvent::Restored);
    }

    fn notify(&self, event: ContextEvent) {
        // Observers may call back into the device; do not hold the lock
        let observers: Vec<ContextObserver> = self
            .observers
            .read()
            .map(|o| o.iter().map(|(_, f)| Arc::clone(f)).collect())
            .unwrap_or_default();
        for observer in observers {
            observer(event);
        }
    }
}

impl std::fmt::Debug for GraphicsDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .field("context_generation", &self.context_generation())
            .finish()
    }
}

// Ensure GraphicsDevice is Send + Sync
static_assertions::assert_impl_all!(GraphicsDevice: Send, Sync);
