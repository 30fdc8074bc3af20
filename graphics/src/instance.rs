//! Graphics instance.
//!
//! The [`GraphicsInstance`] is the top-level entry point for the graphics system.
//! It owns the GPU backend and manages one or more [`GraphicsDevice`]s.

use std::sync::{Arc, RwLock, Weak};

use crate::backend::{self, BackendType, GpuBackend};
use crate::device::{DeviceCapabilities, GraphicsDevice};
use crate::error::GraphicsError;

/// Parameters for creating a [`GraphicsInstance`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstanceParameters {
    /// Backend to use.
    pub backend: BackendType,
}

impl InstanceParameters {
    /// Create default parameters (automatic backend selection).
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the backend.
    pub fn with_backend(mut self, backend: BackendType) -> Self {
        self.backend = backend;
        self
    }
}

/// Information about a graphics adapter.
#[derive(Debug, Clone)]
pub struct AdapterInfo {
    /// Adapter name.
    pub name: String,
    /// Backend driving the adapter.
    pub backend: &'static str,
}

/// The graphics instance manages devices and adapters.
///
/// # Thread Safety
///
/// `GraphicsInstance` is `Send + Sync` and can be safely shared across threads.
///
/// # Example
///
/// ```ignore
/// let instance = GraphicsInstance::new()?;
/// let device = instance.create_device()?;
/// ```
pub struct GraphicsInstance {
    /// Weak self-reference for creating devices.
    self_ref: RwLock<Weak<GraphicsInstance>>,
    /// Devices created by this instance.
    devices: RwLock<Vec<Arc<GraphicsDevice>>>,
    /// GPU backend for this instance.
    backend: Arc<dyn GpuBackend>,
}

impl GraphicsInstance {
    /// Create a new graphics instance with automatic backend selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the graphics system cannot be initialized.
    pub fn new() -> Result<Arc<Self>, GraphicsError> {
        Self::with_parameters(InstanceParameters::default())
    }

    /// Create a new graphics instance with explicit parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested backend is unavailable.
    pub fn with_parameters(parameters: InstanceParameters) -> Result<Arc<Self>, GraphicsError> {
        log::info!("Creating GraphicsInstance ({:?})", parameters.backend);

        let backend = backend::create_backend(parameters.backend)?;
        log::info!("Using GPU backend: {}", backend.name());

        let instance = Arc::new(Self {
            self_ref: RwLock::new(Weak::new()),
            devices: RwLock::new(Vec::new()),
            backend,
        });

        // Store self-reference
        if let Ok(mut self_ref) = instance.self_ref.write() {
            *self_ref = Arc::downgrade(&instance);
        }

        Ok(instance)
    }

    /// Get the GPU backend (internal use only).
    pub(crate) fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }

    /// Name of the active backend.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    fn arc_self(&self) -> Option<Arc<GraphicsInstance>> {
        self.self_ref.read().ok().and_then(|r| r.upgrade())
    }

    /// Enumerate available graphics adapters.
    pub fn enumerate_adapters(&self) -> Vec<AdapterInfo> {
        let name = match self.backend.name() {
            "Dummy Backend" => "Dummy Adapter",
            _ => "Default Adapter",
        };
        vec![AdapterInfo {
            name: name.to_string(),
            backend: self.backend.name(),
        }]
    }

    /// Create a graphics device with default capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if device creation fails.
    pub fn create_device(&self) -> Result<Arc<GraphicsDevice>, GraphicsError> {
        self.create_device_with_capabilities(DeviceCapabilities::default())
    }

    /// Create a graphics device with explicit capabilities.
    ///
    /// Useful to emulate devices without 32-bit index support.
    ///
    /// # Errors
    ///
    /// Returns an error if no adapter is available or the instance was dropped.
    pub fn create_device_with_capabilities(
        &self,
        capabilities: DeviceCapabilities,
    ) -> Result<Arc<GraphicsDevice>, GraphicsError> {
        let adapter = self
            .enumerate_adapters()
            .into_iter()
            .next()
            .ok_or_else(|| GraphicsError::InitializationFailed("no adapters".to_string()))?;
        log::info!("Creating device on adapter: {}", adapter.name);

        let instance = self.arc_self().ok_or_else(|| {
            GraphicsError::ResourceCreationFailed("instance has been dropped".to_string())
        })?;
        let device = GraphicsDevice::new(instance, adapter.name, capabilities);

        // Track the device
        if let Ok(mut devices) = self.devices.write() {
            devices.push(device.clone());
        }

        Ok(device)
    }

    /// Get all devices created by this instance.
    pub fn devices(&self) -> Vec<Arc<GraphicsDevice>> {
        self.devices
            .read()
            .map(|d| d.clone())
            .unwrap_or_else(|_| Vec::new())
    }

    /// Get the number of devices created by this instance.
    pub fn device_count(&self) -> usize {
        self.devices.read().map(|d| d.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for GraphicsInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsInstance")
            .field("backend", &self.backend.name())
            .field("device_count", &self.device_count())
            .finish()
    }
}

// Ensure GraphicsInstance is Send + Sync
static_assertions::assert_impl_all!(GraphicsInstance: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_instance() -> Arc<GraphicsInstance> {
        GraphicsInstance::with_parameters(InstanceParameters::new().with_backend(BackendType::Dummy))
            .unwrap()
    }

    #[test]
    fn test_instance_creation() {
        let instance = dummy_instance();
        assert_eq!(instance.device_count(), 0);
        assert_eq!(instance.backend_name(), "Dummy Backend");
    }

    #[test]
    fn test_enumerate_adapters() {
        let instance = dummy_instance();
        let adapters = instance.enumerate_adapters();
        assert_eq!(adapters.len(), 1);
        assert_eq!(adapters[0].name, "Dummy Adapter");
    }

    #[test]
    fn test_create_multiple_devices() {
        let instance = dummy_instance();
        let _device1 = instance.create_device().unwrap();
        let _device2 = instance
            .create_device_with_capabilities(DeviceCapabilities::without_wide_indices())
            .unwrap();
        assert_eq!(instance.device_count(), 2);
        assert!(!instance.devices()[1].capabilities().wide_indices);
    }

    #[test]
    fn test_device_has_instance_reference() {
        let instance = dummy_instance();
        let device = instance.create_device().unwrap();
        // Device holds a strong reference to instance
        assert!(Arc::ptr_eq(device.instance(), &instance));
    }
}
