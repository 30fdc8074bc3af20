//! Common utilities for geometry integration tests.
//!
//! This module provides shared test infrastructure that can be reused
//! across different backend implementations.

#![allow(dead_code)]

use std::sync::Arc;

use quartz_graphics::{
    BackendType, Buffer, CombinedBufferRegistry, DeviceCapabilities, GeometryDescriptor,
    GeometryRecord, GraphicsDevice, GraphicsInstance, InstanceParameters, PoolConfig,
};

// ============================================================================
// Backend Enumeration
// ============================================================================

/// Available GPU backends for testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Dummy backend (CPU-side byte storage).
    Dummy,
    /// WebGPU backend (via wgpu).
    WebGpu,
}

impl Backend {
    /// Check if this backend is currently available.
    pub fn is_available(&self) -> bool {
        match self {
            // Dummy backend is always available
            Backend::Dummy => true,
            // WebGpu backend (wgpu) is available when the feature is enabled
            #[cfg(feature = "wgpu-backend")]
            Backend::WebGpu => true,
            #[cfg(not(feature = "wgpu-backend"))]
            Backend::WebGpu => false,
        }
    }

    /// Get the backend name for display.
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Dummy => "dummy",
            Backend::WebGpu => "webgpu",
        }
    }

    /// Convert to InstanceParameters for creating a GraphicsInstance.
    pub fn to_instance_parameters(self) -> InstanceParameters {
        match self {
            Backend::Dummy => InstanceParameters::new().with_backend(BackendType::Dummy),
            Backend::WebGpu => InstanceParameters::new().with_backend(BackendType::Wgpu),
        }
    }
}

// ============================================================================
// Test Context
// ============================================================================

/// Test context providing a device and a combined buffer registry.
pub struct TestContext {
    /// The backend being tested.
    pub backend: Backend,
    /// Graphics instance (Arc-wrapped).
    instance: Arc<GraphicsInstance>,
    /// Graphics device for creating resources.
    pub device: Arc<GraphicsDevice>,
    /// Registry for combined geometries.
    pub registry: CombinedBufferRegistry,
}

impl TestContext {
    /// Create a new test context for the given backend.
    ///
    /// Returns `None` if the backend is not available.
    pub fn new(backend: Backend) -> Option<Self> {
        Self::with_settings(backend, DeviceCapabilities::default(), PoolConfig::default())
    }

    /// Create a test context with a custom pool configuration.
    pub fn with_pool_config(backend: Backend, config: PoolConfig) -> Option<Self> {
        Self::with_settings(backend, DeviceCapabilities::default(), config)
    }

    /// Create a test context with explicit device capabilities and pool configuration.
    pub fn with_settings(
        backend: Backend,
        capabilities: DeviceCapabilities,
        config: PoolConfig,
    ) -> Option<Self> {
        init_logging();
        if !backend.is_available() {
            return None;
        }

        let params = backend.to_instance_parameters();
        let instance = GraphicsInstance::with_parameters(params).ok()?;
        let device = instance.create_device_with_capabilities(capabilities).ok()?;
        let registry = CombinedBufferRegistry::with_config(Arc::clone(&device), config);

        Some(Self {
            backend,
            instance,
            device,
            registry,
        })
    }

    /// Build a geometry record, panicking on failure.
    pub fn geometry(&self, descriptor: GeometryDescriptor) -> GeometryRecord {
        GeometryRecord::new(&self.device, &self.registry, descriptor)
            .expect("geometry creation failed")
    }

    /// Read a whole buffer back.
    pub fn read_bytes(&self, buffer: &Buffer) -> Vec<u8> {
        self.device
            .read_buffer(buffer, 0, buffer.size())
            .expect("buffer readback failed")
    }

    /// Read a float range back.
    pub fn read_floats(&self, buffer: &Buffer, offset: u64, count: usize) -> Vec<f32> {
        let bytes = self
            .device
            .read_buffer(buffer, offset, count as u64 * 4)
            .expect("buffer readback failed");
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }
}

/// Route `log` output to the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Geometry Helpers
// ============================================================================

/// Positions of a single triangle in the XY plane.
pub const TRIANGLE_POSITIONS: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];

/// A single triangle.
pub fn triangle() -> GeometryDescriptor {
    GeometryDescriptor::new()
        .with_positions(TRIANGLE_POSITIONS.to_vec())
        .with_indices(vec![0, 1, 2])
}

/// Two triangles sharing the edge 0-1, the second folded out of the XY
/// plane by `fold_degrees`.
///
/// At zero fold both triangles are coplanar with the same orientation.
pub fn folded_pair(fold_degrees: f32) -> GeometryDescriptor {
    let (sin, cos) = fold_degrees.to_radians().sin_cos();
    let positions = vec![
        0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, //
        0.5, -cos, sin,
    ];
    GeometryDescriptor::new()
        .with_positions(positions)
        .with_indices(vec![0, 1, 2, 1, 0, 3])
}

/// Unordered edge set of a line-list index array.
pub fn edge_set(indices: &[u32]) -> std::collections::HashSet<(u32, u32)> {
    indices
        .chunks_exact(2)
        .map(|e| (e[0].min(e[1]), e[0].max(e[1])))
        .collect()
}
