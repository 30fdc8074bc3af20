//! Geometry construction parameters.

use quartz_core::edges::DEFAULT_GHOST_EDGE_THRESHOLD;
use quartz_core::mesh::{MeshArrays, PrimitiveTopology};

use crate::error::GeometryError;

/// Descriptor for creating a [`GeometryRecord`](super::GeometryRecord).
///
/// Attribute arrays are flat: positions and normals hold `xyz` triples, UVs
/// `uv` pairs and colors `rgba` quadruples.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryDescriptor {
    /// How vertices are assembled into primitives.
    pub primitive: PrimitiveTopology,
    /// Vertex positions. Required.
    pub positions: Option<Vec<f32>>,
    /// Vertex normals.
    pub normals: Option<Vec<f32>>,
    /// Texture coordinates.
    pub uv: Option<Vec<f32>>,
    /// Vertex colors. Never quantized.
    pub colors: Option<Vec<f32>>,
    /// Primitive indices. Required.
    pub indices: Option<Vec<u32>>,
    /// Build area-weighted vertex normals when `normals` is absent.
    pub auto_vertex_normals: bool,
    /// Quantize positions/UVs and oct-encode normals.
    pub quantized: bool,
    /// Share GPU buffers with similar geometries through a combined pool.
    pub combined: bool,
    /// Dihedral angle in degrees above which an edge is drawn as a ghost edge.
    pub ghost_edge_threshold: f32,
    /// Debug label, propagated to GPU buffer labels.
    pub label: Option<String>,
}

impl Default for GeometryDescriptor {
    fn default() -> Self {
        Self {
            primitive: PrimitiveTopology::TriangleList,
            positions: None,
            normals: None,
            uv: None,
            colors: None,
            indices: None,
            auto_vertex_normals: false,
            quantized: true,
            combined: false,
            ghost_edge_threshold: DEFAULT_GHOST_EDGE_THRESHOLD,
            label: None,
        }
    }
}

impl GeometryDescriptor {
    /// Create a descriptor with default settings and no data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every array from raw mesh data.
    pub fn from_mesh(mesh: MeshArrays) -> Self {
        Self {
            positions: mesh.positions,
            normals: mesh.normals,
            uv: mesh.uv,
            colors: mesh.colors,
            indices: mesh.indices,
            ..Self::default()
        }
    }

    /// Set the primitive topology.
    pub fn with_primitive(mut self, primitive: PrimitiveTopology) -> Self {
        self.primitive = primitive;
        self
    }

    /// Set the primitive from an engine name such as `"triangle-strip"`.
    ///
    /// Unknown names are logged and fall back to triangles.
    pub fn with_primitive_name(mut self, name: &str) -> Self {
        self.primitive = PrimitiveTopology::from_name(name).unwrap_or_else(|| {
            log::warn!(
                "{}, falling back to 'triangles'",
                GeometryError::UnsupportedPrimitive(name.to_string())
            );
            PrimitiveTopology::TriangleList
        });
        self
    }

    /// Set vertex positions.
    pub fn with_positions(mut self, positions: Vec<f32>) -> Self {
        self.positions = Some(positions);
        self
    }

    /// Set vertex normals.
    pub fn with_normals(mut self, normals: Vec<f32>) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Set texture coordinates.
    pub fn with_uv(mut self, uv: Vec<f32>) -> Self {
        self.uv = Some(uv);
        self
    }

    /// Set vertex colors.
    pub fn with_colors(mut self, colors: Vec<f32>) -> Self {
        self.colors = Some(colors);
        self
    }

    /// Set primitive indices.
    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Enable or disable automatic vertex normals.
    pub fn with_auto_vertex_normals(mut self, enabled: bool) -> Self {
        self.auto_vertex_normals = enabled;
        self
    }

    /// Enable or disable attribute compression.
    pub fn with_quantized(mut self, quantized: bool) -> Self {
        self.quantized = quantized;
        self
    }

    /// Enable or disable combined buffer sharing.
    pub fn with_combined(mut self, combined: bool) -> Self {
        self.combined = combined;
        self
    }

    /// Set the ghost edge threshold in degrees.
    pub fn with_ghost_edge_threshold(mut self, degrees: f32) -> Self {
        self.ghost_edge_threshold = degrees;
        self
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl From<MeshArrays> for GeometryDescriptor {
    fn from(mesh: MeshArrays) -> Self {
        Self::from_mesh(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quartz_core::mesh::generators::generate_quad;

    #[test]
    fn test_defaults() {
        let desc = GeometryDescriptor::new();
        assert_eq!(desc.primitive, PrimitiveTopology::TriangleList);
        assert!(desc.quantized);
        assert!(!desc.combined);
        assert_eq!(desc.ghost_edge_threshold, 2.0);
    }

    #[test]
    fn test_primitive_name() {
        let desc = GeometryDescriptor::new().with_primitive_name("line-strip");
        assert_eq!(desc.primitive, PrimitiveTopology::LineStrip);

        let desc = GeometryDescriptor::new()
            .with_primitive(PrimitiveTopology::PointList)
            .with_primitive_name("polygons");
        assert_eq!(desc.primitive, PrimitiveTopology::TriangleList);
    }

    #[test]
    fn test_from_mesh() {
        let desc = GeometryDescriptor::from(generate_quad(1.0, 1.0))
            .with_combined(true)
            .with_label("quad");
        assert_eq!(desc.positions.as_ref().map(Vec::len), Some(12));
        assert_eq!(desc.indices.as_deref(), Some(&[0, 1, 2, 2, 3, 0][..]));
        assert!(desc.combined);
        assert_eq!(desc.label.as_deref(), Some("quad"));
    }
}
