//! CPU-side mesh data structures.
//!
//! This module provides:
//! - [`PrimitiveTopology`] - How vertices are assembled into primitives
//! - [`IndexFormat`] - Index data format (u16 or u32)
//! - [`MeshArrays`] - Raw, uncompressed attribute arrays supplied by callers

/// Primitive topology describing how vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Each vertex is a separate point.
    PointList,
    /// Every two vertices form a line.
    LineList,
    /// Vertices form a closed loop of lines.
    LineLoop,
    /// Vertices form a connected strip of lines.
    LineStrip,
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Vertices form a connected strip of triangles.
    TriangleStrip,
    /// Vertices form a fan of triangles around the first vertex.
    TriangleFan,
}

impl PrimitiveTopology {
    /// Parse an engine primitive name such as `"triangles"` or `"line-strip"`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "points" => Some(Self::PointList),
            "lines" => Some(Self::LineList),
            "line-loop" => Some(Self::LineLoop),
            "line-strip" => Some(Self::LineStrip),
            "triangles" => Some(Self::TriangleList),
            "triangle-strip" => Some(Self::TriangleStrip),
            "triangle-fan" => Some(Self::TriangleFan),
            _ => None,
        }
    }

    /// The engine name of this primitive, the inverse of [`from_name`](Self::from_name).
    pub fn name(&self) -> &'static str {
        match self {
            Self::PointList => "points",
            Self::LineList => "lines",
            Self::LineLoop => "line-loop",
            Self::LineStrip => "line-strip",
            Self::TriangleList => "triangles",
            Self::TriangleStrip => "triangle-strip",
            Self::TriangleFan => "triangle-fan",
        }
    }

    /// Get the number of vertices per primitive (for non-strip topologies).
    pub fn vertices_per_primitive(&self) -> Option<u32> {
        match self {
            Self::PointList => Some(1),
            Self::LineList => Some(2),
            Self::TriangleList => Some(3),
            Self::LineLoop | Self::LineStrip | Self::TriangleStrip | Self::TriangleFan => None,
        }
    }

    /// Whether this topology assembles triangles.
    pub fn is_triangles(&self) -> bool {
        matches!(
            self,
            Self::TriangleList | Self::TriangleStrip | Self::TriangleFan
        )
    }

    /// Number of primitives produced by `count` indices.
    pub fn primitive_count(&self, count: u32) -> u32 {
        match self {
            Self::PointList => count,
            Self::LineList => count / 2,
            Self::LineLoop => {
                if count < 2 {
                    0
                } else {
                    count
                }
            }
            Self::LineStrip => count.saturating_sub(1),
            Self::TriangleList => count / 3,
            Self::TriangleStrip | Self::TriangleFan => count.saturating_sub(2),
        }
    }

    /// Expand triangle strips and fans into a plain triangle list.
    ///
    /// Strip winding alternates so every emitted triangle keeps the
    /// orientation of the first. Returns `None` for non-triangle topologies.
    pub fn to_triangle_list(&self, indices: &[u32]) -> Option<Vec<u32>> {
        match self {
            Self::TriangleList => {
                let whole = indices.len() - indices.len() % 3;
                Some(indices[..whole].to_vec())
            }
            Self::TriangleStrip => {
                let mut out = Vec::with_capacity(indices.len().saturating_sub(2) * 3);
                for i in 0..indices.len().saturating_sub(2) {
                    if i % 2 == 0 {
                        out.extend_from_slice(&[indices[i], indices[i + 1], indices[i + 2]]);
                    } else {
                        out.extend_from_slice(&[indices[i + 1], indices[i], indices[i + 2]]);
                    }
                }
                Some(out)
            }
            Self::TriangleFan => {
                let mut out = Vec::with_capacity(indices.len().saturating_sub(2) * 3);
                for i in 1..indices.len().saturating_sub(1) {
                    out.extend_from_slice(&[indices[0], indices[i], indices[i + 1]]);
                }
                Some(out)
            }
            _ => None,
        }
    }
}

/// Index format for indexed drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    /// 16-bit unsigned integers (max 65535 vertices).
    #[default]
    Uint16,
    /// 32-bit unsigned integers (max ~4 billion vertices).
    Uint32,
}

impl IndexFormat {
    /// Get the size in bytes of each index.
    pub fn size(&self) -> usize {
        match self {
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }

    /// Largest index value this format can represent.
    pub fn max_index(&self) -> u32 {
        match self {
            Self::Uint16 => u16::MAX as u32,
            Self::Uint32 => u32::MAX,
        }
    }

    /// The narrowest format able to hold `max_index`.
    pub fn for_max_index(max_index: u32) -> Self {
        if max_index > u16::MAX as u32 {
            Self::Uint32
        } else {
            Self::Uint16
        }
    }

    /// Encode indices as little-endian bytes in this format.
    ///
    /// Values that do not fit are a caller bug; they are clamped, never wrapped.
    pub fn encode(&self, indices: &[u32]) -> Vec<u8> {
        match self {
            Self::Uint16 => {
                let narrow: Vec<u16> = indices
                    .iter()
                    .map(|&i| i.min(u16::MAX as u32) as u16)
                    .collect();
                bytemuck::cast_slice(&narrow).to_vec()
            }
            Self::Uint32 => bytemuck::cast_slice(indices).to_vec(),
        }
    }
}

/// Raw mesh attribute arrays as supplied by a loader or generator.
///
/// All arrays are flat: positions and normals hold `xyz` triples, UVs hold
/// `uv` pairs and colors hold `rgba` quadruples. Nothing is compressed here;
/// compression happens when a geometry record is built from these arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshArrays {
    /// Vertex positions, three floats per vertex.
    pub positions: Option<Vec<f32>>,
    /// Vertex normals, three floats per vertex.
    pub normals: Option<Vec<f32>>,
    /// Texture coordinates, two floats per vertex.
    pub uv: Option<Vec<f32>>,
    /// Vertex colors, four floats per vertex.
    pub colors: Option<Vec<f32>>,
    /// Primitive indices.
    pub indices: Option<Vec<u32>>,
}

impl MeshArrays {
    /// Create empty mesh arrays.
    pub fn new() -> Self {
        Self::default()
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

    /// Number of vertices, derived from the positions array.
    pub fn vertex_count(&self) -> usize {
        self.positions.as_ref().map_or(0, |p| p.len() / 3)
    }

    /// Number of indices.
    pub fn index_count(&self) -> usize {
        self.indices.as_ref().map_or(0, |i| i.len())
    }

    /// Largest index value, if any indices are present.
    pub fn max_index(&self) -> Option<u32> {
        self.indices.as_ref().and_then(|i| i.iter().copied().max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_topology_vertices() {
        assert_eq!(
            PrimitiveTopology::PointList.vertices_per_primitive(),
            Some(1)
        );
        assert_eq!(
            PrimitiveTopology::LineList.vertices_per_primitive(),
            Some(2)
        );
        assert_eq!(
            PrimitiveTopology::TriangleList.vertices_per_primitive(),
            Some(3)
        );
        assert_eq!(
            PrimitiveTopology::TriangleFan.vertices_per_primitive(),
            None
        );
    }

    #[test]
    fn test_primitive_names_roundtrip() {
        for topology in [
            PrimitiveTopology::PointList,
            PrimitiveTopology::LineList,
            PrimitiveTopology::LineLoop,
            PrimitiveTopology::LineStrip,
            PrimitiveTopology::TriangleList,
            PrimitiveTopology::TriangleStrip,
            PrimitiveTopology::TriangleFan,
        ] {
            assert_eq!(PrimitiveTopology::from_name(topology.name()), Some(topology));
        }
        assert_eq!(PrimitiveTopology::from_name("quads"), None);
    }

    #[test]
    fn test_primitive_count() {
        assert_eq!(PrimitiveTopology::TriangleList.primitive_count(9), 3);
        assert_eq!(PrimitiveTopology::TriangleStrip.primitive_count(5), 3);
        assert_eq!(PrimitiveTopology::LineLoop.primitive_count(4), 4);
        assert_eq!(PrimitiveTopology::LineStrip.primitive_count(0), 0);
    }

    #[test]
    fn test_strip_to_triangle_list() {
        let list = PrimitiveTopology::TriangleStrip
            .to_triangle_list(&[0, 1, 2, 3])
            .unwrap();
        assert_eq!(list, vec![0, 1, 2, 2, 1, 3]);
    }

    #[test]
    fn test_fan_to_triangle_list() {
        let list = PrimitiveTopology::TriangleFan
            .to_triangle_list(&[0, 1, 2, 3])
            .unwrap();
        assert_eq!(list, vec![0, 1, 2, 0, 2, 3]);
        assert!(PrimitiveTopology::LineList.to_triangle_list(&[0, 1]).is_none());
    }

    #[test]
    fn test_index_format_size() {
        assert_eq!(IndexFormat::Uint16.size(), 2);
        assert_eq!(IndexFormat::Uint32.size(), 4);
        assert_eq!(IndexFormat::Uint16.max_index(), 65535);
    }

    #[test]
    fn test_index_format_selection() {
        assert_eq!(IndexFormat::for_max_index(65535), IndexFormat::Uint16);
        assert_eq!(IndexFormat::for_max_index(65536), IndexFormat::Uint32);
    }

    #[test]
    fn test_index_encode_widths() {
        assert_eq!(IndexFormat::Uint16.encode(&[1, 2]), vec![1, 0, 2, 0]);
        assert_eq!(IndexFormat::Uint32.encode(&[1]).len(), 4);
    }

    #[test]
    fn test_mesh_arrays_counts() {
        let arrays = MeshArrays::new()
            .with_positions(vec![0.0; 12])
            .with_indices(vec![0, 1, 2, 2, 3, 0]);

        assert_eq!(arrays.vertex_count(), 4);
        assert_eq!(arrays.index_count(), 6);
        assert_eq!(arrays.max_index(), Some(3));
        assert!(arrays.normals.is_none());
    }
}
