//! Color-coded picking geometry.
//!
//! Rendering a mesh with a unique flat color per triangle (or per vertex)
//! and reading back the pixel under the cursor identifies what was hit. The
//! triangle variant duplicates vertices so that no two triangles share one
//! and each can carry its own color.

use crate::compression::PositionSource;
use crate::mesh::PrimitiveTopology;

/// Encode a primitive index as an RGBA8 color.
///
/// Red holds the lowest byte and alpha the highest. Pick passes render
/// without blending, so alpha carries data like the other channels.
#[inline]
pub fn encode_pick_color(index: u32) -> [u8; 4] {
    index.to_le_bytes()
}

/// Recover a primitive index from a color read back from a pick target.
#[inline]
pub fn decode_pick_color(color: [u8; 4]) -> u32 {
    u32::from_le_bytes(color)
}

/// Expanded pick vertex positions, in the same representation as the source.
#[derive(Debug, Clone, PartialEq)]
pub enum PickPositions {
    /// Raw floats, three per vertex.
    Float(Vec<f32>),
    /// Quantized values, three per vertex; decode with the geometry's matrix.
    Quantized(Vec<u16>),
}

impl PickPositions {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        match self {
            Self::Float(v) => v.len() / 3,
            Self::Quantized(v) => v.len() / 3,
        }
    }

    /// Raw bytes for upload.
    pub fn to_bytes(&self) -> &[u8] {
        match self {
            Self::Float(v) => bytemuck::cast_slice(v),
            Self::Quantized(v) => bytemuck::cast_slice(v),
        }
    }

    fn empty_like(source: &PositionSource<'_>, capacity: usize) -> Self {
        match source {
            PositionSource::Float(_) => Self::Float(Vec::with_capacity(capacity)),
            PositionSource::Quantized { .. } => Self::Quantized(Vec::with_capacity(capacity)),
        }
    }

    fn push_vertex(&mut self, source: &PositionSource<'_>, i: usize) {
        match (self, source) {
            (Self::Float(out), PositionSource::Float(values)) => {
                out.extend_from_slice(&values[i * 3..i * 3 + 3]);
            }
            (Self::Quantized(out), PositionSource::Quantized { values, .. }) => {
                out.extend_from_slice(&values[i * 3..i * 3 + 3]);
            }
            // Never constructed with mismatched representations
            _ => {}
        }
    }
}

/// Per-triangle pick geometry: three vertices and three colors per triangle.
#[derive(Debug, Clone, PartialEq)]
pub struct PickTriangles {
    /// Expanded positions.
    pub positions: PickPositions,
    /// RGBA8 colors, four bytes per vertex.
    pub colors: Vec<u8>,
}

/// Per-vertex pick geometry: one point per source vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct PickVertices {
    /// Positions copied from the source.
    pub positions: PickPositions,
    /// RGBA8 colors, four bytes per vertex.
    pub colors: Vec<u8>,
}

/// Derives pick geometry from a geometry's positions.
#[derive(Debug, Clone, Copy)]
pub struct PickBufferBuilder<'a> {
    positions: PositionSource<'a>,
}

impl<'a> PickBufferBuilder<'a> {
    /// Create a builder over the given positions.
    pub fn new(positions: PositionSource<'a>) -> Self {
        Self { positions }
    }

    /// Build per-triangle pick geometry.
    ///
    /// Every vertex of triangle `i` gets `encode_pick_color(i)`, with `i`
    /// counted over the triangle list after strip/fan expansion. Triangles
    /// referencing missing vertices are left out but keep their number.
    /// Non-triangle topologies yield empty geometry.
    pub fn build_triangles(&self, topology: PrimitiveTopology, indices: &[u32]) -> PickTriangles {
        crate::profile_function!();

        let triangles = topology.to_triangle_list(indices).unwrap_or_default();
        let vertex_count = self.positions.vertex_count();

        let mut positions = PickPositions::empty_like(&self.positions, triangles.len() * 3);
        let mut colors = Vec::with_capacity(triangles.len() * 4);

        for (i, tri) in triangles.chunks_exact(3).enumerate() {
            if tri.iter().any(|&v| v as usize >= vertex_count) {
                continue;
            }
            let color = encode_pick_color(i as u32);
            for &v in tri {
                positions.push_vertex(&self.positions, v as usize);
                colors.extend_from_slice(&color);
            }
        }

        PickTriangles { positions, colors }
    }

    /// Build per-vertex pick geometry.
    pub fn build_vertices(&self) -> PickVertices {
        let count = self.positions.vertex_count();
        let mut positions = PickPositions::empty_like(&self.positions, count * 3);
        let mut colors = Vec::with_capacity(count * 4);

        for v in 0..count {
            positions.push_vertex(&self.positions, v);
            colors.extend_from_slice(&encode_pick_color(v as u32));
        }

        PickVertices { positions, colors }
    }
}
