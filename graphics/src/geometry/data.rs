//! Attribute storage for geometry records.
//!
//! [`GeometryData`] holds the arrays a record was built from, already
//! compressed when the record is quantized. Records share it with their
//! combined buffer pool through an `Arc`, so updates swap in a new copy
//! rather than mutating under the pool.

use std::fmt;

use quartz_core::compression::{
    PositionSource, decompress_positions, decompress_uv, oct_decode_normals, oct_encode_normals,
    quantize_positions, quantize_uv,
};
use quartz_core::math::{Mat3, Mat4};
use quartz_core::mesh::PrimitiveTopology;
use quartz_core::mesh::normals::build_vertex_normals;

use super::GeometryDescriptor;
use crate::error::GeometryError;

/// A vertex attribute or the index array of a geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Vertex positions.
    Positions,
    /// Vertex normals.
    Normals,
    /// Texture coordinates.
    Uv,
    /// Vertex colors.
    Colors,
    /// Primitive indices.
    Indices,
}

impl AttributeKind {
    /// Every per-vertex attribute, in buffer order.
    pub const VERTEX_ATTRIBUTES: [AttributeKind; 4] =
        [Self::Positions, Self::Normals, Self::Uv, Self::Colors];

    /// Float components per vertex before compression.
    pub fn components(&self) -> usize {
        match self {
            Self::Positions | Self::Normals => 3,
            Self::Uv => 2,
            Self::Colors => 4,
            Self::Indices => 1,
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Positions => "positions",
            Self::Normals => "normals",
            Self::Uv => "uv",
            Self::Colors => "colors",
            Self::Indices => "indices",
        })
    }
}

/// Stored vertex positions.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionData {
    /// Raw `xyz` floats.
    Float(Vec<f32>),
    /// 16-bit quantized triples and the matrix that decodes them.
    Quantized {
        /// Quantized values.
        values: Vec<u16>,
        /// Positions decode matrix.
        decode: Mat4,
    },
}

impl PositionData {
    /// View usable by edge, pick and KD-tree builders.
    pub fn source(&self) -> PositionSource<'_> {
        match self {
            Self::Float(values) => PositionSource::Float(values),
            Self::Quantized { values, decode } => PositionSource::Quantized { values, decode },
        }
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.source().vertex_count()
    }

    /// Raw bytes as uploaded to the GPU.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Float(values) => bytemuck::cast_slice(values),
            Self::Quantized { values, .. } => bytemuck::cast_slice(values),
        }
    }

    /// Decode matrix, if quantized.
    pub fn decode_matrix(&self) -> Option<&Mat4> {
        match self {
            Self::Float(_) => None,
            Self::Quantized { decode, .. } => Some(decode),
        }
    }

    /// Positions as floats, decoding if needed.
    pub fn to_floats(&self) -> Vec<f32> {
        match self {
            Self::Float(values) => values.clone(),
            Self::Quantized { values, decode } => decompress_positions(values, decode),
        }
    }
}

/// Stored vertex normals.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalData {
    /// Raw `xyz` floats.
    Float(Vec<f32>),
    /// Oct-encoded signed byte pairs.
    OctEncoded(Vec<i8>),
}

impl NormalData {
    /// Raw bytes as uploaded to the GPU.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Float(values) => bytemuck::cast_slice(values),
            Self::OctEncoded(values) => bytemuck::cast_slice(values),
        }
    }

    /// Normals as unit floats, decoding if needed.
    pub fn to_floats(&self) -> Vec<f32> {
        match self {
            Self::Float(values) => values.clone(),
            Self::OctEncoded(values) => oct_decode_normals(values),
        }
    }
}

/// Stored texture coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum UvData {
    /// Raw `uv` floats.
    Float(Vec<f32>),
    /// 16-bit quantized pairs and the matrix that decodes them.
    Quantized {
        /// Quantized values.
        values: Vec<u16>,
        /// UV decode matrix.
        decode: Mat3,
    },
}

impl UvData {
    /// Raw bytes as uploaded to the GPU.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Float(values) => bytemuck::cast_slice(values),
            Self::Quantized { values, .. } => bytemuck::cast_slice(values),
        }
    }

    /// Decode matrix, if quantized.
    pub fn decode_matrix(&self) -> Option<&Mat3> {
        match self {
            Self::Float(_) => None,
            Self::Quantized { decode, .. } => Some(decode),
        }
    }

    /// Texture coordinates as floats, decoding if needed.
    pub fn to_floats(&self) -> Vec<f32> {
        match self {
            Self::Float(values) => values.clone(),
            Self::Quantized { values, decode } => decompress_uv(values, decode),
        }
    }
}

/// Which attributes a geometry carries and how they are stored.
///
/// Geometries with equal signatures have identical vertex layouts and can
/// share combined buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeSignature {
    /// Primitive topology.
    pub primitive: PrimitiveTopology,
    /// Normals present.
    pub normals: bool,
    /// Texture coordinates present.
    pub uv: bool,
    /// Colors present.
    pub colors: bool,
    /// Positions, normals and UVs compressed.
    pub quantized: bool,
}

impl AttributeSignature {
    /// Compact string form, e.g. `/g/triangles/p/n/c/u/q`.
    pub fn topology_hash(&self) -> String {
        let mut hash = format!("/g/{}/p", self.primitive.name());
        if self.normals {
            hash.push_str("/n");
        }
        if self.colors {
            hash.push_str("/c");
        }
        if self.uv {
            hash.push_str("/u");
        }
        if self.quantized {
            hash.push_str("/q");
        }
        hash
    }
}

/// Attribute arrays of one geometry, compressed or raw.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryData {
    /// Primitive topology.
    pub primitive: PrimitiveTopology,
    /// Vertex positions.
    pub positions: PositionData,
    /// Vertex normals.
    pub normals: Option<NormalData>,
    /// Texture coordinates.
    pub uv: Option<UvData>,
    /// Vertex colors, four floats per vertex.
    pub colors: Option<Vec<f32>>,
    /// Primitive indices.
    pub indices: Vec<u32>,
    /// Whether positions, normals and UVs are compressed.
    pub quantized: bool,
}

impl GeometryData {
    /// Validate the descriptor's arrays and compress them if requested.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::MissingAttribute`] when positions or indices
    /// are absent or empty, and [`GeometryError::LengthMismatch`] when an
    /// attribute array does not match the vertex count.
    pub fn from_descriptor(descriptor: &GeometryDescriptor) -> Result<Self, GeometryError> {
        quartz_core::profile_function!();

        let positions = descriptor
            .positions
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or(GeometryError::MissingAttribute(AttributeKind::Positions))?;
        let indices = descriptor
            .indices
            .as_deref()
            .filter(|i| !i.is_empty())
            .ok_or(GeometryError::MissingAttribute(AttributeKind::Indices))?;

        let vertex_count = positions.len() / 3;
        check_length(AttributeKind::Positions, vertex_count, positions)?;

        let mut normals = descriptor.normals.clone();
        if normals.is_none() && descriptor.auto_vertex_normals {
            match descriptor.primitive.to_triangle_list(indices) {
                Some(triangles) => normals = Some(build_vertex_normals(positions, &triangles)),
                None => log::warn!(
                    "Automatic vertex normals need triangles, primitive is '{}'",
                    descriptor.primitive.name()
                ),
            }
        }
        if let Some(normals) = &normals {
            check_length(AttributeKind::Normals, vertex_count, normals)?;
        }
        if let Some(uv) = &descriptor.uv {
            check_length(AttributeKind::Uv, vertex_count, uv)?;
        }
        if let Some(colors) = &descriptor.colors {
            check_length(AttributeKind::Colors, vertex_count, colors)?;
        }

        let data = if descriptor.quantized {
            let q = quantize_positions(positions);
            Self {
                primitive: descriptor.primitive,
                positions: PositionData::Quantized {
                    values: q.values,
                    decode: q.decode,
                },
                normals: normals.map(|n| NormalData::OctEncoded(oct_encode_normals(&n))),
                uv: descriptor.uv.as_deref().map(|uv| {
                    let q = quantize_uv(uv);
                    UvData::Quantized {
                        values: q.values,
                        decode: q.decode,
                    }
                }),
                colors: descriptor.colors.clone(),
                indices: indices.to_vec(),
                quantized: true,
            }
        } else {
            Self {
                primitive: descriptor.primitive,
                positions: PositionData::Float(positions.to_vec()),
                normals: normals.map(NormalData::Float),
                uv: descriptor.uv.clone().map(UvData::Float),
                colors: descriptor.colors.clone(),
                indices: indices.to_vec(),
                quantized: false,
            }
        };

        Ok(data)
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.vertex_count()
    }

    /// Largest index value.
    pub fn max_index(&self) -> u32 {
        self.indices.iter().copied().max().unwrap_or(0)
    }

    /// Layout signature used to bucket combined geometries.
    pub fn signature(&self) -> AttributeSignature {
        AttributeSignature {
            primitive: self.primitive,
            normals: self.normals.is_some(),
            uv: self.uv.is_some(),
            colors: self.colors.is_some(),
            quantized: self.quantized,
        }
    }

    /// Upload bytes of a vertex attribute, or `None` if absent.
    ///
    /// Indices are format dependent and have no fixed byte form here.
    pub fn attribute_bytes(&self, kind: AttributeKind) -> Option<&[u8]> {
        match kind {
            AttributeKind::Positions => Some(self.positions.as_bytes()),
            AttributeKind::Normals => self.normals.as_ref().map(NormalData::as_bytes),
            AttributeKind::Uv => self.uv.as_ref().map(UvData::as_bytes),
            AttributeKind::Colors => self.colors.as_deref().map(bytemuck::cast_slice),
            AttributeKind::Indices => None,
        }
    }

    /// Bytes per vertex of a vertex attribute in this geometry's storage.
    pub fn vertex_stride(&self, kind: AttributeKind) -> u64 {
        vertex_stride(kind, self.quantized)
    }
}

/// Bytes per vertex of an attribute, compressed or raw.
pub(crate) fn vertex_stride(kind: AttributeKind, quantized: bool) -> u64 {
    match (kind, quantized) {
        (AttributeKind::Positions, true) => 6,
        (AttributeKind::Positions, false) => 12,
        (AttributeKind::Normals, true) => 2,
        (AttributeKind::Normals, false) => 12,
        (AttributeKind::Uv, true) => 4,
        (AttributeKind::Uv, false) => 8,
        (AttributeKind::Colors, _) => 16,
        (AttributeKind::Indices, _) => 0,
    }
}

fn check_length(
    kind: AttributeKind,
    vertex_count: usize,
    values: &[f32],
) -> Result<(), GeometryError> {
    let expected = vertex_count * kind.components();
    if values.len() != expected {
        return Err(GeometryError::LengthMismatch {
            kind,
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quartz_core::mesh::generators::generate_box;

    fn triangle() -> GeometryDescriptor {
        GeometryDescriptor::new()
            .with_positions(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
            .with_indices(vec![0, 1, 2])
    }

    #[test]
    fn test_missing_positions_rejected() {
        let desc = GeometryDescriptor::new().with_indices(vec![0, 1, 2]);
        assert_eq!(
            GeometryData::from_descriptor(&desc),
            Err(GeometryError::MissingAttribute(AttributeKind::Positions))
        );
    }

    #[test]
    fn test_missing_indices_rejected() {
        let desc = triangle().with_indices(Vec::new());
        assert_eq!(
            GeometryData::from_descriptor(&desc),
            Err(GeometryError::MissingAttribute(AttributeKind::Indices))
        );
    }

    #[test]
    fn test_attribute_length_checked() {
        let desc = triangle().with_uv(vec![0.0; 4]);
        assert_eq!(
            GeometryData::from_descriptor(&desc),
            Err(GeometryError::LengthMismatch {
                kind: AttributeKind::Uv,
                expected: 6,
                actual: 4,
            })
        );
    }

    #[test]
    fn test_quantized_storage() {
        let desc = GeometryDescriptor::from(generate_box([1.0, 1.0, 1.0]));
        let data = GeometryData::from_descriptor(&desc).unwrap();

        assert!(data.quantized);
        assert_eq!(data.vertex_count(), 24);
        assert!(matches!(data.positions, PositionData::Quantized { .. }));
        assert!(matches!(data.normals, Some(NormalData::OctEncoded(_))));
        assert_eq!(data.attribute_bytes(AttributeKind::Positions).unwrap().len(), 24 * 6);
        assert_eq!(data.attribute_bytes(AttributeKind::Normals).unwrap().len(), 24 * 2);
        assert_eq!(data.attribute_bytes(AttributeKind::Uv).unwrap().len(), 24 * 4);
        assert!(data.attribute_bytes(AttributeKind::Colors).is_none());
    }

    #[test]
    fn test_float_storage() {
        let desc = triangle().with_quantized(false).with_colors(vec![1.0; 12]);
        let data = GeometryData::from_descriptor(&desc).unwrap();

        assert!(!data.quantized);
        assert!(data.positions.decode_matrix().is_none());
        assert_eq!(data.attribute_bytes(AttributeKind::Colors).unwrap().len(), 48);
        assert_eq!(data.vertex_stride(AttributeKind::Positions), 12);
    }

    #[test]
    fn test_auto_vertex_normals() {
        let desc = triangle().with_auto_vertex_normals(true).with_quantized(false);
        let data = GeometryData::from_descriptor(&desc).unwrap();
        let normals = data.normals.unwrap().to_floats();
        assert_eq!(normals.len(), 9);
        assert!((normals[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_topology_hash() {
        let desc = GeometryDescriptor::from(generate_box([1.0, 1.0, 1.0])).with_colors(vec![1.0; 96]);
        let data = GeometryData::from_descriptor(&desc).unwrap();
        assert_eq!(data.signature().topology_hash(), "/g/triangles/p/n/c/u/q");

        let data = GeometryData::from_descriptor(&triangle().with_quantized(false)).unwrap();
        assert_eq!(data.signature().topology_hash(), "/g/triangles/p");
    }
}
