//! 16-bit attribute quantization.
//!
//! Each component is mapped onto `0..=65535` relative to the per-axis range
//! of the whole array:
//!
//! ```text
//! q = floor((v - min) * 65535 / (max - min))
//! ```
//!
//! The returned decode matrix is `translate(min) * scale((max - min) / 65535)`,
//! so a shader recovers the original value (within one step) by multiplying
//! the quantized vector with it.
//!
//! An axis where every value is equal has no range to spread over. Such an
//! axis gets a scale of 1 and every value quantizes to 0, which decodes back
//! to `min` exactly.

use crate::math::{
    Mat3, Mat4, Vec2, Vec3, Vec4, mat3_from_translation_scale, mat4_from_translation_scale,
};

/// Largest quantized value.
pub const QUANTIZATION_MAX: u16 = u16::MAX;

/// Value range of one component axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    /// Smallest value on the axis.
    pub min: f32,
    /// Largest value on the axis.
    pub max: f32,
}

impl AxisRange {
    /// Compute the range of every axis of a flat array with `N` components per element.
    ///
    /// An empty array yields `[0.0, 0.0]` ranges.
    pub fn of_components<const N: usize>(values: &[f32]) -> [AxisRange; N] {
        let mut ranges = [AxisRange {
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
        }; N];

        for element in values.chunks_exact(N) {
            for (range, &v) in ranges.iter_mut().zip(element) {
                range.min = range.min.min(v);
                range.max = range.max.max(v);
            }
        }

        for range in &mut ranges {
            if range.min > range.max {
                *range = AxisRange { min: 0.0, max: 0.0 };
            }
        }
        ranges
    }

    /// Whether all values on the axis are equal.
    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }

    /// Size of one quantization step when decoding.
    pub fn decode_scale(&self) -> f32 {
        if self.is_degenerate() {
            1.0
        } else {
            ((self.max as f64 - self.min as f64) / QUANTIZATION_MAX as f64) as f32
        }
    }

    /// Quantize one value on this axis.
    #[inline]
    pub fn quantize(&self, v: f32) -> u16 {
        if self.is_degenerate() {
            return 0;
        }
        let range = self.max as f64 - self.min as f64;
        let q = ((v as f64 - self.min as f64) * QUANTIZATION_MAX as f64 / range).floor();
        q.clamp(0.0, QUANTIZATION_MAX as f64) as u16
    }
}

/// Quantized positions with their 4x4 decode matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedPositions {
    /// Quantized `xyz` triples.
    pub values: Vec<u16>,
    /// Maps a quantized `[x, y, z, 1]` back to model space.
    pub decode: Mat4,
}

/// Quantized texture coordinates with their 3x3 decode matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedUv {
    /// Quantized `uv` pairs.
    pub values: Vec<u16>,
    /// Maps a quantized `[u, v, 1]` back to texture space.
    pub decode: Mat3,
}

fn quantize_components<const N: usize>(values: &[f32], ranges: &[AxisRange; N]) -> Vec<u16> {
    let mut out = Vec::with_capacity(values.len() - values.len() % N);
    for element in values.chunks_exact(N) {
        for (range, &v) in ranges.iter().zip(element) {
            out.push(range.quantize(v));
        }
    }
    out
}

/// Quantize a flat array of `xyz` positions.
///
/// Trailing components that do not form a whole triple are dropped.
pub fn quantize_positions(positions: &[f32]) -> QuantizedPositions {
    crate::profile_function!();

    if positions.len() < 3 {
        return QuantizedPositions {
            values: Vec::new(),
            decode: Mat4::identity(),
        };
    }

    let ranges = AxisRange::of_components::<3>(positions);
    let values = quantize_components(positions, &ranges);
    let decode = mat4_from_translation_scale(
        Vec3::new(ranges[0].min, ranges[1].min, ranges[2].min),
        Vec3::new(
            ranges[0].decode_scale(),
            ranges[1].decode_scale(),
            ranges[2].decode_scale(),
        ),
    );

    QuantizedPositions { values, decode }
}

/// Quantize a flat array of `uv` pairs.
pub fn quantize_uv(uv: &[f32]) -> QuantizedUv {
    crate::profile_function!();

    if uv.len() < 2 {
        return QuantizedUv {
            values: Vec::new(),
            decode: Mat3::identity(),
        };
    }

    let ranges = AxisRange::of_components::<2>(uv);
    let values = quantize_components(uv, &ranges);
    let decode = mat3_from_translation_scale(
        Vec2::new(ranges[0].min, ranges[1].min),
        Vec2::new(ranges[0].decode_scale(), ranges[1].decode_scale()),
    );

    QuantizedUv { values, decode }
}

/// Decode quantized positions back to floats.
pub fn decompress_positions(values: &[u16], decode: &Mat4) -> Vec<f32> {
    let mut out = Vec::with_capacity(values.len());
    for q in values.chunks_exact(3) {
        let p = decode * Vec4::new(q[0] as f32, q[1] as f32, q[2] as f32, 1.0);
        out.extend_from_slice(&[p.x, p.y, p.z]);
    }
    out
}

/// Decode quantized texture coordinates back to floats.
pub fn decompress_uv(values: &[u16], decode: &Mat3) -> Vec<f32> {
    let mut out = Vec::with_capacity(values.len());
    for q in values.chunks_exact(2) {
        let p = decode * Vec3::new(q[0] as f32, q[1] as f32, 1.0);
        out.extend_from_slice(&[p.x, p.y]);
    }
    out
}

/// Vertex positions as stored by a geometry, either raw or quantized.
///
/// Derived data (edges, pick geometry, spatial indices) is built straight
/// from this view, decoding quantized positions one vertex at a time.
#[derive(Debug, Clone, Copy)]
pub enum PositionSource<'a> {
    /// Raw `xyz` floats.
    Float(&'a [f32]),
    /// Quantized `xyz` values and their decode matrix.
    Quantized {
        /// Quantized triples.
        values: &'a [u16],
        /// Positions decode matrix.
        decode: &'a Mat4,
    },
}

/// Grid used to weld float positions.
const WELD_PRECISION: f32 = 1e-4;

impl PositionSource<'_> {
    /// Number of whole vertices.
    pub fn vertex_count(&self) -> usize {
        match self {
            Self::Float(values) => values.len() / 3,
            Self::Quantized { values, .. } => values.len() / 3,
        }
    }

    /// Decoded position of vertex `i`.
    #[inline]
    pub fn position(&self, i: usize) -> Vec3 {
        match self {
            Self::Float(values) => crate::math::vec3_at(values, i),
            Self::Quantized { values, decode } => {
                let q = &values[i * 3..i * 3 + 3];
                let p = *decode * Vec4::new(q[0] as f32, q[1] as f32, q[2] as f32, 1.0);
                Vec3::new(p.x, p.y, p.z)
            }
        }
    }

    /// Key under which coincident vertices compare equal.
    ///
    /// Quantized values are compared exactly; floats are snapped to a
    /// `1e-4` grid first.
    #[inline]
    pub fn weld_key(&self, i: usize) -> [i64; 3] {
        match self {
            Self::Float(values) => {
                let p = &values[i * 3..i * 3 + 3];
                [p[0], p[1], p[2]].map(|v| (v / WELD_PRECISION).round() as i64)
            }
            Self::Quantized { values, .. } => {
                let q = &values[i * 3..i * 3 + 3];
                [q[0] as i64, q[1] as i64, q[2] as i64]
            }
        }
    }

    /// Decode every vertex into a flat `xyz` array.
    pub fn to_floats(&self) -> Vec<f32> {
        match self {
            Self::Float(values) => values[..values.len() - values.len() % 3].to_vec(),
            Self::Quantized { values, decode } => decompress_positions(values, decode),
        }
    }
}
