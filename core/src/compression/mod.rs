//! Attribute compression.
//!
//! - [`quantize`] - 16-bit quantization of positions and UVs with decode matrices
//! - [`oct`] - Octahedral encoding of unit normals into two signed bytes
//!
//! Both are pure functions: the same input always produces the same bits.

pub mod oct;
pub mod quantize;

pub use oct::{
    OctCandidate, oct_decode_normal, oct_decode_normals, oct_encode_candidates, oct_encode_normal,
    oct_encode_normals,
};
pub use quantize::{
    AxisRange, PositionSource, QUANTIZATION_MAX, QuantizedPositions, QuantizedUv,
    decompress_positions, decompress_uv, quantize_positions, quantize_uv,
};
