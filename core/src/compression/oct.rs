//! Octahedral normal encoding.
//!
//! A unit normal is projected onto the octahedron `|x| + |y| + |z| = 1`,
//! the lower hemisphere is folded over the upper one, and the resulting
//! `x`/`y` pair is stored as two signed bytes scaled by 127.
//!
//! Plain rounding can pick the worse of two neighbouring lattice points, so
//! the encoder decodes all four floor/ceil combinations and keeps the one
//! whose reconstruction is closest to the input direction.

use crate::math::{Vec3, vec3_at};

const OCT_SCALE: f32 = 127.0;

/// One rounding choice considered by the encoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctCandidate {
    /// Encoded bytes.
    pub encoded: [i8; 2],
    /// Dot product of the decoded candidate with the input direction.
    pub dot: f32,
}

#[inline]
fn sign_not_zero(v: f32) -> f32 {
    if v >= 0.0 { 1.0 } else { -1.0 }
}

/// Fold the lower hemisphere of the octahedron onto the outer triangles.
#[inline]
fn fold(x: f32, y: f32) -> (f32, f32) {
    ((1.0 - y.abs()) * sign_not_zero(x), (1.0 - x.abs()) * sign_not_zero(y))
}

#[inline]
fn to_byte(v: f32) -> i8 {
    v.clamp(-OCT_SCALE, OCT_SCALE) as i8
}

/// Evaluate every floor/ceil rounding of the projected normal.
///
/// Candidates are returned in the order floor/floor, ceil/floor, floor/ceil,
/// ceil/ceil. A zero-length input yields the encoding of `+Z`.
pub fn oct_encode_candidates(normal: [f32; 3]) -> [OctCandidate; 4] {
    let n = Vec3::from(normal);
    let l1 = n.x.abs() + n.y.abs() + n.z.abs();
    let (mut x, mut y) = if l1 > 0.0 {
        (n.x / l1, n.y / l1)
    } else {
        (0.0, 0.0)
    };
    if n.z < 0.0 {
        (x, y) = fold(x, y);
    }

    let (sx, sy) = (x * OCT_SCALE, y * OCT_SCALE);
    let rounding = [
        (sx.floor(), sy.floor()),
        (sx.ceil(), sy.floor()),
        (sx.floor(), sy.ceil()),
        (sx.ceil(), sy.ceil()),
    ];

    let direction = if l1 > 0.0 { n.normalize() } else { Vec3::z() };
    rounding.map(|(cx, cy)| {
        let encoded = [to_byte(cx), to_byte(cy)];
        let dot = Vec3::from(oct_decode_normal(encoded)).dot(&direction);
        OctCandidate { encoded, dot }
    })
}

/// Encode a unit normal into two signed bytes.
///
/// Among the four rounding candidates the one with the highest dot product
/// against the input wins; ties keep the earliest candidate.
pub fn oct_encode_normal(normal: [f32; 3]) -> [i8; 2] {
    let candidates = oct_encode_candidates(normal);
    let mut best = candidates[0];
    for candidate in &candidates[1..] {
        if candidate.dot > best.dot {
            best = *candidate;
        }
    }
    best.encoded
}

/// Decode two oct-encoded bytes back into a unit normal.
pub fn oct_decode_normal(encoded: [i8; 2]) -> [f32; 3] {
    let mut x = encoded[0] as f32 / OCT_SCALE;
    let mut y = encoded[1] as f32 / OCT_SCALE;
    let z = 1.0 - x.abs() - y.abs();
    if z < 0.0 {
        (x, y) = fold(x, y);
    }
    let n = Vec3::new(x, y, z).normalize();
    [n.x, n.y, n.z]
}

/// Encode a flat array of `xyz` normals into interleaved byte pairs.
pub fn oct_encode_normals(normals: &[f32]) -> Vec<i8> {
    crate::profile_function!();

    let count = normals.len() / 3;
    let mut out = Vec::with_capacity(count * 2);
    for i in 0..count {
        out.extend_from_slice(&oct_encode_normal(vec3_at(normals, i).into()));
    }
    out
}

/// Decode interleaved oct byte pairs into a flat `xyz` array.
pub fn oct_decode_normals(encoded: &[i8]) -> Vec<f32> {
    let mut out = Vec::with_capacity(encoded.len() / 2 * 3);
    for pair in encoded.chunks_exact(2) {
        out.extend_from_slice(&oct_decode_normal([pair[0], pair[1]]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn angle_degrees(a: [f32; 3], b: [f32; 3]) -> f32 {
        let dot = Vec3::from(a).normalize().dot(&Vec3::from(b).normalize());
        dot.clamp(-1.0, 1.0).acos().to_degrees()
    }

    /// Deterministic directions covering the sphere (golden-angle spiral).
    fn sphere_directions(count: usize) -> Vec<[f32; 3]> {
        let golden = std::f32::consts::PI * (3.0 - 5.0f32.sqrt());
        (0..count)
            .map(|i| {
                let y = 1.0 - 2.0 * (i as f32 + 0.5) / count as f32;
                let r = (1.0 - y * y).sqrt();
                let theta = golden * i as f32;
                [r * theta.cos(), y, r * theta.sin()]
            })
            .collect()
    }

    #[test]
    fn test_axes_are_exact() {
        for n in [
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
        ] {
            let decoded = oct_decode_normal(oct_encode_normal(n));
            assert!(angle_degrees(n, decoded) < 1e-3, "{n:?} -> {decoded:?}");
        }
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(oct_encode_normal([0.0, 0.0, 1.0]), [0, 0]);
        assert_eq!(oct_encode_normal([1.0, 0.0, 0.0]), [127, 0]);
        assert_eq!(oct_encode_normal([0.0, -1.0, 0.0]), [0, -127]);
        assert_eq!(oct_encode_normal([0.0, 0.0, -1.0]), [127, 127]);
    }

    #[test]
    fn test_round_trip_error_bounded() {
        for n in sphere_directions(5000) {
            let decoded = oct_decode_normal(oct_encode_normal(n));
            let error = angle_degrees(n, decoded);
            assert!(error <= 1.5, "{n:?}: {error} degrees");
        }
    }

    #[test]
    fn test_chosen_candidate_is_best() {
        for n in sphere_directions(1000) {
            let chosen = oct_encode_normal(n);
            let candidates = oct_encode_candidates(n);
            let chosen_dot = candidates
                .iter()
                .find(|c| c.encoded == chosen)
                .map(|c| c.dot)
                .unwrap();
            assert!(candidates.iter().all(|c| c.dot <= chosen_dot));
        }
    }

    #[test]
    fn test_encoding_is_reproducible() {
        let n = [0.267, -0.534, 0.801];
        assert_eq!(oct_encode_normal(n), oct_encode_normal(n));
    }

    #[test]
    fn test_decoded_normals_are_unit_length() {
        for pair in [[0i8, 0], [127, 127], [-127, 64], [10, -90], [-128, -128]] {
            let n = Vec3::from(oct_decode_normal(pair));
            assert!((n.norm() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_array_helpers() {
        let normals = [0.0, 0.0, 1.0, 1.0, 0.0, 0.0];
        let encoded = oct_encode_normals(&normals);
        assert_eq!(encoded, vec![0, 0, 127, 0]);

        let decoded = oct_decode_normals(&encoded);
        assert_eq!(decoded.len(), 6);
        assert!((decoded[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_normal_does_not_produce_nan() {
        let encoded = oct_encode_normal([0.0, 0.0, 0.0]);
        let decoded = oct_decode_normal(encoded);
        assert!(decoded.iter().all(|v| v.is_finite()));
    }
}
