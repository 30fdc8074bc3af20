//! Automatic vertex normals.

use crate::math::{Vec3, normalize_or_zero, vec3_at};

/// Build area-weighted vertex normals for a triangle list.
///
/// Every triangle adds its unnormalized face normal (whose length is twice
/// its area) to each of its vertices. Vertices not referenced by any triangle
/// get a zero normal. Indices pointing past the positions are skipped.
pub fn build_vertex_normals(positions: &[f32], triangles: &[u32]) -> Vec<f32> {
    let vertex_count = positions.len() / 3;
    let mut accum = vec![Vec3::zeros(); vertex_count];

    for tri in triangles.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= vertex_count || b >= vertex_count || c >= vertex_count {
            continue;
        }
        let pa = vec3_at(positions, a);
        let face = (vec3_at(positions, b) - pa).cross(&(vec3_at(positions, c) - pa));
        accum[a] += face;
        accum[b] += face;
        accum[c] += face;
    }

    let mut normals = Vec::with_capacity(vertex_count * 3);
    for n in accum {
        let n = normalize_or_zero(n);
        normals.extend_from_slice(&[n.x, n.y, n.z]);
    }
    normals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_quad_faces_up() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
        let normals = build_vertex_normals(&positions, &[0, 1, 2, 2, 3, 0]);
        for n in normals.chunks_exact(3) {
            assert_eq!(n, &[0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_larger_face_dominates() {
        // Shared vertex 0: a large triangle facing +Z and a small one facing +X
        let positions = [
            0.0, 0.0, 0.0, //
            10.0, 0.0, 0.0, //
            0.0, 10.0, 0.0, //
            0.0, 1.0, 0.0, //
            0.0, 0.0, 1.0,
        ];
        let normals = build_vertex_normals(&positions, &[0, 1, 2, 0, 3, 4]);
        assert!(normals[2] > normals[0]);
    }

    #[test]
    fn test_unreferenced_vertex_is_zero() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 5.0, 5.0, 5.0];
        let normals = build_vertex_normals(&positions, &[0, 1, 2, 0, 1, 9]);
        assert_eq!(&normals[9..12], &[0.0, 0.0, 0.0]);
        assert_eq!(&normals[0..3], &[0.0, 0.0, 1.0]);
    }
}
