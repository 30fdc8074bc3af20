//! Mesh generators for common shapes.
//!
//! These generators produce [`MeshArrays`] with positions, normals, UVs and
//! `u32` indices, ready to be handed to a geometry record. Faces of the box
//! and quad have their own vertices so normals stay flat across creases.

use std::f32::consts::PI;

use super::data::MeshArrays;

/// Generate an axis-aligned box centered at the origin.
///
/// Each of the six faces has four vertices of its own (24 in total) and two
/// counter-clockwise triangles when viewed from outside.
///
/// # Arguments
///
/// * `half_extents` - Half the size of the box along X, Y and Z
pub fn generate_box(half_extents: [f32; 3]) -> MeshArrays {
    // (normal, u axis, v axis) with u x v == normal
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
    ];
    const CORNERS: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    let mut positions = Vec::with_capacity(24 * 3);
    let mut normals = Vec::with_capacity(24 * 3);
    let mut uv = Vec::with_capacity(24 * 2);
    let mut indices = Vec::with_capacity(36);

    for (face, (n, u, v)) in FACES.iter().enumerate() {
        for (su, sv) in CORNERS {
            for axis in 0..3 {
                let p = n[axis] + su * u[axis] + sv * v[axis];
                positions.push(p * half_extents[axis]);
            }
            normals.extend_from_slice(n);
            uv.push((su + 1.0) * 0.5);
            uv.push((1.0 - sv) * 0.5);
        }
        let base = face as u32 * 4;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshArrays::new()
        .with_positions(positions)
        .with_normals(normals)
        .with_uv(uv)
        .with_indices(indices)
}

/// Generate a UV sphere mesh.
///
/// Creates a sphere with the given radius, number of longitudinal segments,
/// and number of latitudinal rings.
///
/// # Arguments
///
/// * `radius` - Sphere radius
/// * `segments` - Number of longitudinal segments (around the equator)
/// * `rings` - Number of latitudinal rings (from pole to pole)
pub fn generate_sphere(radius: f32, segments: u32, rings: u32) -> MeshArrays {
    let vertex_count = ((rings + 1) * (segments + 1)) as usize;
    let mut positions = Vec::with_capacity(vertex_count * 3);
    let mut normals = Vec::with_capacity(vertex_count * 3);
    let mut uv = Vec::with_capacity(vertex_count * 2);
    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);

    for ring in 0..=rings {
        let theta = ring as f32 * PI / rings as f32;
        let sin_theta = theta.sin();
        let cos_theta = theta.cos();

        for segment in 0..=segments {
            let phi = segment as f32 * 2.0 * PI / segments as f32;
            let sin_phi = phi.sin();
            let cos_phi = phi.cos();

            let x = sin_theta * cos_phi;
            let y = cos_theta;
            let z = sin_theta * sin_phi;

            positions.extend_from_slice(&[x * radius, y * radius, z * radius]);
            normals.extend_from_slice(&[x, y, z]);
            uv.push(segment as f32 / segments as f32);
            uv.push(ring as f32 / rings as f32);
        }
    }

    for ring in 0..rings {
        for segment in 0..segments {
            let current = ring * (segments + 1) + segment;
            let next = current + segments + 1;

            indices.push(current);
            indices.push(next);
            indices.push(current + 1);

            indices.push(current + 1);
            indices.push(next);
            indices.push(next + 1);
        }
    }

    MeshArrays::new()
        .with_positions(positions)
        .with_normals(normals)
        .with_uv(uv)
        .with_indices(indices)
}

/// Generate a quad mesh on the XY plane.
///
/// Creates a quad centered at the origin with the given half-width and
/// half-height, facing +Z.
///
/// UV coordinates go from (0,0) at top-left to (1,1) at bottom-right.
///
/// # Arguments
///
/// * `half_width` - Half the width of the quad along the X axis
/// * `half_height` - Half the height of the quad along the Y axis
pub fn generate_quad(half_width: f32, half_height: f32) -> MeshArrays {
    #[rustfmt::skip]
    let positions = vec![
        -half_width, -half_height, 0.0,
        half_width, -half_height, 0.0,
        half_width, half_height, 0.0,
        -half_width, half_height, 0.0,
    ];
    let normals = [0.0, 0.0, 1.0].repeat(4);
    let uv = vec![0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0];

    MeshArrays::new()
        .with_positions(positions)
        .with_normals(normals)
        .with_uv(uv)
        .with_indices(vec![0, 1, 2, 2, 3, 0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_sphere() {
        let mesh = generate_sphere(1.0, 8, 4);
        // (rings+1) * (segments+1) = 5 * 9 = 45 vertices
        assert_eq!(mesh.vertex_count(), 45);
        // rings * segments * 6 = 4 * 8 * 6 = 192 indices
        assert_eq!(mesh.index_count(), 192);
        assert_eq!(mesh.uv.as_ref().unwrap().len(), 45 * 2);
    }

    #[test]
    fn test_generate_quad() {
        let mesh = generate_quad(0.5, 0.5);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.index_count(), 6);
        assert_eq!(mesh.normals.as_ref().unwrap().len(), 12);
    }

    #[test]
    fn test_generate_box() {
        let mesh = generate_box([1.0, 2.0, 3.0]);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.index_count(), 36);

        let positions = mesh.positions.as_ref().unwrap();
        for vertex in positions.chunks_exact(3) {
            assert_eq!(vertex[0].abs(), 1.0);
            assert_eq!(vertex[1].abs(), 2.0);
            assert_eq!(vertex[2].abs(), 3.0);
        }
    }

    #[test]
    fn test_box_faces_wind_outward() {
        let mesh = generate_box([1.0, 1.0, 1.0]);
        let p = mesh.positions.as_ref().unwrap();
        let n = mesh.normals.as_ref().unwrap();
        let v = |i: u32| {
            let i = i as usize * 3;
            [p[i], p[i + 1], p[i + 2]]
        };
        for tri in mesh.indices.as_ref().unwrap().chunks_exact(3) {
            let (a, b, c) = (v(tri[0]), v(tri[1]), v(tri[2]));
            let e1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let e2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
            let cross = [
                e1[1] * e2[2] - e1[2] * e2[1],
                e1[2] * e2[0] - e1[0] * e2[2],
                e1[0] * e2[1] - e1[1] * e2[0],
            ];
            let ni = tri[0] as usize * 3;
            let dot = cross[0] * n[ni] + cross[1] * n[ni + 1] + cross[2] * n[ni + 2];
            assert!(dot > 0.0);
        }
    }
}
