//! Math type aliases and helper functions.
//!
//! All geometry math is `f32`, matching what ends up in GPU buffers.
//! Decode matrices follow the column-vector convention: a quantized
//! position `q` decodes as `decode * [qx, qy, qz, 1]`.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 3x3 matrix (f32). Used as the UV decode matrix.
pub type Mat3 = nalgebra::Matrix3<f32>;

/// 4x4 matrix (f32). Used as the positions decode matrix.
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Build a translation-only 4x4 matrix.
pub fn mat4_from_translation(t: Vec3) -> Mat4 {
    Mat4::new_translation(&t)
}

/// Build a `translate(t) * scale(s)` 4x4 matrix.
pub fn mat4_from_translation_scale(t: Vec3, s: Vec3) -> Mat4 {
    #[rustfmt::skip]
    let result = Mat4::new(
        s.x, 0.0, 0.0, t.x,
        0.0, s.y, 0.0, t.y,
        0.0, 0.0, s.z, t.z,
        0.0, 0.0, 0.0, 1.0,
    );
    result
}

/// Build a `translate(t) * scale(s)` 3x3 matrix for 2D homogeneous coordinates.
pub fn mat3_from_translation_scale(t: Vec2, s: Vec2) -> Mat3 {
    #[rustfmt::skip]
    let result = Mat3::new(
        s.x, 0.0, t.x,
        0.0, s.y, t.y,
        0.0, 0.0, 1.0,
    );
    result
}

/// Transform a point (w = 1) by a 4x4 matrix, dropping the w component.
#[inline]
pub fn transform_point3(m: &Mat4, p: Vec3) -> Vec3 {
    let r = m * Vec4::new(p.x, p.y, p.z, 1.0);
    Vec3::new(r.x, r.y, r.z)
}

/// Transform a 2D point (w = 1) by a 3x3 matrix.
#[inline]
pub fn transform_point2(m: &Mat3, p: Vec2) -> Vec2 {
    let r = m * nalgebra::Vector3::new(p.x, p.y, 1.0);
    Vec2::new(r.x, r.y)
}

/// Read the `i`-th triple of a flat array as a vector.
#[inline]
pub fn vec3_at(values: &[f32], i: usize) -> Vec3 {
    Vec3::new(values[i * 3], values[i * 3 + 1], values[i * 3 + 2])
}

/// Normalize a vector, returning zero for zero-length input instead of NaN.
#[inline]
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    let len = v.norm();
    if len > 0.0 { v / len } else { Vec3::zeros() }
}

/// Convert a 4x4 matrix to a column-major `[f32; 16]` array for uniform upload.
pub fn mat4_to_cols_array(m: &Mat4) -> [f32; 16] {
    let mut out = [0.0; 16];
    out.copy_from_slice(m.as_slice());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_matrix() {
        let t = Vec3::new(1.0, 2.0, 3.0);
        let m = mat4_from_translation(t);
        assert_eq!(m[(0, 3)], 1.0);
        assert_eq!(m[(1, 3)], 2.0);
        assert_eq!(m[(2, 3)], 3.0);
    }

    #[test]
    fn translation_scale_applies_scale_first() {
        let m = mat4_from_translation_scale(Vec3::new(1.0, 2.0, 3.0), Vec3::new(2.0, 4.0, 8.0));
        let p = transform_point3(&m, Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(p, Vec3::new(3.0, 6.0, 11.0));
    }

    #[test]
    fn uv_matrix_transforms_point() {
        let m = mat3_from_translation_scale(Vec2::new(0.5, -1.0), Vec2::new(2.0, 0.5));
        let p = transform_point2(&m, Vec2::new(1.0, 4.0));
        assert_eq!(p, Vec2::new(2.5, 1.0));
    }

    #[test]
    fn normalize_zero_vector() {
        assert_eq!(normalize_or_zero(Vec3::zeros()), Vec3::zeros());
        let n = normalize_or_zero(Vec3::new(0.0, 3.0, 4.0));
        assert!((n.norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cols_array_identity() {
        let cols = mat4_to_cols_array(&Mat4::identity());
        assert_eq!(cols[0], 1.0);
        assert_eq!(cols[5], 1.0);
        assert_eq!(cols[10], 1.0);
        assert_eq!(cols[15], 1.0);
        assert_eq!(cols[12], 0.0);
    }

    #[test]
    fn cols_array_is_column_major() {
        let m = mat4_from_translation(Vec3::new(7.0, 8.0, 9.0));
        let cols = mat4_to_cols_array(&m);
        assert_eq!(&cols[12..15], &[7.0, 8.0, 9.0]);
    }
}
