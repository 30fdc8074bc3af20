//! Bounding volumes.
//!
//! [`Aabb`] is the local-space axis-aligned box of a geometry; [`Obb`] keeps
//! the eight corners explicitly so the box can be carried through an
//! arbitrary transform without growing.

use crate::math::{Mat4, Vec3, transform_point3};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// An inverted box that contains nothing; expanding it by a point yields that point.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
        max: Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
    };

    /// Create a box from its corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Bounding box of a flat `xyz` array. Empty input gives [`Aabb::EMPTY`].
    pub fn from_positions(positions: &[f32]) -> Self {
        let mut aabb = Self::EMPTY;
        for p in positions.chunks_exact(3) {
            aabb.expand(Vec3::new(p[0], p[1], p[2]));
        }
        aabb
    }

    /// Whether the box contains no points.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow the box to include `p`.
    #[inline]
    pub fn expand(&mut self, p: Vec3) {
        self.min = self.min.inf(&p);
        self.max = self.max.sup(&p);
    }

    /// Smallest box containing both boxes.
    pub fn merged(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Center point.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths along each axis.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Index of the longest axis (0 = X, 1 = Y, 2 = Z).
    pub fn longest_axis(&self) -> usize {
        let size = self.size();
        if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        }
    }

    /// Whether `p` lies inside or on the boundary.
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Whether the two boxes overlap (touching counts).
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// The eight corners, X varying fastest.
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Slab test. Returns the entry distance along the ray, or `None` on a miss.
    ///
    /// `inv_direction` is the component-wise reciprocal of the ray direction.
    pub fn ray_entry(&self, origin: Vec3, inv_direction: Vec3, max_t: f32) -> Option<f32> {
        let mut t_min = 0.0f32;
        let mut t_max = max_t;
        for axis in 0..3 {
            let t0 = (self.min[axis] - origin[axis]) * inv_direction[axis];
            let t1 = (self.max[axis] - origin[axis]) * inv_direction[axis];
            let (near, far) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
            // NaN from 0 * inf compares false and leaves the bounds untouched
            if near > t_min {
                t_min = near;
            }
            if far < t_max {
                t_max = far;
            }
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

/// Oriented bounding box stored as eight corner points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obb {
    /// Corner points in the same order as [`Aabb::corners`].
    pub corners: [Vec3; 8],
}

impl Obb {
    /// The box of an axis-aligned box.
    pub fn from_aabb(aabb: &Aabb) -> Self {
        Self {
            corners: aabb.corners(),
        }
    }

    /// Transform every corner by `m`.
    pub fn transformed(&self, m: &Mat4) -> Self {
        Self {
            corners: self.corners.map(|c| transform_point3(m, c)),
        }
    }

    /// Axis-aligned box enclosing the corners.
    pub fn to_aabb(&self) -> Aabb {
        let mut aabb = Aabb::EMPTY;
        for &c in &self.corners {
            aabb.expand(c);
        }
        aabb
    }

    /// Corners as a flat `xyzw` array with `w = 1`, ready for upload.
    pub fn to_homogeneous_array(&self) -> [f32; 32] {
        let mut out = [0.0; 32];
        for (i, c) in self.corners.iter().enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(&[c.x, c.y, c.z, 1.0]);
        }
        out
    }
}
