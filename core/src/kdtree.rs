//! Triangle KD-tree for CPU-side picking and region queries.
//!
//! Nodes live in one flat vector. Internal nodes split their triangles at
//! the median centroid along the longest axis of the centroid bounds;
//! leaves hold at most [`MAX_LEAF_TRIANGLES`] triangles.

use crate::bounds::Aabb;
use crate::compression::PositionSource;
use crate::math::Vec3;

/// Largest number of triangles stored in one leaf.
pub const MAX_LEAF_TRIANGLES: usize = 16;

/// A node of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct KdNode {
    /// Bounds of every triangle below this node.
    pub bounds: Aabb,
    /// Children or triangle range.
    pub kind: KdNodeKind,
}

/// Node payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KdNodeKind {
    /// Two children, indices into [`TriangleKdTree::nodes`].
    Internal { left: u32, right: u32, axis: u8 },
    /// A run of entries in the tree's triangle order.
    Leaf { start: u32, count: u32 },
}

/// Result of a ray query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Index of the hit triangle in the triangle list.
    pub triangle: u32,
    /// Distance along the ray, in units of the direction's length.
    pub distance: f32,
    /// Barycentric `(u, v)` of the hit; the first vertex weight is `1 - u - v`.
    pub barycentric: [f32; 2],
}

#[derive(Debug, Clone, Copy)]
struct TriangleEntry {
    id: u32,
    vertices: [Vec3; 3],
    bounds: Aabb,
    centroid: Vec3,
}

/// Spatial index over the triangles of one geometry, in model space.
#[derive(Debug, Clone)]
pub struct TriangleKdTree {
    nodes: Vec<KdNode>,
    triangles: Vec<TriangleEntry>,
}

impl TriangleKdTree {
    /// Build the tree from positions and a triangle list.
    ///
    /// Triangles referencing missing vertices are left out.
    pub fn build(positions: PositionSource<'_>, triangles: &[u32]) -> Self {
        crate::profile_function!();

        let vertex_count = positions.vertex_count();
        let mut entries: Vec<TriangleEntry> = triangles
            .chunks_exact(3)
            .enumerate()
            .filter(|(_, tri)| tri.iter().all(|&v| (v as usize) < vertex_count))
            .map(|(id, tri)| {
                let vertices = [
                    positions.position(tri[0] as usize),
                    positions.position(tri[1] as usize),
                    positions.position(tri[2] as usize),
                ];
                let mut bounds = Aabb::EMPTY;
                for v in vertices {
                    bounds.expand(v);
                }
                TriangleEntry {
                    id: id as u32,
                    vertices,
                    bounds,
                    centroid: (vertices[0] + vertices[1] + vertices[2]) / 3.0,
                }
            })
            .collect();

        let mut nodes = Vec::new();
        if !entries.is_empty() {
            build_recursive(&mut nodes, &mut entries, 0);
        }

        log::trace!(
            "KD-tree: {} triangles in {} nodes",
            entries.len(),
            nodes.len()
        );

        Self {
            nodes,
            triangles: entries,
        }
    }

    /// Flat node array; the root is at index 0 when the tree is not empty.
    pub fn nodes(&self) -> &[KdNode] {
        &self.nodes
    }

    /// Number of indexed triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Whether the tree holds no triangles.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Bounds of all triangles.
    pub fn bounds(&self) -> Aabb {
        self.nodes.first().map_or(Aabb::EMPTY, |n| n.bounds)
    }

    /// Triangles whose bounds overlap `region`, sorted by triangle index.
    pub fn query_aabb(&self, region: &Aabb) -> Vec<u32> {
        let mut hits = Vec::new();
        if self.nodes.is_empty() {
            return hits;
        }

        let mut stack = vec![0u32];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            if !node.bounds.intersects(region) {
                continue;
            }
            match node.kind {
                KdNodeKind::Internal { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
                KdNodeKind::Leaf { start, count } => {
                    let range = start as usize..(start + count) as usize;
                    hits.extend(
                        self.triangles[range]
                            .iter()
                            .filter(|t| t.bounds.intersects(region))
                            .map(|t| t.id),
                    );
                }
            }
        }

        hits.sort_unstable();
        hits
    }

    /// Closest triangle hit by the ray, if any. Both faces count.
    pub fn raycast(&self, origin: Vec3, direction: Vec3) -> Option<RayHit> {
        if self.nodes.is_empty() || direction.norm_squared() == 0.0 {
            return None;
        }

        let inv_direction = direction.map(|d| 1.0 / d);
        let mut best: Option<RayHit> = None;
        let mut stack = vec![0u32];

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            let limit = best.map_or(f32::INFINITY, |hit| hit.distance);
            if node.bounds.ray_entry(origin, inv_direction, limit).is_none() {
                continue;
            }
            match node.kind {
                KdNodeKind::Internal { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
                KdNodeKind::Leaf { start, count } => {
                    for entry in &self.triangles[start as usize..(start + count) as usize] {
                        if let Some((distance, u, v)) =
                            intersect_triangle(origin, direction, &entry.vertices)
                            && best.is_none_or(|hit| distance < hit.distance)
                        {
                            best = Some(RayHit {
                                triangle: entry.id,
                                distance,
                                barycentric: [u, v],
                            });
                        }
                    }
                }
            }
        }

        best
    }
}

fn build_recursive(nodes: &mut Vec<KdNode>, entries: &mut [TriangleEntry], start: usize) -> u32 {
    let mut bounds = Aabb::EMPTY;
    let mut centroid_bounds = Aabb::EMPTY;
    for entry in entries.iter() {
        bounds = bounds.merged(&entry.bounds);
        centroid_bounds.expand(entry.centroid);
    }

    let index = nodes.len() as u32;
    if entries.len() <= MAX_LEAF_TRIANGLES {
        nodes.push(KdNode {
            bounds,
            kind: KdNodeKind::Leaf {
                start: start as u32,
                count: entries.len() as u32,
            },
        });
        return index;
    }

    let axis = centroid_bounds.longest_axis();
    entries.sort_unstable_by(|a, b| {
        a.centroid[axis]
            .total_cmp(&b.centroid[axis])
            .then_with(|| a.id.cmp(&b.id))
    });

    // Reserve the slot so the parent precedes its children
    nodes.push(KdNode {
        bounds,
        kind: KdNodeKind::Leaf { start: 0, count: 0 },
    });

    let mid = entries.len() / 2;
    let (left_entries, right_entries) = entries.split_at_mut(mid);
    let left = build_recursive(nodes, left_entries, start);
    let right = build_recursive(nodes, right_entries, start + mid);

    nodes[index as usize].kind = KdNodeKind::Internal {
        left,
        right,
        axis: axis as u8,
    };
    index
}

/// Möller–Trumbore ray/triangle intersection, double-sided.
///
/// Returns `(t, u, v)` for hits in front of the origin.
fn intersect_triangle(origin: Vec3, direction: Vec3, v: &[Vec3; 3]) -> Option<(f32, f32, f32)> {
    const EPSILON: f32 = 1e-7;

    let edge1 = v[1] - v[0];
    let edge2 = v[2] - v[0];
    let p = direction.cross(&edge2);
    let det = edge1.dot(&p);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = origin - v[0];
    let u = s.dot(&p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let w = direction.dot(&q) * inv_det;
    if w < 0.0 || u + w > 1.0 {
        return None;
    }

    let t = edge2.dot(&q) * inv_det;
    (t > EPSILON).then_some((t, u, w))
}
