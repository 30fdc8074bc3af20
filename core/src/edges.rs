//! Ghost edge (wireframe) index derivation.
//!
//! An edge is drawn when it lies on a boundary or when the two triangles
//! meeting at it bend by more than the threshold angle. Edges between
//! near-coplanar faces are dropped, so a flat quad shows its outline but not
//! its diagonal.
//!
//! Coincident vertices are welded before adjacency is computed. Meshes with
//! split normals duplicate vertices along creases, and without welding every
//! crease would look like a boundary.

use std::collections::HashMap;

use crate::compression::PositionSource;
use crate::math::{Vec3, normalize_or_zero};
use crate::mesh::{IndexFormat, PrimitiveTopology};

/// Default dihedral angle threshold in degrees.
pub const DEFAULT_GHOST_EDGE_THRESHOLD: f32 = 2.0;

/// Line-list indices of the ghost edges of a mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GhostEdges {
    /// Pairs of vertex indices, offset applied.
    pub indices: Vec<u32>,
    /// Narrowest format able to hold the largest index.
    pub format: IndexFormat,
}

impl GhostEdges {
    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.indices.len() / 2
    }

    /// Whether no edge survived.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The indices encoded in [`format`](Self::format).
    pub fn to_bytes(&self) -> Vec<u8> {
        self.format.encode(&self.indices)
    }
}

#[derive(Debug)]
struct EdgeEntry {
    /// Original (unwelded) indices of the first occurrence.
    first: [u32; 2],
    faces: u32,
    normals: [Vec3; 2],
}

/// Builds ghost edge indices from triangle topology.
#[derive(Debug, Clone, Copy)]
pub struct EdgeIndexBuilder {
    threshold_degrees: f32,
    offset: u32,
}

impl Default for EdgeIndexBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_GHOST_EDGE_THRESHOLD)
    }
}

impl EdgeIndexBuilder {
    /// Create a builder with the given dihedral threshold in degrees.
    pub fn new(threshold_degrees: f32) -> Self {
        Self {
            threshold_degrees,
            offset: 0,
        }
    }

    /// Add `offset` to every output index (geometries inside a combined buffer).
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// The threshold angle in degrees.
    pub fn threshold_degrees(&self) -> f32 {
        self.threshold_degrees
    }

    /// Build ghost edges for any primitive topology.
    ///
    /// Strips and fans are expanded to triangle lists first. Point and line
    /// topologies have no faces and produce no edges.
    pub fn build(
        &self,
        positions: PositionSource<'_>,
        topology: PrimitiveTopology,
        indices: &[u32],
    ) -> GhostEdges {
        match topology.to_triangle_list(indices) {
            Some(triangles) => self.build_triangles(positions, &triangles),
            None => GhostEdges::default(),
        }
    }

    /// Build ghost edges for a triangle list.
    pub fn build_triangles(&self, positions: PositionSource<'_>, triangles: &[u32]) -> GhostEdges {
        crate::profile_function!();

        let vertex_count = positions.vertex_count();
        let welded = weld_vertices(&positions);
        let cos_threshold = self.threshold_degrees.to_radians().cos();

        let mut lookup: HashMap<(u32, u32), usize> = HashMap::new();
        let mut edges: Vec<EdgeEntry> = Vec::new();
        let mut skipped = 0usize;

        for tri in triangles.chunks_exact(3) {
            if tri.iter().any(|&i| i as usize >= vertex_count) {
                skipped += 1;
                continue;
            }
            let a = positions.position(tri[0] as usize);
            let b = positions.position(tri[1] as usize);
            let c = positions.position(tri[2] as usize);
            let normal = normalize_or_zero((c - b).cross(&(a - b)));

            for (i0, i1) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                let w0 = welded[i0 as usize];
                let w1 = welded[i1 as usize];
                let key = if w0 < w1 { (w0, w1) } else { (w1, w0) };

                match lookup.get(&key) {
                    Some(&slot) => {
                        let entry = &mut edges[slot];
                        if entry.faces < 2 {
                            entry.normals[entry.faces as usize] = normal;
                        }
                        entry.faces += 1;
                    }
                    None => {
                        lookup.insert(key, edges.len());
                        edges.push(EdgeEntry {
                            first: [i0, i1],
                            faces: 1,
                            normals: [normal, Vec3::zeros()],
                        });
                    }
                }
            }
        }

        if skipped > 0 {
            log::warn!("Ghost edges: skipped {skipped} triangles with out-of-range indices");
        }

        let mut indices = Vec::new();
        for entry in &edges {
            let keep = match entry.faces {
                1 => true,
                2 => entry.normals[0].dot(&entry.normals[1]) <= cos_threshold,
                // Non-manifold: more than two faces meet here
                _ => true,
            };
            if keep {
                indices.push(entry.first[0] + self.offset);
                indices.push(entry.first[1] + self.offset);
            }
        }

        let max_index = indices.iter().copied().max().unwrap_or(0);
        log::trace!(
            "Ghost edges: {} of {} edges kept (threshold {} deg)",
            indices.len() / 2,
            edges.len(),
            self.threshold_degrees
        );

        GhostEdges {
            indices,
            format: IndexFormat::for_max_index(max_index),
        }
    }
}

/// Map every vertex to the first vertex sharing its weld key.
fn weld_vertices(positions: &PositionSource<'_>) -> Vec<u32> {
    let count = positions.vertex_count();
    let mut first_by_key: HashMap<[i64; 3], u32> = HashMap::with_capacity(count);
    (0..count)
        .map(|i| *first_by_key.entry(positions.weld_key(i)).or_insert(i as u32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::quantize_positions;
    use crate::mesh::generators::{generate_box, generate_quad};
    use std::collections::HashSet;

    fn edge_set(indices: &[u32]) -> HashSet<(u32, u32)> {
        indices
            .chunks_exact(2)
            .map(|e| (e[0].min(e[1]), e[0].max(e[1])))
            .collect()
    }

    #[test]
    fn test_single_triangle_has_three_edges() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let edges =
            EdgeIndexBuilder::default().build_triangles(PositionSource::Float(&positions), &[0, 1, 2]);

        assert_eq!(edges.indices, vec![0, 1, 1, 2, 2, 0]);
        assert_eq!(edges.format, IndexFormat::Uint16);
    }

    #[test]
    fn test_coplanar_shared_edge_suppressed() {
        let quad = generate_quad(1.0, 1.0);
        let positions = quad.positions.unwrap();
        let edges = EdgeIndexBuilder::new(2.0)
            .build_triangles(PositionSource::Float(&positions), &quad.indices.unwrap());

        let set = edge_set(&edges.indices);
        assert_eq!(edges.edge_count(), 4);
        assert!(!set.contains(&(0, 2)));
    }

    #[test]
    fn test_folded_shared_edge_kept() {
        // Two triangles sharing edge 0-1, folded to 90 degrees
        let positions = [
            0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, //
            0.0, 0.0, 1.0,
        ];
        let edges = EdgeIndexBuilder::new(2.0)
            .build_triangles(PositionSource::Float(&positions), &[0, 1, 2, 1, 0, 3]);

        let set = edge_set(&edges.indices);
        assert!(set.contains(&(0, 1)));
        assert_eq!(edges.edge_count(), 5);
    }

    #[test]
    fn test_box_split_vertices_are_welded() {
        let mesh = generate_box([1.0, 1.0, 1.0]);
        let positions = mesh.positions.unwrap();
        let edges = EdgeIndexBuilder::default()
            .build_triangles(PositionSource::Float(&positions), &mesh.indices.unwrap());

        // 12 cube edges, no face diagonals
        assert_eq!(edges.edge_count(), 12);
    }

    #[test]
    fn test_quantized_positions() {
        let mesh = generate_box([2.0, 1.0, 0.5]);
        let q = quantize_positions(mesh.positions.as_ref().unwrap());
        let source = PositionSource::Quantized {
            values: &q.values,
            decode: &q.decode,
        };
        let edges = EdgeIndexBuilder::default().build_triangles(source, mesh.indices.as_ref().unwrap());
        assert_eq!(edges.edge_count(), 12);
    }

    #[test]
    fn test_non_manifold_edge_kept() {
        // Three coplanar-ish fins share edge 0-1
        let positions = [
            0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, //
            0.0, -1.0, 0.0, //
            0.0, 2.0, 0.0,
        ];
        let edges = EdgeIndexBuilder::new(2.0).build_triangles(
            PositionSource::Float(&positions),
            &[0, 1, 2, 1, 0, 3, 0, 1, 4],
        );
        assert!(edge_set(&edges.indices).contains(&(0, 1)));
    }

    #[test]
    fn test_offset_and_wide_format() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let edges = EdgeIndexBuilder::default()
            .with_offset(70_000)
            .build_triangles(PositionSource::Float(&positions), &[0, 1, 2]);

        assert_eq!(edges.indices[0], 70_000);
        assert_eq!(edges.format, IndexFormat::Uint32);
        assert_eq!(edges.to_bytes().len(), 6 * 4);
    }

    #[test]
    fn test_strip_and_line_topologies() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0];
        let builder = EdgeIndexBuilder::default();
        let source = PositionSource::Float(&positions);

        let strip = builder.build(source, PrimitiveTopology::TriangleStrip, &[0, 1, 2, 3]);
        assert_eq!(strip.edge_count(), 4);

        let lines = builder.build(source, PrimitiveTopology::LineList, &[0, 1, 2, 3]);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_out_of_range_triangle_skipped() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let edges = EdgeIndexBuilder::default()
            .build_triangles(PositionSource::Float(&positions), &[0, 1, 2, 0, 1, 7]);
        assert_eq!(edges.edge_count(), 3);
    }
}
