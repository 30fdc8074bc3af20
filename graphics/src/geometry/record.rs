//! Geometry records.
//!
//! A [`GeometryRecord`] owns the (possibly compressed) attribute arrays of one
//! mesh and the GPU buffers drawn from them. Non-combined records own private
//! vertex and index buffers; combined records hand their data to the pool for
//! their [`AttributeSignature`] and draw from its shared chunks.
//!
//! Everything derived from positions (bounds, ghost edges, pick geometry,
//! KD-tree) is computed on first access and cached until the positions change
//! or [`GeometryRecord::invalidate`] is called.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, MutexGuard};
use quartz_core::bounds::{Aabb, Obb};
use quartz_core::edges::{EdgeIndexBuilder, GhostEdges};
use quartz_core::kdtree::TriangleKdTree;
use quartz_core::math::{Mat3, Mat4};
use quartz_core::mesh::{IndexFormat, PrimitiveTopology};
use quartz_core::pick::{PickBufferBuilder, PickPositions, PickTriangles, PickVertices};

use super::events::GeometryObservers;
use super::pool::{CombinedBufferPool, CombinedBufferRegistry, VertexBufs};
use super::{
    AttributeKind, AttributeSignature, GeometryData, GeometryDescriptor, GeometryEvent,
    GeometryObserverId, NormalData, PositionData, UvData,
};
use crate::device::GraphicsDevice;
use crate::error::{GeometryError, GraphicsError};
use crate::resources::Buffer;
use crate::types::BufferUsage;

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a geometry record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(u64);

impl GeometryId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        Self(NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GeometryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "geometry#{}", self.0)
    }
}

/// GPU buffers of a geometry's pick geometry.
#[derive(Debug, Clone)]
pub struct PickBuffers {
    /// Per-triangle expanded positions; absent without triangles.
    pub triangle_positions: Option<Arc<Buffer>>,
    /// Per-triangle RGBA8 colors; absent without triangles.
    pub triangle_colors: Option<Arc<Buffer>>,
    /// Per-vertex positions.
    pub vertex_positions: Arc<Buffer>,
    /// Per-vertex RGBA8 colors.
    pub vertex_colors: Arc<Buffer>,
}

impl PickBuffers {
    fn is_current(&self) -> bool {
        [&self.triangle_positions, &self.triangle_colors]
            .into_iter()
            .flatten()
            .chain([&self.vertex_positions, &self.vertex_colors])
            .all(|b| b.is_current())
    }
}

#[derive(Debug, Default)]
struct PrivateBuffers {
    vertex: VertexBufs,
    indices: Option<Arc<Buffer>>,
}

impl PrivateBuffers {
    fn is_current(&self) -> bool {
        self.vertex.is_current() && self.indices.as_ref().is_none_or(|b| b.is_current())
    }
}

/// Lazily computed data derived from the attribute arrays.
#[derive(Default)]
struct DerivedCache {
    positions: OnceLock<Vec<f32>>,
    normals: OnceLock<Vec<f32>>,
    uv: OnceLock<Vec<f32>>,
    aabb: OnceLock<Aabb>,
    obb: OnceLock<Obb>,
    ghost_edges: OnceLock<GhostEdges>,
    pick_triangles: OnceLock<PickTriangles>,
    pick_vertices: OnceLock<PickVertices>,
    kd_tree: OnceLock<TriangleKdTree>,
    // (index offset, buffer, index width of the buffer)
    ghost_edges_buffer: Mutex<Option<(u32, Arc<Buffer>, IndexFormat)>>,
    pick_buffers: Mutex<Option<PickBuffers>>,
}

/// One mesh: its attribute arrays, GPU buffers and derived data.
///
/// # Example
///
/// ```ignore
/// let registry = CombinedBufferRegistry::new(device.clone());
/// let geometry = GeometryRecord::new(
///     &device,
///     &registry,
///     GeometryDescriptor::from(generate_box([1.0, 1.0, 1.0])).with_combined(true),
/// )?;
///
/// let bufs = geometry.vertex_bufs();
/// let edges = geometry.ghost_edges_buffer()?;
/// ```
pub struct GeometryRecord {
    id: GeometryId,
    device: Arc<GraphicsDevice>,
    label: Option<String>,
    data: Arc<GeometryData>,
    combined: bool,
    ghost_edge_threshold: f32,
    renderable: bool,
    index_format: Option<IndexFormat>,
    signature: AttributeSignature,
    topology_hash: String,
    pool: Option<Arc<Mutex<CombinedBufferPool>>>,
    buffers: Mutex<PrivateBuffers>,
    cache: DerivedCache,
    observers: GeometryObservers,
}

impl GeometryRecord {
    /// Build a record from caller-supplied arrays.
    ///
    /// Attributes are compressed when `descriptor.quantized` is set. A
    /// combined record registers with the registry's pool for its layout; any
    /// other record uploads private buffers right away.
    ///
    /// Indices needing 32-bit storage on a device without 32-bit index
    /// support are logged; the record is still built but is not renderable
    /// and has no index buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if positions or indices are missing, an attribute
    /// array has the wrong length, the registry belongs to another device,
    /// or buffer creation fails.
    pub fn new(
        device: &Arc<GraphicsDevice>,
        registry: &CombinedBufferRegistry,
        descriptor: GeometryDescriptor,
    ) -> Result<Self, GeometryError> {
        quartz_core::profile_function!();

        let data = GeometryData::from_descriptor(&descriptor).inspect_err(|e| {
            log::error!("Geometry {:?} rejected: {e}", descriptor.label);
        })?;

        if descriptor.combined && !Arc::ptr_eq(registry.device(), device) {
            return Err(GraphicsError::InvalidParameter(
                "combined buffer registry belongs to a different device".to_string(),
            )
            .into());
        }

        let id = GeometryId::next();
        let signature = data.signature();
        let max_index = data.max_index();

        let mut index_format = device.capabilities().index_format_for(max_index);
        let renderable = index_format.is_some();
        if !renderable {
            log::error!(
                "{id}: {}; geometry will not be rendered",
                GeometryError::WideIndicesUnsupported {
                    max_index,
                    required: IndexFormat::Uint32,
                }
            );
        }

        let data = Arc::new(data);
        let mut pool = None;
        let mut buffers = PrivateBuffers::default();

        if descriptor.combined {
            let shared = registry.pool_for(signature);
            {
                let mut guard = shared.lock();
                if renderable {
                    guard.add(id, Arc::clone(&data), descriptor.label.clone())?;
                    index_format = Some(guard.index_format());
                }
            }
            pool = Some(shared);
        } else {
            buffers = upload_private(device, &data, descriptor.label.as_deref(), index_format)?;
        }

        log::trace!(
            "{id}: created {} ({} vertices, {} indices, combined={})",
            signature.topology_hash(),
            data.vertex_count(),
            data.indices.len(),
            descriptor.combined
        );

        Ok(Self {
            id,
            device: Arc::clone(device),
            label: descriptor.label,
            data,
            combined: descriptor.combined,
            ghost_edge_threshold: descriptor.ghost_edge_threshold,
            renderable,
            index_format,
            signature,
            topology_hash: signature.topology_hash(),
            pool,
            buffers: Mutex::new(buffers),
            cache: DerivedCache::default(),
            observers: GeometryObservers::default(),
        })
    }

    /// Record identity.
    pub fn id(&self) -> GeometryId {
        self.id
    }

    /// Debug label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Device the record's buffers live on.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Stored attribute arrays.
    pub fn data(&self) -> &GeometryData {
        &self.data
    }

    /// Primitive topology.
    pub fn primitive(&self) -> PrimitiveTopology {
        self.data.primitive
    }

    /// Whether positions, normals and UVs are compressed.
    pub fn is_quantized(&self) -> bool {
        self.data.quantized
    }

    /// Whether the record draws from a combined pool.
    pub fn is_combined(&self) -> bool {
        self.combined
    }

    /// False when the indices cannot be drawn on this device.
    pub fn is_renderable(&self) -> bool {
        self.renderable
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.data.vertex_count()
    }

    /// Ghost edge threshold in degrees.
    pub fn ghost_edge_threshold(&self) -> f32 {
        self.ghost_edge_threshold
    }

    /// Layout signature.
    pub fn signature(&self) -> AttributeSignature {
        self.signature
    }

    /// Layout summary such as `/g/triangles/p/n/u/q`.
    pub fn topology_hash(&self) -> &str {
        &self.topology_hash
    }

    /// Positions as floats, decoded once and cached if quantized.
    pub fn positions(&self) -> &[f32] {
        match &self.data.positions {
            PositionData::Float(values) => values.as_slice(),
            quantized => self
                .cache
                .positions
                .get_or_init(|| quantized.to_floats())
                .as_slice(),
        }
    }

    /// Unit normals as floats, decoded once and cached if oct-encoded.
    pub fn normals(&self) -> Option<&[f32]> {
        match self.data.normals.as_ref()? {
            NormalData::Float(values) => Some(values.as_slice()),
            encoded => Some(self.cache.normals.get_or_init(|| encoded.to_floats()).as_slice()),
        }
    }

    /// Texture coordinates as floats, decoded once and cached if quantized.
    pub fn uv(&self) -> Option<&[f32]> {
        match self.data.uv.as_ref()? {
            UvData::Float(values) => Some(values.as_slice()),
            quantized => Some(self.cache.uv.get_or_init(|| quantized.to_floats()).as_slice()),
        }
    }

    /// Vertex colors.
    pub fn colors(&self) -> Option<&[f32]> {
        self.data.colors.as_deref()
    }

    /// Primitive indices as supplied.
    pub fn indices(&self) -> &[u32] {
        &self.data.indices
    }

    /// Positions decode matrix, if quantized.
    pub fn positions_decode_matrix(&self) -> Option<&Mat4> {
        self.data.positions.decode_matrix()
    }

    /// UV decode matrix, if quantized and UVs are present.
    pub fn uv_decode_matrix(&self) -> Option<&Mat3> {
        self.data.uv.as_ref().and_then(UvData::decode_matrix)
    }

    /// Local-space bounding box.
    pub fn aabb(&self) -> Aabb {
        *self
            .cache
            .aabb
            .get_or_init(|| Aabb::from_positions(self.positions()))
    }

    /// Local-space oriented bounding box.
    ///
    /// Quantized records take the box of the quantized values and carry it
    /// through the decode matrix.
    pub fn obb(&self) -> Obb {
        *self.cache.obb.get_or_init(|| match &self.data.positions {
            PositionData::Quantized { values, decode } => {
                let raw: Vec<f32> = values.iter().map(|&v| f32::from(v)).collect();
                Obb::from_aabb(&Aabb::from_positions(&raw)).transformed(decode)
            }
            PositionData::Float(_) => Obb::from_aabb(&self.aabb()),
        })
    }

    /// Ghost edges in the record's own vertex numbering.
    pub fn ghost_edge_indices(&self) -> &GhostEdges {
        self.cache.ghost_edges.get_or_init(|| {
            EdgeIndexBuilder::new(self.ghost_edge_threshold).build(
                self.data.positions.source(),
                self.data.primitive,
                &self.data.indices,
            )
        })
    }

    /// Ghost edges uploaded as a line-list index buffer, with the index
    /// format the buffer is encoded in.
    ///
    /// Combined records get their pool offset added so the buffer draws
    /// against the shared chunk. The format follows the largest shifted
    /// index, so it can differ from both [`index_format`](Self::index_format)
    /// and the local [`ghost_edge_indices`](Self::ghost_edge_indices) format.
    /// Returns `None` when there are no edges, the record is not placed, or
    /// the device cannot hold the edge indices.
    ///
    /// # Errors
    ///
    /// Returns an error if buffer creation fails.
    pub fn ghost_edges_buffer(
        &self,
    ) -> Result<Option<(Arc<Buffer>, IndexFormat)>, GeometryError> {
        let offset = if self.combined {
            match self.index_offset() {
                Some(offset) => offset,
                None => return Ok(None),
            }
        } else {
            0
        };

        let mut cached = self.cache.ghost_edges_buffer.lock();
        if let Some((cached_offset, buffer, format)) = cached.as_ref()
            && *cached_offset == offset
            && buffer.is_current()
        {
            return Ok(Some((Arc::clone(buffer), *format)));
        }

        let shifted;
        let edges = if offset == 0 {
            self.ghost_edge_indices()
        } else {
            shifted = EdgeIndexBuilder::new(self.ghost_edge_threshold)
                .with_offset(offset)
                .build(
                    self.data.positions.source(),
                    self.data.primitive,
                    &self.data.indices,
                );
            &shifted
        };

        if edges.is_empty() {
            *cached = None;
            return Ok(None);
        }
        if edges.format == IndexFormat::Uint32 && !self.device.capabilities().wide_indices {
            log::error!(
                "{}: ghost edges need 32-bit indices, which the device does not support",
                self.id
            );
            *cached = None;
            return Ok(None);
        }

        let buffer = self.device.create_buffer_with_data(
            BufferUsage::GEOMETRY_INDEX,
            Some(&self.buffer_label("ghost edges")),
            &edges.to_bytes(),
        )?;
        *cached = Some((offset, Arc::clone(&buffer), edges.format));
        Ok(Some((buffer, edges.format)))
    }

    fn pick_triangles(&self) -> &PickTriangles {
        self.cache.pick_triangles.get_or_init(|| {
            PickBufferBuilder::new(self.data.positions.source())
                .build_triangles(self.data.primitive, &self.data.indices)
        })
    }

    fn pick_vertices(&self) -> &PickVertices {
        self.cache.pick_vertices.get_or_init(|| {
            PickBufferBuilder::new(self.data.positions.source()).build_vertices()
        })
    }

    /// Per-triangle pick positions, in the record's position representation.
    pub fn pick_triangle_positions(&self) -> &PickPositions {
        &self.pick_triangles().positions
    }

    /// Per-triangle pick colors, RGBA8 per expanded vertex.
    pub fn pick_triangle_colors(&self) -> &[u8] {
        &self.pick_triangles().colors
    }

    /// Per-vertex pick positions.
    pub fn pick_vertex_positions(&self) -> &PickPositions {
        &self.pick_vertices().positions
    }

    /// Per-vertex pick colors.
    pub fn pick_vertex_colors(&self) -> &[u8] {
        &self.pick_vertices().colors
    }

    /// Pick geometry uploaded to GPU buffers.
    ///
    /// Pick buffers are private to the record even when it is combined.
    ///
    /// # Errors
    ///
    /// Returns an error if buffer creation fails.
    pub fn pick_buffers(&self) -> Result<PickBuffers, GeometryError> {
        let mut cached = self.cache.pick_buffers.lock();
        if let Some(buffers) = cached.as_ref()
            && buffers.is_current()
        {
            return Ok(buffers.clone());
        }

        let triangles = self.pick_triangles();
        let vertices = self.pick_vertices();
        let upload = |what: &str, bytes: &[u8]| {
            self.device.create_buffer_with_data(
                BufferUsage::GEOMETRY_VERTEX,
                Some(&self.buffer_label(what)),
                bytes,
            )
        };

        let (triangle_positions, triangle_colors) = if triangles.colors.is_empty() {
            (None, None)
        } else {
            (
                Some(upload("pick triangle positions", triangles.positions.to_bytes())?),
                Some(upload("pick triangle colors", &triangles.colors)?),
            )
        };
        let buffers = PickBuffers {
            triangle_positions,
            triangle_colors,
            vertex_positions: upload("pick vertex positions", vertices.positions.to_bytes())?,
            vertex_colors: upload("pick vertex colors", &vertices.colors)?,
        };

        *cached = Some(buffers.clone());
        Ok(buffers)
    }

    /// Triangle KD-tree for CPU-side picking and region queries.
    pub fn kd_tree(&self) -> &TriangleKdTree {
        self.cache.kd_tree.get_or_init(|| {
            let triangles = self
                .data
                .primitive
                .to_triangle_list(&self.data.indices)
                .unwrap_or_default();
            TriangleKdTree::build(self.data.positions.source(), &triangles)
        })
    }

    /// Vertex buffers to draw from; the null set if not placed.
    pub fn vertex_bufs(&self) -> VertexBufs {
        match &self.pool {
            Some(pool) => pool.lock().vertex_bufs(self.id),
            None => self.private_buffers().vertex.clone(),
        }
    }

    /// Index buffer to draw with.
    pub fn index_buffer(&self) -> Option<Arc<Buffer>> {
        match &self.pool {
            Some(pool) => pool.lock().index_buffer(self.id),
            None => self.private_buffers().indices.clone(),
        }
    }

    /// Offset of the first vertex inside the bound vertex buffers.
    ///
    /// Always `0` for private buffers; `None` if the record cannot be drawn.
    pub fn index_offset(&self) -> Option<u32> {
        match &self.pool {
            Some(pool) => pool.lock().indices_offset(self.id),
            None => self.renderable.then_some(0),
        }
    }

    /// Format of [`index_buffer`](Self::index_buffer).
    pub fn index_format(&self) -> Option<IndexFormat> {
        self.index_format
    }

    /// Why the pool could not place this record, if it could not.
    pub fn placement_error(&self) -> Option<GeometryError> {
        self.pool
            .as_ref()
            .and_then(|pool| pool.lock().placement_error(self.id))
    }

    /// Replace positions. Only non-quantized records accept this.
    ///
    /// Every derived cache is dropped and observers receive
    /// [`GeometryEvent::BoundaryChanged`].
    ///
    /// # Errors
    ///
    /// [`GeometryError::QuantizedAttributeImmutable`] for quantized records,
    /// [`GeometryError::LengthMismatch`] if the length differs, or a buffer
    /// write error.
    pub fn set_positions(&mut self, positions: Vec<f32>) -> Result<(), GeometryError> {
        self.check_update(AttributeKind::Positions, positions.len())?;
        Arc::make_mut(&mut self.data).positions = PositionData::Float(positions);
        self.cache = DerivedCache::default();
        self.observers.emit(GeometryEvent::BoundaryChanged);
        self.upload(AttributeKind::Positions)
    }

    /// Replace normals. Only non-quantized records with normals accept this.
    ///
    /// # Errors
    ///
    /// Same as [`set_positions`](Self::set_positions), plus
    /// [`GeometryError::MissingAttribute`] if the record has no normals.
    pub fn set_normals(&mut self, normals: Vec<f32>) -> Result<(), GeometryError> {
        self.check_update(AttributeKind::Normals, normals.len())?;
        Arc::make_mut(&mut self.data).normals = Some(NormalData::Float(normals));
        self.invalidate_attribute(AttributeKind::Normals);
        self.upload(AttributeKind::Normals)
    }

    /// Replace texture coordinates. Only non-quantized records with UVs accept this.
    ///
    /// # Errors
    ///
    /// Same as [`set_normals`](Self::set_normals).
    pub fn set_uv(&mut self, uv: Vec<f32>) -> Result<(), GeometryError> {
        self.check_update(AttributeKind::Uv, uv.len())?;
        Arc::make_mut(&mut self.data).uv = Some(UvData::Float(uv));
        self.invalidate_attribute(AttributeKind::Uv);
        self.upload(AttributeKind::Uv)
    }

    /// Replace vertex colors. Colors are never quantized, so any record with
    /// colors accepts this.
    ///
    /// # Errors
    ///
    /// [`GeometryError::MissingAttribute`] if the record has no colors,
    /// [`GeometryError::LengthMismatch`] if the length differs, or a buffer
    /// write error.
    pub fn set_colors(&mut self, colors: Vec<f32>) -> Result<(), GeometryError> {
        self.check_update(AttributeKind::Colors, colors.len())?;
        Arc::make_mut(&mut self.data).colors = Some(colors);
        self.invalidate_attribute(AttributeKind::Colors);
        self.upload(AttributeKind::Colors)
    }

    /// Drop every derived cache; each is recomputed on next access.
    pub fn invalidate(&mut self) {
        self.cache = DerivedCache::default();
    }

    /// Register an observer for this record's events.
    pub fn observe(
        &mut self,
        observer: impl Fn(GeometryEvent) + Send + Sync + 'static,
    ) -> GeometryObserverId {
        self.observers.add(observer)
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unobserve(&mut self, id: GeometryObserverId) -> bool {
        self.observers.remove(id)
    }

    /// Recreate private GPU buffers after a context restore.
    ///
    /// Shared chunks of combined records are rebuilt by
    /// [`CombinedBufferRegistry::on_context_restored`]; this only drops the
    /// record's own derived buffers.
    ///
    /// # Errors
    ///
    /// Returns an error if buffer creation fails.
    pub fn on_context_restored(&mut self) -> Result<(), GeometryError> {
        *self.cache.ghost_edges_buffer.lock() = None;
        *self.cache.pick_buffers.lock() = None;

        if self.pool.is_none() {
            *self.buffers.get_mut() = upload_private(
                &self.device,
                &self.data,
                self.label.as_deref(),
                self.private_index_format(),
            )?;
            log::debug!("{}: private buffers rebuilt after context restore", self.id);
        }
        Ok(())
    }

    /// Destroy the record, releasing private buffers or leaving its pool.
    pub fn destroy(self) {
        drop(self);
    }

    fn check_update(&self, kind: AttributeKind, len: usize) -> Result<(), GeometryError> {
        let result = if self.data.quantized && kind != AttributeKind::Colors {
            Err(GeometryError::QuantizedAttributeImmutable(kind))
        } else if self.data.attribute_bytes(kind).is_none() {
            Err(GeometryError::MissingAttribute(kind))
        } else {
            let expected = self.data.vertex_count() * kind.components();
            if len == expected {
                Ok(())
            } else {
                Err(GeometryError::LengthMismatch {
                    kind,
                    expected,
                    actual: len,
                })
            }
        };
        result.inspect_err(|e| log::error!("{}: {e}", self.id))
    }

    fn invalidate_attribute(&mut self, kind: AttributeKind) {
        match kind {
            AttributeKind::Normals => {
                self.cache.normals.take();
            }
            AttributeKind::Uv => {
                self.cache.uv.take();
            }
            _ => {}
        }
        self.cache.aabb.take();
        self.cache.obb.take();
    }

    fn upload(&self, kind: AttributeKind) -> Result<(), GeometryError> {
        if let Some(pool) = &self.pool {
            return pool.lock().update(self.id, Arc::clone(&self.data), kind);
        }

        let buffers = self.private_buffers();
        let (Some(buffer), Some(bytes)) =
            (buffers.vertex.get(kind), self.data.attribute_bytes(kind))
        else {
            return Ok(());
        };
        if !buffer.is_current() {
            // Context lost; re-uploaded from the new data once it is restored
            return Ok(());
        }
        self.device.write_buffer(buffer, 0, bytes)?;
        Ok(())
    }

    fn private_index_format(&self) -> Option<IndexFormat> {
        self.renderable.then_some(self.index_format).flatten()
    }

    /// Private buffers, re-uploaded first if they predate the current context.
    fn private_buffers(&self) -> MutexGuard<'_, PrivateBuffers> {
        let mut buffers = self.buffers.lock();
        if buffers.is_current() {
            return buffers;
        }
        if self.device.is_context_lost() {
            log::warn!("{}: context lost, returning stale buffers", self.id);
            return buffers;
        }

        match upload_private(
            &self.device,
            &self.data,
            self.label.as_deref(),
            self.private_index_format(),
        ) {
            Ok(rebuilt) => {
                *buffers = rebuilt;
                log::debug!(
                    "{}: private buffers rebuilt for context generation {}",
                    self.id,
                    self.device.context_generation()
                );
            }
            Err(err) => log::error!("{}: failed to rebuild private buffers: {err}", self.id),
        }
        buffers
    }

    fn buffer_label(&self, what: &str) -> String {
        format!("{} {what}", self.label.as_deref().unwrap_or("geometry"))
    }
}

/// Upload every present attribute, plus indices when `index_format` is set.
fn upload_private(
    device: &GraphicsDevice,
    data: &GeometryData,
    label: Option<&str>,
    index_format: Option<IndexFormat>,
) -> Result<PrivateBuffers, GeometryError> {
    let label = label.unwrap_or("geometry");
    let mut vertex = VertexBufs {
        quantized: data.quantized,
        ..VertexBufs::default()
    };

    for kind in AttributeKind::VERTEX_ATTRIBUTES {
        if let Some(bytes) = data.attribute_bytes(kind) {
            let buffer = device.create_buffer_with_data(
                BufferUsage::GEOMETRY_VERTEX,
                Some(&format!("{label} {kind}")),
                bytes,
            )?;
            vertex.set(kind, buffer);
        }
    }

    let indices = match index_format {
        Some(format) => Some(device.create_buffer_with_data(
            BufferUsage::GEOMETRY_INDEX,
            Some(&format!("{label} indices")),
            &format.encode(&data.indices),
        )?),
        None => None,
    };

    Ok(PrivateBuffers { vertex, indices })
}

impl Drop for GeometryRecord {
    fn drop(&mut self) {
        self.observers.emit(GeometryEvent::Destroyed);
        if let Some(pool) = &self.pool {
            pool.lock().remove(self.id);
        }
        log::trace!("{}: destroyed", self.id);
    }
}

impl fmt::Debug for GeometryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeometryRecord")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("topology", &self.topology_hash)
            .field("vertices", &self.data.vertex_count())
            .field("indices", &self.data.indices.len())
            .field("combined", &self.combined)
            .field("renderable", &self.renderable)
            .field("observers", &self.observers)
            .finish()
    }
}

// Ensure GeometryRecord is Send + Sync
static_assertions::assert_impl_all!(GeometryRecord: Send, Sync);
