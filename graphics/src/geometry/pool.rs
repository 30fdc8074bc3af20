//! Combined buffer pools.
//!
//! Many small geometries with the same vertex layout are packed into shared
//! vertex buffers ("chunks") so a renderer can bind one buffer set for all of
//! them. Every geometry keeps its own index buffer, rewritten with the offset
//! of its first vertex inside the chunk.
//!
//! Pools rebuild lazily: adding or removing a geometry only marks the pool
//! dirty, and the next query repacks every entry in insertion order. A
//! context restore invalidates all chunks and forces a rebuild.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use quartz_core::mesh::IndexFormat;
use quartz_core::scratch::Scratch;

use super::data::vertex_stride;
use super::{AttributeKind, AttributeSignature, GeometryData, GeometryId};
use crate::device::GraphicsDevice;
use crate::error::GeometryError;
use crate::resources::Buffer;
use crate::types::BufferUsage;

/// Default chunk capacity in vertices, before clamping by the index format.
pub const DEFAULT_MAX_CHUNK_VERTICES: u32 = 5_000_000;

/// Combined pool settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Upper bound on vertices per chunk. Always clamped to what the
    /// pool's index format can address.
    pub max_chunk_vertices: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_chunk_vertices: DEFAULT_MAX_CHUNK_VERTICES,
        }
    }
}

impl PoolConfig {
    /// Set the chunk capacity.
    pub fn with_max_chunk_vertices(mut self, vertices: u32) -> Self {
        self.max_chunk_vertices = vertices;
        self
    }
}

/// Vertex buffers a geometry is drawn from.
///
/// The default value is the null set returned for unknown or unplaced
/// geometries.
#[derive(Debug, Clone, Default)]
pub struct VertexBufs {
    /// Positions buffer.
    pub positions: Option<Arc<Buffer>>,
    /// Normals buffer.
    pub normals: Option<Arc<Buffer>>,
    /// Texture coordinate buffer.
    pub uv: Option<Arc<Buffer>>,
    /// Colors buffer.
    pub colors: Option<Arc<Buffer>>,
    /// Whether the buffers hold compressed attributes.
    pub quantized: bool,
}

impl VertexBufs {
    /// Whether no buffer is set.
    pub fn is_null(&self) -> bool {
        self.positions.is_none()
    }

    /// The buffer holding `kind`, if any.
    pub fn get(&self, kind: AttributeKind) -> Option<&Arc<Buffer>> {
        match kind {
            AttributeKind::Positions => self.positions.as_ref(),
            AttributeKind::Normals => self.normals.as_ref(),
            AttributeKind::Uv => self.uv.as_ref(),
            AttributeKind::Colors => self.colors.as_ref(),
            AttributeKind::Indices => None,
        }
    }

    /// Whether every set buffer is alive in the current context.
    pub fn is_current(&self) -> bool {
        [&self.positions, &self.normals, &self.uv, &self.colors]
            .into_iter()
            .flatten()
            .all(|b| b.is_current())
    }

    pub(crate) fn set(&mut self, kind: AttributeKind, buffer: Arc<Buffer>) {
        match kind {
            AttributeKind::Positions => self.positions = Some(buffer),
            AttributeKind::Normals => self.normals = Some(buffer),
            AttributeKind::Uv => self.uv = Some(buffer),
            AttributeKind::Colors => self.colors = Some(buffer),
            AttributeKind::Indices => {}
        }
    }

    pub(crate) fn memory(&self) -> u64 {
        [&self.positions, &self.normals, &self.uv, &self.colors]
            .into_iter()
            .flatten()
            .map(|b| b.size())
            .sum()
    }
}

#[derive(Debug)]
struct Placement {
    chunk: usize,
    vertex_offset: u32,
    adjusted_indices: Vec<u32>,
    index_buffer: Option<Arc<Buffer>>,
}

#[derive(Debug)]
struct PoolEntry {
    id: GeometryId,
    data: Arc<GeometryData>,
    label: Option<String>,
    placement: Option<Placement>,
    error: Option<GeometryError>,
}

#[derive(Debug)]
struct Chunk {
    buffers: VertexBufs,
    vertex_count: u32,
}

/// Per-attribute byte accumulation for the chunk being filled.
#[derive(Debug, Default)]
struct Staging {
    positions: Scratch<Vec<u8>>,
    normals: Scratch<Vec<u8>>,
    uv: Scratch<Vec<u8>>,
    colors: Scratch<Vec<u8>>,
}

impl Staging {
    fn slot(&mut self, kind: AttributeKind) -> Option<&mut Scratch<Vec<u8>>> {
        match kind {
            AttributeKind::Positions => Some(&mut self.positions),
            AttributeKind::Normals => Some(&mut self.normals),
            AttributeKind::Uv => Some(&mut self.uv),
            AttributeKind::Colors => Some(&mut self.colors),
            AttributeKind::Indices => None,
        }
    }

    fn release(&mut self) {
        self.positions.release();
        self.normals.release();
        self.uv.release();
        self.colors.release();
    }
}

/// Shared vertex buffers for geometries with one [`AttributeSignature`].
pub struct CombinedBufferPool {
    device: Arc<GraphicsDevice>,
    signature: AttributeSignature,
    index_format: IndexFormat,
    capacity: u32,
    entries: Vec<PoolEntry>,
    chunks: Vec<Chunk>,
    dirty: bool,
    generation: u64,
    staging: Staging,
}

impl CombinedBufferPool {
    /// Create an empty pool.
    ///
    /// The index format is the widest the device supports; chunk capacity is
    /// `config.max_chunk_vertices` clamped to what that format can address.
    pub fn new(device: Arc<GraphicsDevice>, signature: AttributeSignature, config: PoolConfig) -> Self {
        let index_format = device.capabilities().widest_index_format();
        let capacity = config
            .max_chunk_vertices
            .min(index_format.max_index().saturating_add(1))
            .max(1);
        let generation = device.context_generation();

        log::debug!(
            "CombinedBufferPool {}: {:?} indices, {} vertices per chunk",
            signature.topology_hash(),
            index_format,
            capacity
        );

        Self {
            device,
            signature,
            index_format,
            capacity,
            entries: Vec::new(),
            chunks: Vec::new(),
            dirty: false,
            generation,
            staging: Staging::default(),
        }
    }

    /// Layout shared by every geometry in this pool.
    pub fn signature(&self) -> AttributeSignature {
        self.signature
    }

    /// Index format of the offset-adjusted index buffers.
    pub fn index_format(&self) -> IndexFormat {
        self.index_format
    }

    /// Vertices per chunk.
    pub fn chunk_capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of registered geometries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no geometry is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a geometry is registered.
    pub fn contains(&self, id: GeometryId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Whether the next query will rebuild.
    pub fn is_dirty(&self) -> bool {
        self.dirty || self.generation != self.device.context_generation()
    }

    /// Number of chunks from the last rebuild.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Register a geometry, or replace its data if already registered.
    ///
    /// Placement happens on the next query.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::LayoutMismatch`] and leaves the pool untouched
    /// if the geometry's attribute layout is not the pool's.
    pub fn add(
        &mut self,
        id: GeometryId,
        data: Arc<GeometryData>,
        label: Option<String>,
    ) -> Result<(), GeometryError> {
        self.check_layout(id, &data)?;

        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.data = data;
                entry.label = label;
            }
            None => self.entries.push(PoolEntry {
                id,
                data,
                label,
                placement: None,
                error: None,
            }),
        }
        self.dirty = true;
        Ok(())
    }

    /// Deregister a geometry. Returns `false` if it was not registered.
    ///
    /// Releases the geometry's index buffer; chunks are repacked on the next query.
    pub fn remove(&mut self, id: GeometryId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        let removed = self.entries.len() != before;
        if removed {
            self.dirty = true;
        }
        removed
    }

    /// Replace a geometry's data after one of its vertex attributes changed.
    ///
    /// A placed geometry gets the new bytes written into its chunk at its
    /// offset; otherwise the data is picked up by the next rebuild.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout changed or the buffer write fails.
    pub fn update(
        &mut self,
        id: GeometryId,
        data: Arc<GeometryData>,
        kind: AttributeKind,
    ) -> Result<(), GeometryError> {
        self.check_layout(id, &data)?;
        let built = !self.is_dirty();
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return Ok(());
        };
        entry.data = data;

        if !built {
            return Ok(());
        }
        let (Some(placement), Some(bytes)) =
            (&entry.placement, entry.data.attribute_bytes(kind))
        else {
            return Ok(());
        };
        let Some(buffer) = self
            .chunks
            .get(placement.chunk)
            .and_then(|chunk| chunk.buffers.get(kind))
        else {
            return Ok(());
        };

        let offset = placement.vertex_offset as u64 * entry.data.vertex_stride(kind);
        self.device.write_buffer(buffer, offset, bytes)?;
        log::trace!(
            "CombinedBufferPool: updated {kind} of {id} at byte offset {offset}"
        );
        Ok(())
    }

    fn check_layout(&self, id: GeometryId, data: &GeometryData) -> Result<(), GeometryError> {
        let signature = data.signature();
        if signature == self.signature {
            return Ok(());
        }
        let err = GeometryError::LayoutMismatch {
            expected: self.signature.topology_hash(),
            found: signature.topology_hash(),
        };
        log::error!("CombinedBufferPool: rejected {id}: {err}");
        Err(err)
    }

    /// Vertex buffers of the chunk holding `id`, or the null set.
    pub fn vertex_bufs(&mut self, id: GeometryId) -> VertexBufs {
        self.ensure_built();
        self.placement(id)
            .and_then(|p| self.chunks.get(p.chunk))
            .map(|chunk| chunk.buffers.clone())
            .unwrap_or_default()
    }

    /// Offset of the geometry's first vertex inside its chunk.
    pub fn indices_offset(&mut self, id: GeometryId) -> Option<u32> {
        self.ensure_built();
        self.placement(id).map(|p| p.vertex_offset)
    }

    /// The geometry's offset-adjusted index buffer.
    pub fn index_buffer(&mut self, id: GeometryId) -> Option<Arc<Buffer>> {
        self.ensure_built();
        self.placement(id).and_then(|p| p.index_buffer.clone())
    }

    /// The geometry's indices with its chunk offset added.
    pub fn adjusted_indices(&mut self, id: GeometryId) -> Option<&[u32]> {
        self.ensure_built();
        self.placement(id).map(|p| p.adjusted_indices.as_slice())
    }

    /// Why the last rebuild left `id` unplaced, if it did.
    pub fn placement_error(&mut self, id: GeometryId) -> Option<GeometryError> {
        self.ensure_built();
        self.entries
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| e.error.clone())
    }

    /// Total bytes of chunk buffers and index buffers.
    pub fn memory_usage(&self) -> u64 {
        let chunks: u64 = self.chunks.iter().map(|c| c.buffers.memory()).sum();
        let indices: u64 = self
            .entries
            .iter()
            .filter_map(|e| e.placement.as_ref()?.index_buffer.as_ref())
            .map(|b| b.size())
            .sum();
        chunks + indices
    }

    /// Rebuild unconditionally for the new context.
    ///
    /// # Errors
    ///
    /// Returns an error if buffer creation fails; the pool stays dirty.
    pub fn on_context_restored(&mut self) -> Result<(), GeometryError> {
        self.dirty = true;
        self.rebuild()
    }

    fn placement(&self, id: GeometryId) -> Option<&Placement> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| e.placement.as_ref())
    }

    fn ensure_built(&mut self) {
        if !self.is_dirty() {
            return;
        }
        if self.device.is_context_lost() {
            log::trace!(
                "CombinedBufferPool {}: rebuild deferred until the context is restored",
                self.signature.topology_hash()
            );
            return;
        }
        if let Err(e) = self.rebuild() {
            log::error!(
                "CombinedBufferPool {}: rebuild failed: {e}",
                self.signature.topology_hash()
            );
        }
    }

    /// Repack every entry into chunks in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if buffer creation fails; every placement is dropped
    /// and the pool stays dirty. Per-geometry problems are not errors here:
    /// the geometry is left unplaced and the reason is kept for
    /// [`placement_error`](Self::placement_error).
    pub fn rebuild(&mut self) -> Result<(), GeometryError> {
        quartz_core::profile_function!();

        let result = self.pack();
        if result.is_err() {
            self.chunks.clear();
            for entry in &mut self.entries {
                entry.placement = None;
            }
            self.dirty = true;
        }
        result
    }

    fn pack(&mut self) -> Result<(), GeometryError> {
        let Self {
            device,
            signature,
            index_format,
            capacity,
            entries,
            chunks,
            staging,
            ..
        } = self;

        chunks.clear();
        staging.release();
        let generation = device.context_generation();
        let mut open_vertices = 0u32;
        let mut unplaced = 0usize;

        for entry in entries.iter_mut() {
            entry.placement = None;
            entry.error = None;

            let vertices = u32::try_from(entry.data.vertex_count()).unwrap_or(u32::MAX);
            if vertices > *capacity {
                let error = GeometryError::ChunkCapacityExceeded {
                    vertices,
                    capacity: *capacity,
                };
                log::error!("CombinedBufferPool: geometry {}: {error}", entry.id);
                entry.error = Some(error);
                unplaced += 1;
                continue;
            }

            if u64::from(open_vertices) + u64::from(vertices) > u64::from(*capacity) {
                flush_chunk(device, *signature, staging, chunks, open_vertices)?;
                open_vertices = 0;
            }

            let offset = open_vertices;
            let adjusted = match adjust_indices(&entry.data.indices, offset, vertices, *index_format) {
                Ok(adjusted) => adjusted,
                Err(error) => {
                    log::error!("CombinedBufferPool: geometry {}: {error}", entry.id);
                    entry.error = Some(error);
                    unplaced += 1;
                    continue;
                }
            };

            for kind in AttributeKind::VERTEX_ATTRIBUTES {
                if let (Some(bytes), Some(slot)) =
                    (entry.data.attribute_bytes(kind), staging.slot(kind))
                {
                    slot.activate().extend_from_slice(bytes);
                }
            }

            let index_buffer = if adjusted.is_empty() {
                None
            } else {
                let label = format!("{} indices", entry.label.as_deref().unwrap_or("combined"));
                Some(device.create_buffer_with_data(
                    BufferUsage::GEOMETRY_INDEX,
                    Some(&label),
                    &index_format.encode(&adjusted),
                )?)
            };

            entry.placement = Some(Placement {
                chunk: chunks.len(),
                vertex_offset: offset,
                adjusted_indices: adjusted,
                index_buffer,
            });
            open_vertices += vertices;
        }

        if open_vertices > 0 {
            flush_chunk(device, *signature, staging, chunks, open_vertices)?;
        }
        staging.release();

        self.generation = generation;
        self.dirty = false;

        log::debug!(
            "CombinedBufferPool {}: rebuilt {} geometries into {} chunks ({} unplaced)",
            self.signature.topology_hash(),
            self.entries.len() - unplaced,
            self.chunks.len(),
            unplaced
        );
        quartz_core::profile_plot!("combined_chunks", self.chunks.len());

        Ok(())
    }
}

/// Add `offset` to every index, checking it stays inside the geometry and
/// within what `format` can address.
fn adjust_indices(
    indices: &[u32],
    offset: u32,
    vertices: u32,
    format: IndexFormat,
) -> Result<Vec<u32>, GeometryError> {
    let limit = (offset + vertices).saturating_sub(1).min(format.max_index());
    indices
        .iter()
        .map(|&i| {
            let adjusted = i.checked_add(offset).filter(|_| i < vertices);
            match adjusted {
                Some(adjusted) if adjusted <= limit => Ok(adjusted),
                _ => Err(GeometryError::IndexOutOfRange {
                    index: i.saturating_add(offset),
                    limit,
                }),
            }
        })
        .collect()
}

/// Upload the staged bytes as a new chunk.
fn flush_chunk(
    device: &GraphicsDevice,
    signature: AttributeSignature,
    staging: &mut Staging,
    chunks: &mut Vec<Chunk>,
    vertex_count: u32,
) -> Result<(), GeometryError> {
    quartz_core::profile_scope!("flush_chunk");

    let index = chunks.len();
    let mut buffers = VertexBufs {
        quantized: signature.quantized,
        ..VertexBufs::default()
    };

    for kind in AttributeKind::VERTEX_ATTRIBUTES {
        let Some(slot) = staging.slot(kind) else {
            continue;
        };
        let Some(bytes) = slot.get().filter(|b| !b.is_empty()) else {
            continue;
        };
        debug_assert_eq!(
            bytes.len() as u64,
            vertex_count as u64 * vertex_stride(kind, signature.quantized)
        );
        let buffer = device.create_buffer_with_data(
            BufferUsage::GEOMETRY_VERTEX,
            Some(&format!("combined {kind} #{index}")),
            bytes,
        )?;
        buffers.set(kind, buffer);
        slot.release();
    }

    chunks.push(Chunk {
        buffers,
        vertex_count,
    });
    Ok(())
}

impl std::fmt::Debug for CombinedBufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedBufferPool")
            .field("signature", &self.signature.topology_hash())
            .field("index_format", &self.index_format)
            .field("capacity", &self.capacity)
            .field("entries", &self.entries.len())
            .field(
                "chunk_vertices",
                &self.chunks.iter().map(|c| c.vertex_count).collect::<Vec<_>>(),
            )
            .field("dirty", &self.dirty)
            .finish()
    }
}

/// Maps attribute signatures to their combined pools.
///
/// One registry serves one device. Records receive it at construction, so
/// there is no global pool state.
pub struct CombinedBufferRegistry {
    device: Arc<GraphicsDevice>,
    config: PoolConfig,
    pools: Mutex<HashMap<AttributeSignature, Arc<Mutex<CombinedBufferPool>>>>,
}

impl CombinedBufferRegistry {
    /// Create a registry with default settings.
    pub fn new(device: Arc<GraphicsDevice>) -> Self {
        Self::with_config(device, PoolConfig::default())
    }

    /// Create a registry with explicit pool settings.
    pub fn with_config(device: Arc<GraphicsDevice>, config: PoolConfig) -> Self {
        Self {
            device,
            config,
            pools: Mutex::new(HashMap::new()),
        }
    }

    /// The device pools allocate from.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Pool settings.
    pub fn config(&self) -> PoolConfig {
        self.config
    }

    /// The pool for `signature`, created on first use.
    pub fn pool_for(&self, signature: AttributeSignature) -> Arc<Mutex<CombinedBufferPool>> {
        let mut pools = self.pools.lock();
        Arc::clone(pools.entry(signature).or_insert_with(|| {
            Arc::new(Mutex::new(CombinedBufferPool::new(
                Arc::clone(&self.device),
                signature,
                self.config,
            )))
        }))
    }

    /// The pool for `signature`, if one exists.
    pub fn pool(&self, signature: AttributeSignature) -> Option<Arc<Mutex<CombinedBufferPool>>> {
        self.pools.lock().get(&signature).cloned()
    }

    /// Number of pools.
    pub fn pool_count(&self) -> usize {
        self.pools.lock().len()
    }

    /// Total bytes held by every pool.
    pub fn memory_usage(&self) -> u64 {
        self.pools
            .lock()
            .values()
            .map(|pool| pool.lock().memory_usage())
            .sum()
    }

    /// Rebuild every pool for the new context.
    ///
    /// Every pool is attempted; the first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if any pool fails to create its buffers.
    pub fn on_context_restored(&self) -> Result<(), GeometryError> {
        let pools: Vec<_> = self.pools.lock().values().cloned().collect();
        let mut result = Ok(());
        for pool in pools {
            if let Err(e) = pool.lock().on_context_restored() {
                log::error!("Combined pool rebuild after context restore failed: {e}");
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }
}

impl std::fmt::Debug for CombinedBufferRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedBufferRegistry")
            .field("config", &self.config)
            .field("pool_count", &self.pool_count())
            .finish()
    }
}

// Ensure pools can be shared across threads
static_assertions::assert_impl_all!(CombinedBufferPool: Send, Sync);
static_assertions::assert_impl_all!(CombinedBufferRegistry: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendType;
    use crate::geometry::GeometryDescriptor;
    use crate::instance::{GraphicsInstance, InstanceParameters};

    fn create_test_device() -> Arc<GraphicsDevice> {
        let parameters = InstanceParameters::new().with_backend(BackendType::Dummy);
        GraphicsInstance::with_parameters(parameters)
            .unwrap()
            .create_device()
            .unwrap()
    }

    fn triangle_data(indices: Vec<u32>) -> Arc<GeometryData> {
        let desc = GeometryDescriptor::new()
            .with_positions(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
            .with_indices(indices)
            .with_quantized(false);
        Arc::new(GeometryData::from_descriptor(&desc).unwrap())
    }

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    fn pool_for(data: &GeometryData, config: PoolConfig) -> CombinedBufferPool {
        CombinedBufferPool::new(create_test_device(), data.signature(), config)
    }

    #[test]
    fn test_capacity_clamped_by_index_format() {
        let data = triangle_data(vec![0, 1, 2]);
        let pool = pool_for(&data, PoolConfig::default());
        assert_eq!(pool.index_format(), IndexFormat::Uint32);
        assert_eq!(pool.chunk_capacity(), DEFAULT_MAX_CHUNK_VERTICES);

        let narrow = create_test_device()
            .instance()
            .create_device_with_capabilities(crate::device::DeviceCapabilities::without_wide_indices())
            .unwrap();
        let pool = CombinedBufferPool::new(narrow, data.signature(), PoolConfig::default());
        assert_eq!(pool.index_format(), IndexFormat::Uint16);
        assert_eq!(pool.chunk_capacity(), 65_536);
    }

    #[test]
    fn test_offsets_follow_insertion_order() {
        let data = triangle_data(vec![0, 1, 2]);
        let mut pool = pool_for(&data, PoolConfig::default());
        let (a, b) = (GeometryId::next(), GeometryId::next());

        pool.add(a, Arc::clone(&data), None).unwrap();
        pool.add(b, Arc::clone(&data), None).unwrap();
        assert!(pool.is_dirty());

        assert_eq!(pool.indices_offset(a), Some(0));
        assert_eq!(pool.indices_offset(b), Some(3));
        assert_eq!(pool.adjusted_indices(b), Some(&[3, 4, 5][..]));
        assert_eq!(pool.chunk_count(), 1);
        assert!(!pool.is_dirty());

        let bufs = pool.vertex_bufs(a);
        assert_eq!(bufs.positions.as_ref().map(|b| b.size()), Some(6 * 12));
        assert!(bufs.normals.is_none());
    }

    #[test]
    fn test_unknown_id_returns_null_set() {
        let data = triangle_data(vec![0, 1, 2]);
        let mut pool = pool_for(&data, PoolConfig::default());
        let id = GeometryId::next();
        assert!(pool.vertex_bufs(id).is_null());
        assert_eq!(pool.indices_offset(id), None);
        assert!(pool.index_buffer(id).is_none());
        assert!(!pool.remove(id));
    }

    #[test]
    fn test_out_of_range_index_left_unplaced() {
        let good = triangle_data(vec![0, 1, 2]);
        let bad = triangle_data(vec![0, 1, 3]);
        let mut pool = pool_for(&good, PoolConfig::default());
        let (a, b, c) = (GeometryId::next(), GeometryId::next(), GeometryId::next());

        pool.add(a, Arc::clone(&good), None).unwrap();
        pool.add(b, bad, None).unwrap();
        pool.add(c, good, None).unwrap();

        assert_eq!(pool.indices_offset(b), None);
        assert!(matches!(
            pool.placement_error(b),
            Some(GeometryError::IndexOutOfRange { index: 6, .. })
        ));
        // The rejected geometry takes no space
        assert_eq!(pool.indices_offset(c), Some(3));
    }

    #[test]
    fn test_mismatched_layout_rejected() {
        let colored = {
            let desc = GeometryDescriptor::new()
                .with_positions(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
                .with_colors(vec![1.0; 12])
                .with_indices(vec![0, 1, 2])
                .with_quantized(false);
            Arc::new(GeometryData::from_descriptor(&desc).unwrap())
        };
        let plain = triangle_data(vec![0, 1, 2]);
        let mut pool = pool_for(&colored, PoolConfig::default());
        let (a, b) = (GeometryId::next(), GeometryId::next());

        let err = pool.add(a, Arc::clone(&plain), None).unwrap_err();
        assert!(matches!(err, GeometryError::LayoutMismatch { .. }));
        assert!(!pool.contains(a));
        assert!(pool.is_empty());

        pool.add(b, Arc::clone(&colored), None).unwrap();
        let bufs = pool.vertex_bufs(b);
        assert_eq!(pool.indices_offset(b), Some(0));
        assert_eq!(bufs.colors.as_ref().map(|c| c.size()), Some(3 * 16));

        let err = pool.update(b, plain, AttributeKind::Positions).unwrap_err();
        assert!(matches!(err, GeometryError::LayoutMismatch { .. }));
    }

    #[test]
    fn test_chunk_split_at_capacity() {
        let data = triangle_data(vec![0, 1, 2]);
        let mut pool = pool_for(&data, PoolConfig::default().with_max_chunk_vertices(7));
        let ids: Vec<_> = (0..3).map(|_| GeometryId::next()).collect();
        for &id in &ids {
            pool.add(id, Arc::clone(&data), None).unwrap();
        }

        assert_eq!(pool.indices_offset(ids[0]), Some(0));
        assert_eq!(pool.indices_offset(ids[1]), Some(3));
        assert_eq!(pool.indices_offset(ids[2]), Some(0));
        assert_eq!(pool.chunk_count(), 2);
        for &id in &ids {
            assert!(pool.adjusted_indices(id).unwrap().iter().all(|&i| i < 7));
        }
    }

    #[test]
    fn test_oversized_geometry_reported() {
        let data = triangle_data(vec![0, 1, 2]);
        let mut pool = pool_for(&data, PoolConfig::default().with_max_chunk_vertices(2));
        let id = GeometryId::next();
        pool.add(id, data, None).unwrap();

        assert!(pool.vertex_bufs(id).is_null());
        assert_eq!(
            pool.placement_error(id),
            Some(GeometryError::ChunkCapacityExceeded {
                vertices: 3,
                capacity: 2,
            })
        );
        assert_eq!(pool.chunk_count(), 0);
    }

    #[test]
    fn test_update_writes_at_offset() {
        let data = triangle_data(vec![0, 1, 2]);
        let mut pool = pool_for(&data, PoolConfig::default());
        let (a, b) = (GeometryId::next(), GeometryId::next());
        pool.add(a, Arc::clone(&data), None).unwrap();
        pool.add(b, Arc::clone(&data), None).unwrap();
        let positions = pool.vertex_bufs(b).positions.unwrap();

        let mut changed = (*data).clone();
        changed.positions = crate::geometry::PositionData::Float(vec![5.0; 9]);
        pool.update(b, Arc::new(changed), AttributeKind::Positions).unwrap();

        let device = positions.device().unwrap();
        let bytes = device.read_buffer(&positions, 36, 36).unwrap();
        assert_eq!(floats(&bytes), vec![5.0; 9]);
        let untouched = device.read_buffer(&positions, 0, 12).unwrap();
        assert_eq!(floats(&untouched), vec![0.0; 3]);
    }

    #[test]
    fn test_registry_buckets_by_signature() {
        let device = create_test_device();
        let registry = CombinedBufferRegistry::new(device);
        let float = triangle_data(vec![0, 1, 2]);
        let mut quantized = (*float).clone();
        quantized.quantized = true;

        let p1 = registry.pool_for(float.signature());
        let p2 = registry.pool_for(float.signature());
        let p3 = registry.pool_for(quantized.signature());
        assert!(Arc::ptr_eq(&p1, &p2));
        assert!(!Arc::ptr_eq(&p1, &p3));
        assert_eq!(registry.pool_count(), 2);
    }
}
