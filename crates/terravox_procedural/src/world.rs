//! # World Collaborator
//!
//! The generator hands finished buffers to a [`VoxelWorld`] and writes
//! vegetation through it. [`SparseWorld`] is the in-memory reference
//! implementation used by tests, benches and the demo binary.

use std::collections::HashMap;

use crate::chunk::{ChunkId, VoxelBuffer};
use crate::palette::BlockId;

/// Storage the generator commits into.
///
/// Implementations must accept writes anywhere, including positions whose
/// chunk is not loaded yet. Trees routinely reach across chunk edges.
pub trait VoxelWorld {
    /// Takes ownership of a fully populated chunk.
    fn commit(&mut self, id: ChunkId, buffer: VoxelBuffer);

    /// Writes a single block.
    fn set_block(&mut self, id: BlockId, x: i32, y: i32, z: i32);

    /// Reads a single block. Unknown positions read as air.
    fn get_block(&self, x: i32, y: i32, z: i32) -> BlockId;
}

/// Edge of a lookup grid cell, in blocks.
const GRID: i32 = 32;

/// Lookup grid cell holding a world position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct ChunkCoord {
    x: i32,
    y: i32,
    z: i32,
}

impl ChunkCoord {
    const fn from_world_pos(x: i32, y: i32, z: i32) -> Self {
        Self {
            x: x.div_euclid(GRID),
            y: y.div_euclid(GRID),
            z: z.div_euclid(GRID),
        }
    }

    /// Every cell a buffer's box overlaps.
    fn covering(buffer: &VoxelBuffer) -> impl Iterator<Item = Self> {
        let [ox, oy, oz] = buffer.origin();
        let [sx, sy, sz] = buffer.shape();
        // Buffers come from validated requests, so the last cell fits in i32
        let lo = Self::from_world_pos(ox, oy, oz);
        let hi = Self::from_world_pos(ox + (sx - 1), oy + (sy - 1), oz + (sz - 1));

        (lo.y..=hi.y).flat_map(move |y| {
            (lo.z..=hi.z).flat_map(move |z| (lo.x..=hi.x).map(move |x| Self { x, y, z }))
        })
    }
}

/// Committed chunks plus an overlay of single-block writes.
///
/// Overlay entries win over chunk data, so a tree written into a chunk
/// before that chunk is committed survives the commit. Chunk reads go
/// through a grid index; where committed boxes overlap, the latest commit
/// wins.
#[derive(Debug, Default)]
pub struct SparseWorld {
    chunks: HashMap<ChunkId, VoxelBuffer>,
    grid: HashMap<ChunkCoord, Vec<ChunkId>>,
    overlay: HashMap<(i32, i32, i32), BlockId>,
}

impl SparseWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed chunks.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Number of overlay writes.
    #[must_use]
    pub fn overlay_len(&self) -> usize {
        self.overlay.len()
    }

    /// A committed chunk.
    #[must_use]
    pub fn chunk(&self, id: ChunkId) -> Option<&VoxelBuffer> {
        self.chunks.get(&id)
    }

    /// Returns true if a chunk with this id was committed.
    #[must_use]
    pub fn is_loaded(&self, id: ChunkId) -> bool {
        self.chunks.contains_key(&id)
    }

    /// Overlay writes, in no particular order.
    pub fn overlay(&self) -> impl Iterator<Item = ((i32, i32, i32), BlockId)> + '_ {
        self.overlay.iter().map(|(&pos, &id)| (pos, id))
    }

    fn unindex(&mut self, id: ChunkId) {
        let Some(old) = self.chunks.get(&id) else {
            return;
        };
        for coord in ChunkCoord::covering(old) {
            if let Some(ids) = self.grid.get_mut(&coord) {
                ids.retain(|&other| other != id);
                if ids.is_empty() {
                    self.grid.remove(&coord);
                }
            }
        }
    }

    fn chunk_value(&self, x: i32, y: i32, z: i32) -> Option<BlockId> {
        let ids = self.grid.get(&ChunkCoord::from_world_pos(x, y, z))?;
        ids.iter()
            .rev()
            .find_map(|id| self.chunks.get(id)?.get_world(x, y, z))
    }
}

impl VoxelWorld for SparseWorld {
    fn commit(&mut self, id: ChunkId, buffer: VoxelBuffer) {
        tracing::debug!(
            "commit chunk {:?} at {:?} shape {:?}",
            id,
            buffer.origin(),
            buffer.shape()
        );
        self.unindex(id);
        for coord in ChunkCoord::covering(&buffer) {
            self.grid.entry(coord).or_default().push(id);
        }
        self.chunks.insert(id, buffer);
    }

    fn set_block(&mut self, id: BlockId, x: i32, y: i32, z: i32) {
        self.overlay.insert((x, y, z), id);
    }

    fn get_block(&self, x: i32, y: i32, z: i32) -> BlockId {
        if let Some(&id) = self.overlay.get(&(x, y, z)) {
            return id;
        }
        self.chunk_value(x, y, z).unwrap_or(BlockId::AIR)
    }
}
