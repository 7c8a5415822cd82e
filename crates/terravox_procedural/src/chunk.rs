//! # Chunk Population
//!
//! Turns the column fields into a dense block buffer for one fill request.
//!
//! ## Buffer Layout
//!
//! A request covers the box `origin .. origin + shape`. The buffer stores
//! one [`BlockId`] per cell, flat, with local offsets `(i, j, k)` mapping to
//! world `(x + i, y + j, z + k)` and to index `i + sx * (k + sz * j)`, so a
//! horizontal layer is contiguous.
//!
//! ## Layers
//!
//! For a column with surface `h`:
//!
//! | World Y          | Block                         |
//! |------------------|-------------------------------|
//! | `y < h - 4`      | stone                         |
//! | `h - 4 <= y < h` | biome sub-surface             |
//! | `y == h`         | biome surface                 |
//! | `h < y <= w`     | water (river/lake columns)    |
//! | otherwise        | air                           |
//!
//! Cave carving may turn any ground cell into air.

use std::sync::Arc;

use crate::caves::CaveCarver;
use crate::error::{GenError, GenResult};
use crate::palette::{BlockId, BlockKind, BlockPalette};
use crate::terrain::{ColumnField, TerrainField};

/// Layers of sub-surface material between stone and the surface block.
pub const SUBSURFACE_DEPTH: i32 = 4;

/// Identifier the streaming collaborator assigns to a chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(pub u64);

/// One request to fill a box of the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkFillRequest {
    /// Chunk identifier, handed back on commit.
    pub id: ChunkId,
    /// World position of the `(0, 0, 0)` cell.
    pub origin: [i32; 3],
    /// Extent along X, Y and Z.
    pub shape: [i32; 3],
}

impl ChunkFillRequest {
    /// Creates a request.
    #[must_use]
    pub const fn new(id: ChunkId, origin: [i32; 3], shape: [i32; 3]) -> Self {
        Self { id, origin, shape }
    }

    /// Checks that every dimension is positive and that the box stays
    /// addressable.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::InvalidShape`] for a non-positive dimension and
    /// [`GenError::RequestOutOfRange`] when the last cell lies past
    /// `i32::MAX` or the cell count overflows `usize`.
    pub fn validate(&self) -> GenResult<()> {
        let [x, y, z] = self.shape;
        if x <= 0 || y <= 0 || z <= 0 {
            return Err(GenError::InvalidShape { x, y, z });
        }

        let out_of_range = GenError::RequestOutOfRange {
            origin: self.origin,
            shape: self.shape,
        };
        let last_fits = self
            .origin
            .iter()
            .zip(self.shape)
            .all(|(&o, s)| o.checked_add(s - 1).is_some());
        if !last_fits || self.checked_volume().is_none() {
            return Err(out_of_range);
        }
        Ok(())
    }

    fn checked_volume(&self) -> Option<usize> {
        let [x, y, z] = self.shape.map(|s| usize::try_from(s).ok());
        x?.checked_mul(y?)?.checked_mul(z?)
    }

    /// Number of cells in the box.
    #[must_use]
    pub const fn volume(&self) -> usize {
        self.shape[0] as usize * self.shape[1] as usize * self.shape[2] as usize
    }
}

/// Dense block buffer for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelBuffer {
    origin: [i32; 3],
    shape: [i32; 3],
    blocks: Vec<BlockId>,
}

impl VoxelBuffer {
    /// Creates an all-air buffer for a validated request.
    ///
    /// # Errors
    ///
    /// As [`ChunkFillRequest::validate`].
    pub fn for_request(request: &ChunkFillRequest) -> GenResult<Self> {
        request.validate()?;
        Ok(Self {
            origin: request.origin,
            shape: request.shape,
            blocks: vec![BlockId::AIR; request.volume()],
        })
    }

    /// World position of the first cell.
    #[must_use]
    pub const fn origin(&self) -> [i32; 3] {
        self.origin
    }

    /// Extent along each axis.
    #[must_use]
    pub const fn shape(&self) -> [i32; 3] {
        self.shape
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false for a buffer built from a valid request.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[inline]
    fn index(&self, i: i32, j: i32, k: i32) -> usize {
        let [sx, _, sz] = self.shape;
        let (sx, sz) = (sx as usize, sz as usize);
        i as usize + sx * (k as usize + sz * j as usize)
    }

    #[inline]
    fn in_local_bounds(&self, i: i32, j: i32, k: i32) -> bool {
        let [sx, sy, sz] = self.shape;
        (0..sx).contains(&i) && (0..sy).contains(&j) && (0..sz).contains(&k)
    }

    /// Block at a local offset, or `None` outside the box.
    #[must_use]
    pub fn get(&self, i: i32, j: i32, k: i32) -> Option<BlockId> {
        self.in_local_bounds(i, j, k)
            .then(|| self.blocks[self.index(i, j, k)])
    }

    /// Writes a local offset. Returns false outside the box.
    pub fn set(&mut self, i: i32, j: i32, k: i32, id: BlockId) -> bool {
        if !self.in_local_bounds(i, j, k) {
            return false;
        }
        let idx = self.index(i, j, k);
        self.blocks[idx] = id;
        true
    }

    fn to_local(&self, x: i32, y: i32, z: i32) -> Option<(i32, i32, i32)> {
        let [ox, oy, oz] = self.origin;
        Some((x.checked_sub(ox)?, y.checked_sub(oy)?, z.checked_sub(oz)?))
    }

    /// Returns true if the world position lies inside the box.
    #[must_use]
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        self.to_local(x, y, z)
            .is_some_and(|(i, j, k)| self.in_local_bounds(i, j, k))
    }

    /// Block at a world position, or `None` outside the box.
    #[must_use]
    pub fn get_world(&self, x: i32, y: i32, z: i32) -> Option<BlockId> {
        let (i, j, k) = self.to_local(x, y, z)?;
        self.get(i, j, k)
    }

    /// Writes a world position. Returns false outside the box.
    pub fn set_world(&mut self, x: i32, y: i32, z: i32, id: BlockId) -> bool {
        self.to_local(x, y, z)
            .is_some_and(|(i, j, k)| self.set(i, j, k, id))
    }

    /// The cells, in index order.
    #[must_use]
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    /// Raw little-endian bytes of the cells, for hashing and upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.blocks)
    }

    /// Counts cells holding `id`.
    #[must_use]
    pub fn count(&self, id: BlockId) -> usize {
        self.blocks.iter().filter(|&&b| b == id).count()
    }
}

/// Fills buffers from the terrain field.
///
/// Cheap to clone: the field and carver are shared.
#[derive(Clone)]
pub struct ChunkPopulator {
    terrain: Arc<TerrainField>,
    caves: Arc<CaveCarver>,
    palette: BlockPalette,
}

impl ChunkPopulator {
    /// Creates a populator.
    #[must_use]
    pub fn new(terrain: Arc<TerrainField>, caves: Arc<CaveCarver>, palette: BlockPalette) -> Self {
        Self {
            terrain,
            caves,
            palette,
        }
    }

    /// The resolved palette.
    #[must_use]
    pub const fn palette(&self) -> &BlockPalette {
        &self.palette
    }

    /// The height and water field.
    #[must_use]
    pub fn terrain(&self) -> &TerrainField {
        &self.terrain
    }

    /// The cave carver.
    #[must_use]
    pub fn caves(&self) -> &CaveCarver {
        &self.caves
    }

    /// Block for one cell of a column, before any vegetation.
    #[must_use]
    pub fn block_at(&self, column: &ColumnField, x: i32, y: i32, z: i32) -> BlockId {
        let h = column.surface_height;

        if y > h {
            return match column.water_level {
                Some(w) if y <= w => self.palette.id(BlockKind::Water),
                _ => BlockId::AIR,
            };
        }

        if self.caves.carves(column, x, y, z) {
            return BlockId::AIR;
        }

        let kind = if y == h {
            column.biome.surface_block()
        } else if y >= h - SUBSURFACE_DEPTH {
            column.biome.subsurface_block()
        } else {
            BlockKind::Stone
        };
        self.palette.id(kind)
    }

    /// Fills a fresh buffer for the request.
    ///
    /// # Errors
    ///
    /// Returns the [`ChunkFillRequest::validate`] error before allocating
    /// anything.
    pub fn populate(&self, request: &ChunkFillRequest) -> GenResult<VoxelBuffer> {
        let mut buffer = VoxelBuffer::for_request(request)?;
        let [ox, oy, oz] = request.origin;
        let [sx, sy, sz] = request.shape;

        for k in 0..sz {
            for i in 0..sx {
                let (x, z) = (ox + i, oz + k);
                let column = self.terrain.column(x, z);

                // Everything above both surfaces stays air
                let top = column.water_level.map_or(column.surface_height, |w| {
                    w.max(column.surface_height)
                });
                let j_end = (i64::from(top) - i64::from(oy) + 1).clamp(0, i64::from(sy)) as i32;

                for j in 0..j_end {
                    let id = self.block_at(&column, x, oy + j, z);
                    if !id.is_air() {
                        buffer.set(i, j, k, id);
                    }
                }
            }
        }

        tracing::trace!(
            "populated chunk {:?} at {:?} ({} cells)",
            request.id,
            request.origin,
            buffer.len()
        );

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::{Biome, BiomeClassifier, BiomeThresholds};
    use crate::caves::CaveConfig;
    use crate::noise::{NoiseBank, WorldSeed};
    use crate::palette::MaterialRegistry;
    use crate::terrain::{TerrainConfig, WaterConfig};

    fn populator(seed: u64, caves: CaveConfig) -> ChunkPopulator {
        let noise = Arc::new(NoiseBank::new(WorldSeed::new(seed)));
        let classifier = BiomeClassifier::new(Arc::clone(&noise), BiomeThresholds::default());
        let terrain = TerrainField::new(
            Arc::clone(&noise),
            classifier,
            TerrainConfig::default(),
            WaterConfig::default(),
        );
        let carver = CaveCarver::new(noise, caves);
        let palette = BlockPalette::resolve(&MaterialRegistry::with_default_blocks()).unwrap();
        ChunkPopulator::new(Arc::new(terrain), Arc::new(carver), palette)
    }

    fn no_caves() -> CaveConfig {
        CaveConfig {
            enabled: false,
            ..CaveConfig::default()
        }
    }

    #[test]
    fn test_invalid_shape_rejected() {
        let p = populator(42, no_caves());
        for shape in [[0, 16, 16], [16, -1, 16], [16, 16, 0]] {
            let request = ChunkFillRequest::new(ChunkId(1), [0, 0, 0], shape);
            let err = p.populate(&request).unwrap_err();
            assert!(matches!(err, GenError::InvalidShape { .. }));
        }
    }

    #[test]
    fn test_index_layout() {
        let request = ChunkFillRequest::new(ChunkId(0), [10, 20, 30], [4, 3, 2]);
        let mut buffer = VoxelBuffer::for_request(&request).unwrap();
        assert_eq!(buffer.len(), 24);

        assert!(buffer.set(1, 2, 1, BlockId(9)));
        // i + sx * (k + sz * j) = 1 + 4 * (1 + 2 * 2)
        assert_eq!(buffer.blocks()[21], BlockId(9));
        assert_eq!(buffer.get_world(11, 22, 31), Some(BlockId(9)));

        assert!(!buffer.set(4, 0, 0, BlockId(1)));
        assert_eq!(buffer.get(0, 3, 0), None);
        assert!(buffer.contains(10, 20, 30));
        assert!(!buffer.contains(9, 20, 30));
    }

    #[test]
    fn test_column_layers() {
        let p = populator(42, no_caves());
        let request = ChunkFillRequest::new(ChunkId(7), [96, 0, 192], [8, 128, 8]);
        let buffer = p.populate(&request).unwrap();
        let palette = p.palette();

        for k in 0..8 {
            for i in 0..8 {
                let (x, z) = (96 + i, 192 + k);
                let column = p.terrain().column(x, z);
                let h = column.surface_height;

                for j in 0..128 {
                    let id = buffer.get(i, j, k).unwrap();
                    let expected = if j < h - 4 {
                        palette.id(BlockKind::Stone)
                    } else if j < h {
                        palette.id(column.biome.subsurface_block())
                    } else if j == h {
                        palette.id(column.biome.surface_block())
                    } else {
                        match column.water_level {
                            Some(w) if j <= w => palette.id(BlockKind::Water),
                            _ => BlockId::AIR,
                        }
                    };
                    assert_eq!(id, expected, "cell ({x}, {j}, {z}) of {:?}", column.biome);
                }
            }
        }
    }

    #[test]
    fn test_water_only_above_surface() {
        let p = populator(42, CaveConfig::default());
        let palette = p.palette();
        let column = ColumnField {
            biome: Biome::Plains,
            surface_height: 40,
            water_level: Some(45),
        };

        for y in 0..=40 {
            assert_ne!(p.block_at(&column, 0, y, 0), palette.id(BlockKind::Water));
        }
        for y in 41..=45 {
            assert_eq!(p.block_at(&column, 0, y, 0), palette.id(BlockKind::Water));
        }
        assert_eq!(p.block_at(&column, 0, 46, 0), BlockId::AIR);
    }

    #[test]
    fn test_population_is_byte_identical() {
        let a = populator(42, CaveConfig::default());
        let b = populator(42, CaveConfig::default());
        let request = ChunkFillRequest::new(ChunkId(3), [-64, 0, 320], [16, 96, 16]);

        let first = a.populate(&request).unwrap();
        let second = b.populate(&request).unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
        assert_eq!(first.as_bytes().len(), first.len() * 2);
    }

    #[test]
    fn test_chunk_above_terrain_is_air() {
        let p = populator(42, CaveConfig::default());
        let request = ChunkFillRequest::new(ChunkId(9), [0, 400, 0], [16, 16, 16]);
        let buffer = p.populate(&request).unwrap();
        assert_eq!(buffer.count(BlockId::AIR), buffer.len());
    }

    #[test]
    fn test_populate_at_coordinate_limits() {
        let p = populator(42, CaveConfig::default());

        let deep = ChunkFillRequest::new(ChunkId(1), [0, i32::MIN + 5, 0], [1, 1, 1]);
        let buffer = p.populate(&deep).unwrap();
        assert_eq!(buffer.len(), 1);

        let high = ChunkFillRequest::new(ChunkId(2), [i32::MAX - 1, i32::MAX - 3, i32::MIN], [2, 4, 2]);
        let buffer = p.populate(&high).unwrap();
        assert_eq!(buffer.count(BlockId::AIR), buffer.len());
        assert_eq!(buffer.get_world(i32::MAX, i32::MAX, i32::MIN + 1), Some(BlockId::AIR));
    }

    #[test]
    fn test_request_past_i32_range_rejected() {
        let p = populator(42, no_caves());
        let cases = [
            ([0, i32::MAX - 1, 0], [1, 4, 1]),
            ([i32::MAX, 0, 0], [2, 1, 1]),
            ([0, 0, i32::MAX - 14], [16, 16, 16]),
        ];
        for (origin, shape) in cases {
            let request = ChunkFillRequest::new(ChunkId(1), origin, shape);
            assert_eq!(
                p.populate(&request).unwrap_err(),
                GenError::RequestOutOfRange { origin, shape }
            );
        }

        // Last cell exactly at the limit is fine
        let edge = ChunkFillRequest::new(ChunkId(1), [0, i32::MAX - 3, 0], [1, 4, 1]);
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_oversized_volume_rejected() {
        let shape = [i32::MAX, i32::MAX, i32::MAX];
        let request = ChunkFillRequest::new(ChunkId(1), [0, 0, 0], shape);
        assert_eq!(
            request.validate(),
            Err(GenError::RequestOutOfRange {
                origin: [0, 0, 0],
                shape
            })
        );
    }
}
