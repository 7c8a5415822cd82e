//! # World Generator
//!
//! Wires the pieces together from one [`GeneratorConfig`] and a block
//! registry, and exposes the chunk-fill entry points the streaming layer
//! calls.
//!
//! ## Fill Sequence
//!
//! 1. Validate the request shape
//! 2. Populate a fresh buffer (no world access)
//! 3. Commit the buffer
//! 4. If the chunk sits on the floor layer, grow vegetation over its
//!    footprint with the chunk's own random stream

use std::sync::Arc;

use parking_lot::Mutex;

use crate::biome::{Biome, BiomeClassifier};
use crate::caves::CaveCarver;
use crate::chunk::{ChunkFillRequest, ChunkId, ChunkPopulator, VoxelBuffer};
use crate::config::GeneratorConfig;
use crate::error::GenResult;
use crate::noise::{NoiseBank, WorldSeed};
use crate::palette::{BlockPalette, BlockRegistry};
use crate::rng::chunk_rng;
use crate::terrain::{ColumnField, TerrainField};
use crate::vegetation::{VegetationPlacer, VegetationReport};
use crate::world::VoxelWorld;

/// Result of one committed fill.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FillSummary {
    /// Chunk that was committed.
    pub id: ChunkId,
    /// Vegetation grown, for floor-layer chunks.
    pub vegetation: Option<VegetationReport>,
}

/// Deterministic world generator.
pub struct WorldGenerator {
    config: GeneratorConfig,
    seed: WorldSeed,
    noise: Arc<NoiseBank>,
    terrain: Arc<TerrainField>,
    populator: ChunkPopulator,
    vegetation: VegetationPlacer,
}

impl WorldGenerator {
    /// Builds every component and resolves the block palette.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, when a required block is missing
    /// from the registry, or with [`crate::GenError::SeedAlreadySet`] when
    /// `install_global_seed` is on and another seed owns the global slot.
    pub fn new(config: GeneratorConfig, registry: &impl BlockRegistry) -> GenResult<Self> {
        config.validate()?;
        let palette = BlockPalette::resolve(registry)?;

        let seed = WorldSeed::new(config.seed);
        if config.install_global_seed {
            seed.install_global()?;
        }
        let noise = Arc::new(NoiseBank::new(seed));
        let classifier = BiomeClassifier::new(Arc::clone(&noise), config.biomes.clone());
        let terrain = Arc::new(TerrainField::new(
            Arc::clone(&noise),
            classifier,
            config.terrain.clone(),
            config.water.clone(),
        ));
        let caves = Arc::new(CaveCarver::new(Arc::clone(&noise), config.caves.clone()));

        let populator = ChunkPopulator::new(Arc::clone(&terrain), caves, palette);
        let vegetation = VegetationPlacer::new(
            populator.clone(),
            config.vegetation.clone(),
            config.trees.clone(),
        );

        tracing::info!(
            "world generator ready: seed {}, floor layer {}",
            seed.value(),
            config.floor_y
        );

        Ok(Self {
            config,
            seed,
            noise,
            terrain,
            populator,
            vegetation,
        })
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// World seed.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Shared noise bank.
    #[must_use]
    pub fn noise(&self) -> &Arc<NoiseBank> {
        &self.noise
    }

    /// Height and water field.
    #[must_use]
    pub fn terrain(&self) -> &TerrainField {
        &self.terrain
    }

    /// Resolved block palette.
    #[must_use]
    pub const fn palette(&self) -> &BlockPalette {
        self.populator.palette()
    }

    /// Cave carver.
    #[must_use]
    pub fn caves(&self) -> &CaveCarver {
        self.populator.caves()
    }

    /// Vegetation placer.
    #[must_use]
    pub const fn vegetation(&self) -> &VegetationPlacer {
        &self.vegetation
    }

    /// Biome of a column.
    #[must_use]
    pub fn biome(&self, x: i32, z: i32) -> Biome {
        self.terrain.biome(x, z)
    }

    /// Surface height of a column.
    #[must_use]
    pub fn height_at(&self, x: i32, z: i32) -> i32 {
        self.terrain.height_at(x, z)
    }

    /// Water surface of a column, for rivers and lakes.
    #[must_use]
    pub fn water_level(&self, x: i32, z: i32) -> Option<i32> {
        self.terrain.water_level(x, z)
    }

    /// Biome, height and water of a column.
    #[must_use]
    pub fn column(&self, x: i32, z: i32) -> ColumnField {
        self.terrain.column(x, z)
    }

    /// Populates a buffer without touching any world.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GenError::InvalidShape`] for non-positive shapes and
    /// [`crate::GenError::RequestOutOfRange`] for boxes past the `i32` range.
    pub fn populate(&self, request: &ChunkFillRequest) -> GenResult<VoxelBuffer> {
        self.populator.populate(request)
    }

    /// Returns true if vegetation runs for chunks at this request's layer.
    #[must_use]
    pub fn is_floor_layer(&self, request: &ChunkFillRequest) -> bool {
        request.origin[1] == self.config.floor_y
    }

    /// Grows vegetation over the request's footprint.
    pub fn plant_vegetation<W: VoxelWorld + ?Sized>(
        &self,
        request: &ChunkFillRequest,
        world: &mut W,
    ) -> VegetationReport {
        let [x0, _, z0] = request.origin;
        let [sx, _, sz] = request.shape;
        let mut rng = chunk_rng(self.seed, x0, z0);
        self.vegetation.place_in_chunk(world, &mut rng, [x0, z0], [sx, sz])
    }

    fn commit<W: VoxelWorld + ?Sized>(
        &self,
        request: &ChunkFillRequest,
        buffer: VoxelBuffer,
        world: &mut W,
    ) -> FillSummary {
        world.commit(request.id, buffer);
        let vegetation = self
            .is_floor_layer(request)
            .then(|| self.plant_vegetation(request, world));
        FillSummary {
            id: request.id,
            vegetation,
        }
    }

    /// Populates, commits and (on the floor layer) grows vegetation.
    ///
    /// # Errors
    ///
    /// Returns the request's validation error before anything is
    /// committed.
    pub fn fill_chunk<W: VoxelWorld + ?Sized>(
        &self,
        request: &ChunkFillRequest,
        world: &mut W,
    ) -> GenResult<FillSummary> {
        let buffer = self.populate(request)?;
        Ok(self.commit(request, buffer, world))
    }

    /// Like [`WorldGenerator::fill_chunk`], but populates before taking the
    /// world lock and holds it only for commit and vegetation.
    ///
    /// # Errors
    ///
    /// As [`WorldGenerator::fill_chunk`].
    pub fn fill_chunk_shared<W: VoxelWorld + ?Sized>(
        &self,
        request: &ChunkFillRequest,
        world: &Mutex<W>,
    ) -> GenResult<FillSummary> {
        let buffer = self.populate(request)?;
        let mut guard = world.lock();
        Ok(self.commit(request, buffer, &mut *guard))
    }
}
