//! # TERRAVOX Procedural Generation
//!
//! Deterministic voxel terrain for infinite, reproducible worlds.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same world
//! 2. **Column-pure**: Biome, height and water depend only on `(x, z)`
//! 3. **Streamable**: Any chunk can be filled in any order, on any thread
//! 4. **No global RNG**: Vegetation randomness is seeded per chunk
//!
//! ## Core Components
//!
//! - `NoiseBank`: seeded 2D/3D simplex channels
//! - `BiomeClassifier`: climate samples to one of five biomes
//! - `TerrainField`: surface height and river/lake water level
//! - `CaveCarver`: caves, tunnels and surface entrances
//! - `ChunkPopulator`: dense block buffers for fill requests
//! - `VegetationPlacer`: L-system oaks, snow pines, palms, plants
//! - `WorldGenerator`: the facade the streaming layer talks to
//! - `ChunkStreamer`: worker pool over a shared world
//!
//! ## Example
//!
//! ```rust,ignore
//! use terravox_procedural::{
//!     ChunkFillRequest, ChunkId, GeneratorConfig, MaterialRegistry, SparseWorld, WorldGenerator,
//! };
//!
//! let registry = MaterialRegistry::with_default_blocks();
//! let generator = WorldGenerator::new(GeneratorConfig::with_seed(42), &registry)?;
//!
//! let mut world = SparseWorld::new();
//! let request = ChunkFillRequest::new(ChunkId(1), [96, 0, 192], [32, 64, 32]);
//! generator.fill_chunk(&request, &mut world)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod biome;
pub mod caves;
pub mod chunk;
pub mod config;
pub mod error;
pub mod generator;
pub mod lsystem;
pub mod noise;
pub mod palette;
pub mod plants;
pub mod rng;
pub mod streaming;
pub mod terrain;
pub mod trees;
pub mod vegetation;
pub mod world;

pub use biome::{Biome, BiomeClassifier, BiomeThresholds, Climate};
pub use caves::{CaveCarver, CaveConfig};
pub use chunk::{ChunkFillRequest, ChunkId, ChunkPopulator, VoxelBuffer};
pub use config::GeneratorConfig;
pub use error::{GenError, GenResult};
pub use generator::{FillSummary, WorldGenerator};
pub use lsystem::{LSystem, Turtle, TurtleFrame};
pub use noise::{NoiseBank, NoiseChannel, SimplexNoise, WorldSeed};
pub use palette::{BlockId, BlockKind, BlockPalette, BlockRegistry, MaterialRegistry};
pub use plants::{is_good_plant_spot, MushroomShape, PlantConfig};
pub use streaming::{ChunkStreamer, FillOutcome, StreamStatsSnapshot, StreamingConfig};
pub use terrain::{ColumnField, TerrainConfig, TerrainField, WaterConfig};
pub use trees::{TreeKind, TreeShape, TreeTemplates};
pub use vegetation::{VegetationConfig, VegetationPlacer, VegetationReport};
pub use world::{SparseWorld, VoxelWorld};
