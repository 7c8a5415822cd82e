//! # Height & Water Field
//!
//! Pure functions of a world column `(x, z)`:
//!
//! - surface height, composed from continental, hill, river-valley and
//!   ridge terms plus a per-biome offset
//! - optional water surface for rivers and lakes, always a fixed depth
//!   below the dry-land height of the same column
//!
//! Neither depends on call order or chunk boundaries, so adjacent chunks
//! agree on shared edges without talking to each other.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::biome::{Biome, BiomeClassifier};
use crate::noise::{NoiseBank, NoiseChannel};

/// Height field constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Height before any noise term.
    pub base_height: f64,
    /// Continental term: sampling scale of the height channel.
    pub continent_scale: f64,
    /// Continental term amplitude.
    pub continent_amplitude: f64,
    /// Hill term scale.
    pub hill_scale: f64,
    /// Hill term amplitude.
    pub hill_amplitude: f64,
    /// River valley scale.
    pub river_carve_scale: f64,
    /// Maximum valley depth (reached on the channel's zero crossings).
    pub river_carve_depth: f64,
    /// Ridge scale.
    pub ridge_scale: f64,
    /// Ridge amplitude (applied to the squared absolute sample).
    pub ridge_amplitude: f64,
    /// Additive offset for plains.
    pub plains_offset: f64,
    /// Additive offset for forest.
    pub forest_offset: f64,
    /// Additive offset for desert.
    pub desert_offset: f64,
    /// Additive offset for tundra.
    pub tundra_offset: f64,
    /// Additive offset for mountain.
    pub mountain_offset: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            base_height: 38.0,
            continent_scale: 0.0012,
            continent_amplitude: 32.0,
            hill_scale: 0.01,
            hill_amplitude: 10.0,
            river_carve_scale: 0.004,
            river_carve_depth: 14.0,
            ridge_scale: 0.006,
            ridge_amplitude: 75.0,
            plains_offset: 0.0,
            forest_offset: 2.0,
            desert_offset: -3.0,
            tundra_offset: -2.0,
            mountain_offset: 6.0,
        }
    }
}

impl TerrainConfig {
    /// Additive height offset for a biome.
    #[must_use]
    pub const fn biome_offset(&self, biome: Biome) -> f64 {
        match biome {
            Biome::Plains => self.plains_offset,
            Biome::Forest => self.forest_offset,
            Biome::Desert => self.desert_offset,
            Biome::Tundra => self.tundra_offset,
            Biome::Mountain => self.mountain_offset,
        }
    }
}

/// River and lake detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterConfig {
    /// River channel scale.
    pub river_scale: f64,
    /// A column is river when `|river| < river_band`.
    pub river_band: f64,
    /// Lake channel scale.
    pub lake_scale: f64,
    /// A column is lake when `lake > lake_threshold`.
    pub lake_threshold: f64,
    /// Water surface depth below the dry-land height.
    pub depth: i32,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            river_scale: 0.002,
            river_band: 0.10,
            lake_scale: 0.003,
            lake_threshold: 0.45,
            depth: 3,
        }
    }
}

/// Everything the populator needs to know about one column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnField {
    /// Column biome.
    pub biome: Biome,
    /// Y of the topmost ground block.
    pub surface_height: i32,
    /// Y of the water surface, for river and lake columns.
    pub water_level: Option<i32>,
}

/// The height and water field over the whole world.
pub struct TerrainField {
    noise: Arc<NoiseBank>,
    classifier: BiomeClassifier,
    terrain: TerrainConfig,
    water: WaterConfig,
}

impl TerrainField {
    /// Creates the field over a shared noise bank.
    #[must_use]
    pub fn new(
        noise: Arc<NoiseBank>,
        classifier: BiomeClassifier,
        terrain: TerrainConfig,
        water: WaterConfig,
    ) -> Self {
        Self {
            noise,
            classifier,
            terrain,
            water,
        }
    }

    /// The biome classifier this field uses.
    #[must_use]
    pub const fn classifier(&self) -> &BiomeClassifier {
        &self.classifier
    }

    /// Biome of a column.
    #[inline]
    #[must_use]
    pub fn biome(&self, x: i32, z: i32) -> Biome {
        self.classifier.classify(x, z)
    }

    /// Surface height of a column.
    #[must_use]
    pub fn height_at(&self, x: i32, z: i32) -> i32 {
        self.height_for_biome(x, z, self.biome(x, z))
    }

    /// Surface height given an already-classified biome.
    #[must_use]
    pub fn height_for_biome(&self, x: i32, z: i32, biome: Biome) -> i32 {
        let cfg = &self.terrain;
        let noise = &self.noise;

        let continent = noise.scaled2d(NoiseChannel::Height, x, z, cfg.continent_scale)
            * cfg.continent_amplitude;
        let hills = noise.scaled2d(NoiseChannel::Detail, x, z, cfg.hill_scale) * cfg.hill_amplitude;

        // Deepest where the carve channel crosses zero
        let carve = noise
            .scaled2d(NoiseChannel::RiverCarve, x, z, cfg.river_carve_scale)
            .abs();
        let valley = (1.0 - carve) * cfg.river_carve_depth;

        let ridge = noise.scaled2d(NoiseChannel::Ridge, x, z, cfg.ridge_scale).abs();
        let ridges = ridge * ridge * cfg.ridge_amplitude;

        let height = cfg.base_height + continent + hills - valley + ridges + cfg.biome_offset(biome);
        height.floor() as i32
    }

    /// Returns true if the column lies in a river or lake band.
    #[must_use]
    pub fn is_wet(&self, x: i32, z: i32) -> bool {
        let cfg = &self.water;
        let river = self.noise.scaled2d(NoiseChannel::River, x, z, cfg.river_scale);
        if river.abs() < cfg.river_band {
            return true;
        }
        self.noise.scaled2d(NoiseChannel::Lake, x, z, cfg.lake_scale) > cfg.lake_threshold
    }

    /// Water surface of a column, if it is a river or lake.
    #[must_use]
    pub fn water_level(&self, x: i32, z: i32) -> Option<i32> {
        self.is_wet(x, z)
            .then(|| self.height_at(x, z) - self.water.depth)
    }

    /// Biome, height and water for a column, classifying only once.
    #[must_use]
    pub fn column(&self, x: i32, z: i32) -> ColumnField {
        let biome = self.biome(x, z);
        let surface_height = self.height_for_biome(x, z, biome);
        let water_level = self
            .is_wet(x, z)
            .then_some(surface_height - self.water.depth);

        ColumnField {
            biome,
            surface_height,
            water_level,
        }
    }
}
