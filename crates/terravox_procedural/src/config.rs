//! # Generator Configuration
//!
//! One TOML document, one section per subsystem. Every field has a
//! default, so an empty file (or no file at all) yields the stock world.
//!
//! ```toml
//! seed = 12345
//! install_global_seed = true
//! floor_y = 0
//!
//! [terrain]
//! base_height = 40.0
//!
//! [vegetation]
//! oak_chance = 0.3
//!
//! [trees.pine]
//! trunk_max = 20
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::biome::BiomeThresholds;
use crate::caves::CaveConfig;
use crate::error::{GenError, GenResult};
use crate::streaming::StreamingConfig;
use crate::terrain::{TerrainConfig, WaterConfig};
use crate::trees::TreeTemplates;
use crate::vegetation::VegetationConfig;

/// Complete generator configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// World seed.
    pub seed: u64,
    /// Also install `seed` as the process-wide seed on construction.
    pub install_global_seed: bool,
    /// Chunk layer (origin Y) that triggers vegetation.
    pub floor_y: i32,
    /// Height field.
    pub terrain: TerrainConfig,
    /// Biome thresholds.
    pub biomes: BiomeThresholds,
    /// Rivers and lakes.
    pub water: WaterConfig,
    /// Cave carving.
    pub caves: CaveConfig,
    /// Vegetation density.
    pub vegetation: VegetationConfig,
    /// Tree shapes.
    pub trees: TreeTemplates,
    /// Worker pool.
    pub streaming: StreamingConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            install_global_seed: false,
            floor_y: 0,
            terrain: TerrainConfig::default(),
            biomes: BiomeThresholds::default(),
            water: WaterConfig::default(),
            caves: CaveConfig::default(),
            vegetation: VegetationConfig::default(),
            trees: TreeTemplates::default(),
            streaming: StreamingConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Default configuration with a different seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::Config`] on malformed TOML or invalid values.
    pub fn from_toml_str(text: &str) -> GenResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::Io`] if the file cannot be read, otherwise as
    /// [`GeneratorConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> GenResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!("loaded generator config from {}", path.display());
        Ok(config)
    }

    /// Serializes to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::Config`] if serialization fails.
    pub fn to_toml_string(&self) -> GenResult<String> {
        toml::to_string(self).map_err(|e| GenError::Config(e.to_string()))
    }

    /// Rejects values no world can be built from.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::Config`] naming the first bad field.
    pub fn validate(&self) -> GenResult<()> {
        if self.streaming.workers == 0 {
            return Err(GenError::Config("streaming.workers must be at least 1".into()));
        }
        if self.water.depth < 0 {
            return Err(GenError::Config("water.depth must not be negative".into()));
        }
        if self.caves.entrance_depth < 0 {
            return Err(GenError::Config("caves.entrance_depth must not be negative".into()));
        }
        let trees = &self.trees;
        if trees.oak.trunk_min < 1 || trees.pine.trunk_min < 1 || trees.palm.trunk_min < 1 {
            return Err(GenError::Config("tree trunk_min must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = GeneratorConfig::from_toml_str("").unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let text = r#"
            seed = 777
            floor_y = -64

            [terrain]
            base_height = 50.0

            [vegetation]
            candidates = 4

            [trees.pine]
            trunk_max = 22

            [biomes]
            tundra_below_temperature = -0.5
        "#;
        let config = GeneratorConfig::from_toml_str(text).unwrap();

        assert_eq!(config.seed, 777);
        assert_eq!(config.floor_y, -64);
        assert_eq!(config.terrain.base_height, 50.0);
        assert_eq!(config.terrain.ridge_amplitude, 75.0);
        assert_eq!(config.vegetation.candidates, 4);
        assert_eq!(config.vegetation.oak_chance, 0.42);
        assert_eq!(config.trees.pine.trunk_max, 22);
        assert_eq!(config.trees.pine.trunk_min, 12);
        assert_eq!(config.biomes.tundra_below_temperature, -0.5);
    }

    #[test]
    fn test_oak_grammar_in_toml() {
        let text = r#"
            [trees.oak]
            iterations = 1

            [trees.oak.grammar]
            axiom = "FF"
            rules = [{ symbol = "F", replacement = "F[+F]" }]
        "#;
        let config = GeneratorConfig::from_toml_str(text).unwrap();
        assert_eq!(config.trees.oak.grammar.expand(1), "F[+F]F[+F]");
    }

    #[test]
    fn test_malformed_toml() {
        let err = GeneratorConfig::from_toml_str("seed = [").unwrap_err();
        assert!(matches!(err, GenError::Config(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = GeneratorConfig::from_toml_str("[streaming]\nworkers = 0").unwrap_err();
        assert!(matches!(err, GenError::Config(_)));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = GeneratorConfig::with_seed(9);
        let text = config.to_toml_string().unwrap();
        assert_eq!(GeneratorConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        let err = GeneratorConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, GenError::Io(_)));
    }
}
