//! # Biome Classification
//!
//! Determines terrain type from noise values.
//!
//! Uses a climate model based on:
//! - Temperature (large-scale noise channel)
//! - Moisture (a separate noise channel)
//! - Height (the continental channel, for the mountain override)
//!
//! This is the single place biome thresholds live. Height, water and
//! vegetation all consume the closed [`Biome`] enum it returns.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::noise::{NoiseBank, NoiseChannel};
use crate::palette::BlockKind;

/// Biome types in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Biome {
    /// Grassland (the default)
    Plains = 0,
    /// Temperate forest
    Forest = 1,
    /// Hot, dry sand
    Desert = 2,
    /// Cold, snow-covered lowland
    Tundra = 3,
    /// High ground
    Mountain = 4,
}

impl Biome {
    /// Every biome, in discriminant order.
    pub const ALL: [Self; 5] = [
        Self::Plains,
        Self::Forest,
        Self::Desert,
        Self::Tundra,
        Self::Mountain,
    ];

    /// Lowercase name, as used in config files and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Plains => "plains",
            Self::Forest => "forest",
            Self::Desert => "desert",
            Self::Tundra => "tundra",
            Self::Mountain => "mountain",
        }
    }

    /// Block placed at the surface height of a column.
    #[must_use]
    pub const fn surface_block(self) -> BlockKind {
        match self {
            Self::Desert => BlockKind::Sand,
            Self::Tundra | Self::Mountain => BlockKind::Snow,
            Self::Plains | Self::Forest => BlockKind::Grass,
        }
    }

    /// Block filling the four layers under the surface.
    #[must_use]
    pub const fn subsurface_block(self) -> BlockKind {
        match self {
            Self::Tundra | Self::Mountain => BlockKind::TundraDirt,
            Self::Plains | Self::Forest | Self::Desert => BlockKind::Dirt,
        }
    }

    /// Converts from u8.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Forest,
            2 => Self::Desert,
            3 => Self::Tundra,
            4 => Self::Mountain,
            _ => Self::Plains,
        }
    }
}

/// Classification thresholds on [-1, 1] climate samples.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeThresholds {
    /// Temperature below this is tundra.
    pub tundra_below_temperature: f64,
    /// Temperature above this (and dry enough) is desert.
    pub desert_above_temperature: f64,
    /// Moisture below this (and hot enough) is desert.
    pub desert_below_moisture: f64,
    /// Height sample above this is mountain.
    pub mountain_above_height: f64,
    /// Moisture above this is forest.
    pub forest_above_moisture: f64,
    /// Sampling scale of the temperature channel.
    pub temperature_scale: f64,
    /// Sampling scale of the moisture channel.
    pub moisture_scale: f64,
    /// Sampling scale of the height channel.
    pub height_scale: f64,
}

impl Default for BiomeThresholds {
    fn default() -> Self {
        Self {
            tundra_below_temperature: -0.35,
            desert_above_temperature: 0.25,
            desert_below_moisture: -0.1,
            mountain_above_height: 0.42,
            forest_above_moisture: 0.25,
            temperature_scale: 0.001,
            moisture_scale: 0.001,
            height_scale: 0.0008,
        }
    }
}

/// Raw climate samples for one column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Climate {
    /// Temperature in [-1, 1].
    pub temperature: f64,
    /// Moisture in [-1, 1].
    pub moisture: f64,
    /// Large-scale height in [-1, 1].
    pub height: f64,
}

/// Biome classifier that determines biome from world coordinates.
pub struct BiomeClassifier {
    noise: Arc<NoiseBank>,
    thresholds: BiomeThresholds,
}

impl BiomeClassifier {
    /// Creates a classifier over a shared noise bank.
    #[must_use]
    pub fn new(noise: Arc<NoiseBank>, thresholds: BiomeThresholds) -> Self {
        Self { noise, thresholds }
    }

    /// The thresholds in use.
    #[must_use]
    pub const fn thresholds(&self) -> &BiomeThresholds {
        &self.thresholds
    }

    /// Samples the climate channels for a column.
    #[must_use]
    pub fn climate(&self, x: i32, z: i32) -> Climate {
        let t = &self.thresholds;
        Climate {
            temperature: self
                .noise
                .scaled2d(NoiseChannel::Temperature, x, z, t.temperature_scale),
            moisture: self.noise.scaled2d(NoiseChannel::Moisture, x, z, t.moisture_scale),
            height: self.noise.scaled2d(NoiseChannel::Height, x, z, t.height_scale),
        }
    }

    /// Classifies the biome at a world column. Total: every column has one.
    #[must_use]
    pub fn classify(&self, x: i32, z: i32) -> Biome {
        self.classify_climate(self.climate(x, z))
    }

    /// Classifies biome from climate values.
    #[must_use]
    pub fn classify_climate(&self, climate: Climate) -> Biome {
        let t = &self.thresholds;

        if climate.temperature < t.tundra_below_temperature {
            return Biome::Tundra;
        }
        if climate.temperature > t.desert_above_temperature
            && climate.moisture < t.desert_below_moisture
        {
            return Biome::Desert;
        }
        if climate.height > t.mountain_above_height {
            return Biome::Mountain;
        }
        if climate.moisture > t.forest_above_moisture {
            return Biome::Forest;
        }

        Biome::Plains
    }
}
