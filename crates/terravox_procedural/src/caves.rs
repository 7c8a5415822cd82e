//! # Cave Carving
//!
//! Subtractive pass folded into the populator's ground decision. Three
//! channels drive it: 3D cave pockets, 3D tunnels and 2D entrances.
//!
//! Each channel is read as a carve strength `1 - |n|`, which peaks on the
//! noise's zero-crossing sheets. Deep ground is carved where the cave or
//! tunnel strength exceeds its threshold; the top few layers only open
//! where the entrance channel allows it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::noise::{NoiseBank, NoiseChannel};
use crate::terrain::ColumnField;

/// Cave carving parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveConfig {
    /// Master switch.
    pub enabled: bool,
    /// No deep carving above this Y.
    pub max_y: i32,
    /// Cave pocket channel scale.
    pub cave_scale: f64,
    /// Cave pocket carve threshold on `1 - |n|`.
    pub cave_threshold: f64,
    /// Tunnel channel scale.
    pub tunnel_scale: f64,
    /// Tunnel carve threshold on `1 - |n|`.
    pub tunnel_threshold: f64,
    /// Entrance channel scale.
    pub entrance_scale: f64,
    /// Entrance carve threshold on `1 - |n|`.
    pub entrance_threshold: f64,
    /// How many layers under the surface an entrance opens.
    pub entrance_depth: i32,
}

impl Default for CaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_y: 60,
            cave_scale: 0.03,
            cave_threshold: 0.94,
            tunnel_scale: 0.02,
            tunnel_threshold: 0.97,
            entrance_scale: 0.05,
            entrance_threshold: 0.997,
            entrance_depth: 4,
        }
    }
}

/// Decides which ground cells become air.
pub struct CaveCarver {
    noise: Arc<NoiseBank>,
    config: CaveConfig,
}

impl CaveCarver {
    /// Creates a carver over a shared noise bank.
    #[must_use]
    pub fn new(noise: Arc<NoiseBank>, config: CaveConfig) -> Self {
        Self { noise, config }
    }

    /// Carving parameters.
    #[must_use]
    pub const fn config(&self) -> &CaveConfig {
        &self.config
    }

    #[inline]
    fn strength(sample: f64) -> f64 {
        1.0 - sample.abs()
    }

    /// True if a deep cave pocket or tunnel passes through the cell.
    #[must_use]
    pub fn is_cave(&self, x: i32, y: i32, z: i32) -> bool {
        let cfg = &self.config;
        if y > cfg.max_y {
            return false;
        }

        let (fx, fy, fz) = (f64::from(x), f64::from(y), f64::from(z));

        let cave = self.noise.noise3d(
            NoiseChannel::Cave,
            fx * cfg.cave_scale,
            fy * cfg.cave_scale,
            fz * cfg.cave_scale,
        );
        if Self::strength(cave) > cfg.cave_threshold {
            return true;
        }

        let tunnel = self.noise.noise3d(
            NoiseChannel::Tunnel,
            fx * cfg.tunnel_scale,
            fy * cfg.tunnel_scale,
            fz * cfg.tunnel_scale,
        );
        Self::strength(tunnel) > cfg.tunnel_threshold
    }

    /// True if the column has a surface opening.
    #[must_use]
    pub fn is_entrance(&self, x: i32, z: i32) -> bool {
        let cfg = &self.config;
        let n = self.noise.scaled2d(NoiseChannel::Entrance, x, z, cfg.entrance_scale);
        Self::strength(n) > cfg.entrance_threshold
    }

    /// True if the ground cell at `(x, y, z)` is carved to air.
    ///
    /// Only ground cells (`y <= surface`) are ever carved, and never in
    /// river or lake columns.
    #[must_use]
    pub fn carves(&self, column: &ColumnField, x: i32, y: i32, z: i32) -> bool {
        let cfg = &self.config;
        let surface = column.surface_height;

        if !cfg.enabled || column.water_level.is_some() || y > surface {
            return false;
        }

        if y >= surface - cfg.entrance_depth {
            return self.is_entrance(x, z);
        }

        self.is_cave(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::Biome;
    use crate::noise::WorldSeed;

    fn carver(config: CaveConfig) -> CaveCarver {
        CaveCarver::new(Arc::new(NoiseBank::new(WorldSeed::new(42))), config)
    }

    fn dry_column(surface_height: i32) -> ColumnField {
        ColumnField {
            biome: Biome::Plains,
            surface_height,
            water_level: None,
        }
    }

    #[test]
    fn test_never_carves_above_surface() {
        let c = carver(CaveConfig::default());
        let column = dry_column(40);
        for x in 0..50 {
            for y in 41..80 {
                assert!(!c.carves(&column, x, y, x * 3));
            }
        }
    }

    #[test]
    fn test_never_carves_wet_columns() {
        let c = carver(CaveConfig {
            cave_threshold: 0.0,
            tunnel_threshold: 0.0,
            entrance_threshold: 0.0,
            ..CaveConfig::default()
        });
        let column = ColumnField {
            biome: Biome::Forest,
            surface_height: 40,
            water_level: Some(37),
        };
        for y in 0..=40 {
            assert!(!c.carves(&column, 5, y, 5));
        }
    }

    #[test]
    fn test_disabled_carves_nothing() {
        let c = carver(CaveConfig {
            enabled: false,
            cave_threshold: 0.0,
            ..CaveConfig::default()
        });
        assert!(!c.carves(&dry_column(50), 1, 10, 1));
    }

    #[test]
    fn test_no_deep_caves_above_max_y() {
        let c = carver(CaveConfig {
            cave_threshold: 0.0,
            tunnel_threshold: 0.0,
            ..CaveConfig::default()
        });
        assert!(!c.is_cave(0, 61, 0));
        assert!(c.is_cave(0, 10, 0) || c.is_cave(1, 10, 1));
    }

    #[test]
    fn test_caves_are_rare_but_present() {
        let c = carver(CaveConfig::default());
        let column = dry_column(80);
        let mut carved = 0;
        let mut total = 0;
        for x in (0..256).step_by(2) {
            for z in (0..256).step_by(2) {
                for y in (0..60).step_by(3) {
                    total += 1;
                    if c.carves(&column, x, y, z) {
                        carved += 1;
                    }
                }
            }
        }
        let ratio = f64::from(carved) / f64::from(total);
        assert!(carved > 0, "Expected some carved cells");
        assert!(ratio < 0.35, "Caves should be sparse, ratio {ratio}");
    }

    #[test]
    fn test_carving_is_deterministic() {
        let a = carver(CaveConfig::default());
        let b = carver(CaveConfig::default());
        let column = dry_column(64);
        for i in 0..500 {
            let (x, y, z) = (i * 3, i % 64, i * 7);
            assert_eq!(a.carves(&column, x, y, z), b.carves(&column, x, y, z));
        }
    }
}
