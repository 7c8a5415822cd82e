//! # Vegetation Placer
//!
//! Runs once per chunk footprint, after the ground is committed.
//!
//! Two passes, both driven by the chunk's own random stream:
//!
//! 1. **Trees**: a fixed number of candidate columns, each rolling
//!    independently for every species its biome allows.
//! 2. **Plants**: random columns validated with [`is_good_plant_spot`],
//!    getting a small plant or (in forests, rarely) a giant mushroom.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::biome::Biome;
use crate::chunk::ChunkPopulator;
use crate::plants::{
    grow_giant_mushroom, is_good_plant_spot, place_small_plant, small_plant_for, MushroomShape,
    PlantConfig,
};
use crate::rng::roll;
use crate::trees::{grow_oak, grow_palm, grow_snow_pine, TreeShape, TreeTemplates};
use crate::world::VoxelWorld;

/// Vegetation density.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VegetationConfig {
    /// Master switch.
    pub enabled: bool,
    /// Tree candidate columns per chunk.
    pub candidates: u32,
    /// Oak chance per forest or plains candidate.
    pub oak_chance: f64,
    /// Snow pine chance per forest, tundra or mountain candidate.
    pub pine_chance: f64,
    /// Palm chance per desert candidate.
    pub palm_chance: f64,
    /// Plant pass attempts per chunk.
    pub plant_attempts: u32,
    /// Plant pass tuning.
    pub plants: PlantConfig,
}

impl Default for VegetationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            candidates: 10,
            oak_chance: 0.42,
            pine_chance: 0.20,
            palm_chance: 0.45,
            plant_attempts: 16,
            plants: PlantConfig::default(),
        }
    }
}

/// Everything placed in one chunk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VegetationReport {
    /// Trees, in placement order.
    pub trees: Vec<TreeShape>,
    /// Small plants.
    pub plants: usize,
    /// Giant mushrooms.
    pub mushrooms: Vec<MushroomShape>,
}

/// Places trees and plants over chunk footprints.
pub struct VegetationPlacer {
    ground: ChunkPopulator,
    config: VegetationConfig,
    templates: TreeTemplates,
}

impl VegetationPlacer {
    /// Creates a placer. Plant spots are judged against `ground`.
    #[must_use]
    pub fn new(ground: ChunkPopulator, config: VegetationConfig, templates: TreeTemplates) -> Self {
        Self {
            ground,
            config,
            templates,
        }
    }

    /// Density settings.
    #[must_use]
    pub const fn config(&self) -> &VegetationConfig {
        &self.config
    }

    /// Tree templates.
    #[must_use]
    pub const fn templates(&self) -> &TreeTemplates {
        &self.templates
    }

    /// Populates the footprint `[x0, x0 + sx) × [z0, z0 + sz)`.
    pub fn place_in_chunk<W, R>(
        &self,
        world: &mut W,
        rng: &mut R,
        [x0, z0]: [i32; 2],
        [sx, sz]: [i32; 2],
    ) -> VegetationReport
    where
        W: VoxelWorld + ?Sized,
        R: Rng + ?Sized,
    {
        let mut report = VegetationReport::default();
        if !self.config.enabled || sx <= 0 || sz <= 0 {
            return report;
        }

        self.place_trees(world, rng, [x0, z0], [sx, sz], &mut report);
        self.place_plants(world, rng, [x0, z0], [sx, sz], &mut report);

        tracing::debug!(
            "vegetation at ({}, {}): {} trees, {} plants, {} mushrooms",
            x0,
            z0,
            report.trees.len(),
            report.plants,
            report.mushrooms.len()
        );
        report
    }

    fn place_trees<W, R>(
        &self,
        world: &mut W,
        rng: &mut R,
        [x0, z0]: [i32; 2],
        [sx, sz]: [i32; 2],
        report: &mut VegetationReport,
    ) where
        W: VoxelWorld + ?Sized,
        R: Rng + ?Sized,
    {
        let cfg = &self.config;
        let templates = &self.templates;
        let palette = self.ground.palette();

        for _ in 0..cfg.candidates {
            let x = x0 + rng.gen_range(0..sx);
            let z = z0 + rng.gen_range(0..sz);
            let column = self.ground.terrain().column(x, z);
            let root = [x, column.surface_height + 1, z];

            if matches!(column.biome, Biome::Forest | Biome::Plains) && roll(rng, cfg.oak_chance) {
                let tree = grow_oak(world, palette, &templates.oak, rng, root);
                report.trees.push(tree);
            }

            if matches!(column.biome, Biome::Forest | Biome::Tundra | Biome::Mountain)
                && roll(rng, cfg.pine_chance)
            {
                let tree = grow_snow_pine(world, palette, &templates.pine, rng, root);
                report.trees.push(tree);
            }

            if column.biome == Biome::Desert && roll(rng, cfg.palm_chance) {
                let tree = grow_palm(world, palette, &templates.palm, rng, root);
                report.trees.push(tree);
            }
        }
    }

    fn place_plants<W, R>(
        &self,
        world: &mut W,
        rng: &mut R,
        [x0, z0]: [i32; 2],
        [sx, sz]: [i32; 2],
        report: &mut VegetationReport,
    ) where
        W: VoxelWorld + ?Sized,
        R: Rng + ?Sized,
    {
        let plants = &self.config.plants;
        let palette = self.ground.palette();

        for _ in 0..self.config.plant_attempts {
            // Same draws per attempt whether or not the spot is usable
            let x = x0 + rng.gen_range(0..sx);
            let z = z0 + rng.gen_range(0..sz);
            let mushroom_roll: f64 = rng.gen();
            let flower_roll: f64 = rng.gen();

            let column = self.ground.terrain().column(x, z);
            let y = column.surface_height;
            if !is_good_plant_spot(&self.ground, &column, x, y, z) {
                continue;
            }

            if column.biome == Biome::Forest && mushroom_roll < plants.mushroom_chance {
                let shape =
                    grow_giant_mushroom(world, palette, &plants.mushroom, rng, [x, y + 1, z]);
                report.mushrooms.push(shape);
                continue;
            }

            if let Some(kind) = small_plant_for(column.biome, plants, flower_roll) {
                if place_small_plant(world, palette, kind, [x, y, z]) {
                    report.plants += 1;
                }
            }
        }
    }
}
