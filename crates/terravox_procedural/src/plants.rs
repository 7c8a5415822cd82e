//! # Plant Placer
//!
//! Spot validation, small ground plants and the giant mushroom.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::biome::Biome;
use crate::chunk::ChunkPopulator;
use crate::palette::{BlockId, BlockKind, BlockPalette};
use crate::rng::pick;
use crate::terrain::ColumnField;
use crate::world::VoxelWorld;

/// Giant mushroom shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MushroomTemplate {
    /// Shortest stem.
    pub stem_min: i32,
    /// Tallest stem.
    pub stem_max: i32,
    /// Smallest cap radius.
    pub cap_min: i32,
    /// Largest cap radius.
    pub cap_max: i32,
    /// Added to the radius in the lower cap's distance test.
    pub cap_slack: f64,
}

impl Default for MushroomTemplate {
    fn default() -> Self {
        Self {
            stem_min: 6,
            stem_max: 10,
            cap_min: 4,
            cap_max: 6,
            cap_slack: 0.3,
        }
    }
}

/// Plant pass tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    /// Chance a temperate plant is a flower rather than grass.
    pub flower_chance: f64,
    /// Chance a valid forest spot gets a giant mushroom.
    pub mushroom_chance: f64,
    /// Mushroom shape.
    pub mushroom: MushroomTemplate,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            flower_chance: 0.25,
            mushroom_chance: 0.02,
            mushroom: MushroomTemplate::default(),
        }
    }
}

/// What a giant mushroom wrote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MushroomShape {
    /// Lowest stem voxel.
    pub base: [i32; 3],
    /// Stem length.
    pub stem_height: i32,
    /// Lower cap radius.
    pub cap_radius: i32,
    /// Total writes.
    pub blocks: usize,
}

/// Returns true if a plant may root on the ground block at `(x, y, z)`.
///
/// Rejects spots at or below the column's water surface, ground that is
/// air, water, ice or snow, and ground with water directly above. Both
/// cells are judged from the generated terrain, not the live world, so the
/// answer does not depend on which chunks are loaded.
#[must_use]
pub fn is_good_plant_spot(
    ground: &ChunkPopulator,
    column: &ColumnField,
    x: i32,
    y: i32,
    z: i32,
) -> bool {
    if column.water_level.is_some_and(|w| y <= w) {
        return false;
    }

    let palette = ground.palette();
    let block = ground.block_at(column, x, y, z);
    let unusable = block.is_air()
        || palette.is(block, BlockKind::Water)
        || palette.is(block, BlockKind::Ice)
        || palette.is(block, BlockKind::Snow);
    if unusable {
        return false;
    }

    let above = ground.block_at(column, x, y.saturating_add(1), z);
    !palette.is(above, BlockKind::Water)
}

/// Small plant suited to a biome, if any grows there.
///
/// `flower_roll` is a uniform sample in `[0, 1)` drawn by the caller.
#[must_use]
pub fn small_plant_for(biome: Biome, config: &PlantConfig, flower_roll: f64) -> Option<BlockKind> {
    match biome {
        Biome::Plains | Biome::Forest => Some(if flower_roll < config.flower_chance {
            BlockKind::Flower
        } else {
            BlockKind::TallGrass
        }),
        Biome::Desert => Some(BlockKind::DeadBush),
        Biome::Tundra | Biome::Mountain => None,
    }
}

/// Places a single plant block on top of `ground` if that cell is air.
pub fn place_small_plant<W: VoxelWorld + ?Sized>(
    world: &mut W,
    palette: &BlockPalette,
    kind: BlockKind,
    [x, y, z]: [i32; 3],
) -> bool {
    if !world.get_block(x, y + 1, z).is_air() {
        return false;
    }
    world.set_block(palette.id(kind), x, y + 1, z);
    true
}

/// Grows a giant mushroom with its lowest stem voxel at `base`.
pub fn grow_giant_mushroom<W, R>(
    world: &mut W,
    palette: &BlockPalette,
    template: &MushroomTemplate,
    rng: &mut R,
    base: [i32; 3],
) -> MushroomShape
where
    W: VoxelWorld + ?Sized,
    R: Rng + ?Sized,
{
    let stem = palette.id(BlockKind::MushroomStem);
    let cap = palette.id(BlockKind::MushroomCap);
    let [x, y, z] = base;
    let mut blocks = 0;
    let mut put = |id: BlockId, px: i32, py: i32, pz: i32| {
        world.set_block(id, px, py, pz);
        blocks += 1;
    };

    let stem_height = pick(rng, template.stem_min, template.stem_max).max(1);
    for i in 0..stem_height {
        put(stem, x, y + i, z);
    }

    let cap_y = y + stem_height;
    let r = pick(rng, template.cap_min, template.cap_max).max(1);

    let lower = f64::from(r) + template.cap_slack;
    for dz in -r..=r {
        for dx in -r..=r {
            if f64::from(dx * dx + dz * dz).sqrt() <= lower {
                put(cap, x + dx, cap_y, z + dz);
            }
        }
    }

    let inner = r - 1;
    for dz in -inner..=inner {
        for dx in -inner..=inner {
            if dx * dx + dz * dz <= inner * inner {
                put(cap, x + dx, cap_y + 1, z + dz);
            }
        }
    }

    for (dx, dz) in [(0, 0), (1, 0), (-1, 0), (0, 1), (0, -1)] {
        put(cap, x + dx, cap_y + 2, z + dz);
    }

    tracing::trace!("giant mushroom at {:?}, stem {}, cap {}", base, stem_height, r);
    MushroomShape {
        base,
        stem_height,
        cap_radius: r,
        blocks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::{BiomeClassifier, BiomeThresholds};
    use crate::caves::{CaveCarver, CaveConfig};
    use crate::noise::{NoiseBank, WorldSeed};
    use crate::palette::MaterialRegistry;
    use crate::terrain::{TerrainConfig, TerrainField, WaterConfig};
    use crate::world::SparseWorld;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::Arc;

    fn palette() -> BlockPalette {
        BlockPalette::resolve(&MaterialRegistry::with_default_blocks()).unwrap()
    }

    fn ground() -> ChunkPopulator {
        let noise = Arc::new(NoiseBank::new(WorldSeed::new(42)));
        let classifier = BiomeClassifier::new(Arc::clone(&noise), BiomeThresholds::default());
        let terrain = TerrainField::new(
            Arc::clone(&noise),
            classifier,
            TerrainConfig::default(),
            WaterConfig::default(),
        );
        let caves = CaveCarver::new(noise, CaveConfig::default());
        ChunkPopulator::new(Arc::new(terrain), Arc::new(caves), palette())
    }

    /// First column along a diagonal walk matching `want`.
    fn find_column(
        g: &ChunkPopulator,
        want: impl Fn(&ColumnField, i32, i32) -> bool,
    ) -> (ColumnField, i32, i32) {
        for step in 0..200_000 {
            let (x, z) = (step * 7 - 700_000, step * 3);
            let column = g.terrain().column(x, z);
            if want(&column, x, z) {
                return (column, x, z);
            }
        }
        panic!("no matching column");
    }

    #[test]
    fn test_plant_spot_on_dry_grass() {
        let g = ground();
        let (column, x, z) = find_column(&g, |c, x, z| {
            c.water_level.is_none()
                && matches!(c.biome, Biome::Plains | Biome::Forest)
                && !g.caves().carves(c, x, c.surface_height, z)
        });
        let h = column.surface_height;

        assert!(is_good_plant_spot(&g, &column, x, h, z));
        // Open air above the surface is no ground
        assert!(!is_good_plant_spot(&g, &column, x, h + 1, z));
        assert!(!is_good_plant_spot(&g, &column, x, h + 20, z));
    }

    #[test]
    fn test_plant_spot_rejects_snow() {
        let g = ground();
        let (column, x, z) = find_column(&g, |c, x, z| {
            c.water_level.is_none()
                && c.biome == Biome::Tundra
                && !g.caves().carves(c, x, c.surface_height, z)
        });
        assert!(!is_good_plant_spot(&g, &column, x, column.surface_height, z));
    }

    #[test]
    fn test_plant_spot_rejects_underwater() {
        let g = ground();
        let (column, x, z) = find_column(&g, |c, _, _| {
            c.water_level.is_some() && matches!(c.biome, Biome::Plains | Biome::Desert)
        });
        let level = column.water_level.unwrap();

        assert!(!is_good_plant_spot(&g, &column, x, level, z));
        assert!(!is_good_plant_spot(&g, &column, x, level - 2, z));
        // The surface sits above the water level and is never carved here
        assert!(is_good_plant_spot(&g, &column, x, column.surface_height, z));
    }

    #[test]
    fn test_small_plants_by_biome() {
        let config = PlantConfig::default();
        assert_eq!(small_plant_for(Biome::Plains, &config, 0.1), Some(BlockKind::Flower));
        assert_eq!(small_plant_for(Biome::Forest, &config, 0.9), Some(BlockKind::TallGrass));
        assert_eq!(small_plant_for(Biome::Desert, &config, 0.1), Some(BlockKind::DeadBush));
        assert_eq!(small_plant_for(Biome::Tundra, &config, 0.1), None);
        assert_eq!(small_plant_for(Biome::Mountain, &config, 0.9), None);
    }

    #[test]
    fn test_small_plant_needs_air() {
        let p = palette();
        let mut world = SparseWorld::new();
        assert!(place_small_plant(&mut world, &p, BlockKind::Flower, [0, 10, 0]));
        assert_eq!(world.get_block(0, 11, 0), p.id(BlockKind::Flower));
        assert!(!place_small_plant(&mut world, &p, BlockKind::TallGrass, [0, 10, 0]));
    }

    #[test]
    fn test_giant_mushroom_shape() {
        let p = palette();
        let template = MushroomTemplate::default();

        for seed in 0..10 {
            let mut world = SparseWorld::new();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let shape = grow_giant_mushroom(&mut world, &p, &template, &mut rng, [0, 20, 0]);

            assert!((6..=10).contains(&shape.stem_height));
            assert!((4..=6).contains(&shape.cap_radius));

            let cap_y = 20 + shape.stem_height;
            let cap = p.id(BlockKind::MushroomCap);
            assert_eq!(world.get_block(0, cap_y - 1, 0), p.id(BlockKind::MushroomStem));
            assert_eq!(world.get_block(shape.cap_radius, cap_y, 0), cap);
            assert_eq!(world.get_block(shape.cap_radius + 1, cap_y, 0), BlockId::AIR);
            assert_eq!(world.get_block(shape.cap_radius - 1, cap_y + 1, 0), cap);
            assert_eq!(world.get_block(shape.cap_radius, cap_y + 1, 0), BlockId::AIR);
            assert_eq!(world.get_block(0, cap_y + 2, 1), cap);
            assert_eq!(world.get_block(1, cap_y + 2, 1), BlockId::AIR);
        }
    }
}
