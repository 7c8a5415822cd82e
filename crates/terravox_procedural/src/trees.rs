//! # Tree Generators
//!
//! Three structural algorithms that write logs and leaves straight into the
//! world:
//!
//! - **Oak**: straight trunk, L-system branches with leaf scatter, solid
//!   crown sphere
//! - **Snow pine**: straight trunk, stacked leaf discs narrowing upward
//! - **Palm**: drifting trunk, eight drooping fronds, small cap
//!
//! Generators do no bounds checks. The world collaborator accepts writes
//! anywhere, including into chunks that do not exist yet.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::lsystem::{LSystem, Turtle, TurtleFrame};
use crate::palette::{BlockId, BlockKind, BlockPalette};
use crate::rng::{pick, roll};
use crate::world::VoxelWorld;

/// Tree species.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeKind {
    /// Branching deciduous tree.
    Oak,
    /// Layered conifer.
    SnowPine,
    /// Leaning palm.
    Palm,
}

/// What a generator wrote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeShape {
    /// Species.
    pub kind: TreeKind,
    /// Lowest trunk voxel.
    pub base: [i32; 3],
    /// Trunk length in voxels.
    pub trunk_height: i32,
    /// Log writes.
    pub logs: usize,
    /// Leaf writes.
    pub leaves: usize,
}

/// Oak parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OakTemplate {
    /// Shortest trunk.
    pub trunk_min: i32,
    /// Tallest trunk.
    pub trunk_max: i32,
    /// Branch grammar.
    pub grammar: LSystem,
    /// Rewriting passes.
    pub iterations: u32,
    /// Yaw change for `+`/`-`, degrees.
    pub yaw_step_deg: f64,
    /// Pitch change for `^`/`v`, degrees.
    pub pitch_step_deg: f64,
    /// Initial turtle pitch, degrees above horizontal.
    pub start_pitch_deg: f64,
    /// Leaf scatter radius around each branch tip.
    pub scatter_radius: f64,
    /// Chance each scatter cell gets a leaf.
    pub scatter_chance: f64,
    /// Crown sphere radius.
    pub crown_radius: i32,
    /// Slack added to `r²` in the crown inclusion test.
    pub crown_slack: i32,
}

impl Default for OakTemplate {
    fn default() -> Self {
        Self {
            trunk_min: 5,
            trunk_max: 7,
            grammar: LSystem::new("F", 'F', "F[+F][-F][^F][vF]"),
            iterations: 2,
            yaw_step_deg: 60.0,
            pitch_step_deg: 30.0,
            start_pitch_deg: 60.0,
            scatter_radius: 1.4,
            scatter_chance: 0.45,
            crown_radius: 3,
            crown_slack: 2,
        }
    }
}

/// Snow pine parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PineTemplate {
    /// Shortest trunk.
    pub trunk_min: i32,
    /// Tallest trunk.
    pub trunk_max: i32,
    /// Fraction of the trunk that stays bare.
    pub bare_fraction: f64,
    /// Disc radius at the lowest leaf layer.
    pub base_radius: i32,
    /// Layers per radius step.
    pub layers_per_step: i32,
}

impl Default for PineTemplate {
    fn default() -> Self {
        Self {
            trunk_min: 12,
            trunk_max: 18,
            bare_fraction: 0.3,
            base_radius: 5,
            layers_per_step: 2,
        }
    }
}

impl PineTemplate {
    /// Leaf disc radius `d` layers above the first leaf layer.
    #[must_use]
    pub fn radius_at(&self, d: i32) -> i32 {
        let step = self.layers_per_step.max(1);
        (self.base_radius - d.div_euclid(step)).max(1)
    }
}

/// Palm parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PalmTemplate {
    /// Shortest trunk.
    pub trunk_min: i32,
    /// Tallest trunk.
    pub trunk_max: i32,
    /// Largest per-step drift along X or Z.
    pub max_lean: f64,
    /// Shortest frond.
    pub frond_min: i32,
    /// Longest frond.
    pub frond_max: i32,
    /// Frond voxels before drooping may start.
    pub droop_after: i32,
    /// Per-step droop chance.
    pub droop_chance: f64,
    /// Chance of each extra leaf under the cap.
    pub cap_droop_chance: f64,
}

impl Default for PalmTemplate {
    fn default() -> Self {
        Self {
            trunk_min: 7,
            trunk_max: 11,
            max_lean: 0.3,
            frond_min: 4,
            frond_max: 5,
            droop_after: 2,
            droop_chance: 0.5,
            cap_droop_chance: 0.5,
        }
    }
}

/// All tree templates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeTemplates {
    /// Oak.
    pub oak: OakTemplate,
    /// Snow pine.
    pub pine: PineTemplate,
    /// Palm.
    pub palm: PalmTemplate,
}

/// Compass and diagonal directions, for fronds.
const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (-1, 1),
    (1, -1),
    (-1, -1),
];

/// Counting writer shared by every generator.
struct Planter<'w, W: VoxelWorld + ?Sized> {
    world: &'w mut W,
    log: BlockId,
    leaf: BlockId,
    logs: usize,
    leaves: usize,
}

impl<'w, W: VoxelWorld + ?Sized> Planter<'w, W> {
    fn new(world: &'w mut W, palette: &BlockPalette, log: BlockKind, leaf: BlockKind) -> Self {
        Self {
            world,
            log: palette.id(log),
            leaf: palette.id(leaf),
            logs: 0,
            leaves: 0,
        }
    }

    fn log(&mut self, [x, y, z]: [i32; 3]) {
        self.world.set_block(self.log, x, y, z);
        self.logs += 1;
    }

    fn leaf(&mut self, [x, y, z]: [i32; 3]) {
        if self.world.get_block(x, y, z) == self.log {
            return;
        }
        self.world.set_block(self.leaf, x, y, z);
        self.leaves += 1;
    }

    fn trunk(&mut self, [x, y, z]: [i32; 3], height: i32) {
        for i in 0..height {
            self.log([x, y + i, z]);
        }
    }

    fn finish(self, kind: TreeKind, base: [i32; 3], trunk_height: i32) -> TreeShape {
        TreeShape {
            kind,
            base,
            trunk_height,
            logs: self.logs,
            leaves: self.leaves,
        }
    }
}

/// Grows an oak with its lowest log at `base`.
pub fn grow_oak<W, R>(
    world: &mut W,
    palette: &BlockPalette,
    template: &OakTemplate,
    rng: &mut R,
    base: [i32; 3],
) -> TreeShape
where
    W: VoxelWorld + ?Sized,
    R: Rng + ?Sized,
{
    let mut planter = Planter::new(world, palette, BlockKind::Log, BlockKind::LeavesOak);
    let [x, y, z] = base;

    let trunk_height = pick(rng, template.trunk_min, template.trunk_max).max(1);
    planter.trunk(base, trunk_height);
    let top = [x, y + trunk_height - 1, z];

    let start = TurtleFrame {
        position: top,
        yaw: rng.gen_range(0.0..std::f64::consts::TAU),
        pitch: template.start_pitch_deg.to_radians(),
    };
    let mut turtle = Turtle::new(
        start,
        template.yaw_step_deg.to_radians(),
        template.pitch_step_deg.to_radians(),
    );

    let commands = template.grammar.expand(template.iterations);
    let reach = template.scatter_radius.ceil() as i32;
    let reach_sq = template.scatter_radius * template.scatter_radius;

    turtle.run(&commands, |segment| {
        planter.log(segment.to);

        let [tx, ty, tz] = segment.to;
        for dy in -reach..=reach {
            for dz in -reach..=reach {
                for dx in -reach..=reach {
                    let d2 = f64::from(dx * dx + dy * dy + dz * dz);
                    if d2 > reach_sq || !roll(rng, template.scatter_chance) {
                        continue;
                    }
                    planter.leaf([tx + dx, ty + dy, tz + dz]);
                }
            }
        }
    });

    // Crown sits one block above the trunk top
    let r = template.crown_radius;
    let limit = r * r + template.crown_slack;
    let [cx, cy, cz] = [x, top[1] + 1, z];
    for dy in -r..=r {
        for dz in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy + dz * dz <= limit {
                    planter.leaf([cx + dx, cy + dy, cz + dz]);
                }
            }
        }
    }

    tracing::trace!("oak at {:?}, trunk {}", base, trunk_height);
    planter.finish(TreeKind::Oak, base, trunk_height)
}

/// Grows a snow pine with its lowest log at `base`.
pub fn grow_snow_pine<W, R>(
    world: &mut W,
    palette: &BlockPalette,
    template: &PineTemplate,
    rng: &mut R,
    base: [i32; 3],
) -> TreeShape
where
    W: VoxelWorld + ?Sized,
    R: Rng + ?Sized,
{
    let mut planter = Planter::new(world, palette, BlockKind::Log, BlockKind::LeavesPine);
    let [x, y, z] = base;

    let trunk_height = pick(rng, template.trunk_min, template.trunk_max).max(1);
    planter.trunk(base, trunk_height);
    let top_y = y + trunk_height - 1;

    let leaf_start = y + (f64::from(trunk_height) * template.bare_fraction).floor() as i32;
    for ly in leaf_start..=top_y {
        let r = template.radius_at(ly - leaf_start);
        for dz in -r..=r {
            for dx in -r..=r {
                if dx * dx + dz * dz <= r * r {
                    planter.leaf([x + dx, ly, z + dz]);
                }
            }
        }
    }

    planter.leaf([x, top_y + 1, z]);

    tracing::trace!("snow pine at {:?}, trunk {}", base, trunk_height);
    planter.finish(TreeKind::SnowPine, base, trunk_height)
}

/// Grows a palm with its lowest log at `base`.
pub fn grow_palm<W, R>(
    world: &mut W,
    palette: &BlockPalette,
    template: &PalmTemplate,
    rng: &mut R,
    base: [i32; 3],
) -> TreeShape
where
    W: VoxelWorld + ?Sized,
    R: Rng + ?Sized,
{
    let mut planter = Planter::new(world, palette, BlockKind::Log, BlockKind::LeavesSavanna);
    let [x, y, z] = base;

    let trunk_height = pick(rng, template.trunk_min, template.trunk_max).max(1);
    let lean = template.max_lean.abs();
    let (lean_x, lean_z) = if lean > 0.0 {
        (rng.gen_range(-lean..=lean), rng.gen_range(-lean..=lean))
    } else {
        (0.0, 0.0)
    };

    let (mut px, mut pz) = (f64::from(x), f64::from(z));
    for i in 0..trunk_height {
        planter.log([px.round() as i32, y + i, pz.round() as i32]);
        px += lean_x;
        pz += lean_z;
    }

    let top_y = y + trunk_height;
    let (cx, cz) = (px.round() as i32, pz.round() as i32);

    for (dx, dz) in DIRECTIONS {
        let length = pick(rng, template.frond_min, template.frond_max);
        let (mut lx, mut ly, mut lz) = (cx, top_y, cz);
        for i in 0..length {
            lx += dx;
            lz += dz;
            if i >= template.droop_after && roll(rng, template.droop_chance) {
                ly -= 1;
            }
            planter.leaf([lx, ly, lz]);
        }
    }

    for dz in -1..=1 {
        for dx in -1..=1 {
            planter.leaf([cx + dx, top_y, cz + dz]);
        }
    }

    // Just outside the cap, one layer down
    for (dx, dz) in DIRECTIONS {
        if roll(rng, template.cap_droop_chance) {
            planter.leaf([cx + 2 * dx, top_y - 1, cz + 2 * dz]);
        }
    }

    tracing::trace!("palm at {:?}, trunk {}", base, trunk_height);
    planter.finish(TreeKind::Palm, base, trunk_height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::MaterialRegistry;
    use crate::world::SparseWorld;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn palette() -> BlockPalette {
        BlockPalette::resolve(&MaterialRegistry::with_default_blocks()).unwrap()
    }

    fn sorted_overlay(world: &SparseWorld) -> Vec<((i32, i32, i32), BlockId)> {
        let mut cells: Vec<_> = world.overlay().collect();
        cells.sort();
        cells
    }

    /// FNV-1a over the sorted cells, one 32-bit word per coordinate and id.
    fn digest(cells: &[((i32, i32, i32), BlockId)]) -> u64 {
        cells.iter().fold(0xcbf2_9ce4_8422_2325, |h, &((x, y, z), id)| {
            [x as u32, y as u32, z as u32, u32::from(id.0)]
                .iter()
                .fold(h, |h, &word| (h ^ u64::from(word)).wrapping_mul(0x0100_0000_01b3))
        })
    }

    #[test]
    fn test_oak_is_reproducible() {
        let p = palette();
        let template = OakTemplate::default();
        let grow = || {
            let mut world = SparseWorld::new();
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            let shape = grow_oak(&mut world, &p, &template, &mut rng, [10, 50, 10]);
            (shape, sorted_overlay(&world))
        };

        let (shape_a, cells_a) = grow();
        let (shape_b, cells_b) = grow();
        assert_eq!(shape_a, shape_b);
        assert_eq!(cells_a, cells_b);
    }

    #[test]
    fn test_oak_snapshot() {
        let p = palette();
        let mut world = SparseWorld::new();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let shape = grow_oak(&mut world, &p, &OakTemplate::default(), &mut rng, [10, 50, 10]);

        assert_eq!(shape.trunk_height, 5);
        // Trunk plus 25 segments; leaf count includes overwrites
        assert_eq!(shape.logs, 30);
        assert_eq!(shape.leaves, 213);

        let cells = sorted_overlay(&world);
        let log = p.id(BlockKind::Log);
        assert_eq!(cells.len(), 174);
        assert_eq!(cells.iter().filter(|&&(_, id)| id == log).count(), 15);
        assert_eq!(cells.first(), Some(&((7, 54, 9), p.id(BlockKind::LeavesOak))));
        assert_eq!(cells.last(), Some(&((13, 56, 11), p.id(BlockKind::LeavesOak))));
        assert_eq!(digest(&cells), 0xe68b_162b_2449_b3da);
    }

    #[test]
    fn test_oak_trunk_and_crown() {
        let p = palette();
        let template = OakTemplate::default();
        let log = p.id(BlockKind::Log);

        for seed in 0..20 {
            let mut world = SparseWorld::new();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let shape = grow_oak(&mut world, &p, &template, &mut rng, [0, 30, 0]);

            assert!((5..=7).contains(&shape.trunk_height));
            for i in 0..shape.trunk_height {
                assert_eq!(world.get_block(0, 30 + i, 0), log, "trunk voxel {i}");
            }
            // Trunk plus at least the 25 branch segments of two passes
            assert!(shape.logs >= shape.trunk_height as usize + 25);
            assert!(shape.leaves > 0);

            // Crown center: one above the trunk top, never a log there
            let crown_y = 30 + shape.trunk_height;
            let crown = world.get_block(0, crown_y + 2, 0);
            assert!(crown == p.id(BlockKind::LeavesOak) || crown == log);
        }
    }

    #[test]
    fn test_leaves_never_replace_logs() {
        let p = palette();
        let mut world = SparseWorld::new();
        let log = p.id(BlockKind::Log);
        world.set_block(log, 1, 37, 0);

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let shape = grow_snow_pine(&mut world, &p, &PineTemplate::default(), &mut rng, [0, 30, 0]);

        assert_eq!(world.get_block(1, 37, 0), log);
        for i in 0..shape.trunk_height {
            assert_eq!(world.get_block(0, 30 + i, 0), log);
        }
    }

    #[test]
    fn test_pine_radius_schedule() {
        let template = PineTemplate::default();
        let expected = [5, 5, 4, 4, 3, 3, 2, 2, 1, 1, 1, 1, 1];
        for (d, &r) in expected.iter().enumerate() {
            assert_eq!(template.radius_at(d as i32), r, "offset {d}");
        }
    }

    #[test]
    fn test_pine_cone() {
        let p = palette();
        let leaf = p.id(BlockKind::LeavesPine);
        let mut world = SparseWorld::new();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let template = PineTemplate::default();
        let shape = grow_snow_pine(&mut world, &p, &template, &mut rng, [0, 0, 0]);

        let h = shape.trunk_height;
        assert!((12..=18).contains(&h));

        let leaf_start = (f64::from(h) * 0.3).floor() as i32;
        assert_eq!(world.get_block(1, leaf_start - 1, 0), BlockId::AIR);

        for ly in leaf_start..h {
            let r = template.radius_at(ly - leaf_start);
            assert_eq!(world.get_block(r, ly, 0), leaf, "edge of layer {ly}");
            assert_eq!(world.get_block(r + 1, ly, 0), BlockId::AIR);
        }
        assert_eq!(world.get_block(0, h, 0), leaf, "apex");
    }

    #[test]
    fn test_palm_shape() {
        let p = palette();
        let leaf = p.id(BlockKind::LeavesSavanna);
        let log = p.id(BlockKind::Log);

        for seed in 0..20 {
            let mut world = SparseWorld::new();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let shape = grow_palm(&mut world, &p, &PalmTemplate::default(), &mut rng, [0, 10, 0]);
            let h = shape.trunk_height;

            assert!((7..=11).contains(&h));
            assert_eq!(shape.logs, h as usize);

            // One log per layer, drifting at most 0.3 per step
            let mut trunk: Vec<_> = world
                .overlay()
                .filter(|&(_, id)| id == log)
                .map(|((x, y, z), _)| (y, x, z))
                .collect();
            trunk.sort_unstable();
            assert_eq!(trunk.len(), h as usize, "seed {seed}");
            assert_eq!(trunk[0], (10, 0, 0));
            for (i, &(y, x, z)) in trunk.iter().enumerate() {
                let bound = 0.3 * i as f64 + 0.5 + 1e-9;
                assert_eq!(y, 10 + i as i32);
                assert!(f64::from(x.abs()) <= bound && f64::from(z.abs()) <= bound, "seed {seed} log {i}");
            }
            for pair in trunk.windows(2) {
                assert!((pair[1].1 - pair[0].1).abs() <= 1 && (pair[1].2 - pair[0].2).abs() <= 1);
            }

            // The cap center is one drift step past the last log
            let top_y = 10 + h;
            let (_, lx, lz) = trunk[trunk.len() - 1];
            let is_leaf = |x: i32, y: i32, z: i32| world.get_block(x, y, z) == leaf;
            let centers: Vec<_> = (-1..=1)
                .flat_map(|ox| (-1..=1).map(move |oz| (lx + ox, lz + oz)))
                .filter(|&(cx, cz)| {
                    let cap = (-1..=1).all(|dx| (-1..=1).all(|dz| is_leaf(cx + dx, top_y, cz + dz)));
                    cap && DIRECTIONS
                        .iter()
                        .all(|&(dx, dz)| is_leaf(cx + 2 * dx, top_y, cz + 2 * dz))
                })
                .collect();
            assert_eq!(centers.len(), 1, "seed {seed}: complete 3x3 cap");
            let (cx, cz) = centers[0];
            let cap_bound = 0.3 * f64::from(h) + 0.5 + 1e-9;
            assert!(f64::from(cx.abs()) <= cap_bound && f64::from(cz.abs()) <= cap_bound);

            for (dx, dz) in DIRECTIONS {
                let along = |s: i32, dy: i32| is_leaf(cx + s * dx, top_y + dy, cz + s * dz);

                // No droop on the first two voxels
                assert!(along(1, 0) && along(2, 0));
                assert!(!along(1, -1), "seed {seed} frond ({dx}, {dz})");

                // Four or five voxels, each droop at most one step
                assert!((-1..=0).any(|dy| along(3, dy)), "seed {seed} frond ({dx}, {dz})");
                assert!((-2..=0).any(|dy| along(4, dy)), "seed {seed} frond ({dx}, {dz})");
                assert!(!(-6..=-4).any(|dy| along(5, dy)));
                assert!(!(-5..=1).any(|dy| along(6, dy)), "seed {seed} frond ({dx}, {dz})");
            }
        }
    }

    #[test]
    fn test_palm_without_lean_is_straight() {
        let p = palette();
        let template = PalmTemplate {
            max_lean: 0.0,
            droop_chance: 0.0,
            ..PalmTemplate::default()
        };
        let leaf = p.id(BlockKind::LeavesSavanna);
        let mut world = SparseWorld::new();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let shape = grow_palm(&mut world, &p, &template, &mut rng, [0, 0, 0]);

        for i in 0..shape.trunk_height {
            assert_eq!(world.get_block(0, i, 0), p.id(BlockKind::Log));
        }
        let top_y = shape.trunk_height;
        for (dx, dz) in DIRECTIONS {
            for s in 1..=4 {
                assert_eq!(world.get_block(s * dx, top_y, s * dz), leaf);
            }
            assert_eq!(world.get_block(6 * dx, top_y, 6 * dz), BlockId::AIR);
        }
    }

    #[test]
    fn test_fallback_leaves() {
        let mut registry = MaterialRegistry::new();
        for name in ["stone", "dirt", "water", "log", "leaves_oak", "tall_grass"] {
            registry.register(name).unwrap();
        }
        let p = BlockPalette::resolve(&registry).unwrap();
        let mut world = SparseWorld::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        grow_palm(&mut world, &p, &PalmTemplate::default(), &mut rng, [0, 0, 0]);

        let oak_leaf = p.id(BlockKind::LeavesOak);
        assert!(world.overlay().any(|(_, id)| id == oak_leaf));
    }
}
