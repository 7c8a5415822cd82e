//! # Region Generator
//!
//! Streams a square grid of floor-layer chunks through the worker pool and
//! prints biome, water and vegetation statistics.
//!
//! Usage: `generate_region [config.toml] [--radius <chunks>] [--size <blocks>]`

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use terravox_procedural::{
    Biome, BlockKind, ChunkFillRequest, ChunkId, ChunkStreamer, GeneratorConfig, MaterialRegistry,
    SparseWorld, TreeKind, VoxelWorld, WorldGenerator,
};

/// Chunk height used for every request.
const CHUNK_HEIGHT: i32 = 192;

fn flag_value(args: &[String], flag: &str) -> Option<i32> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn main() {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         TERRAVOX REGION GENERATOR                                ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let args: Vec<String> = std::env::args().collect();
    let config_path = args.get(1).filter(|a| !a.starts_with("--"));
    let radius = flag_value(&args, "--radius").unwrap_or(3).max(0);
    let size = flag_value(&args, "--size").unwrap_or(32).max(1);

    let config = match config_path {
        Some(path) => match GeneratorConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                println!("Error: {e}");
                std::process::exit(1);
            }
        },
        None => GeneratorConfig::default(),
    };

    let registry = MaterialRegistry::with_default_blocks();
    let streaming = config.streaming.clone();
    let generator = match WorldGenerator::new(config, &registry) {
        Ok(g) => Arc::new(g),
        Err(e) => {
            println!("Error: {e}");
            std::process::exit(1);
        }
    };

    let floor_y = generator.config().floor_y;
    println!("Seed:      {}", generator.seed().value());
    println!("Region:    {0}x{0} chunks of {1}x{2}x{1}", 2 * radius + 1, size, CHUNK_HEIGHT);
    println!("Workers:   {}", streaming.workers);
    println!();

    let world = Arc::new(Mutex::new(SparseWorld::new()));
    let streamer = ChunkStreamer::spawn(Arc::clone(&generator), Arc::clone(&world), &streaming);

    let start = Instant::now();
    let mut next_id = 0u64;
    for cz in -radius..=radius {
        for cx in -radius..=radius {
            let request = ChunkFillRequest::new(
                ChunkId(next_id),
                [cx * size, floor_y, cz * size],
                [size, CHUNK_HEIGHT, size],
            );
            next_id += 1;
            if let Err(e) = streamer.submit(request) {
                println!("Error: {e}");
                break;
            }
        }
    }

    let outcomes = streamer.shutdown();
    let elapsed = start.elapsed();

    let mut trees: HashMap<TreeKind, usize> = HashMap::new();
    let mut plants = 0;
    let mut mushrooms = 0;
    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(summary) => {
                if let Some(report) = &summary.vegetation {
                    for tree in &report.trees {
                        *trees.entry(tree.kind).or_default() += 1;
                    }
                    plants += report.plants;
                    mushrooms += report.mushrooms.len();
                }
            }
            Err(e) => {
                failed += 1;
                println!("Chunk {:?} failed: {e}", outcome.id);
            }
        }
    }

    let mut biomes: HashMap<Biome, usize> = HashMap::new();
    let mut wet = 0usize;
    let (mut min_h, mut max_h) = (i32::MAX, i32::MIN);
    let half = radius * size;
    for z in -half..half + size {
        for x in -half..half + size {
            let column = generator.column(x, z);
            *biomes.entry(column.biome).or_default() += 1;
            wet += usize::from(column.water_level.is_some());
            min_h = min_h.min(column.surface_height);
            max_h = max_h.max(column.surface_height);
        }
    }
    let columns: usize = biomes.values().sum();

    println!("┌─ CHUNKS ───────────────────────────────────────────────────────┐");
    println!("│ Generated:          {}", outcomes.len() - failed);
    println!("│ Failed:             {failed}");
    println!("│ Time:               {:.2?}", elapsed);
    println!("└────────────────────────────────────────────────────────────────┘");
    println!();

    println!("┌─ TERRAIN ──────────────────────────────────────────────────────┐");
    for biome in Biome::ALL {
        let count = biomes.get(&biome).copied().unwrap_or(0);
        let share = 100.0 * count as f64 / columns.max(1) as f64;
        println!("│ {:<18}  {:>5.1}%", biome.name(), share);
    }
    println!("│ Height range:       {min_h}..={max_h}");
    println!("│ River/lake columns: {:.1}%", 100.0 * wet as f64 / columns.max(1) as f64);
    println!("└────────────────────────────────────────────────────────────────┘");
    println!();

    println!("┌─ VEGETATION ───────────────────────────────────────────────────┐");
    for kind in [TreeKind::Oak, TreeKind::SnowPine, TreeKind::Palm] {
        println!("│ {:<18}  {}", format!("{kind:?}"), trees.get(&kind).copied().unwrap_or(0));
    }
    println!("│ Small plants:       {plants}");
    println!("│ Giant mushrooms:    {mushrooms}");
    println!("└────────────────────────────────────────────────────────────────┘");

    let world = world.lock();
    let stone = generator.palette().id(BlockKind::Stone);
    println!();
    println!(
        "Block at spawn column surface: {:?} (stone id {:?}), overlay writes: {}",
        world.get_block(0, generator.height_at(0, 0), 0),
        stone,
        world.overlay_len()
    );
}
