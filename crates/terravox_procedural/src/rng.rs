//! Per-chunk random streams.
//!
//! Vegetation needs randomness, but chunks fill on any worker in any
//! order. Each chunk gets its own `ChaCha8Rng` keyed by the world seed and
//! its horizontal origin, so the same chunk always grows the same trees.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::noise::WorldSeed;

const VEGETATION_SALT: u64 = 0x5EED_7EE5_0000_0000;

/// Random stream for the chunk whose footprint starts at `(x0, z0)`.
#[must_use]
pub fn chunk_rng(seed: WorldSeed, x0: i32, z0: i32) -> ChaCha8Rng {
    let packed = (u64::from(x0 as u32) << 32) | u64::from(z0 as u32);
    let key = seed.derive(VEGETATION_SALT ^ packed);
    ChaCha8Rng::seed_from_u64(key.value())
}

/// Bernoulli trial. Chances outside `[0, 1]` saturate instead of panicking.
#[inline]
pub fn roll<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    rng.gen::<f64>() < chance
}

/// Uniform integer in `[a, b]`, in either order.
#[inline]
pub fn pick<R: Rng + ?Sized>(rng: &mut R, a: i32, b: i32) -> i32 {
    rng.gen_range(a.min(b)..=a.max(b))
}
