//! # Seeded Noise Bank
//!
//! Deterministic 2D/3D simplex noise, one independent channel per terrain
//! feature, every channel derived from a single `WorldSeed`.
//!
//! ## Determinism Guarantee
//!
//! Given the same `WorldSeed`, every channel produces **exactly** the same
//! values on any platform, in any call order, on any thread. Sampling never
//! mutates state, so a `NoiseBank` can be shared behind an `Arc` by any
//! number of chunk workers without locking.

use std::sync::OnceLock;

use crate::error::{GenError, GenResult};

/// Root of every random decision in a world.
///
/// Noise channels and per-chunk vegetation streams are all derived from it,
/// never from ambient entropy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

/// Process-wide seed slot. Written at most once.
static GLOBAL_SEED: OnceLock<WorldSeed> = OnceLock::new();

impl WorldSeed {
    /// Wraps a raw seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Raw seed.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Sub-seed for one consumer, identified by `purpose`.
    ///
    /// Distinct purposes give unrelated streams; the same purpose always
    /// gives the same sub-seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mixed = (self.0 ^ purpose).wrapping_mul(0x517c_c1b7_2722_0a95);
        Self(mixed ^ (mixed >> 32))
    }

    /// Installs this seed as the process-wide world seed.
    ///
    /// The first call wins. Installing the same value again is a no-op;
    /// installing a different value is rejected, since a world's seed never
    /// changes during its lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::SeedAlreadySet`] if a different seed is installed.
    pub fn install_global(self) -> GenResult<()> {
        let current = *GLOBAL_SEED.get_or_init(|| self);
        if current == self {
            Ok(())
        } else {
            Err(GenError::SeedAlreadySet {
                current: current.value(),
                requested: self.value(),
            })
        }
    }

    /// Returns the process-wide seed, if one was installed.
    #[must_use]
    pub fn global() -> Option<Self> {
        GLOBAL_SEED.get().copied()
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(0xDEAD_BEEF_CAFE_BABE)
    }
}

/// Park-Miller minimal standard linear-congruential generator.
///
/// Only used to shuffle permutation tables: each channel reseeds its own
/// instance, so channels stay decorrelated while sharing one world seed.
#[derive(Clone, Debug)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    const MODULUS: u64 = 2_147_483_647;
    const MULTIPLIER: u64 = 16_807;

    /// Creates a generator. Any seed is accepted; it is folded into
    /// the valid state range `[1, MODULUS - 1]`.
    #[must_use]
    pub const fn new(seed: WorldSeed) -> Self {
        Self {
            state: seed.value() % (Self::MODULUS - 1) + 1,
        }
    }

    /// Advances and returns the next raw state in `[1, MODULUS - 1]`.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state * Self::MULTIPLIER % Self::MODULUS;
        self.state as u32
    }

    /// Returns the next value in `[0, 1)`.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32() - 1) / (Self::MODULUS - 1) as f64
    }
}

/// Shuffled lattice hash for one channel.
///
/// The 256 shuffled entries are stored twice so that `a + table[b]` lookups
/// never need a second wrap.
struct Permutation {
    table: [u8; 512],
}

impl Permutation {
    /// 2D gradient directions, indexed by `hash % 12`.
    const GRAD2: [[i8; 2]; 12] = [
        [1, 0], [1, 1], [0, 1], [-1, 1],
        [-1, 0], [-1, -1], [0, -1], [1, -1],
        [1, 0], [0, 1], [-1, 0], [0, -1],
    ];

    /// 3D gradient directions (cube edge midpoints), indexed by `hash % 12`.
    const GRAD3: [[i8; 3]; 12] = [
        [1, 1, 0], [-1, 1, 0], [1, -1, 0], [-1, -1, 0],
        [1, 0, 1], [-1, 0, 1], [1, 0, -1], [-1, 0, -1],
        [0, 1, 1], [0, -1, 1], [0, 1, -1], [0, -1, -1],
    ];

    fn shuffled(seed: WorldSeed) -> Self {
        let mut base: [u8; 256] = std::array::from_fn(|i| i as u8);

        // Fisher-Yates, driven by the channel's own LCG
        let mut lcg = Lcg::new(seed);
        for i in (1..base.len()).rev() {
            let j = ((lcg.next_f64() * (i + 1) as f64) as usize).min(i);
            base.swap(i, j);
        }

        Self {
            table: std::array::from_fn(|i| base[i & 255]),
        }
    }

    #[inline]
    fn at(&self, index: usize) -> usize {
        usize::from(self.table[index & 511])
    }
}

/// Seeded simplex noise in two and three dimensions.
///
/// Sampling is read-only, and every result lies in `[-1, 1]`.
///
/// ```rust,ignore
/// let noise = SimplexNoise::new(WorldSeed::new(42));
/// let ground = noise.sample(100.5, 200.3);
/// let hollow = noise.sample3(10.0, 20.0, 30.0);
/// ```
pub struct SimplexNoise {
    perm: Permutation,
}

impl SimplexNoise {
    /// 2D skew, `(sqrt(3) - 1) / 2`.
    const F2: f64 = 0.366_025_403_784_439;
    /// 2D unskew, `(3 - sqrt(3)) / 6`.
    const G2: f64 = 0.211_324_865_405_187;
    /// 3D skew.
    const F3: f64 = 1.0 / 3.0;
    /// 3D unskew.
    const G3: f64 = 1.0 / 6.0;

    /// Builds the generator's permutation from `seed`.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            perm: Permutation::shuffled(seed),
        }
    }

    /// 2D sample in `[-1, 1]`.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        // Cell of the skewed lattice containing the point
        let s = (x + y) * Self::F2;
        let i = floor_i32(x + s);
        let j = floor_i32(y + s);

        let t = (f64::from(i) + f64::from(j)) * Self::G2;
        let x0 = x - (f64::from(i) - t);
        let y0 = y - (f64::from(j) - t);

        // Upper or lower triangle
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - f64::from(i1 as u8) + Self::G2;
        let y1 = y0 - f64::from(j1 as u8) + Self::G2;
        let x2 = x0 - 1.0 + 2.0 * Self::G2;
        let y2 = y0 - 1.0 + 2.0 * Self::G2;

        let (a, b) = ((i & 255) as usize, (j & 255) as usize);
        let p = &self.perm;

        let n0 = Self::corner2(x0, y0, p.at(a + p.at(b)));
        let n1 = Self::corner2(x1, y1, p.at(a + i1 + p.at(b + j1)));
        let n2 = Self::corner2(x2, y2, p.at(a + 1 + p.at(b + 1)));

        // 70 scales the sum to unit range; diagonal gradients can overshoot
        (70.0 * (n0 + n1 + n2)).clamp(-1.0, 1.0)
    }

    /// 3D sample in `[-1, 1]`.
    #[must_use]
    pub fn sample3(&self, x: f64, y: f64, z: f64) -> f64 {
        let s = (x + y + z) * Self::F3;
        let i = floor_i32(x + s);
        let j = floor_i32(y + s);
        let k = floor_i32(z + s);

        let t = (f64::from(i) + f64::from(j) + f64::from(k)) * Self::G3;
        let x0 = x - (f64::from(i) - t);
        let y0 = y - (f64::from(j) - t);
        let z0 = z - (f64::from(k) - t);

        // Which of the six tetrahedra holds the point
        let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
            if y0 >= z0 {
                (1, 0, 0, 1, 1, 0)
            } else if x0 >= z0 {
                (1, 0, 0, 1, 0, 1)
            } else {
                (0, 0, 1, 1, 0, 1)
            }
        } else if y0 < z0 {
            (0, 0, 1, 0, 1, 1)
        } else if x0 < z0 {
            (0, 1, 0, 0, 1, 1)
        } else {
            (0, 1, 0, 1, 1, 0)
        };

        let offset = |v: usize| v as f64;
        let x1 = x0 - offset(i1) + Self::G3;
        let y1 = y0 - offset(j1) + Self::G3;
        let z1 = z0 - offset(k1) + Self::G3;
        let x2 = x0 - offset(i2) + 2.0 * Self::G3;
        let y2 = y0 - offset(j2) + 2.0 * Self::G3;
        let z2 = z0 - offset(k2) + 2.0 * Self::G3;
        let x3 = x0 - 1.0 + 3.0 * Self::G3;
        let y3 = y0 - 1.0 + 3.0 * Self::G3;
        let z3 = z0 - 1.0 + 3.0 * Self::G3;

        let (a, b, c) = ((i & 255) as usize, (j & 255) as usize, (k & 255) as usize);
        let p = &self.perm;

        let n0 = Self::corner3(x0, y0, z0, p.at(a + p.at(b + p.at(c))));
        let n1 = Self::corner3(x1, y1, z1, p.at(a + i1 + p.at(b + j1 + p.at(c + k1))));
        let n2 = Self::corner3(x2, y2, z2, p.at(a + i2 + p.at(b + j2 + p.at(c + k2))));
        let n3 = Self::corner3(x3, y3, z3, p.at(a + 1 + p.at(b + 1 + p.at(c + 1))));

        (32.0 * (n0 + n1 + n2 + n3)).clamp(-1.0, 1.0)
    }

    #[inline]
    fn corner2(x: f64, y: f64, hash: usize) -> f64 {
        let falloff = 0.5 - x * x - y * y;
        if falloff <= 0.0 {
            return 0.0;
        }
        let [gx, gy] = Permutation::GRAD2[hash % 12];
        falloff.powi(4) * (x * f64::from(gx) + y * f64::from(gy))
    }

    #[inline]
    fn corner3(x: f64, y: f64, z: f64, hash: usize) -> f64 {
        let falloff = 0.6 - x * x - y * y - z * z;
        if falloff <= 0.0 {
            return 0.0;
        }
        let [gx, gy, gz] = Permutation::GRAD3[hash % 12];
        falloff.powi(4) * (x * f64::from(gx) + y * f64::from(gy) + z * f64::from(gz))
    }

    /// Sums `octaves` layers of `shape(sample)`, each at `lacunarity` times
    /// the previous frequency and `persistence` times its weight, then
    /// divides by the total weight.
    fn layered(
        &self,
        x: f64,
        y: f64,
        octaves: u32,
        persistence: f64,
        lacunarity: f64,
        shape: impl Fn(f64) -> f64,
    ) -> f64 {
        let (mut sum, mut weight, mut total_weight, mut freq) = (0.0, 1.0, 0.0, 1.0);
        for _ in 0..octaves.max(1) {
            sum += shape(self.sample(x * freq, y * freq)) * weight;
            total_weight += weight;
            weight *= persistence;
            freq *= lacunarity;
        }
        sum / total_weight
    }

    /// Fractal sum of plain samples, in `[-1, 1]`.
    #[must_use]
    pub fn octaved(&self, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
        self.layered(x, y, octaves, persistence, lacunarity, |n| n)
    }

    /// Fractal sum of `(1 - |n|)²`, in `[0, 1]`. Peaks along zero crossings.
    #[must_use]
    pub fn ridged(&self, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
        self.layered(x, y, octaves, persistence, lacunarity, |n| {
            let ridge = 1.0 - n.abs();
            ridge * ridge
        })
    }
}

#[inline]
fn floor_i32(v: f64) -> i32 {
    v.floor() as i32
}

/// Named noise channels.
///
/// Every channel owns its own permutation table, seeded from
/// `WorldSeed::derive(channel.purpose())`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NoiseChannel {
    /// Continental height; also drives the mountain override.
    Height = 0,
    /// Short-wavelength hills.
    Detail = 1,
    /// Ridge lines (used squared-absolute).
    Ridge = 2,
    /// Valley carving along river courses.
    RiverCarve = 3,
    /// River band detection.
    River = 4,
    /// Lake detection.
    Lake = 5,
    /// Temperature.
    Temperature = 6,
    /// Moisture.
    Moisture = 7,
    /// 3D cave pockets.
    Cave = 8,
    /// 3D tunnels.
    Tunnel = 9,
    /// 2D cave entrances.
    Entrance = 10,
}

impl NoiseChannel {
    /// Number of channels.
    pub const COUNT: usize = 11;

    /// All channels, in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Height,
        Self::Detail,
        Self::Ridge,
        Self::RiverCarve,
        Self::River,
        Self::Lake,
        Self::Temperature,
        Self::Moisture,
        Self::Cave,
        Self::Tunnel,
        Self::Entrance,
    ];

    /// Seed-derivation purpose for this channel.
    #[inline]
    #[must_use]
    pub const fn purpose(self) -> u64 {
        0x7E44_A000 + self as u64
    }
}

/// One simplex generator per channel, built once from the world seed.
pub struct NoiseBank {
    seed: WorldSeed,
    channels: Vec<SimplexNoise>,
}

impl NoiseBank {
    /// Builds every channel from the world seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        let channels = NoiseChannel::ALL
            .iter()
            .map(|channel| SimplexNoise::new(seed.derive(channel.purpose())))
            .collect();
        Self { seed, channels }
    }

    /// The seed this bank was built from.
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Direct access to a channel's generator (for fractal sampling).
    #[inline]
    #[must_use]
    pub fn channel(&self, channel: NoiseChannel) -> &SimplexNoise {
        &self.channels[channel as usize]
    }

    /// Samples a channel in 2D. Result is in [-1, 1].
    #[inline]
    #[must_use]
    pub fn noise2d(&self, channel: NoiseChannel, x: f64, z: f64) -> f64 {
        self.channel(channel).sample(x, z)
    }

    /// Samples a channel in 3D. Result is in [-1, 1].
    #[inline]
    #[must_use]
    pub fn noise3d(&self, channel: NoiseChannel, x: f64, y: f64, z: f64) -> f64 {
        self.channel(channel).sample3(x, y, z)
    }

    /// Samples a channel in 2D at world coordinates times `scale`.
    #[inline]
    #[must_use]
    pub fn scaled2d(&self, channel: NoiseChannel, x: i32, z: i32, scale: f64) -> f64 {
        self.noise2d(channel, f64::from(x) * scale, f64::from(z) * scale)
    }
}
