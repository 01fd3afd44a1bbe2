//! rg-rng: seeded random streams for layout generation
//!
//! Every generation run starts from a single `u64` seed. A [`SeedTree`]
//! derives an independent ChaCha stream per decision category, so the
//! number of draws made for one category (say, template picks) never shifts
//! the draws seen by another (say, configuration picks).

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

/// Decision categories that get their own random stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum StreamLabel {
    /// Permutation of node variation groups
    #[strum(serialize = "graph-variation")]
    GraphVariation,
    /// Whether an edge materializes as its own room
    #[strum(serialize = "edge-rooms")]
    EdgeRooms,
    /// Template variation order per placement step
    #[strum(serialize = "templates")]
    Templates,
    /// Configuration order per placement step
    #[strum(serialize = "configurations")]
    Configurations,
    /// Collectable spot weighting
    #[strum(serialize = "collectables")]
    Collectables,
}

impl StreamLabel {
    /// Stable name used when hashing the label into a child seed
    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// SplitMix64 finalizer, used to spread derived seeds over the full range
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// 64-bit FNV-1a, stable across platforms and releases
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = 0xCBF2_9CE4_8422_2325u64;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
    }
    hash
}

/// Hierarchical seed: one root, one child stream per [`StreamLabel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedTree {
    seed: u64,
}

impl SeedTree {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Root seed this tree was built from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Seed of the child stream for `label`
    pub fn child_seed(&self, label: StreamLabel) -> u64 {
        splitmix64(self.seed ^ fnv1a(label.name().as_bytes()))
    }

    /// Seed of the `index`-th substream below `label`
    pub fn indexed_seed(&self, label: StreamLabel, index: u64) -> u64 {
        splitmix64(self.child_seed(label) ^ splitmix64(index))
    }

    /// Open the child stream for `label`
    pub fn stream(&self, label: StreamLabel) -> RandomStream {
        RandomStream::new(self.child_seed(label))
    }

    /// Open the `index`-th substream below `label`
    pub fn substream(&self, label: StreamLabel, index: u64) -> RandomStream {
        RandomStream::new(self.indexed_seed(label, index))
    }
}

/// A single reproducible random stream
///
/// Wraps ChaCha8Rng and counts how many values have been drawn, so a
/// decision point can record how far into its stream it was made.
#[derive(Debug, Clone)]
pub struct RandomStream {
    rng: ChaCha8Rng,
    seed: u64,
    draws: u64,
}

// Only the seed is serialized; a restored stream starts over from it
impl Serialize for RandomStream {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.seed.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RandomStream {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let seed = u64::deserialize(deserializer)?;
        Ok(RandomStream::new(seed))
    }
}

impl RandomStream {
    /// Create a new stream with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            draws: 0,
        }
    }

    /// Get the seed used to create this stream
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of values drawn so far
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Returns 0..n-1, or 0 if n is 0
    pub fn rn2(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.draws += 1;
        self.rng.gen_range(0..n)
    }

    /// Returns 1..=n, or 0 if n is 0
    pub fn rnd(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.draws += 1;
        self.rng.gen_range(1..=n)
    }

    /// Uniform float in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        self.draws += 1;
        self.rng.r#gen::<f64>()
    }

    /// Returns true with probability 1/n
    pub fn one_in(&mut self, n: u32) -> bool {
        self.rn2(n) == 0
    }

    /// Returns true with probability `p`, clamped to [0, 1]
    ///
    /// Always draws, even for p of 0 or 1, so the stream position does not
    /// depend on the probability value.
    pub fn chance(&mut self, p: f64) -> bool {
        let roll = self.next_f64();
        roll < p.clamp(0.0, 1.0)
    }

    /// Choose a random element from a slice
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            Some(&items[self.rn2(items.len() as u32) as usize])
        }
    }

    /// Shuffle a slice in place (Fisher-Yates)
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.rn2(i as u32 + 1) as usize;
            items.swap(i, j);
        }
    }

    /// Pick an index with probability proportional to its weight
    ///
    /// Non-finite and negative weights count as zero. Returns None when
    /// no weight is positive.
    pub fn weighted_index(&mut self, weights: &[f64]) -> Option<usize> {
        let clean = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        let total: f64 = weights.iter().map(|&w| clean(w)).sum();
        if total <= 0.0 {
            return None;
        }

        let mut target = self.next_f64() * total;
        let mut last_positive = None;
        for (i, &w) in weights.iter().enumerate() {
            let w = clean(w);
            if w <= 0.0 {
                continue;
            }
            if target < w {
                return Some(i);
            }
            target -= w;
            last_positive = Some(i);
        }
        // Rounding can leave a sliver past the last bucket
        last_positive
    }
}
