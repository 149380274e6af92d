//! Construction seed source built on Sebastiano Vigna's [`SplitMix64`] generator.
//!
//! [`SplitMix64`]: http://xoroshiro.di.unimi.it/splitmix64.c
//!
//! Written in 2015 by Sebastiano Vigna (vigna@acm.org)
//!
//! To the extent possible under law, the author has dedicated all copyright and related and
//! neighboring rights to this software to the public domain worldwide. This software is
//! distributed without any warranty.
//!
//! See <http://creativecommons.org/publicdomain/zero/1.0/>.

/// RNG seed used when the caller gives none and the `uniform-random` feature is disabled.
#[cfg(not(feature = "uniform-random"))]
const FALLBACK_RNG_SEED: u64 = 1;

/// Deterministic stream of construction seeds.
///
/// Every peeling attempt draws a fresh 32-bit seed from here. Two sources created from the same
/// RNG seed yield the same sequence, which is what makes seeded builds reproducible.
#[derive(Debug, Clone)]
pub struct SeedSource {
    state: u64,
}

impl SeedSource {
    pub const fn new(rng_seed: u64) -> Self {
        Self { state: rng_seed }
    }

    /// Uses `rng_seed` when given, otherwise a random one.
    pub fn from_option(rng_seed: Option<u64>) -> Self {
        Self::new(rng_seed.unwrap_or_else(random_rng_seed))
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Draws the next construction seed. Seeds are 32 bits wide on the wire.
    pub fn next_seed(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }
}

#[cfg(feature = "uniform-random")]
fn random_rng_seed() -> u64 {
    rand::random()
}

#[cfg(not(feature = "uniform-random"))]
fn random_rng_seed() -> u64 {
    FALLBACK_RNG_SEED
}
