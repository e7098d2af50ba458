//! RNG backend integration and per-invocation seeding.

use rand::SeedableRng;
use rand::rngs::StdRng;

/// Source of the RNGs resolution contexts draw from
pub trait RngProvider: Send + Sync {
    type Rng: rand::RngCore + Clone + Send;

    /// A seeded RNG, or an entropy-seeded one when `seed` is `None`
    fn create_rng(&self, seed: Option<u64>) -> Self::Rng;
}

/// Provides `StdRng`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRngProvider;

impl RngProvider for DefaultRngProvider {
    type Rng = StdRng;

    fn create_rng(&self, seed: Option<u64>) -> Self::Rng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Create a new RNG, seeded when a seed is given
pub fn create_rng(seed: Option<u64>) -> StdRng {
    DefaultRngProvider.create_rng(seed)
}

/// Derive the seed of one invocation from the run seed.
///
/// Every invocation gets its own well-mixed seed, so rows generated in
/// parallel reproduce exactly what a sequential run produces.
pub fn invocation_seed(base: u64, invocation: usize) -> u64 {
    // splitmix64 finalizer
    let step = (invocation as u64)
        .wrapping_add(1)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut z = base.wrapping_add(step);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
