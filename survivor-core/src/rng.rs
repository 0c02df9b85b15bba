//! Session randomness source.
//!
//! All gameplay randomness (loot tiers, pool shuffles, dice, fallback reward
//! targets) funnels through one seedable generator so turn outcomes are
//! reproducible under test. Rolling entry points elsewhere take
//! `&mut impl Rng`, so tests can also pass any other generator.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seedable RNG for one game session.
#[derive(Debug, Clone)]
pub struct SessionRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl SessionRng {
    /// Create a generator with a fixed seed. Same seed, same sequence.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create a generator seeded from the operating system.
    pub fn from_entropy() -> Self {
        let seed = rand::thread_rng().gen();
        Self::new(seed)
    }

    /// The seed this generator was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RngCore for SessionRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}
