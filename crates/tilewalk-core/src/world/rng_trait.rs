//! RNG trait abstraction for tile selection
//!
//! Catalogs and the animation scheduler only need a couple of primitives, so
//! they take any `rand::Rng` through this trait. Seeded runs use
//! `Xoshiro256StarStar`; unseeded runs draw the seed from entropy.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

/// Random number generator trait for procedural tile decisions
pub trait WorldRng {
    /// Generate random f32 in [0.0, 1.0)
    fn gen_f32(&mut self) -> f32;

    /// Generate a uniform index in `0..len` (`len` must be non-zero)
    fn gen_index(&mut self, len: usize) -> usize;
}

impl<T: ?Sized + rand::Rng> WorldRng for T {
    fn gen_f32(&mut self) -> f32 {
        rand::Rng::r#gen(self)
    }

    fn gen_index(&mut self, len: usize) -> usize {
        rand::Rng::gen_range(self, 0..len)
    }
}

/// Build the RNG used for tile decisions
pub fn seeded_rng(seed: Option<u64>) -> Xoshiro256StarStar {
    match seed {
        Some(seed) => Xoshiro256StarStar::seed_from_u64(seed),
        None => Xoshiro256StarStar::from_entropy(),
    }
}
