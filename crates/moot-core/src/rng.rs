//! Seed-source abstraction for reproducible randomness.
//!
//! The token-draw resolution strategy seeds a dedicated RNG per draw and
//! records the seed in the resolution audit payload, so the draw can be
//! replayed exactly. In production the seed comes from OS entropy; tests
//! and replays inject fixed sequences.

/// Abstraction over seed material for random draws.
pub trait SeedSource: Send + Sync {
    /// Returns the next 64-bit seed.
    fn next_seed(&mut self) -> u64;
}

/// Production seed source backed by the operating-system entropy pool.
#[derive(Debug, Clone, Copy)]
pub struct EntropySeed;

impl SeedSource for EntropySeed {
    fn next_seed(&mut self) -> u64 {
        rand::random()
    }
}
