//! Test seed sources — deterministic `SeedSource` implementations.

use moot_core::rng::SeedSource;

/// A seed source that always returns the same seed. Suitable for tests
/// that pin one specific token draw.
#[derive(Debug, Clone, Copy)]
pub struct FixedSeed(pub u64);

impl SeedSource for FixedSeed {
    fn next_seed(&mut self) -> u64 {
        self.0
    }
}

/// A seed source that returns seeds from a predetermined sequence.
/// Panics when the sequence is exhausted.
#[derive(Debug)]
pub struct SequenceSeed {
    values: Vec<u64>,
    index: usize,
}

impl SequenceSeed {
    /// Create a new `SequenceSeed` with the given values.
    #[must_use]
    pub fn new(values: Vec<u64>) -> Self {
        Self { values, index: 0 }
    }
}

impl SeedSource for SequenceSeed {
    fn next_seed(&mut self) -> u64 {
        let val = self.values[self.index];
        self.index += 1;
        val
    }
}
