//! Shared test mocks and utilities for the Moot matrix-game engine.

mod clock;
mod notify;
mod seed;
mod store;

pub use clock::{FixedClock, ManualClock};
pub use notify::RecordingNotifier;
pub use seed::{FixedSeed, SequenceSeed};
pub use store::MemoryStore;
