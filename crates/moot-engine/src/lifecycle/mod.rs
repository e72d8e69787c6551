//! The action lifecycle: proposal → argumentation → voting → resolution
//! → narration, each sub-phase gated by acting-unit completion.
//!
//! Every operation here is safe under concurrent invocation: duplicates
//! die on store uniqueness (`Conflict`), and the status advances are
//! conditional updates, so racing writers lose cleanly instead of
//! overwriting each other.

mod argument;
mod narration;
mod overrides;
mod propose;
mod voting;

pub use argument::ArgumentationProgress;
pub use narration::NarrationResult;
pub use propose::ProposeInput;
pub use voting::VoteProgress;
