//! Moot Core — shared domain abstractions.
//!
//! This crate defines the entity model, the repository traits, and the
//! small set of injectable capabilities (clock, seed source, notifier)
//! that the engine and its adapters depend on. It contains no
//! infrastructure code.

pub mod clock;
pub mod error;
pub mod model;
pub mod notify;
pub mod rng;
pub mod store;
