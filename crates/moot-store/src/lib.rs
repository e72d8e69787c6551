//! PostgreSQL implementation of the Moot repository traits.
//!
//! Uniqueness violations (SQLSTATE 23505) surface as
//! `StoreError::UniqueViolation` so the engine can turn them into
//! `Conflict`; everything else becomes `StoreError::Backend`.

mod codec;
mod pg_store;
pub mod schema;

pub use pg_store::PgStore;
