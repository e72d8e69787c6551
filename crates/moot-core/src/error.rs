//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// Top-level domain error type.
///
/// The first four variants are the complete caller-facing taxonomy; the
/// transport layer alone maps them to response codes. `Storage` carries
/// non-recoverable persistence failures through unchanged — the core has
/// no retry logic.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An entity is absent or soft-deleted.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. `"game"` or `"action"`.
        entity: &'static str,
        /// The identifier that failed to resolve.
        id: Uuid,
    },

    /// The operation is not valid for the current phase or status.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The caller lacks the required role (member/host/initiator/arbiter).
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A uniqueness or single-resolution invariant would be violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl CoreError {
    /// Shorthand for the `NotFound` variant.
    #[must_use]
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}

/// Maps a store-level result into the domain taxonomy, translating the
/// uniqueness-violation signal into `Conflict` with the given message.
///
/// # Errors
///
/// Returns `Conflict` for `StoreError::UniqueViolation`, `Storage` for
/// every other store failure.
pub fn unique_to_conflict<T>(
    result: Result<T, StoreError>,
    conflict_msg: &str,
) -> Result<T, CoreError> {
    match result {
        Ok(value) => Ok(value),
        Err(StoreError::UniqueViolation(_)) => Err(CoreError::Conflict(conflict_msg.to_owned())),
        Err(other) => Err(CoreError::Storage(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        let result: Result<(), StoreError> =
            Err(StoreError::UniqueViolation("votes_action_player_key".to_owned()));

        match unique_to_conflict(result, "player already voted").unwrap_err() {
            CoreError::Conflict(msg) => assert_eq!(msg, "player already voted"),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_backend_error_passes_through_as_storage() {
        let result: Result<(), StoreError> = Err(StoreError::Backend("connection refused".into()));

        match unique_to_conflict(result, "unused").unwrap_err() {
            CoreError::Storage(StoreError::Backend(msg)) => {
                assert_eq!(msg, "connection refused");
            }
            other => panic!("expected Storage, got {other:?}"),
        }
    }

    #[test]
    fn test_ok_passes_through() {
        let result: Result<u32, StoreError> = Ok(7);
        assert_eq!(unique_to_conflict(result, "unused").unwrap(), 7);
    }
}
