//! Pluggable resolution strategies.
//!
//! A strategy converts a completed vote set into a narrative outcome.
//! The interface is intentionally small — vote-to-token mapping and the
//! resolution itself — and implementations are selected per game by the
//! string id stored in the game settings.

mod arbiter;
mod token_draw;

pub use arbiter::Arbiter;
pub use token_draw::TokenDraw;

use moot_core::error::CoreError;
use moot_core::model::{Argument, ResolutionOutcome, TokenWeights, Vote, VoteKind};

/// Everything a strategy may consult when resolving.
#[derive(Debug)]
pub struct ResolutionInput<'a> {
    /// All votes on the action, synthesized ones included.
    pub votes: &'a [Vote],
    /// All arguments on the action.
    pub arguments: &'a [Argument],
    /// Recorded seed for any randomness; replaying the seed replays the
    /// resolution exactly.
    pub seed: u64,
}

/// The product of a resolution.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Outcome tier and momentum delta.
    pub outcome: ResolutionOutcome,
    /// Strategy-specific audit payload, persisted opaquely.
    pub data: serde_json::Value,
}

/// A vote-set-to-outcome algorithm.
pub trait ResolutionStrategy: Send + Sync {
    /// Token weights a vote of the given kind contributes.
    fn map_vote_to_tokens(&self, kind: VoteKind) -> TokenWeights;

    /// Converts the completed vote set into an outcome.
    ///
    /// # Errors
    ///
    /// Strategy-specific; the built-in strategies are infallible given
    /// any input and return `Ok`.
    fn resolve(&self, input: &ResolutionInput<'_>) -> Result<Resolved, CoreError>;
}

/// Stored id of the token-draw strategy, the default.
pub const TOKEN_DRAW_ID: &str = "token_draw";

/// Stored id of the arbiter strategy.
pub const ARBITER_ID: &str = "arbiter";

static TOKEN_DRAW: TokenDraw = TokenDraw;
static ARBITER: Arbiter = Arbiter;

/// Looks up a strategy by its stored id.
///
/// # Errors
///
/// `InvalidState` for an unrecognized id.
pub fn strategy_for(id: &str) -> Result<&'static dyn ResolutionStrategy, CoreError> {
    match id {
        TOKEN_DRAW_ID => Ok(&TOKEN_DRAW),
        ARBITER_ID => Ok(&ARBITER),
        other => Err(CoreError::InvalidState(format!(
            "unknown resolution method: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_ids_resolve() {
        assert!(strategy_for(TOKEN_DRAW_ID).is_ok());
        assert!(strategy_for(ARBITER_ID).is_ok());
    }

    #[test]
    fn test_unknown_id_is_invalid_state() {
        let err = match strategy_for("coin_flip") {
            Ok(_) => panic!("expected an error for an unknown id"),
            Err(e) => e,
        };
        match err {
            CoreError::InvalidState(msg) => {
                assert!(msg.contains("coin_flip"));
            }
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }
}
