//! Votes on an action's likely outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A voter's read on the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteKind {
    /// The action will probably succeed.
    LikelySuccess,
    /// The action will probably fail.
    LikelyFailure,
    /// Could go either way.
    Uncertain,
}

/// Token weights a vote contributes to the draw pool, assigned by the
/// active resolution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenWeights {
    /// Success tokens contributed.
    pub success: u32,
    /// Failure tokens contributed.
    pub failure: u32,
}

/// One vote on one action. Unique per (action, player).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    /// Vote identifier.
    pub id: Uuid,
    /// Owning action.
    pub action_id: Uuid,
    /// Voter.
    pub player_id: Uuid,
    /// The voter's read.
    pub kind: VoteKind,
    /// Success-token weight recorded at submission.
    pub success_tokens: i32,
    /// Failure-token weight recorded at submission.
    pub failure_tokens: i32,
    /// Set on votes synthesized for non-participating units.
    pub was_skipped: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
