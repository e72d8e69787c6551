//! Actions: one proposed narrative move and its resolution record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-action lifecycle state. No re-entry: an action only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// Arguments are being collected.
    Arguing,
    /// Votes are being collected.
    Voting,
    /// An outcome has been recorded.
    Resolved,
    /// A narration has been recorded; the action is complete.
    Narrated,
}

/// Narrative outcome tier of a resolved action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    /// Unqualified success.
    Triumph,
    /// Success with a complication.
    SuccessBut,
    /// Failure with a silver lining.
    FailureBut,
    /// Unqualified failure.
    Disaster,
}

/// The outcome a resolution strategy produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionOutcome {
    /// Outcome tier.
    pub result_type: ResultType,
    /// Momentum delta: +3/+1/-1/-3 (token draw) or +1/-1 (arbiter).
    pub result_value: i64,
}

/// A proposed action. Append-only; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Action identifier.
    pub id: Uuid,
    /// Owning game.
    pub game_id: Uuid,
    /// Owning round.
    pub round_id: Uuid,
    /// Proposing player.
    pub initiator_id: Uuid,
    /// Storage key of the proposing acting unit; unique per round, which
    /// is what rejects a unit's second proposal.
    pub unit_key: String,
    /// Global monotonic sequence within the game.
    pub sequence_number: i64,
    /// What the initiator's unit attempts.
    pub description: String,
    /// What the initiator hopes happens.
    pub desired_outcome: String,
    /// Lifecycle state.
    pub status: ActionStatus,
    /// When argumentation opened.
    pub argumentation_started_at: Option<DateTime<Utc>>,
    /// When voting opened.
    pub voting_started_at: Option<DateTime<Utc>>,
    /// When the outcome was recorded.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Strategy id that produced the outcome.
    pub resolution_method: Option<String>,
    /// The recorded outcome.
    pub resolution_result: Option<ResolutionOutcome>,
    /// Opaque strategy audit payload (seed, pool, draw, tallies...).
    pub resolution_data: Option<serde_json::Value>,
    /// Whether argumentation was skipped by the host.
    pub argumentation_skipped: bool,
    /// Whether voting was skipped by the host or timeout.
    pub voting_skipped: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_type_serializes_snake_case() {
        let json = serde_json::to_value(ResultType::SuccessBut).unwrap();
        assert_eq!(json, serde_json::json!("success_but"));
    }
}
