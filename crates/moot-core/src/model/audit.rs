//! Append-only audit trail of orchestrator decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Well-known audit event kinds.
pub mod audit_kind {
    /// A phase transition was committed.
    pub const PHASE_TRANSITION: &str = "PHASE_TRANSITION";
    /// Argumentation was force-completed by the timeout sweep.
    pub const ARGUMENTATION_TIMEOUT: &str = "ARGUMENTATION_TIMEOUT";
    /// Voting was force-completed by the timeout sweep.
    pub const VOTING_TIMEOUT: &str = "VOTING_TIMEOUT";
    /// A stale proposal phase was flagged to the host.
    pub const PROPOSAL_TIMEOUT: &str = "PROPOSAL_TIMEOUT";
    /// A stale narration phase was flagged to the host.
    pub const NARRATION_TIMEOUT: &str = "NARRATION_TIMEOUT";
    /// An action was resolved.
    pub const ACTION_RESOLVED: &str = "ACTION_RESOLVED";
    /// The host skipped the rest of argumentation.
    pub const ARGUMENTATION_SKIPPED: &str = "ARGUMENTATION_SKIPPED";
    /// The host skipped the rest of voting.
    pub const VOTING_SKIPPED: &str = "VOTING_SKIPPED";
    /// The host force-completed the round.
    pub const ROUND_FORCED: &str = "ROUND_FORCED";
    /// A round summary was submitted and the next round opened.
    pub const ROUND_SUMMARY: &str = "ROUND_SUMMARY";
    /// The host ended the game.
    pub const GAME_COMPLETED: &str = "GAME_COMPLETED";
}

/// One audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub id: Uuid,
    /// Owning game.
    pub game_id: Uuid,
    /// Event kind; see [`audit_kind`].
    pub kind: String,
    /// Event details.
    pub payload: serde_json::Value,
    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Creates an audit record.
    #[must_use]
    pub fn new(
        game_id: Uuid,
        kind: &str,
        payload: serde_json::Value,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            game_id,
            kind: kind.to_owned(),
            payload,
            occurred_at,
        }
    }
}
