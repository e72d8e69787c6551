//! Arguments for and against an action.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stance of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentKind {
    /// An opening argument supplied by the initiator at proposal time.
    InitiatorFor,
    /// A supporting argument from another unit.
    For,
    /// An opposing argument.
    Against,
    /// A clarification from the initiator; the only kind the initiator
    /// may add after proposing.
    Clarification,
}

impl ArgumentKind {
    /// Whether this argument supports the action (arbiter tally side).
    #[must_use]
    pub fn is_pro(self) -> bool {
        matches!(self, Self::InitiatorFor | Self::For)
    }
}

/// One argument on one action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Argument {
    /// Argument identifier.
    pub id: Uuid,
    /// Owning action.
    pub action_id: Uuid,
    /// Author.
    pub player_id: Uuid,
    /// Stance.
    pub kind: ArgumentKind,
    /// Argument text.
    pub content: String,
    /// 1-based position within the action's argument list.
    pub sequence: i32,
    /// Arbiter-strategy flag: counted in the strong-argument tally.
    pub is_strong: bool,
    /// Set on arguments synthesized by the timeout sweep.
    pub is_placeholder: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
