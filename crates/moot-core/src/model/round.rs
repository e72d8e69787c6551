//! Rounds: a fixed quota of actions, one per acting unit.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    /// Actions are still being played.
    InProgress,
    /// All required actions are narrated (or the round was force-closed).
    Completed,
}

/// One round of a game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    /// Round identifier.
    pub id: Uuid,
    /// Owning game.
    pub game_id: Uuid,
    /// 1-based position within the game.
    pub round_number: i32,
    /// Lifecycle status.
    pub status: RoundStatus,
    /// Narrated actions so far. Never exceeds `total_actions_required`.
    pub actions_completed: i32,
    /// Acting-unit count at round start, NPC unit included if present.
    pub total_actions_required: i32,
}

impl Round {
    /// Creates an in-progress round with the given quota.
    #[must_use]
    pub fn new(id: Uuid, game_id: Uuid, round_number: i32, total_actions_required: i32) -> Self {
        Self {
            id,
            game_id,
            round_number,
            status: RoundStatus::InProgress,
            actions_completed: 0,
            total_actions_required,
        }
    }

    /// Whether the quota has been met.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.actions_completed >= self.total_actions_required
    }
}
