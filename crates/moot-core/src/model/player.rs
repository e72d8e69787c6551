//! Players: the per-game seat of a human or the NPC system actor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A player seat in one game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Player identifier (scoped to this game).
    pub id: Uuid,
    /// Owning game.
    pub game_id: Uuid,
    /// Owning identity. `None` marks the NPC system actor's seat.
    pub user_id: Option<Uuid>,
    /// Claimed persona, if any.
    pub persona_id: Option<Uuid>,
    /// Whether this player represents the shared persona. At most one
    /// lead per persona; a vacated lead is reassigned to a remaining
    /// active member.
    pub is_persona_lead: bool,
    /// Whether this player hosts the game.
    pub is_host: bool,
    /// Whether this player holds the arbiter role.
    pub is_arbiter: bool,
    /// Whether this seat is the scripted NPC actor.
    pub is_npc: bool,
    /// Soft leave/rejoin flag.
    pub is_active: bool,
    /// When the seat was created.
    pub joined_at: DateTime<Utc>,
}

impl Player {
    /// Creates an active human player seat.
    #[must_use]
    pub fn new(id: Uuid, game_id: Uuid, user_id: Uuid, joined_at: DateTime<Utc>) -> Self {
        Self {
            id,
            game_id,
            user_id: Some(user_id),
            persona_id: None,
            is_persona_lead: false,
            is_host: false,
            is_arbiter: false,
            is_npc: false,
            is_active: true,
            joined_at,
        }
    }

    /// Creates the NPC system actor's seat, bound to its persona.
    #[must_use]
    pub fn new_npc(id: Uuid, game_id: Uuid, persona_id: Uuid, joined_at: DateTime<Utc>) -> Self {
        Self {
            id,
            game_id,
            user_id: None,
            persona_id: Some(persona_id),
            is_persona_lead: true,
            is_host: false,
            is_arbiter: false,
            is_npc: true,
            is_active: true,
            joined_at,
        }
    }
}
