//! Personas: the named roles players act through.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persona within one game. Claimed by zero or more active players
/// (exactly one unless sharing is enabled).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    /// Persona identifier.
    pub id: Uuid,
    /// Owning game.
    pub game_id: Uuid,
    /// Display name.
    pub name: String,
    /// Whether this persona is played by the scripted NPC actor.
    pub is_npc: bool,
    /// Scripted action text, used only when `is_npc`.
    pub scripted_action: Option<String>,
    /// Scripted desired-outcome text, used only when `is_npc`.
    pub scripted_outcome: Option<String>,
}
