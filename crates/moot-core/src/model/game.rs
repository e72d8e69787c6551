//! The game aggregate: status, phase, and per-game settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Created, collecting players. The only status that allows deletion.
    Lobby,
    /// Running rounds.
    Active,
    /// Finished.
    Completed,
}

/// Game-wide pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Lobby; the game has not started.
    Waiting,
    /// An acting unit may propose an action.
    Proposal,
    /// The current action is being argued.
    Argumentation,
    /// The current action is being voted on.
    Voting,
    /// Votes are being converted into an outcome.
    Resolution,
    /// The outcome is being narrated.
    Narration,
    /// All actions in the round are done; a summary closes the round.
    RoundSummary,
}

impl GamePhase {
    /// Whether the timeout worker watches this phase.
    #[must_use]
    pub fn is_timed(self) -> bool {
        matches!(
            self,
            Self::Proposal | Self::Argumentation | Self::Voting | Self::Narration
        )
    }

    /// Stable lowercase name, used in audit payloads and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Proposal => "proposal",
            Self::Argumentation => "argumentation",
            Self::Voting => "voting",
            Self::Resolution => "resolution",
            Self::Narration => "narration",
            Self::RoundSummary => "round_summary",
        }
    }
}

/// How votes are counted for players sharing a persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingMode {
    /// The first member to vote casts the persona's single vote.
    OnePerPersona,
    /// Every member votes; the unit counts once all members have.
    EachMember,
}

/// How the argument cap is counted for players sharing a persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentMode {
    /// Persona members share one pooled cap.
    SharedPool,
    /// Each member gets the full cap.
    Independent,
}

/// Who may narrate a resolved action. NPC-initiated actions are always
/// narratable by any member, regardless of mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrationMode {
    /// Only the action's initiator.
    InitiatorOnly,
    /// Any active member.
    Open,
}

/// Persona-sharing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaSharing {
    /// Whether multiple players may claim the same persona.
    pub enabled: bool,
    /// Vote counting mode for shared personas.
    pub voting_mode: VotingMode,
    /// Argument cap mode for shared personas.
    pub argument_mode: ArgumentMode,
}

impl Default for PersonaSharing {
    fn default() -> Self {
        Self {
            enabled: false,
            voting_mode: VotingMode::OnePerPersona,
            argument_mode: ArgumentMode::Independent,
        }
    }
}

/// Per-game settings consumed by the engine.
///
/// Timeout fields are `None` for "no deadline"; the HTTP layer accepts the
/// wire value `-1` and maps it here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSettings {
    /// Per-unit cap on added arguments.
    pub argument_limit: u32,
    /// Hours before a stale proposal phase is flagged to the host.
    pub proposal_timeout_hours: Option<i64>,
    /// Hours before argumentation is force-completed.
    pub argumentation_timeout_hours: Option<i64>,
    /// Hours before voting is force-completed.
    pub voting_timeout_hours: Option<i64>,
    /// Hours before a stale narration phase is flagged to the host.
    pub narration_timeout_hours: Option<i64>,
    /// Stored id of the resolution strategy.
    pub resolution_method: String,
    /// Persona-sharing configuration.
    pub persona_sharing: PersonaSharing,
    /// Narration permission mode.
    pub narration_mode: NarrationMode,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            argument_limit: 3,
            proposal_timeout_hours: None,
            argumentation_timeout_hours: None,
            voting_timeout_hours: None,
            narration_timeout_hours: None,
            resolution_method: "token_draw".to_owned(),
            persona_sharing: PersonaSharing::default(),
            narration_mode: NarrationMode::InitiatorOnly,
        }
    }
}

impl GameSettings {
    /// Configured timeout for a phase, `None` when untimed or infinite.
    #[must_use]
    pub fn timeout_hours_for(&self, phase: GamePhase) -> Option<i64> {
        match phase {
            GamePhase::Proposal => self.proposal_timeout_hours,
            GamePhase::Argumentation => self.argumentation_timeout_hours,
            GamePhase::Voting => self.voting_timeout_hours,
            GamePhase::Narration => self.narration_timeout_hours,
            GamePhase::Waiting | GamePhase::Resolution | GamePhase::RoundSummary => None,
        }
    }
}

/// A matrix game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    /// Game identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Current pipeline phase.
    pub current_phase: GamePhase,
    /// When the current phase began; the sole anchor the timeout worker
    /// reads. Every phase transition resets it.
    pub phase_started_at: Option<DateTime<Utc>>,
    /// The round in progress, once the game has started.
    pub current_round_id: Option<Uuid>,
    /// The action in flight, while one exists.
    pub current_action_id: Option<Uuid>,
    /// Per-game settings.
    pub settings: GameSettings,
    /// Accumulated momentum from resolved NPC-initiated actions.
    pub npc_momentum: i64,
    /// Soft-delete flag; deletable only while in the lobby.
    pub is_deleted: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Game {
    /// Creates a lobby-status game with the given settings.
    #[must_use]
    pub fn new(id: Uuid, name: String, settings: GameSettings, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            status: GameStatus::Lobby,
            current_phase: GamePhase::Waiting,
            phase_started_at: None,
            current_round_id: None,
            current_action_id: None,
            settings,
            npc_momentum: 0,
            is_deleted: false,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_phases() {
        assert!(GamePhase::Proposal.is_timed());
        assert!(GamePhase::Argumentation.is_timed());
        assert!(GamePhase::Voting.is_timed());
        assert!(GamePhase::Narration.is_timed());
        assert!(!GamePhase::Waiting.is_timed());
        assert!(!GamePhase::Resolution.is_timed());
        assert!(!GamePhase::RoundSummary.is_timed());
    }

    #[test]
    fn test_default_settings() {
        let settings = GameSettings::default();
        assert_eq!(settings.argument_limit, 3);
        assert_eq!(settings.resolution_method, "token_draw");
        assert!(settings.voting_timeout_hours.is_none());
        assert!(!settings.persona_sharing.enabled);
    }

    #[test]
    fn test_timeout_lookup_ignores_untimed_phases() {
        let settings = GameSettings {
            voting_timeout_hours: Some(24),
            ..GameSettings::default()
        };
        assert_eq!(settings.timeout_hours_for(GamePhase::Voting), Some(24));
        assert_eq!(settings.timeout_hours_for(GamePhase::Resolution), None);
    }
}
