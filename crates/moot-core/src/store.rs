//! Repository traits for the persistence boundary.
//!
//! The engine's concurrency story lives at this seam: uniqueness
//! constraints surface as a distinct [`StoreError::UniqueViolation`] (the
//! engine maps it to `Conflict`), and the conditional updates
//! ([`GameRepo::commit_phase`], [`ActionRepo::advance_action_status`],
//! [`GameRepo::increment_round_actions`]) report "did not match" instead
//! of clobbering a concurrent writer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::model::{
    Action, ActionStatus, Argument, AuditEvent, Game, GamePhase, Narration, Persona, Player,
    ResolutionOutcome, Round, Vote,
};

/// Errors produced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched the lookup.
    #[error("row not found")]
    NotFound,

    /// A uniqueness constraint rejected the write. Distinguishable from
    /// other failures so the engine can produce `Conflict`.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// The backing store failed.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Games and rounds.
#[async_trait]
pub trait GameRepo: Send + Sync {
    /// Inserts a new game.
    async fn insert_game(&self, game: &Game) -> Result<(), StoreError>;

    /// Loads a game by id, soft-deleted rows included.
    async fn game(&self, id: Uuid) -> Result<Option<Game>, StoreError>;

    /// Writes back a full game row.
    async fn update_game(&self, game: &Game) -> Result<(), StoreError>;

    /// Commits a phase transition only if the stored phase still equals
    /// `expected`, stamping `phase_started_at`. Returns `false` when the
    /// row was concurrently moved on — the caller lost the race.
    async fn commit_phase(
        &self,
        game_id: Uuid,
        expected: GamePhase,
        next: GamePhase,
        started_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Active, non-deleted games sitting in a timed phase with a phase
    /// start stamp — the timeout sweep's candidate set.
    async fn timeout_candidates(&self) -> Result<Vec<Game>, StoreError>;

    /// Inserts a new round.
    async fn insert_round(&self, round: &Round) -> Result<(), StoreError>;

    /// Loads a round by id.
    async fn round(&self, id: Uuid) -> Result<Option<Round>, StoreError>;

    /// Writes back a full round row.
    async fn update_round(&self, round: &Round) -> Result<(), StoreError>;

    /// Increments `actions_completed`, bounded by
    /// `total_actions_required`. Returns the updated round, or `None`
    /// when the bound was already reached.
    async fn increment_round_actions(&self, round_id: Uuid)
    -> Result<Option<Round>, StoreError>;
}

/// Players and personas.
#[async_trait]
pub trait RosterRepo: Send + Sync {
    /// Inserts a new player seat.
    async fn insert_player(&self, player: &Player) -> Result<(), StoreError>;

    /// Loads a player by id.
    async fn player(&self, id: Uuid) -> Result<Option<Player>, StoreError>;

    /// All player seats in a game, inactive ones included.
    async fn players_in_game(&self, game_id: Uuid) -> Result<Vec<Player>, StoreError>;

    /// Writes back a full player row.
    async fn update_player(&self, player: &Player) -> Result<(), StoreError>;

    /// Inserts a new persona.
    async fn insert_persona(&self, persona: &Persona) -> Result<(), StoreError>;

    /// Loads a persona by id.
    async fn persona(&self, id: Uuid) -> Result<Option<Persona>, StoreError>;

    /// All personas in a game.
    async fn personas_in_game(&self, game_id: Uuid) -> Result<Vec<Persona>, StoreError>;
}

/// Actions and their arguments, votes, completion signals and narrations.
#[async_trait]
pub trait ActionRepo: Send + Sync {
    /// Inserts a new action. The (round, unit_key) unique index rejects a
    /// unit's second proposal in a round with `UniqueViolation`.
    async fn insert_action(&self, action: &Action) -> Result<(), StoreError>;

    /// Loads an action by id.
    async fn action(&self, id: Uuid) -> Result<Option<Action>, StoreError>;

    /// All actions in a round, in sequence order.
    async fn actions_in_round(&self, round_id: Uuid) -> Result<Vec<Action>, StoreError>;

    /// Writes back a full action row.
    async fn update_action(&self, action: &Action) -> Result<(), StoreError>;

    /// Advances the action status only if it still equals `expected`,
    /// stamping the matching timestamp column. Returns `false` when
    /// another writer won; this is the resolve-once guard.
    async fn advance_action_status(
        &self,
        action_id: Uuid,
        expected: ActionStatus,
        next: ActionStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Persists the resolution outcome and audit payload. Only valid
    /// after winning the Voting→Resolved advance.
    async fn record_resolution(
        &self,
        action_id: Uuid,
        method: &str,
        outcome: ResolutionOutcome,
        data: &serde_json::Value,
    ) -> Result<(), StoreError>;

    /// Next value of the game-wide monotonic action sequence.
    async fn next_sequence_number(&self, game_id: Uuid) -> Result<i64, StoreError>;

    /// Inserts a new argument.
    async fn insert_argument(&self, argument: &Argument) -> Result<(), StoreError>;

    /// Loads an argument by id.
    async fn argument(&self, id: Uuid) -> Result<Option<Argument>, StoreError>;

    /// All arguments on an action, in sequence order.
    async fn arguments_for_action(&self, action_id: Uuid) -> Result<Vec<Argument>, StoreError>;

    /// Writes back a full argument row.
    async fn update_argument(&self, argument: &Argument) -> Result<(), StoreError>;

    /// Inserts a vote. The (action, player) unique index rejects a second
    /// vote from the same player with `UniqueViolation`.
    async fn insert_vote(&self, vote: &Vote) -> Result<(), StoreError>;

    /// All votes on an action.
    async fn votes_for_action(&self, action_id: Uuid) -> Result<Vec<Vote>, StoreError>;

    /// Records the idempotent "done arguing" signal; a duplicate signal
    /// is swallowed, not an error.
    async fn record_argumentation_done(
        &self,
        action_id: Uuid,
        player_id: Uuid,
    ) -> Result<(), StoreError>;

    /// Players who have signalled "done arguing" on an action.
    async fn argumentation_done(&self, action_id: Uuid) -> Result<Vec<Uuid>, StoreError>;

    /// Inserts a narration. The unique action index rejects a duplicate
    /// with `UniqueViolation`.
    async fn insert_narration(&self, narration: &Narration) -> Result<(), StoreError>;

    /// Loads the narration of an action, if any.
    async fn narration_for_action(&self, action_id: Uuid)
    -> Result<Option<Narration>, StoreError>;

    /// Writes back a full narration row.
    async fn update_narration(&self, narration: &Narration) -> Result<(), StoreError>;
}

/// Append-only audit trail.
#[async_trait]
pub trait AuditRepo: Send + Sync {
    /// Appends an audit event.
    async fn append(&self, event: &AuditEvent) -> Result<(), StoreError>;

    /// All audit events for a game, oldest first.
    async fn events_for_game(&self, game_id: Uuid) -> Result<Vec<AuditEvent>, StoreError>;
}
