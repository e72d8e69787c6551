//! In-memory store implementing every repository trait.
//!
//! Mirrors the Postgres adapter's semantics closely enough for engine
//! tests: uniqueness violations surface as `UniqueViolation`, and the
//! conditional updates (phase commit, status advance, bounded round
//! increment) report "did not match" the same way.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use moot_core::model::{
    Action, ActionStatus, Argument, AuditEvent, Game, GamePhase, Narration, Persona, Player,
    ResolutionOutcome, Round, Vote,
};
use moot_core::store::{ActionRepo, AuditRepo, GameRepo, RosterRepo, StoreError};

#[derive(Debug, Default)]
struct Inner {
    games: HashMap<Uuid, Game>,
    rounds: HashMap<Uuid, Round>,
    players: HashMap<Uuid, Player>,
    personas: HashMap<Uuid, Persona>,
    actions: HashMap<Uuid, Action>,
    arguments: HashMap<Uuid, Argument>,
    votes: HashMap<Uuid, Vote>,
    argumentation_done: HashSet<(Uuid, Uuid)>,
    narrations: HashMap<Uuid, Narration>,
    audits: Vec<AuditEvent>,
}

/// In-memory store for tests. All four repository traits are implemented
/// on the same value; hand out `Arc<MemoryStore>` clones per trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("MemoryStore mutex poisoned")
    }
}

#[async_trait]
impl GameRepo for MemoryStore {
    async fn insert_game(&self, game: &Game) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.games.contains_key(&game.id) {
            return Err(StoreError::UniqueViolation("games_pkey".to_owned()));
        }
        inner.games.insert(game.id, game.clone());
        Ok(())
    }

    async fn game(&self, id: Uuid) -> Result<Option<Game>, StoreError> {
        Ok(self.lock().games.get(&id).cloned())
    }

    async fn update_game(&self, game: &Game) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if !inner.games.contains_key(&game.id) {
            return Err(StoreError::NotFound);
        }
        inner.games.insert(game.id, game.clone());
        Ok(())
    }

    async fn commit_phase(
        &self,
        game_id: Uuid,
        expected: GamePhase,
        next: GamePhase,
        started_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let game = inner.games.get_mut(&game_id).ok_or(StoreError::NotFound)?;
        if game.current_phase != expected {
            return Ok(false);
        }
        game.current_phase = next;
        game.phase_started_at = Some(started_at);
        Ok(true)
    }

    async fn timeout_candidates(&self) -> Result<Vec<Game>, StoreError> {
        Ok(self
            .lock()
            .games
            .values()
            .filter(|g| {
                !g.is_deleted
                    && g.status == moot_core::model::GameStatus::Active
                    && g.current_phase.is_timed()
                    && g.phase_started_at.is_some()
            })
            .cloned()
            .collect())
    }

    async fn insert_round(&self, round: &Round) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.rounds.contains_key(&round.id) {
            return Err(StoreError::UniqueViolation("rounds_pkey".to_owned()));
        }
        inner.rounds.insert(round.id, round.clone());
        Ok(())
    }

    async fn round(&self, id: Uuid) -> Result<Option<Round>, StoreError> {
        Ok(self.lock().rounds.get(&id).cloned())
    }

    async fn update_round(&self, round: &Round) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if !inner.rounds.contains_key(&round.id) {
            return Err(StoreError::NotFound);
        }
        inner.rounds.insert(round.id, round.clone());
        Ok(())
    }

    async fn increment_round_actions(
        &self,
        round_id: Uuid,
    ) -> Result<Option<Round>, StoreError> {
        let mut inner = self.lock();
        let round = inner.rounds.get_mut(&round_id).ok_or(StoreError::NotFound)?;
        if round.actions_completed >= round.total_actions_required {
            return Ok(None);
        }
        round.actions_completed += 1;
        Ok(Some(round.clone()))
    }
}

#[async_trait]
impl RosterRepo for MemoryStore {
    async fn insert_player(&self, player: &Player) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.players.contains_key(&player.id) {
            return Err(StoreError::UniqueViolation("players_pkey".to_owned()));
        }
        inner.players.insert(player.id, player.clone());
        Ok(())
    }

    async fn player(&self, id: Uuid) -> Result<Option<Player>, StoreError> {
        Ok(self.lock().players.get(&id).cloned())
    }

    async fn players_in_game(&self, game_id: Uuid) -> Result<Vec<Player>, StoreError> {
        let mut players: Vec<Player> = self
            .lock()
            .players
            .values()
            .filter(|p| p.game_id == game_id)
            .cloned()
            .collect();
        players.sort_by_key(|p| p.joined_at);
        Ok(players)
    }

    async fn update_player(&self, player: &Player) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if !inner.players.contains_key(&player.id) {
            return Err(StoreError::NotFound);
        }
        inner.players.insert(player.id, player.clone());
        Ok(())
    }

    async fn insert_persona(&self, persona: &Persona) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.personas.contains_key(&persona.id) {
            return Err(StoreError::UniqueViolation("personas_pkey".to_owned()));
        }
        inner.personas.insert(persona.id, persona.clone());
        Ok(())
    }

    async fn persona(&self, id: Uuid) -> Result<Option<Persona>, StoreError> {
        Ok(self.lock().personas.get(&id).cloned())
    }

    async fn personas_in_game(&self, game_id: Uuid) -> Result<Vec<Persona>, StoreError> {
        Ok(self
            .lock()
            .personas
            .values()
            .filter(|p| p.game_id == game_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ActionRepo for MemoryStore {
    async fn insert_action(&self, action: &Action) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let duplicate_unit = inner
            .actions
            .values()
            .any(|a| a.round_id == action.round_id && a.unit_key == action.unit_key);
        if duplicate_unit {
            return Err(StoreError::UniqueViolation(
                "actions_round_unit_key".to_owned(),
            ));
        }
        if inner.actions.contains_key(&action.id) {
            return Err(StoreError::UniqueViolation("actions_pkey".to_owned()));
        }
        inner.actions.insert(action.id, action.clone());
        Ok(())
    }

    async fn action(&self, id: Uuid) -> Result<Option<Action>, StoreError> {
        Ok(self.lock().actions.get(&id).cloned())
    }

    async fn actions_in_round(&self, round_id: Uuid) -> Result<Vec<Action>, StoreError> {
        let mut actions: Vec<Action> = self
            .lock()
            .actions
            .values()
            .filter(|a| a.round_id == round_id)
            .cloned()
            .collect();
        actions.sort_by_key(|a| a.sequence_number);
        Ok(actions)
    }

    async fn update_action(&self, action: &Action) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if !inner.actions.contains_key(&action.id) {
            return Err(StoreError::NotFound);
        }
        inner.actions.insert(action.id, action.clone());
        Ok(())
    }

    async fn advance_action_status(
        &self,
        action_id: Uuid,
        expected: ActionStatus,
        next: ActionStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let action = inner.actions.get_mut(&action_id).ok_or(StoreError::NotFound)?;
        if action.status != expected {
            return Ok(false);
        }
        action.status = next;
        match next {
            ActionStatus::Voting => action.voting_started_at = Some(at),
            ActionStatus::Resolved => action.resolved_at = Some(at),
            ActionStatus::Arguing | ActionStatus::Narrated => {}
        }
        Ok(true)
    }

    async fn record_resolution(
        &self,
        action_id: Uuid,
        method: &str,
        outcome: ResolutionOutcome,
        data: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let action = inner.actions.get_mut(&action_id).ok_or(StoreError::NotFound)?;
        action.resolution_method = Some(method.to_owned());
        action.resolution_result = Some(outcome);
        action.resolution_data = Some(data.clone());
        Ok(())
    }

    async fn next_sequence_number(&self, game_id: Uuid) -> Result<i64, StoreError> {
        let max = self
            .lock()
            .actions
            .values()
            .filter(|a| a.game_id == game_id)
            .map(|a| a.sequence_number)
            .max()
            .unwrap_or(0);
        Ok(max + 1)
    }

    async fn insert_argument(&self, argument: &Argument) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.arguments.contains_key(&argument.id) {
            return Err(StoreError::UniqueViolation("arguments_pkey".to_owned()));
        }
        inner.arguments.insert(argument.id, argument.clone());
        Ok(())
    }

    async fn argument(&self, id: Uuid) -> Result<Option<Argument>, StoreError> {
        Ok(self.lock().arguments.get(&id).cloned())
    }

    async fn arguments_for_action(&self, action_id: Uuid) -> Result<Vec<Argument>, StoreError> {
        let mut arguments: Vec<Argument> = self
            .lock()
            .arguments
            .values()
            .filter(|a| a.action_id == action_id)
            .cloned()
            .collect();
        arguments.sort_by_key(|a| a.sequence);
        Ok(arguments)
    }

    async fn update_argument(&self, argument: &Argument) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if !inner.arguments.contains_key(&argument.id) {
            return Err(StoreError::NotFound);
        }
        inner.arguments.insert(argument.id, argument.clone());
        Ok(())
    }

    async fn insert_vote(&self, vote: &Vote) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let duplicate = inner
            .votes
            .values()
            .any(|v| v.action_id == vote.action_id && v.player_id == vote.player_id);
        if duplicate {
            return Err(StoreError::UniqueViolation(
                "votes_action_player_key".to_owned(),
            ));
        }
        inner.votes.insert(vote.id, vote.clone());
        Ok(())
    }

    async fn votes_for_action(&self, action_id: Uuid) -> Result<Vec<Vote>, StoreError> {
        let mut votes: Vec<Vote> = self
            .lock()
            .votes
            .values()
            .filter(|v| v.action_id == action_id)
            .cloned()
            .collect();
        votes.sort_by_key(|v| v.created_at);
        Ok(votes)
    }

    async fn record_argumentation_done(
        &self,
        action_id: Uuid,
        player_id: Uuid,
    ) -> Result<(), StoreError> {
        self.lock().argumentation_done.insert((action_id, player_id));
        Ok(())
    }

    async fn argumentation_done(&self, action_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(self
            .lock()
            .argumentation_done
            .iter()
            .filter(|(a, _)| *a == action_id)
            .map(|(_, p)| *p)
            .collect())
    }

    async fn insert_narration(&self, narration: &Narration) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let duplicate = inner
            .narrations
            .values()
            .any(|n| n.action_id == narration.action_id);
        if duplicate {
            return Err(StoreError::UniqueViolation(
                "narrations_action_key".to_owned(),
            ));
        }
        inner.narrations.insert(narration.id, narration.clone());
        Ok(())
    }

    async fn narration_for_action(
        &self,
        action_id: Uuid,
    ) -> Result<Option<Narration>, StoreError> {
        Ok(self
            .lock()
            .narrations
            .values()
            .find(|n| n.action_id == action_id)
            .cloned())
    }

    async fn update_narration(&self, narration: &Narration) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if !inner.narrations.contains_key(&narration.id) {
            return Err(StoreError::NotFound);
        }
        inner.narrations.insert(narration.id, narration.clone());
        Ok(())
    }
}

#[async_trait]
impl AuditRepo for MemoryStore {
    async fn append(&self, event: &AuditEvent) -> Result<(), StoreError> {
        self.lock().audits.push(event.clone());
        Ok(())
    }

    async fn events_for_game(&self, game_id: Uuid) -> Result<Vec<AuditEvent>, StoreError> {
        Ok(self
            .lock()
            .audits
            .iter()
            .filter(|e| e.game_id == game_id)
            .cloned()
            .collect())
    }
}
