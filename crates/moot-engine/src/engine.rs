//! The engine aggregate: injected capabilities and shared loaders.

use std::sync::{Arc, Mutex};

use uuid::Uuid;

use moot_core::clock::Clock;
use moot_core::error::CoreError;
use moot_core::model::{Action, AuditEvent, Game, Player, Round};
use moot_core::notify::{NotificationKind, Notifier};
use moot_core::rng::SeedSource;
use moot_core::store::{ActionRepo, AuditRepo, GameRepo, RosterRepo};

/// The orchestrator. One instance serves every game; all state lives
/// behind the repositories, so the engine itself is freely sharable and
/// safe under concurrent invocation.
pub struct Engine {
    pub(crate) games: Arc<dyn GameRepo>,
    pub(crate) roster: Arc<dyn RosterRepo>,
    pub(crate) actions: Arc<dyn ActionRepo>,
    pub(crate) audit: Arc<dyn AuditRepo>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) seeds: Mutex<Box<dyn SeedSource>>,
    pub(crate) notifier: Arc<dyn Notifier>,
}

impl Engine {
    /// Wires an engine from its collaborators.
    pub fn new(
        games: Arc<dyn GameRepo>,
        roster: Arc<dyn RosterRepo>,
        actions: Arc<dyn ActionRepo>,
        audit: Arc<dyn AuditRepo>,
        clock: Arc<dyn Clock>,
        seeds: Box<dyn SeedSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            games,
            roster,
            actions,
            audit,
            clock,
            seeds: Mutex::new(seeds),
            notifier,
        }
    }

    /// Loads a game, treating soft-deleted rows as absent.
    pub(crate) async fn load_game(&self, id: Uuid) -> Result<Game, CoreError> {
        self.games
            .game(id)
            .await?
            .filter(|g| !g.is_deleted)
            .ok_or(CoreError::not_found("game", id))
    }

    /// Loads a round.
    pub(crate) async fn load_round(&self, id: Uuid) -> Result<Round, CoreError> {
        self.games
            .round(id)
            .await?
            .ok_or(CoreError::not_found("round", id))
    }

    /// Loads an action.
    pub(crate) async fn load_action(&self, id: Uuid) -> Result<Action, CoreError> {
        self.actions
            .action(id)
            .await?
            .ok_or(CoreError::not_found("action", id))
    }

    /// Loads the caller's seat in a game and checks basic membership:
    /// the seat must belong to the game, be active, and be human.
    pub(crate) async fn load_member(
        &self,
        game: &Game,
        player_id: Uuid,
    ) -> Result<Player, CoreError> {
        let player = self
            .roster
            .player(player_id)
            .await?
            .filter(|p| p.game_id == game.id)
            .ok_or(CoreError::not_found("player", player_id))?;
        if !player.is_active {
            return Err(CoreError::PermissionDenied(
                "player has left the game".to_owned(),
            ));
        }
        if player.is_npc {
            return Err(CoreError::PermissionDenied(
                "the NPC actor cannot call player operations".to_owned(),
            ));
        }
        Ok(player)
    }

    /// As [`Self::load_member`], additionally requiring the host role.
    pub(crate) async fn load_host(&self, game: &Game, player_id: Uuid) -> Result<Player, CoreError> {
        let player = self.load_member(game, player_id).await?;
        if !player.is_host {
            return Err(CoreError::PermissionDenied(
                "host role required".to_owned(),
            ));
        }
        Ok(player)
    }

    /// Next seed for a reproducible draw.
    ///
    /// # Panics
    ///
    /// Panics if the seed-source mutex is poisoned.
    pub(crate) fn next_seed(&self) -> u64 {
        self.seeds.lock().expect("seed source poisoned").next_seed()
    }

    /// Appends an audit event stamped with the engine clock.
    pub(crate) async fn record_audit(
        &self,
        game_id: Uuid,
        kind: &str,
        payload: serde_json::Value,
    ) -> Result<(), CoreError> {
        let event = AuditEvent::new(game_id, kind, payload, self.clock.now());
        self.audit.append(&event).await?;
        Ok(())
    }

    /// Fire-and-forget notification; the outcome is ignored by design of
    /// the notification port.
    pub(crate) async fn notify(
        &self,
        kind: NotificationKind,
        game_id: Uuid,
        payload: serde_json::Value,
    ) {
        self.notifier.notify(kind, game_id, payload).await;
    }
}
