//! Game and roster management: creation, joining, leaving, personas,
//! start and soft delete.

use uuid::Uuid;

use moot_core::error::CoreError;
use moot_core::model::{Game, GamePhase, GameSettings, GameStatus, Persona, Player};
use moot_core::notify::NotificationKind;

use crate::engine::Engine;

impl Engine {
    /// Creates a lobby game with its host seat.
    ///
    /// # Errors
    ///
    /// Storage errors only.
    pub async fn create_game(
        &self,
        name: String,
        settings: GameSettings,
        host_user_id: Uuid,
    ) -> Result<(Game, Player), CoreError> {
        let now = self.clock.now();
        let game = Game::new(Uuid::new_v4(), name, settings, now);
        self.games.insert_game(&game).await?;

        let mut host = Player::new(Uuid::new_v4(), game.id, host_user_id, now);
        host.is_host = true;
        self.roster.insert_player(&host).await?;

        tracing::info!(game_id = %game.id, "game created");
        Ok((game, host))
    }

    /// Creates a persona. Host-only, lobby-only.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for non-hosts, `InvalidState` once the game has
    /// started.
    pub async fn create_persona(
        &self,
        game_id: Uuid,
        caller_id: Uuid,
        name: String,
        is_npc: bool,
        scripted_action: Option<String>,
        scripted_outcome: Option<String>,
    ) -> Result<Persona, CoreError> {
        let game = self.load_game(game_id).await?;
        self.load_host(&game, caller_id).await?;
        if game.status != GameStatus::Lobby {
            return Err(CoreError::InvalidState(
                "personas can only be created in the lobby".to_owned(),
            ));
        }

        let persona = Persona {
            id: Uuid::new_v4(),
            game_id,
            name,
            is_npc,
            scripted_action,
            scripted_outcome,
        };
        self.roster.insert_persona(&persona).await?;

        // The NPC persona plays through its own seat from day one.
        if is_npc {
            let npc = Player::new_npc(Uuid::new_v4(), game_id, persona.id, self.clock.now());
            self.roster.insert_player(&npc).await?;
        }
        Ok(persona)
    }

    /// Adds a player to a game, optionally claiming a persona.
    ///
    /// # Errors
    ///
    /// `InvalidState` for completed/deleted games or NPC personas,
    /// `Conflict` when the persona is taken and sharing is disabled.
    pub async fn join_game(
        &self,
        game_id: Uuid,
        user_id: Uuid,
        persona_id: Option<Uuid>,
    ) -> Result<Player, CoreError> {
        let game = self.load_game(game_id).await?;
        if game.status == GameStatus::Completed {
            return Err(CoreError::InvalidState(
                "the game is already over".to_owned(),
            ));
        }

        let mut player = Player::new(Uuid::new_v4(), game_id, user_id, self.clock.now());
        if let Some(persona_id) = persona_id {
            player.is_persona_lead = self.claim_persona_in(&game, persona_id).await?;
            player.persona_id = Some(persona_id);
        }
        self.roster.insert_player(&player).await?;
        Ok(player)
    }

    /// Claims a persona for an existing player without one.
    ///
    /// # Errors
    ///
    /// `InvalidState` when the caller already has a persona or the
    /// persona is the NPC's, `Conflict` when it is taken and sharing is
    /// disabled.
    pub async fn claim_persona(
        &self,
        game_id: Uuid,
        caller_id: Uuid,
        persona_id: Uuid,
    ) -> Result<Player, CoreError> {
        let game = self.load_game(game_id).await?;
        let mut player = self.load_member(&game, caller_id).await?;
        if player.persona_id.is_some() {
            return Err(CoreError::InvalidState(
                "player already has a persona".to_owned(),
            ));
        }

        player.is_persona_lead = self.claim_persona_in(&game, persona_id).await?;
        player.persona_id = Some(persona_id);
        self.roster.update_player(&player).await?;
        Ok(player)
    }

    /// Validates a claim and reports whether the claimer becomes lead
    /// (first active claimer leads).
    async fn claim_persona_in(&self, game: &Game, persona_id: Uuid) -> Result<bool, CoreError> {
        let persona = self
            .roster
            .persona(persona_id)
            .await?
            .filter(|p| p.game_id == game.id)
            .ok_or(CoreError::not_found("persona", persona_id))?;
        if persona.is_npc {
            return Err(CoreError::InvalidState(
                "the NPC persona cannot be claimed".to_owned(),
            ));
        }

        let players = self.roster.players_in_game(game.id).await?;
        let holders: Vec<&Player> = players
            .iter()
            .filter(|p| p.is_active && p.persona_id == Some(persona_id))
            .collect();
        if !holders.is_empty() && !game.settings.persona_sharing.enabled {
            return Err(CoreError::Conflict(format!(
                "persona {} is already claimed",
                persona.name
            )));
        }
        Ok(holders.iter().all(|p| !p.is_persona_lead))
    }

    /// Soft-leaves a game. A vacated persona lead is reassigned to a
    /// remaining active member.
    ///
    /// # Errors
    ///
    /// `NotFound` when the seat is absent, `PermissionDenied` when it is
    /// already inactive.
    pub async fn leave_game(&self, game_id: Uuid, caller_id: Uuid) -> Result<(), CoreError> {
        let game = self.load_game(game_id).await?;
        let mut player = self.load_member(&game, caller_id).await?;

        player.is_active = false;
        let vacated_lead = player.is_persona_lead;
        player.is_persona_lead = false;
        self.roster.update_player(&player).await?;

        if vacated_lead
            && let Some(persona_id) = player.persona_id
        {
            let players = self.roster.players_in_game(game_id).await?;
            let successor = players
                .into_iter()
                .find(|p| p.is_active && !p.is_npc && p.persona_id == Some(persona_id));
            if let Some(mut successor) = successor {
                successor.is_persona_lead = true;
                self.roster.update_player(&successor).await?;
            }
        }
        Ok(())
    }

    /// Reactivates a seat that previously left. If the seat's persona
    /// has no lead, the returning player takes it.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown seat, `InvalidState` if it never left.
    pub async fn rejoin_game(&self, game_id: Uuid, caller_id: Uuid) -> Result<Player, CoreError> {
        let game = self.load_game(game_id).await?;
        let mut player = self
            .roster
            .player(caller_id)
            .await?
            .filter(|p| p.game_id == game.id)
            .ok_or(CoreError::not_found("player", caller_id))?;
        if player.is_active {
            return Err(CoreError::InvalidState(
                "player is already in the game".to_owned(),
            ));
        }

        player.is_active = true;
        if let Some(persona_id) = player.persona_id {
            let players = self.roster.players_in_game(game_id).await?;
            let has_lead = players
                .iter()
                .any(|p| p.is_active && p.persona_id == Some(persona_id) && p.is_persona_lead);
            player.is_persona_lead = !has_lead;
        }
        self.roster.update_player(&player).await?;
        Ok(player)
    }

    /// Starts the game: host-only, at least two active human players.
    /// Opens round 1 and moves Waiting→Proposal.
    ///
    /// # Errors
    ///
    /// `InvalidState` outside the lobby or with too few players,
    /// `PermissionDenied` for non-hosts.
    pub async fn start_game(&self, game_id: Uuid, caller_id: Uuid) -> Result<Game, CoreError> {
        let mut game = self.load_game(game_id).await?;
        self.load_host(&game, caller_id).await?;
        if game.status != GameStatus::Lobby {
            return Err(CoreError::InvalidState(
                "the game has already started".to_owned(),
            ));
        }

        let players = self.roster.players_in_game(game_id).await?;
        let active_humans = players.iter().filter(|p| p.is_active && !p.is_npc).count();
        if active_humans < 2 {
            return Err(CoreError::InvalidState(
                "at least two active players are required to start".to_owned(),
            ));
        }

        game.status = GameStatus::Active;
        self.games.update_game(&game).await?;
        self.open_round(&mut game, 1).await?;
        let game = self.transition_phase(game_id, GamePhase::Proposal).await?;

        self.notify(
            NotificationKind::GameStarted,
            game_id,
            serde_json::json!({ "round": 1 }),
        )
        .await;
        Ok(game)
    }

    /// Grants or revokes the arbiter role. Host-only; the role is what
    /// gates strong-argument marking and arbiter review.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for non-hosts, `NotFound` for an unknown seat.
    pub async fn assign_arbiter(
        &self,
        game_id: Uuid,
        caller_id: Uuid,
        player_id: Uuid,
        is_arbiter: bool,
    ) -> Result<Player, CoreError> {
        let game = self.load_game(game_id).await?;
        self.load_host(&game, caller_id).await?;

        let mut player = self.load_member(&game, player_id).await?;
        player.is_arbiter = is_arbiter;
        self.roster.update_player(&player).await?;
        Ok(player)
    }

    /// Ends the game. Host-only; a completed game accepts no further
    /// play and its history stays readable.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for non-hosts, `InvalidState` unless the game
    /// is active.
    pub async fn complete_game(&self, game_id: Uuid, caller_id: Uuid) -> Result<Game, CoreError> {
        let mut game = self.load_game(game_id).await?;
        self.load_host(&game, caller_id).await?;
        if game.status != GameStatus::Active {
            return Err(CoreError::InvalidState(
                "only an active game can be completed".to_owned(),
            ));
        }

        game.status = GameStatus::Completed;
        self.games.update_game(&game).await?;
        self.record_audit(
            game_id,
            moot_core::model::audit_kind::GAME_COMPLETED,
            serde_json::json!({ "npc_momentum": game.npc_momentum }),
        )
        .await?;
        Ok(game)
    }

    /// Soft-deletes a game. Host-only, lobby-only.
    ///
    /// # Errors
    ///
    /// `InvalidState` once the game has started.
    pub async fn delete_game(&self, game_id: Uuid, caller_id: Uuid) -> Result<(), CoreError> {
        let mut game = self.load_game(game_id).await?;
        self.load_host(&game, caller_id).await?;
        if game.status != GameStatus::Lobby {
            return Err(CoreError::InvalidState(
                "only lobby games can be deleted".to_owned(),
            ));
        }
        game.is_deleted = true;
        self.games.update_game(&game).await?;
        Ok(())
    }
}
