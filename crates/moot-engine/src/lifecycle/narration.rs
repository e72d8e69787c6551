//! Narration: the prose record that completes an action, and the round
//! bookkeeping that follows it.

use std::collections::HashSet;

use uuid::Uuid;

use moot_core::error::{CoreError, unique_to_conflict};
use moot_core::model::{
    ActionStatus, Game, GamePhase, Narration, NarrationMode, Round, RoundStatus,
};
use moot_core::notify::NotificationKind;

use crate::engine::Engine;
use crate::units;

/// What a narration submission produced.
#[derive(Debug, Clone)]
pub struct NarrationResult {
    /// The stored narration.
    pub narration: Narration,
    /// Actions completed in the round after this one.
    pub actions_completed: i32,
    /// The round's action quota.
    pub total_actions_required: i32,
    /// Whether this narration completed the round.
    pub round_completed: bool,
}

impl Engine {
    /// Submits the narration for a resolved action, completing it.
    ///
    /// Permission depends on the game's narration mode — initiator-only
    /// or open — except NPC-initiated actions, which any member may
    /// narrate. Completing the last action of the round moves the game
    /// to RoundSummary; otherwise it returns to Proposal, auto-proposing
    /// for the NPC unit once every human unit has proposed this round.
    ///
    /// # Errors
    ///
    /// `InvalidState` before resolution, `Conflict` for a duplicate
    /// narration, `PermissionDenied` when the mode reserves narration
    /// for the initiator.
    pub async fn submit_narration(
        &self,
        action_id: Uuid,
        caller_id: Uuid,
        content: String,
    ) -> Result<NarrationResult, CoreError> {
        let action = self.load_action(action_id).await?;
        match action.status {
            ActionStatus::Resolved => {}
            ActionStatus::Arguing | ActionStatus::Voting => {
                return Err(CoreError::InvalidState(
                    "the action has not been resolved yet".to_owned(),
                ));
            }
            ActionStatus::Narrated => {
                return Err(CoreError::Conflict(
                    "the action has already been narrated".to_owned(),
                ));
            }
        }
        let game = self.load_game(action.game_id).await?;
        let caller = self.load_member(&game, caller_id).await?;

        let initiator = self
            .roster
            .player(action.initiator_id)
            .await?
            .ok_or(CoreError::not_found("player", action.initiator_id))?;
        let initiator_only = game.settings.narration_mode == NarrationMode::InitiatorOnly;
        if initiator_only && !initiator.is_npc && caller.id != initiator.id {
            return Err(CoreError::PermissionDenied(
                "only the initiator may narrate this action".to_owned(),
            ));
        }

        let narration = Narration {
            id: Uuid::new_v4(),
            action_id,
            author_id: caller.id,
            content,
            created_at: self.clock.now(),
        };
        unique_to_conflict(
            self.actions.insert_narration(&narration).await,
            "the action has already been narrated",
        )?;

        if !self
            .actions
            .advance_action_status(
                action_id,
                ActionStatus::Resolved,
                ActionStatus::Narrated,
                self.clock.now(),
            )
            .await?
        {
            return Err(CoreError::Conflict(
                "the action has already been narrated".to_owned(),
            ));
        }

        let round = match self.games.increment_round_actions(action.round_id).await? {
            Some(round) => round,
            // The quota was already met; fall back to the stored row.
            None => self.load_round(action.round_id).await?,
        };

        let mut fresh = self.load_game(game.id).await?;
        fresh.current_action_id = None;
        self.games.update_game(&fresh).await?;

        self.notify(
            NotificationKind::NarrationSubmitted,
            game.id,
            serde_json::json!({ "action_id": action_id }),
        )
        .await;

        let round_completed = round.is_complete();
        if round_completed {
            self.close_round(&round).await?;
            self.transition_phase(game.id, GamePhase::RoundSummary)
                .await?;
            self.notify(
                NotificationKind::RoundCompleted,
                game.id,
                serde_json::json!({ "round_number": round.round_number }),
            )
            .await;
        } else {
            self.transition_phase(game.id, GamePhase::Proposal).await?;
            self.maybe_auto_propose_npc(&fresh, &round).await?;
        }

        Ok(NarrationResult {
            narration,
            actions_completed: round.actions_completed,
            total_actions_required: round.total_actions_required,
            round_completed,
        })
    }

    /// Marks a round completed.
    pub(crate) async fn close_round(&self, round: &Round) -> Result<(), CoreError> {
        if round.status != RoundStatus::Completed {
            let mut round = round.clone();
            round.status = RoundStatus::Completed;
            self.games.update_round(&round).await?;
        }
        Ok(())
    }

    /// Proposes the NPC unit's scripted action once every human unit has
    /// proposed this round. No-op when there is no NPC seat, the NPC
    /// already proposed, or human proposals are still outstanding.
    async fn maybe_auto_propose_npc(&self, game: &Game, round: &Round) -> Result<(), CoreError> {
        let players = self.roster.players_in_game(game.id).await?;
        let Some(npc) = players.iter().find(|p| p.is_npc && p.is_active) else {
            return Ok(());
        };

        let actions = self.actions.actions_in_round(round.id).await?;
        let proposed_units: HashSet<&str> =
            actions.iter().map(|a| a.unit_key.as_str()).collect();
        if proposed_units.contains(units::unit_key_for(npc).as_str()) {
            return Ok(());
        }
        let all_humans_proposed = units::acting_units(&players).iter().all(|unit| {
            unit.first()
                .is_some_and(|p| proposed_units.contains(units::unit_key_for(p).as_str()))
        });
        if !all_humans_proposed {
            return Ok(());
        }

        let persona_id = npc
            .persona_id
            .ok_or_else(|| CoreError::InvalidState("NPC seat has no persona".to_owned()))?;
        let persona = self
            .roster
            .persona(persona_id)
            .await?
            .ok_or(CoreError::not_found("persona", persona_id))?;

        let description = persona
            .scripted_action
            .clone()
            .unwrap_or_else(|| format!("{} acts according to its nature", persona.name));
        let desired_outcome = persona
            .scripted_outcome
            .clone()
            .unwrap_or_else(|| "The situation develops".to_owned());

        let game = self.load_game(game.id).await?;
        let action = self
            .spawn_action(&game, round, npc, description, desired_outcome, Vec::new())
            .await?;
        self.transition_phase(game.id, GamePhase::Argumentation)
            .await?;
        self.notify(
            NotificationKind::ActionProposed,
            game.id,
            serde_json::json!({ "action_id": action.id, "npc": true }),
        )
        .await;
        Ok(())
    }

    /// Edits narration prose. Host-only; never changes lifecycle state.
    ///
    /// # Errors
    ///
    /// `NotFound` when no narration exists, `PermissionDenied` for
    /// non-hosts.
    pub async fn edit_narration(
        &self,
        action_id: Uuid,
        caller_id: Uuid,
        content: String,
    ) -> Result<Narration, CoreError> {
        let action = self.load_action(action_id).await?;
        let game = self.load_game(action.game_id).await?;
        self.load_host(&game, caller_id).await?;

        let mut narration = self
            .actions
            .narration_for_action(action_id)
            .await?
            .ok_or(CoreError::not_found("narration", action_id))?;
        narration.content = content;
        self.actions.update_narration(&narration).await?;
        Ok(narration)
    }
}
