//! Host overrides: early sub-phase advances, the round-level force, and
//! content edits.

use std::collections::HashSet;

use uuid::Uuid;

use moot_core::error::CoreError;
use moot_core::model::{
    Action, ActionStatus, Argument, Game, GamePhase, RoundStatus, Vote, VoteKind, VotingMode,
    audit_kind,
};

use crate::engine::Engine;
use crate::strategy;
use crate::units;

impl Engine {
    /// Skips the rest of argumentation. Host-only; the action advances
    /// straight to voting.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for non-hosts, `InvalidState` when the action
    /// is not arguing, `Conflict` when a concurrent advance won.
    pub async fn skip_argumentation(
        &self,
        action_id: Uuid,
        caller_id: Uuid,
    ) -> Result<(), CoreError> {
        let mut action = self.load_action(action_id).await?;
        let game = self.load_game(action.game_id).await?;
        self.load_host(&game, caller_id).await?;
        if action.status != ActionStatus::Arguing {
            return Err(CoreError::InvalidState(
                "argumentation on this action is closed".to_owned(),
            ));
        }

        action.argumentation_skipped = true;
        self.actions.update_action(&action).await?;
        self.record_audit(
            game.id,
            audit_kind::ARGUMENTATION_SKIPPED,
            serde_json::json!({ "action_id": action_id }),
        )
        .await?;

        if !self.open_voting(&game, &action).await? {
            return Err(CoreError::Conflict(
                "argumentation was already completed".to_owned(),
            ));
        }
        Ok(())
    }

    /// Skips the rest of voting. Host-only: synthesizes Uncertain,
    /// was-skipped votes for every acting unit that had not voted, then
    /// resolves — semantically identical to a voting timeout.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for non-hosts, `InvalidState` when the action
    /// is not voting, `Conflict` when already resolved.
    pub async fn skip_voting(&self, action_id: Uuid, caller_id: Uuid) -> Result<(), CoreError> {
        let mut action = self.load_action(action_id).await?;
        let game = self.load_game(action.game_id).await?;
        self.load_host(&game, caller_id).await?;
        if action.status != ActionStatus::Voting {
            return Err(CoreError::InvalidState(
                "this action is not open for voting".to_owned(),
            ));
        }

        let synthesized = self.synthesize_missing_votes(&game, &action).await?;
        action.voting_skipped = true;
        self.actions.update_action(&action).await?;
        self.record_audit(
            game.id,
            audit_kind::VOTING_SKIPPED,
            serde_json::json!({
                "action_id": action_id,
                "synthesized_for": synthesized,
            }),
        )
        .await?;

        self.resolve_action(&game, &action).await
    }

    /// Synthesizes an Uncertain, was-skipped vote for every acting unit
    /// that has not voted. Under each-member voting the missing members
    /// of partially-voted units are filled in too. Returns the players
    /// voted for. Shared by the host skip and the timeout sweep.
    pub(crate) async fn synthesize_missing_votes(
        &self,
        game: &Game,
        action: &Action,
    ) -> Result<Vec<Uuid>, CoreError> {
        let players = self.roster.players_in_game(game.id).await?;
        let existing = self.actions.votes_for_action(action.id).await?;
        let voters: HashSet<Uuid> = existing.iter().map(|v| v.player_id).collect();

        let strategy = strategy::strategy_for(&game.settings.resolution_method)?;
        let weights = strategy.map_vote_to_tokens(VoteKind::Uncertain);
        let mode = game.settings.persona_sharing.voting_mode;

        let mut synthesized = Vec::new();
        for unit in units::acting_units(&players) {
            let targets: Vec<&moot_core::model::Player> = match mode {
                VotingMode::OnePerPersona => {
                    if unit.iter().any(|p| voters.contains(&p.id)) {
                        continue;
                    }
                    units::unit_representative(&unit).into_iter().collect()
                }
                VotingMode::EachMember => unit
                    .iter()
                    .copied()
                    .filter(|p| !voters.contains(&p.id))
                    .collect(),
            };
            for player in targets {
                let vote = Vote {
                    id: Uuid::new_v4(),
                    action_id: action.id,
                    player_id: player.id,
                    kind: VoteKind::Uncertain,
                    success_tokens: i32::try_from(weights.success).unwrap_or(i32::MAX),
                    failure_tokens: i32::try_from(weights.failure).unwrap_or(i32::MAX),
                    was_skipped: true,
                    created_at: self.clock.now(),
                };
                // A racing human vote wins; the synthesized one is dropped.
                match self.actions.insert_vote(&vote).await {
                    Ok(()) => synthesized.push(player.id),
                    Err(moot_core::store::StoreError::UniqueViolation(_)) => {}
                    Err(other) => return Err(other.into()),
                }
            }
        }
        Ok(synthesized)
    }

    /// Force-completes the round on whatever actions already exist.
    /// Host-only, callable between actions (Proposal phase); rejected
    /// when the round has no actions.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for non-hosts, `InvalidState` outside the
    /// Proposal phase or with an empty round.
    pub async fn skip_to_next_action(
        &self,
        game_id: Uuid,
        caller_id: Uuid,
    ) -> Result<(), CoreError> {
        let game = self.load_game(game_id).await?;
        self.load_host(&game, caller_id).await?;
        if game.current_phase != GamePhase::Proposal {
            return Err(CoreError::InvalidState(
                "the round can only be forced between actions".to_owned(),
            ));
        }

        let mut round = self.current_round(&game).await?;
        let actions = self.actions.actions_in_round(round.id).await?;
        if actions.is_empty() {
            return Err(CoreError::InvalidState(
                "the round has no actions to complete it on".to_owned(),
            ));
        }

        round.total_actions_required = round.actions_completed;
        round.status = RoundStatus::Completed;
        self.games.update_round(&round).await?;

        self.force_phase(
            game_id,
            GamePhase::Proposal,
            GamePhase::RoundSummary,
            audit_kind::ROUND_FORCED,
            serde_json::json!({
                "round_number": round.round_number,
                "actions_completed": round.actions_completed,
            }),
        )
        .await
    }

    /// Edits action prose. Host-only; never changes lifecycle state.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for non-hosts.
    pub async fn edit_action(
        &self,
        action_id: Uuid,
        caller_id: Uuid,
        description: Option<String>,
        desired_outcome: Option<String>,
    ) -> Result<Action, CoreError> {
        let mut action = self.load_action(action_id).await?;
        let game = self.load_game(action.game_id).await?;
        self.load_host(&game, caller_id).await?;

        if let Some(description) = description {
            action.description = description;
        }
        if let Some(desired_outcome) = desired_outcome {
            action.desired_outcome = desired_outcome;
        }
        self.actions.update_action(&action).await?;
        Ok(action)
    }

    /// Edits argument prose. Host-only; never changes lifecycle state.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for non-hosts.
    pub async fn edit_argument(
        &self,
        argument_id: Uuid,
        caller_id: Uuid,
        content: String,
    ) -> Result<Argument, CoreError> {
        let mut argument = self
            .actions
            .argument(argument_id)
            .await?
            .ok_or(CoreError::not_found("argument", argument_id))?;
        let action = self.load_action(argument.action_id).await?;
        let game = self.load_game(action.game_id).await?;
        self.load_host(&game, caller_id).await?;

        argument.content = content;
        self.actions.update_argument(&argument).await?;
        Ok(argument)
    }
}
