//! Voting and resolution.

use std::collections::HashSet;

use uuid::Uuid;

use moot_core::error::{CoreError, unique_to_conflict};
use moot_core::model::{
    Action, ActionStatus, Game, GamePhase, Vote, VoteKind, VotingMode, audit_kind,
};
use moot_core::notify::NotificationKind;

use crate::engine::Engine;
use crate::strategy::{self, ResolutionInput};
use crate::units::{self, Coverage};

/// Progress of the voting sub-phase.
#[derive(Debug, Clone, Copy)]
pub struct VoteProgress {
    /// Human acting units whose vote is in.
    pub units_covered: usize,
    /// Human acting units that must vote.
    pub units_required: usize,
    /// Whether this call triggered resolution.
    pub resolved: bool,
}

impl Engine {
    /// Submits a vote on the action being voted on.
    ///
    /// Under one-vote-per-persona the first member to vote casts the
    /// unit's vote and later members are rejected with `Conflict`; under
    /// each-member voting every player votes and the unit counts once
    /// all its members have. Token weights come from the game's active
    /// strategy. Reaching the acting-unit threshold triggers resolution
    /// exactly once.
    ///
    /// # Errors
    ///
    /// `InvalidState` when the action is not voting, `PermissionDenied`
    /// for non-members, `Conflict` for duplicate votes.
    pub async fn submit_vote(
        &self,
        action_id: Uuid,
        caller_id: Uuid,
        kind: VoteKind,
    ) -> Result<VoteProgress, CoreError> {
        let action = self.load_action(action_id).await?;
        if action.status != ActionStatus::Voting {
            return Err(CoreError::InvalidState(
                "this action is not open for voting".to_owned(),
            ));
        }
        let game = self.load_game(action.game_id).await?;
        let caller = self.load_member(&game, caller_id).await?;

        let players = self.roster.players_in_game(game.id).await?;
        let existing = self.actions.votes_for_action(action_id).await?;

        if game.settings.persona_sharing.voting_mode == VotingMode::OnePerPersona
            && let Some(persona_id) = caller.persona_id
        {
            let members: HashSet<Uuid> = units::persona_member_ids(&players, persona_id)
                .into_iter()
                .collect();
            if existing.iter().any(|v| members.contains(&v.player_id)) {
                return Err(CoreError::Conflict(
                    "this persona has already voted".to_owned(),
                ));
            }
        }

        let strategy = strategy::strategy_for(&game.settings.resolution_method)?;
        let weights = strategy.map_vote_to_tokens(kind);
        let vote = Vote {
            id: Uuid::new_v4(),
            action_id,
            player_id: caller.id,
            kind,
            success_tokens: i32::try_from(weights.success).unwrap_or(i32::MAX),
            failure_tokens: i32::try_from(weights.failure).unwrap_or(i32::MAX),
            was_skipped: false,
            created_at: self.clock.now(),
        };
        unique_to_conflict(
            self.actions.insert_vote(&vote).await,
            "this player has already voted on the action",
        )?;

        let mut voters: HashSet<Uuid> = existing.iter().map(|v| v.player_id).collect();
        voters.insert(caller.id);
        let coverage = vote_coverage(game.settings.persona_sharing.voting_mode);
        let units_covered = units::units_covered(&players, &voters, coverage);
        let units_required = units::count_acting_units(&players);

        // Arbiter games resolve through the review operation, not the
        // vote threshold.
        let threshold_resolves =
            game.settings.resolution_method != strategy::ARBITER_ID;
        let resolved = if threshold_resolves && units_covered >= units_required {
            // A concurrent voter or sweep may already hold the
            // resolve-once guard; losing that race is a no-op here.
            match self.resolve_action(&game, &action).await {
                Ok(()) => true,
                Err(CoreError::Conflict(_)) => false,
                Err(other) => return Err(other),
            }
        } else {
            false
        };

        Ok(VoteProgress {
            units_covered,
            units_required,
            resolved,
        })
    }

    /// Runs resolution for an action whose vote threshold is met.
    ///
    /// Normally resolution fires from the final vote; this operation
    /// retries the step when that call failed after its votes were
    /// already persisted.
    ///
    /// # Errors
    ///
    /// `Conflict` when the action already resolved, `InvalidState` when
    /// votes are outstanding or the action is still arguing.
    pub async fn resolve(&self, action_id: Uuid, caller_id: Uuid) -> Result<Action, CoreError> {
        let action = self.load_action(action_id).await?;
        match action.status {
            ActionStatus::Voting => {}
            ActionStatus::Arguing => {
                return Err(CoreError::InvalidState(
                    "the action is still being argued".to_owned(),
                ));
            }
            ActionStatus::Resolved | ActionStatus::Narrated => {
                return Err(CoreError::Conflict(
                    "the action has already been resolved".to_owned(),
                ));
            }
        }
        let game = self.load_game(action.game_id).await?;
        self.load_member(&game, caller_id).await?;
        if game.settings.resolution_method == strategy::ARBITER_ID {
            return Err(CoreError::InvalidState(
                "arbiter games resolve through the review operation".to_owned(),
            ));
        }

        let players = self.roster.players_in_game(game.id).await?;
        let voters: HashSet<Uuid> = self
            .actions
            .votes_for_action(action_id)
            .await?
            .iter()
            .map(|v| v.player_id)
            .collect();
        let coverage = vote_coverage(game.settings.persona_sharing.voting_mode);
        if units::units_covered(&players, &voters, coverage) < units::count_acting_units(&players)
        {
            return Err(CoreError::InvalidState(
                "votes are still outstanding".to_owned(),
            ));
        }

        self.resolve_action(&game, &action).await?;
        self.load_action(action_id).await
    }

    /// Completes the arbiter's review, resolving the action from the
    /// strong-argument tally. Arbiter role and strategy only, gated to
    /// the voting (review) phase.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for non-arbiters, `InvalidState` under another
    /// strategy or outside review, `Conflict` when already resolved.
    pub async fn complete_arbiter_review(
        &self,
        action_id: Uuid,
        caller_id: Uuid,
    ) -> Result<Action, CoreError> {
        let action = self.load_action(action_id).await?;
        let game = self.load_game(action.game_id).await?;
        if game.settings.resolution_method != strategy::ARBITER_ID {
            return Err(CoreError::InvalidState(
                "this game does not use arbitration".to_owned(),
            ));
        }
        let caller = self.load_member(&game, caller_id).await?;
        if !caller.is_arbiter {
            return Err(CoreError::PermissionDenied(
                "arbiter role required".to_owned(),
            ));
        }
        if action.status != ActionStatus::Voting {
            return Err(CoreError::InvalidState(
                "the action is not under review".to_owned(),
            ));
        }

        self.resolve_action(&game, &action).await?;
        self.load_action(action_id).await
    }

    /// The single resolution path: commits the Voting→Resolution phase,
    /// takes the resolve-once guard, runs the strategy, persists the
    /// outcome, accumulates NPC momentum, and lands the game in the
    /// Narration phase. Exactly one caller wins the guard; all others
    /// see `Conflict`.
    pub(crate) async fn resolve_action(
        &self,
        game: &Game,
        action: &Action,
    ) -> Result<(), CoreError> {
        let game_id = game.id;
        let fresh = self.load_game(game_id).await?;
        if fresh.current_phase == GamePhase::Voting {
            self.transition_phase(game_id, GamePhase::Resolution)
                .await?;
        }

        let advanced = self
            .actions
            .advance_action_status(
                action.id,
                ActionStatus::Voting,
                ActionStatus::Resolved,
                self.clock.now(),
            )
            .await?;
        if !advanced {
            return Err(CoreError::Conflict(
                "the action has already been resolved".to_owned(),
            ));
        }

        let votes = self.actions.votes_for_action(action.id).await?;
        let arguments = self.actions.arguments_for_action(action.id).await?;
        let seed = self.next_seed();
        let strategy = strategy::strategy_for(&game.settings.resolution_method)?;
        let resolved = strategy.resolve(&ResolutionInput {
            votes: &votes,
            arguments: &arguments,
            seed,
        })?;

        self.actions
            .record_resolution(
                action.id,
                &game.settings.resolution_method,
                resolved.outcome,
                &resolved.data,
            )
            .await?;

        let initiator = self
            .roster
            .player(action.initiator_id)
            .await?
            .ok_or(CoreError::not_found("player", action.initiator_id))?;
        if initiator.is_npc {
            let mut fresh = self.load_game(game_id).await?;
            fresh.npc_momentum += resolved.outcome.result_value;
            self.games.update_game(&fresh).await?;
        }

        self.record_audit(
            game_id,
            audit_kind::ACTION_RESOLVED,
            serde_json::json!({
                "action_id": action.id,
                "result_type": resolved.outcome.result_type,
                "result_value": resolved.outcome.result_value,
            }),
        )
        .await?;
        self.notify(
            NotificationKind::ActionResolved,
            game_id,
            serde_json::json!({
                "action_id": action.id,
                "result_type": resolved.outcome.result_type,
            }),
        )
        .await;

        self.transition_phase(game_id, GamePhase::Narration).await?;
        Ok(())
    }
}

/// The coverage rule matching a voting mode.
fn vote_coverage(mode: VotingMode) -> Coverage {
    match mode {
        VotingMode::OnePerPersona => Coverage::AnyMember,
        VotingMode::EachMember => Coverage::AllMembers,
    }
}
