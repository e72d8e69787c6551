//! Argumentation: adding arguments, the idempotent "done" signal, and
//! the arbiter's strong-argument flag.

use std::collections::HashSet;

use uuid::Uuid;

use moot_core::error::CoreError;
use moot_core::model::{Action, ActionStatus, Argument, ArgumentKind, ArgumentMode, GamePhase};
use moot_core::notify::NotificationKind;

use crate::engine::Engine;
use crate::strategy;
use crate::units::{self, Coverage};

/// Progress of the argumentation sub-phase.
#[derive(Debug, Clone, Copy)]
pub struct ArgumentationProgress {
    /// Human acting units that have signalled done.
    pub units_done: usize,
    /// Human acting units that must signal.
    pub units_required: usize,
    /// Whether this call advanced the action to voting.
    pub voting_opened: bool,
}

impl Engine {
    /// Adds an argument to the action being argued.
    ///
    /// The initiator's unit may only clarify; other units may only argue
    /// for or against, up to the per-unit cap (pooled across persona
    /// members or counted per player, depending on the sharing mode).
    ///
    /// # Errors
    ///
    /// `InvalidState` when the action is not arguing, the kind is not
    /// permitted for the caller, or the cap is reached;
    /// `PermissionDenied` for non-members.
    pub async fn add_argument(
        &self,
        action_id: Uuid,
        caller_id: Uuid,
        kind: ArgumentKind,
        content: String,
    ) -> Result<Argument, CoreError> {
        let action = self.load_action(action_id).await?;
        if action.status != ActionStatus::Arguing {
            return Err(CoreError::InvalidState(
                "argumentation on this action is closed".to_owned(),
            ));
        }
        let game = self.load_game(action.game_id).await?;
        let caller = self.load_member(&game, caller_id).await?;

        let in_initiator_unit = units::unit_key_for(&caller) == action.unit_key;
        match kind {
            ArgumentKind::InitiatorFor => {
                return Err(CoreError::InvalidState(
                    "opening arguments are recorded at proposal time".to_owned(),
                ));
            }
            ArgumentKind::Clarification if !in_initiator_unit => {
                return Err(CoreError::InvalidState(
                    "only the initiating unit may clarify".to_owned(),
                ));
            }
            ArgumentKind::For | ArgumentKind::Against if in_initiator_unit => {
                return Err(CoreError::InvalidState(
                    "the initiating unit may only add clarifications".to_owned(),
                ));
            }
            ArgumentKind::For | ArgumentKind::Against | ArgumentKind::Clarification => {}
        }

        let arguments = self.actions.arguments_for_action(action_id).await?;
        let players = self.roster.players_in_game(game.id).await?;
        let counted_authors: HashSet<Uuid> = match game.settings.persona_sharing.argument_mode {
            ArgumentMode::Independent => [caller.id].into_iter().collect(),
            ArgumentMode::SharedPool => match caller.persona_id {
                Some(persona_id) => units::persona_member_ids(&players, persona_id)
                    .into_iter()
                    .collect(),
                None => [caller.id].into_iter().collect(),
            },
        };
        let used = arguments
            .iter()
            .filter(|a| {
                a.kind != ArgumentKind::InitiatorFor
                    && !a.is_placeholder
                    && counted_authors.contains(&a.player_id)
            })
            .count();
        if used >= usize::try_from(game.settings.argument_limit).unwrap_or(usize::MAX) {
            return Err(CoreError::InvalidState(format!(
                "argument limit of {} reached",
                game.settings.argument_limit
            )));
        }

        let argument = Argument {
            id: Uuid::new_v4(),
            action_id,
            player_id: caller.id,
            kind,
            content,
            sequence: i32::try_from(arguments.len()).unwrap_or(i32::MAX).saturating_add(1),
            is_strong: false,
            is_placeholder: false,
            created_at: self.clock.now(),
        };
        self.actions.insert_argument(&argument).await?;
        Ok(argument)
    }

    /// Signals that the caller's unit is done arguing. Idempotent: the
    /// signal is a unique (action, player) insert and a repeat changes
    /// nothing. Once every human acting unit has signalled, the action
    /// advances to voting. NPC units never participate and are excluded
    /// from the threshold.
    ///
    /// # Errors
    ///
    /// `InvalidState` when the action is not arguing,
    /// `PermissionDenied` for non-members.
    pub async fn complete_argumentation(
        &self,
        action_id: Uuid,
        caller_id: Uuid,
    ) -> Result<ArgumentationProgress, CoreError> {
        let action = self.load_action(action_id).await?;
        if action.status != ActionStatus::Arguing {
            return Err(CoreError::InvalidState(
                "argumentation on this action is closed".to_owned(),
            ));
        }
        let game = self.load_game(action.game_id).await?;
        self.load_member(&game, caller_id).await?;

        self.actions
            .record_argumentation_done(action_id, caller_id)
            .await?;

        let players = self.roster.players_in_game(game.id).await?;
        let done: HashSet<Uuid> = self
            .actions
            .argumentation_done(action_id)
            .await?
            .into_iter()
            .collect();
        let units_done = units::units_covered(&players, &done, Coverage::AnyMember);
        let units_required = units::count_acting_units(&players);

        let voting_opened = if units_done >= units_required {
            self.open_voting(&game, &action).await?
        } else {
            false
        };

        Ok(ArgumentationProgress {
            units_done,
            units_required,
            voting_opened,
        })
    }

    /// Advances an arguing action to voting and the game phase with it.
    /// Returns `false` when a concurrent caller got there first — the
    /// advance is conditional, so the loser is a no-op.
    pub(crate) async fn open_voting(
        &self,
        game: &moot_core::model::Game,
        action: &Action,
    ) -> Result<bool, CoreError> {
        let advanced = self
            .actions
            .advance_action_status(
                action.id,
                ActionStatus::Arguing,
                ActionStatus::Voting,
                self.clock.now(),
            )
            .await?;
        if !advanced {
            return Ok(false);
        }

        self.transition_phase(game.id, GamePhase::Voting).await?;
        self.notify(
            NotificationKind::VotingOpened,
            game.id,
            serde_json::json!({ "action_id": action.id }),
        )
        .await;
        Ok(true)
    }

    /// Toggles the arbiter's strong flag on an argument. Arbiter role
    /// and arbiter strategy only; available until the action resolves.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for non-arbiters, `InvalidState` under another
    /// strategy or after resolution.
    pub async fn mark_argument_strong(
        &self,
        argument_id: Uuid,
        caller_id: Uuid,
    ) -> Result<Argument, CoreError> {
        let mut argument = self
            .actions
            .argument(argument_id)
            .await?
            .ok_or(CoreError::not_found("argument", argument_id))?;
        let action = self.load_action(argument.action_id).await?;
        let game = self.load_game(action.game_id).await?;

        if game.settings.resolution_method != strategy::ARBITER_ID {
            return Err(CoreError::InvalidState(
                "strong arguments only matter under arbitration".to_owned(),
            ));
        }
        let caller = self.load_member(&game, caller_id).await?;
        if !caller.is_arbiter {
            return Err(CoreError::PermissionDenied(
                "arbiter role required".to_owned(),
            ));
        }
        if matches!(action.status, ActionStatus::Resolved | ActionStatus::Narrated) {
            return Err(CoreError::InvalidState(
                "the action has already been resolved".to_owned(),
            ));
        }

        argument.is_strong = !argument.is_strong;
        self.actions.update_argument(&argument).await?;
        tracing::debug!(
            argument_id = %argument.id,
            is_strong = argument.is_strong,
            "argument strength toggled"
        );
        Ok(argument)
    }
}
