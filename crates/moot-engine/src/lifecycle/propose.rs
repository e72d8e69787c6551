//! Proposing an action.

use uuid::Uuid;

use moot_core::error::{CoreError, unique_to_conflict};
use moot_core::model::{
    Action, ActionStatus, Argument, ArgumentKind, Game, GamePhase, GameStatus, Player, Round,
};
use moot_core::notify::NotificationKind;

use crate::engine::Engine;
use crate::units;

/// What a proposal carries.
#[derive(Debug, Clone)]
pub struct ProposeInput {
    /// What the acting unit attempts.
    pub description: String,
    /// What the initiator hopes happens.
    pub desired_outcome: String,
    /// Opening supporting arguments, recorded as `InitiatorFor`.
    pub opening_arguments: Vec<String>,
}

impl Engine {
    /// Proposes an action for the caller's acting unit.
    ///
    /// Only valid in the Proposal phase. A unit's second proposal in the
    /// same round dies on the (round, unit) unique index with `Conflict`.
    /// On success the game advances to Argumentation.
    ///
    /// # Errors
    ///
    /// `InvalidState` outside the Proposal phase of an active game,
    /// `PermissionDenied` for non-members, `Conflict` for a duplicate
    /// proposal.
    pub async fn propose(
        &self,
        game_id: Uuid,
        caller_id: Uuid,
        input: ProposeInput,
    ) -> Result<Action, CoreError> {
        let game = self.load_game(game_id).await?;
        if game.status != GameStatus::Active {
            return Err(CoreError::InvalidState(
                "the game is not active".to_owned(),
            ));
        }
        if game.current_phase != GamePhase::Proposal {
            return Err(CoreError::InvalidState(
                "proposals are only accepted in the proposal phase".to_owned(),
            ));
        }

        let caller = self.load_member(&game, caller_id).await?;
        let round = self.current_round(&game).await?;

        let action = self
            .spawn_action(
                &game,
                &round,
                &caller,
                input.description,
                input.desired_outcome,
                input.opening_arguments,
            )
            .await?;

        self.transition_phase(game_id, GamePhase::Argumentation)
            .await?;
        self.notify(
            NotificationKind::ActionProposed,
            game_id,
            serde_json::json!({
                "action_id": action.id,
                "sequence_number": action.sequence_number,
            }),
        )
        .await;
        Ok(action)
    }

    /// Creates the action row and its opening arguments, and points the
    /// game at it. Shared between the player path and the NPC
    /// auto-proposal.
    pub(crate) async fn spawn_action(
        &self,
        game: &Game,
        round: &Round,
        initiator: &Player,
        description: String,
        desired_outcome: String,
        opening_arguments: Vec<String>,
    ) -> Result<Action, CoreError> {
        let now = self.clock.now();
        let sequence_number = self.actions.next_sequence_number(game.id).await?;
        let action = Action {
            id: Uuid::new_v4(),
            game_id: game.id,
            round_id: round.id,
            initiator_id: initiator.id,
            unit_key: units::unit_key_for(initiator),
            sequence_number,
            description,
            desired_outcome,
            status: ActionStatus::Arguing,
            argumentation_started_at: Some(now),
            voting_started_at: None,
            resolved_at: None,
            resolution_method: None,
            resolution_result: None,
            resolution_data: None,
            argumentation_skipped: false,
            voting_skipped: false,
        };
        unique_to_conflict(
            self.actions.insert_action(&action).await,
            "this acting unit has already proposed an action this round",
        )?;

        for (i, content) in opening_arguments.into_iter().enumerate() {
            let argument = Argument {
                id: Uuid::new_v4(),
                action_id: action.id,
                player_id: initiator.id,
                kind: ArgumentKind::InitiatorFor,
                content,
                sequence: i32::try_from(i).unwrap_or(i32::MAX).saturating_add(1),
                is_strong: false,
                is_placeholder: false,
                created_at: now,
            };
            self.actions.insert_argument(&argument).await?;
        }

        let mut game = self.load_game(game.id).await?;
        game.current_action_id = Some(action.id);
        self.games.update_game(&game).await?;

        tracing::info!(
            game_id = %game.id,
            action_id = %action.id,
            sequence = action.sequence_number,
            "action proposed"
        );
        Ok(action)
    }
}
