//! Round tracker: sizing, completion counting, and the round summary.

use uuid::Uuid;

use moot_core::error::CoreError;
use moot_core::model::{Game, GamePhase, Round, RoundStatus, audit_kind};
use moot_core::notify::NotificationKind;

use crate::engine::Engine;
use crate::units;

impl Engine {
    /// Opens a new round sized from the current roster: one action per
    /// acting unit, plus one for the NPC unit when present. Points the
    /// game at the new round.
    pub(crate) async fn open_round(
        &self,
        game: &mut Game,
        round_number: i32,
    ) -> Result<Round, CoreError> {
        let players = self.roster.players_in_game(game.id).await?;
        let mut total = i32::try_from(units::count_acting_units(&players)).unwrap_or(i32::MAX);
        if units::has_npc_unit(&players) {
            total += 1;
        }

        let round = Round::new(Uuid::new_v4(), game.id, round_number, total);
        self.games.insert_round(&round).await?;

        game.current_round_id = Some(round.id);
        game.current_action_id = None;
        self.games.update_game(game).await?;
        Ok(round)
    }

    /// The round the game is currently playing.
    pub(crate) async fn current_round(&self, game: &Game) -> Result<Round, CoreError> {
        let round_id = game.current_round_id.ok_or_else(|| {
            CoreError::InvalidState("the game has no round in progress".to_owned())
        })?;
        self.load_round(round_id).await
    }

    /// Submits the round summary. Host-only, RoundSummary phase only:
    /// completes the round, records the summary in the audit trail,
    /// opens the next round, and returns to Proposal.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for non-hosts, `InvalidState` outside the
    /// RoundSummary phase.
    pub async fn submit_round_summary(
        &self,
        game_id: Uuid,
        caller_id: Uuid,
        content: String,
    ) -> Result<Round, CoreError> {
        let mut game = self.load_game(game_id).await?;
        self.load_host(&game, caller_id).await?;
        if game.current_phase != GamePhase::RoundSummary {
            return Err(CoreError::InvalidState(
                "the round is still being played".to_owned(),
            ));
        }

        let mut round = self.current_round(&game).await?;
        if round.status != RoundStatus::Completed {
            round.status = RoundStatus::Completed;
            self.games.update_round(&round).await?;
        }

        self.record_audit(
            game_id,
            audit_kind::ROUND_SUMMARY,
            serde_json::json!({
                "round_number": round.round_number,
                "summary": content,
            }),
        )
        .await?;

        let next = self.open_round(&mut game, round.round_number + 1).await?;
        self.transition_phase(game_id, GamePhase::Proposal).await?;

        self.notify(
            NotificationKind::RoundCompleted,
            game_id,
            serde_json::json!({ "next_round": next.round_number }),
        )
        .await;
        Ok(next)
    }
}
