//! Game phase orchestrator: the fixed transition table and the commit
//! path every phase change goes through.

use uuid::Uuid;

use moot_core::error::CoreError;
use moot_core::model::{Game, GamePhase, audit_kind};

use crate::engine::Engine;

/// The fixed transition table. No skipping, no reverting.
#[must_use]
pub fn allowed_transitions(from: GamePhase) -> &'static [GamePhase] {
    match from {
        GamePhase::Waiting => &[GamePhase::Proposal],
        GamePhase::Proposal => &[GamePhase::Argumentation],
        GamePhase::Argumentation => &[GamePhase::Voting],
        GamePhase::Voting => &[GamePhase::Resolution],
        GamePhase::Resolution => &[GamePhase::Narration],
        GamePhase::Narration => &[GamePhase::Proposal, GamePhase::RoundSummary],
        GamePhase::RoundSummary => &[GamePhase::Proposal],
    }
}

/// Whether `from → to` is in the table.
#[must_use]
pub fn is_allowed(from: GamePhase, to: GamePhase) -> bool {
    allowed_transitions(from).contains(&to)
}

impl Engine {
    /// Commits a phase transition.
    ///
    /// Re-reads the current phase, validates the move against the table,
    /// and commits conditionally on the phase it read — a transition from
    /// a stale phase fails instead of clobbering a concurrent one. On
    /// success `phase_started_at` is reset to now (the sole anchor the
    /// timeout worker reads) and a `PHASE_TRANSITION` audit event is
    /// recorded.
    ///
    /// # Errors
    ///
    /// `InvalidState` when the move is not in the table, `Conflict` when
    /// the phase moved concurrently, `NotFound` when the game is absent
    /// or soft-deleted.
    pub async fn transition_phase(&self, game_id: Uuid, to: GamePhase) -> Result<Game, CoreError> {
        let mut game = self.load_game(game_id).await?;
        let from = game.current_phase;
        if !is_allowed(from, to) {
            return Err(CoreError::InvalidState(format!(
                "cannot transition from {} to {}",
                from.as_str(),
                to.as_str()
            )));
        }

        let now = self.clock.now();
        if !self.games.commit_phase(game_id, from, to, now).await? {
            return Err(CoreError::Conflict(format!(
                "phase moved past {} concurrently",
                from.as_str()
            )));
        }

        tracing::debug!(%game_id, from = from.as_str(), to = to.as_str(), "phase transition");
        self.record_audit(
            game_id,
            audit_kind::PHASE_TRANSITION,
            serde_json::json!({ "from": from.as_str(), "to": to.as_str() }),
        )
        .await?;

        game.current_phase = to;
        game.phase_started_at = Some(now);
        Ok(game)
    }

    /// Host-triggered phase nudge: the same table-validated commit,
    /// gated to the host. Exposed so a transition stranded by a partial
    /// failure can be retried.
    ///
    /// # Errors
    ///
    /// As [`Self::transition_phase`], plus `PermissionDenied` for
    /// non-hosts.
    pub async fn host_transition_phase(
        &self,
        game_id: Uuid,
        caller_id: Uuid,
        to: GamePhase,
    ) -> Result<Game, CoreError> {
        let game = self.load_game(game_id).await?;
        self.load_host(&game, caller_id).await?;
        self.transition_phase(game_id, to).await
    }

    /// Commits a host-forced phase change outside the table. Used only by
    /// the round-level override; still conditional on the phase the
    /// caller read, and still audited.
    pub(crate) async fn force_phase(
        &self,
        game_id: Uuid,
        from: GamePhase,
        to: GamePhase,
        audit_event: &str,
        payload: serde_json::Value,
    ) -> Result<(), CoreError> {
        let now = self.clock.now();
        if !self.games.commit_phase(game_id, from, to, now).await? {
            return Err(CoreError::Conflict(format!(
                "phase moved past {} concurrently",
                from.as_str()
            )));
        }
        self.record_audit(game_id, audit_event, payload).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_exactly_the_specified_graph() {
        assert_eq!(
            allowed_transitions(GamePhase::Waiting),
            &[GamePhase::Proposal]
        );
        assert_eq!(
            allowed_transitions(GamePhase::Proposal),
            &[GamePhase::Argumentation]
        );
        assert_eq!(
            allowed_transitions(GamePhase::Argumentation),
            &[GamePhase::Voting]
        );
        assert_eq!(
            allowed_transitions(GamePhase::Voting),
            &[GamePhase::Resolution]
        );
        assert_eq!(
            allowed_transitions(GamePhase::Resolution),
            &[GamePhase::Narration]
        );
        assert_eq!(
            allowed_transitions(GamePhase::Narration),
            &[GamePhase::Proposal, GamePhase::RoundSummary]
        );
        assert_eq!(
            allowed_transitions(GamePhase::RoundSummary),
            &[GamePhase::Proposal]
        );
    }

    #[test]
    fn test_no_skipping_or_reverting() {
        assert!(!is_allowed(GamePhase::Proposal, GamePhase::Voting));
        assert!(!is_allowed(GamePhase::Voting, GamePhase::Argumentation));
        assert!(!is_allowed(GamePhase::Proposal, GamePhase::RoundSummary));
        assert!(!is_allowed(GamePhase::RoundSummary, GamePhase::Narration));
        assert!(!is_allowed(GamePhase::Waiting, GamePhase::Voting));
    }
}
