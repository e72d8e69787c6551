//! Text codecs for the enum columns.
//!
//! The database stores enums as their lowercase snake-case names (the
//! same spelling serde uses); decoding an unknown value is a backend
//! error, never a panic.

use moot_core::model::{ActionStatus, ArgumentKind, GamePhase, GameStatus, RoundStatus, VoteKind};
use moot_core::store::StoreError;

pub fn game_status_str(status: GameStatus) -> &'static str {
    match status {
        GameStatus::Lobby => "lobby",
        GameStatus::Active => "active",
        GameStatus::Completed => "completed",
    }
}

pub fn game_status(s: &str) -> Result<GameStatus, StoreError> {
    match s {
        "lobby" => Ok(GameStatus::Lobby),
        "active" => Ok(GameStatus::Active),
        "completed" => Ok(GameStatus::Completed),
        other => Err(decode_error("game status", other)),
    }
}

pub fn phase_str(phase: GamePhase) -> &'static str {
    phase.as_str()
}

pub fn phase(s: &str) -> Result<GamePhase, StoreError> {
    match s {
        "waiting" => Ok(GamePhase::Waiting),
        "proposal" => Ok(GamePhase::Proposal),
        "argumentation" => Ok(GamePhase::Argumentation),
        "voting" => Ok(GamePhase::Voting),
        "resolution" => Ok(GamePhase::Resolution),
        "narration" => Ok(GamePhase::Narration),
        "round_summary" => Ok(GamePhase::RoundSummary),
        other => Err(decode_error("game phase", other)),
    }
}

pub fn round_status_str(status: RoundStatus) -> &'static str {
    match status {
        RoundStatus::InProgress => "in_progress",
        RoundStatus::Completed => "completed",
    }
}

pub fn round_status(s: &str) -> Result<RoundStatus, StoreError> {
    match s {
        "in_progress" => Ok(RoundStatus::InProgress),
        "completed" => Ok(RoundStatus::Completed),
        other => Err(decode_error("round status", other)),
    }
}

pub fn action_status_str(status: ActionStatus) -> &'static str {
    match status {
        ActionStatus::Arguing => "arguing",
        ActionStatus::Voting => "voting",
        ActionStatus::Resolved => "resolved",
        ActionStatus::Narrated => "narrated",
    }
}

pub fn action_status(s: &str) -> Result<ActionStatus, StoreError> {
    match s {
        "arguing" => Ok(ActionStatus::Arguing),
        "voting" => Ok(ActionStatus::Voting),
        "resolved" => Ok(ActionStatus::Resolved),
        "narrated" => Ok(ActionStatus::Narrated),
        other => Err(decode_error("action status", other)),
    }
}

pub fn argument_kind_str(kind: ArgumentKind) -> &'static str {
    match kind {
        ArgumentKind::InitiatorFor => "initiator_for",
        ArgumentKind::For => "for",
        ArgumentKind::Against => "against",
        ArgumentKind::Clarification => "clarification",
    }
}

pub fn argument_kind(s: &str) -> Result<ArgumentKind, StoreError> {
    match s {
        "initiator_for" => Ok(ArgumentKind::InitiatorFor),
        "for" => Ok(ArgumentKind::For),
        "against" => Ok(ArgumentKind::Against),
        "clarification" => Ok(ArgumentKind::Clarification),
        other => Err(decode_error("argument kind", other)),
    }
}

pub fn vote_kind_str(kind: VoteKind) -> &'static str {
    match kind {
        VoteKind::LikelySuccess => "likely_success",
        VoteKind::LikelyFailure => "likely_failure",
        VoteKind::Uncertain => "uncertain",
    }
}

pub fn vote_kind(s: &str) -> Result<VoteKind, StoreError> {
    match s {
        "likely_success" => Ok(VoteKind::LikelySuccess),
        "likely_failure" => Ok(VoteKind::LikelyFailure),
        "uncertain" => Ok(VoteKind::Uncertain),
        other => Err(decode_error("vote kind", other)),
    }
}

fn decode_error(what: &str, value: &str) -> StoreError {
    StoreError::Backend(format!("undecodable {what}: {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_round_trips() {
        for p in [
            GamePhase::Waiting,
            GamePhase::Proposal,
            GamePhase::Argumentation,
            GamePhase::Voting,
            GamePhase::Resolution,
            GamePhase::Narration,
            GamePhase::RoundSummary,
        ] {
            assert_eq!(phase(phase_str(p)).unwrap(), p);
        }
    }

    #[test]
    fn test_vote_kind_round_trips() {
        for k in [
            VoteKind::LikelySuccess,
            VoteKind::LikelyFailure,
            VoteKind::Uncertain,
        ] {
            assert_eq!(vote_kind(vote_kind_str(k)).unwrap(), k);
        }
    }

    #[test]
    fn test_unknown_value_is_a_backend_error() {
        match phase("limbo").unwrap_err() {
            StoreError::Backend(msg) => assert!(msg.contains("limbo")),
            other => panic!("expected Backend, got {other:?}"),
        }
    }
}
