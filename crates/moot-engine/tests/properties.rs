//! Invariant-level tests over the in-memory store: the transition table,
//! the once-only guards, idempotent signals, and timeout behavior.

mod common;

use moot_core::error::CoreError;
use moot_core::model::{
    ActionStatus, ArgumentKind, GamePhase, GameSettings, PersonaSharing, VoteKind,
    audit_kind,
};
use moot_core::store::{ActionRepo, AuditRepo, GameRepo, RosterRepo};
use moot_engine::timeout::TimeoutWorker;

use common::{Harness, RunningGame, harness, proposal, shared_persona_game, two_solo_game};

/// Proposes and completes argumentation for both solo players, leaving
/// the action in voting.
async fn action_in_voting(h: &Harness, g: &RunningGame) -> uuid::Uuid {
    let action = h
        .engine
        .propose(g.game_id, g.players[0].id, proposal("Make a move"))
        .await
        .unwrap();
    h.engine
        .complete_argumentation(action.id, g.players[0].id)
        .await
        .unwrap();
    h.engine
        .complete_argumentation(action.id, g.players[1].id)
        .await
        .unwrap();
    action.id
}

#[tokio::test]
async fn test_phase_moves_only_along_the_table() {
    let h = harness();
    let g = two_solo_game(&h, GameSettings::default()).await;

    // The game sits in Proposal; skipping ahead is rejected and the
    // phase is untouched.
    for to in [
        GamePhase::Voting,
        GamePhase::Narration,
        GamePhase::RoundSummary,
        GamePhase::Waiting,
    ] {
        match h.engine.transition_phase(g.game_id, to).await.unwrap_err() {
            CoreError::InvalidState(_) => {}
            other => panic!("expected InvalidState, got {other:?}"),
        }
        let game = h.store.game(g.game_id).await.unwrap().unwrap();
        assert_eq!(game.current_phase, GamePhase::Proposal);
    }
}

#[tokio::test]
async fn test_stale_phase_commit_loses_instead_of_clobbering() {
    let h = harness();
    let g = two_solo_game(&h, GameSettings::default()).await;

    // A writer that read Waiting is behind; its commit must not apply.
    let committed = h
        .store
        .commit_phase(
            g.game_id,
            GamePhase::Waiting,
            GamePhase::Proposal,
            common::start_time(),
        )
        .await
        .unwrap();
    assert!(!committed);
    let game = h.store.game(g.game_id).await.unwrap().unwrap();
    assert_eq!(game.current_phase, GamePhase::Proposal);
}

#[tokio::test]
async fn test_every_transition_resets_the_phase_anchor() {
    let h = harness();
    let g = two_solo_game(&h, GameSettings::default()).await;

    let before = h.store.game(g.game_id).await.unwrap().unwrap();
    h.clock.advance(chrono::Duration::hours(1));
    h.engine
        .propose(g.game_id, g.players[0].id, proposal("Strike camp"))
        .await
        .unwrap();

    let after = h.store.game(g.game_id).await.unwrap().unwrap();
    assert_eq!(after.current_phase, GamePhase::Argumentation);
    assert!(after.phase_started_at.unwrap() > before.phase_started_at.unwrap());
}

#[tokio::test]
async fn test_round_completion_counter_is_bounded() {
    let h = harness();
    let g = two_solo_game(&h, GameSettings::default()).await;
    let game = h.store.game(g.game_id).await.unwrap().unwrap();
    let round_id = game.current_round_id.unwrap();

    assert!(h.store.increment_round_actions(round_id).await.unwrap().is_some());
    assert!(h.store.increment_round_actions(round_id).await.unwrap().is_some());
    // The quota is two; a third increment must not apply.
    assert!(h.store.increment_round_actions(round_id).await.unwrap().is_none());

    let round = h.store.round(round_id).await.unwrap().unwrap();
    assert_eq!(round.actions_completed, round.total_actions_required);
}

#[tokio::test]
async fn test_vacated_persona_lead_is_reassigned() {
    let h = harness();
    let settings = GameSettings {
        persona_sharing: PersonaSharing {
            enabled: true,
            ..PersonaSharing::default()
        },
        ..GameSettings::default()
    };
    let g = shared_persona_game(&h, settings).await;
    let [a, b] = [&g.players[0], &g.players[1]];
    assert!(a.is_persona_lead);
    assert!(!b.is_persona_lead);

    h.engine.leave_game(g.game_id, a.id).await.unwrap();

    let players = h.store.players_in_game(g.game_id).await.unwrap();
    let leads: Vec<_> = players
        .iter()
        .filter(|p| p.is_active && p.is_persona_lead)
        .collect();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].id, b.id);

    // A returns; the lead stays with B, and there is still only one.
    h.engine.rejoin_game(g.game_id, a.id).await.unwrap();
    let players = h.store.players_in_game(g.game_id).await.unwrap();
    let leads = players
        .iter()
        .filter(|p| p.is_active && p.is_persona_lead)
        .count();
    assert_eq!(leads, 1);
}

#[tokio::test]
async fn test_resolution_happens_at_most_once() {
    let h = harness();
    let g = two_solo_game(&h, GameSettings::default()).await;
    let action_id = action_in_voting(&h, &g).await;

    h.engine
        .submit_vote(action_id, g.players[0].id, VoteKind::LikelySuccess)
        .await
        .unwrap();
    h.engine
        .submit_vote(action_id, g.players[1].id, VoteKind::LikelyFailure)
        .await
        .unwrap();

    let resolved = h.store.action(action_id).await.unwrap().unwrap();
    assert_eq!(resolved.status, ActionStatus::Resolved);
    let data = resolved.resolution_data.clone().unwrap();

    // A second resolution attempt is a conflict and changes nothing.
    match h
        .engine
        .resolve(action_id, g.players[0].id)
        .await
        .unwrap_err()
    {
        CoreError::Conflict(_) => {}
        other => panic!("expected Conflict, got {other:?}"),
    }
    let after = h.store.action(action_id).await.unwrap().unwrap();
    assert_eq!(after.resolution_data.unwrap(), data);
}

#[tokio::test]
async fn test_double_vote_by_one_player_is_a_conflict() {
    let h = harness();
    let g = two_solo_game(&h, GameSettings::default()).await;
    let action_id = action_in_voting(&h, &g).await;

    h.engine
        .submit_vote(action_id, g.players[0].id, VoteKind::Uncertain)
        .await
        .unwrap();
    match h
        .engine
        .submit_vote(action_id, g.players[0].id, VoteKind::LikelySuccess)
        .await
        .unwrap_err()
    {
        CoreError::Conflict(_) => {}
        other => panic!("expected Conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn test_done_signal_is_idempotent() {
    let h = harness();
    let g = two_solo_game(&h, GameSettings::default()).await;
    let action = h
        .engine
        .propose(g.game_id, g.players[0].id, proposal("Dig in"))
        .await
        .unwrap();

    let first = h
        .engine
        .complete_argumentation(action.id, g.players[0].id)
        .await
        .unwrap();
    let second = h
        .engine
        .complete_argumentation(action.id, g.players[0].id)
        .await
        .unwrap();
    assert_eq!(first.units_done, second.units_done);
    assert!(!second.voting_opened);

    let done = h.store.argumentation_done(action.id).await.unwrap();
    assert_eq!(done.len(), 1);
}

#[tokio::test]
async fn test_duplicate_proposal_from_one_unit_is_a_conflict() {
    let h = harness();
    let g = two_solo_game(&h, GameSettings::default()).await;

    h.engine
        .propose(g.game_id, g.players[0].id, proposal("March east"))
        .await
        .unwrap();
    // The phase gate fires first for anyone proposing mid-action.
    match h
        .engine
        .propose(g.game_id, g.players[0].id, proposal("March west"))
        .await
        .unwrap_err()
    {
        CoreError::InvalidState(_) => {}
        other => panic!("expected InvalidState, got {other:?}"),
    }
}

#[tokio::test]
async fn test_second_proposal_same_round_hits_the_unique_unit_index() {
    let h = harness();
    let g = two_solo_game(&h, GameSettings::default()).await;
    let [a, b] = [&g.players[0], &g.players[1]];

    // Play A's action through so the game returns to Proposal.
    let action_id = action_in_voting(&h, &g).await;
    h.engine
        .submit_vote(action_id, a.id, VoteKind::Uncertain)
        .await
        .unwrap();
    h.engine
        .submit_vote(action_id, b.id, VoteKind::Uncertain)
        .await
        .unwrap();
    h.engine
        .submit_narration(action_id, a.id, "Done.".to_owned())
        .await
        .unwrap();

    // A already proposed this round; the unit index rejects a second.
    match h
        .engine
        .propose(g.game_id, a.id, proposal("Again"))
        .await
        .unwrap_err()
    {
        CoreError::Conflict(msg) => assert!(msg.contains("already proposed")),
        other => panic!("expected Conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn test_initiator_clarifies_and_others_argue() {
    let h = harness();
    let g = two_solo_game(&h, GameSettings::default()).await;
    let [a, b] = [&g.players[0], &g.players[1]];
    let action = h
        .engine
        .propose(g.game_id, a.id, proposal("Scale the walls"))
        .await
        .unwrap();

    // The initiator may only clarify.
    match h
        .engine
        .add_argument(action.id, a.id, ArgumentKind::For, "Also this".to_owned())
        .await
        .unwrap_err()
    {
        CoreError::InvalidState(_) => {}
        other => panic!("expected InvalidState, got {other:?}"),
    }
    h.engine
        .add_argument(
            action.id,
            a.id,
            ArgumentKind::Clarification,
            "At the north tower".to_owned(),
        )
        .await
        .unwrap();

    // Everyone else may never clarify.
    match h
        .engine
        .add_argument(
            action.id,
            b.id,
            ArgumentKind::Clarification,
            "Which walls?".to_owned(),
        )
        .await
        .unwrap_err()
    {
        CoreError::InvalidState(_) => {}
        other => panic!("expected InvalidState, got {other:?}"),
    }
    h.engine
        .add_argument(
            action.id,
            b.id,
            ArgumentKind::Against,
            "The walls are sheer".to_owned(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_argument_cap_is_enforced_per_unit() {
    let h = harness();
    let settings = GameSettings {
        argument_limit: 2,
        ..GameSettings::default()
    };
    let g = two_solo_game(&h, settings).await;
    let [a, b] = [&g.players[0], &g.players[1]];
    let action = h
        .engine
        .propose(g.game_id, a.id, proposal("Poison the well"))
        .await
        .unwrap();

    for i in 0..2 {
        h.engine
            .add_argument(action.id, b.id, ArgumentKind::Against, format!("No {i}"))
            .await
            .unwrap();
    }
    match h
        .engine
        .add_argument(action.id, b.id, ArgumentKind::Against, "No more".to_owned())
        .await
        .unwrap_err()
    {
        CoreError::InvalidState(msg) => assert!(msg.contains("limit")),
        other => panic!("expected InvalidState, got {other:?}"),
    }
}

#[tokio::test]
async fn test_sweep_is_a_noop_before_the_deadline_and_for_infinite_timeouts() {
    let h = harness();
    let settings = GameSettings {
        argumentation_timeout_hours: Some(4),
        ..GameSettings::default()
    };
    let g = two_solo_game(&h, settings).await;
    h.engine
        .propose(g.game_id, g.players[0].id, proposal("Wait and see"))
        .await
        .unwrap();

    let worker = TimeoutWorker::new(h.engine.clone(), std::time::Duration::from_secs(300));

    // One hour in: nothing to do.
    h.clock.advance(chrono::Duration::hours(1));
    let outcome = worker.sweep().await;
    assert_eq!(outcome.games_checked, 1);
    assert_eq!(outcome.timeouts_processed, 0);

    // An infinite game never times out, however stale.
    let h2 = harness();
    let g2 = two_solo_game(&h2, GameSettings::default()).await;
    h2.engine
        .propose(g2.game_id, g2.players[0].id, proposal("Hold forever"))
        .await
        .unwrap();
    h2.clock.advance(chrono::Duration::days(365));
    let worker2 = TimeoutWorker::new(h2.engine.clone(), std::time::Duration::from_secs(300));
    let outcome = worker2.sweep().await;
    assert_eq!(outcome.timeouts_processed, 0);
}

#[tokio::test]
async fn test_negative_timeout_hours_mean_infinite() {
    let h = harness();
    let settings = GameSettings {
        argumentation_timeout_hours: Some(-1),
        ..GameSettings::default()
    };
    let g = two_solo_game(&h, settings).await;
    h.engine
        .propose(g.game_id, g.players[0].id, proposal("Stall"))
        .await
        .unwrap();

    h.clock.advance(chrono::Duration::days(30));
    let worker = TimeoutWorker::new(h.engine.clone(), std::time::Duration::from_secs(300));
    assert_eq!(worker.sweep().await.timeouts_processed, 0);
}

#[tokio::test]
async fn test_proposal_timeout_only_notifies_the_host() {
    let h = harness();
    let settings = GameSettings {
        proposal_timeout_hours: Some(1),
        ..GameSettings::default()
    };
    let g = two_solo_game(&h, settings).await;

    h.clock.advance(chrono::Duration::hours(2));
    let worker = TimeoutWorker::new(h.engine.clone(), std::time::Duration::from_secs(300));
    let outcome = worker.sweep().await;
    assert_eq!(outcome.timeouts_processed, 1);

    // The phase was not force-advanced.
    let game = h.store.game(g.game_id).await.unwrap().unwrap();
    assert_eq!(game.current_phase, GamePhase::Proposal);

    let events = h.store.events_for_game(g.game_id).await.unwrap();
    assert!(events.iter().any(|e| e.kind == audit_kind::PROPOSAL_TIMEOUT));
    let kinds = h.notifier.kinds();
    assert!(kinds.contains(&moot_core::notify::NotificationKind::HostAttentionNeeded));
}

#[tokio::test]
async fn test_voting_timeout_synthesizes_skipped_votes_and_resolves() {
    let h = harness();
    let settings = GameSettings {
        voting_timeout_hours: Some(6),
        ..GameSettings::default()
    };
    let g = two_solo_game(&h, settings).await;
    let action_id = action_in_voting(&h, &g).await;

    h.engine
        .submit_vote(action_id, g.players[0].id, VoteKind::LikelySuccess)
        .await
        .unwrap();

    h.clock.advance(chrono::Duration::hours(7));
    let worker = TimeoutWorker::new(h.engine.clone(), std::time::Duration::from_secs(300));
    let outcome = worker.sweep().await;
    assert_eq!(outcome.timeouts_processed, 1);

    let votes = h.store.votes_for_action(action_id).await.unwrap();
    assert_eq!(votes.len(), 2);
    let synthesized: Vec<_> = votes.iter().filter(|v| v.was_skipped).collect();
    assert_eq!(synthesized.len(), 1);
    assert_eq!(synthesized[0].player_id, g.players[1].id);
    assert_eq!(synthesized[0].kind, VoteKind::Uncertain);

    let action = h.store.action(action_id).await.unwrap().unwrap();
    assert_eq!(action.status, ActionStatus::Resolved);
    let game = h.store.game(g.game_id).await.unwrap().unwrap();
    assert_eq!(game.current_phase, GamePhase::Narration);
}

#[tokio::test]
async fn test_host_skip_voting_matches_timeout_semantics() {
    let h = harness();
    let g = two_solo_game(&h, GameSettings::default()).await;
    let action_id = action_in_voting(&h, &g).await;
    let host = &g.players[0];

    h.engine.skip_voting(action_id, host.id).await.unwrap();

    let votes = h.store.votes_for_action(action_id).await.unwrap();
    assert_eq!(votes.len(), 2);
    assert!(votes.iter().all(|v| v.was_skipped && v.kind == VoteKind::Uncertain));

    let action = h.store.action(action_id).await.unwrap().unwrap();
    assert_eq!(action.status, ActionStatus::Resolved);
    assert!(action.voting_skipped);
}

#[tokio::test]
async fn test_host_skip_argumentation_advances_to_voting() {
    let h = harness();
    let g = two_solo_game(&h, GameSettings::default()).await;
    let action = h
        .engine
        .propose(g.game_id, g.players[0].id, proposal("Storm the gate"))
        .await
        .unwrap();

    // Only the host may force the advance.
    match h
        .engine
        .skip_argumentation(action.id, g.players[1].id)
        .await
        .unwrap_err()
    {
        CoreError::PermissionDenied(_) => {}
        other => panic!("expected PermissionDenied, got {other:?}"),
    }

    h.engine
        .skip_argumentation(action.id, g.players[0].id)
        .await
        .unwrap();
    let stored = h.store.action(action.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ActionStatus::Voting);
    assert!(stored.argumentation_skipped);
}

#[tokio::test]
async fn test_force_completing_an_empty_round_is_rejected() {
    let h = harness();
    let g = two_solo_game(&h, GameSettings::default()).await;

    match h
        .engine
        .skip_to_next_action(g.game_id, g.players[0].id)
        .await
        .unwrap_err()
    {
        CoreError::InvalidState(msg) => assert!(msg.contains("no actions")),
        other => panic!("expected InvalidState, got {other:?}"),
    }
}

#[tokio::test]
async fn test_force_completing_a_round_with_actions() {
    let h = harness();
    let g = two_solo_game(&h, GameSettings::default()).await;
    let [a, b] = [&g.players[0], &g.players[1]];

    // Complete A's action, then force the round before B proposes.
    let action_id = action_in_voting(&h, &g).await;
    h.engine
        .submit_vote(action_id, a.id, VoteKind::Uncertain)
        .await
        .unwrap();
    h.engine
        .submit_vote(action_id, b.id, VoteKind::Uncertain)
        .await
        .unwrap();
    h.engine
        .submit_narration(action_id, a.id, "Done.".to_owned())
        .await
        .unwrap();

    h.engine
        .skip_to_next_action(g.game_id, a.id)
        .await
        .unwrap();

    let game = h.store.game(g.game_id).await.unwrap().unwrap();
    assert_eq!(game.current_phase, GamePhase::RoundSummary);
    let events = h.store.events_for_game(g.game_id).await.unwrap();
    assert!(events.iter().any(|e| e.kind == audit_kind::ROUND_FORCED));
}

#[tokio::test]
async fn test_duplicate_narration_is_a_conflict() {
    let h = harness();
    let g = two_solo_game(&h, GameSettings::default()).await;
    let [a, b] = [&g.players[0], &g.players[1]];
    let action_id = action_in_voting(&h, &g).await;
    h.engine
        .submit_vote(action_id, a.id, VoteKind::Uncertain)
        .await
        .unwrap();
    h.engine
        .submit_vote(action_id, b.id, VoteKind::Uncertain)
        .await
        .unwrap();

    h.engine
        .submit_narration(action_id, a.id, "First telling.".to_owned())
        .await
        .unwrap();
    match h
        .engine
        .submit_narration(action_id, a.id, "Second telling.".to_owned())
        .await
        .unwrap_err()
    {
        CoreError::Conflict(_) => {}
        other => panic!("expected Conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn test_narration_permission_follows_the_mode() {
    let h = harness();
    let g = two_solo_game(&h, GameSettings::default()).await;
    let [a, b] = [&g.players[0], &g.players[1]];
    let action_id = action_in_voting(&h, &g).await;
    h.engine
        .submit_vote(action_id, a.id, VoteKind::Uncertain)
        .await
        .unwrap();
    h.engine
        .submit_vote(action_id, b.id, VoteKind::Uncertain)
        .await
        .unwrap();

    // Initiator-only by default: B cannot narrate A's action.
    match h
        .engine
        .submit_narration(action_id, b.id, "Mine now.".to_owned())
        .await
        .unwrap_err()
    {
        CoreError::PermissionDenied(_) => {}
        other => panic!("expected PermissionDenied, got {other:?}"),
    }
}

#[tokio::test]
async fn test_host_edits_change_content_but_never_state() {
    let h = harness();
    let g = two_solo_game(&h, GameSettings::default()).await;
    let [a, b] = [&g.players[0], &g.players[1]];
    let action = h
        .engine
        .propose(g.game_id, a.id, proposal("Raid the convoy"))
        .await
        .unwrap();

    // Non-hosts are denied.
    match h
        .engine
        .edit_action(action.id, b.id, Some("Raid the caravan".to_owned()), None)
        .await
        .unwrap_err()
    {
        CoreError::PermissionDenied(_) => {}
        other => panic!("expected PermissionDenied, got {other:?}"),
    }

    let edited = h
        .engine
        .edit_action(action.id, a.id, Some("Raid the caravan".to_owned()), None)
        .await
        .unwrap();
    assert_eq!(edited.description, "Raid the caravan");
    assert_eq!(edited.status, ActionStatus::Arguing);
}

#[tokio::test]
async fn test_lobby_only_soft_delete() {
    let h = harness();
    let (game, host) = h
        .engine
        .create_game(
            "Short-lived".to_owned(),
            GameSettings::default(),
            uuid::Uuid::new_v4(),
        )
        .await
        .unwrap();
    h.engine.delete_game(game.id, host.id).await.unwrap();

    // Soft-deleted games read as absent.
    match h.engine.timeout_status(game.id).await.unwrap_err() {
        CoreError::NotFound { .. } => {}
        other => panic!("expected NotFound, got {other:?}"),
    }

    // A started game refuses deletion.
    let g = two_solo_game(&h, GameSettings::default()).await;
    match h
        .engine
        .delete_game(g.game_id, g.players[0].id)
        .await
        .unwrap_err()
    {
        CoreError::InvalidState(_) => {}
        other => panic!("expected InvalidState, got {other:?}"),
    }
}

#[tokio::test]
async fn test_completed_game_accepts_no_further_play() {
    let h = harness();
    let g = two_solo_game(&h, GameSettings::default()).await;

    // Only the host may end the game.
    match h
        .engine
        .complete_game(g.game_id, g.players[1].id)
        .await
        .unwrap_err()
    {
        CoreError::PermissionDenied(_) => {}
        other => panic!("expected PermissionDenied, got {other:?}"),
    }

    let game = h
        .engine
        .complete_game(g.game_id, g.players[0].id)
        .await
        .unwrap();
    assert_eq!(game.status, moot_core::model::GameStatus::Completed);

    match h
        .engine
        .propose(g.game_id, g.players[0].id, proposal("One more"))
        .await
        .unwrap_err()
    {
        CoreError::InvalidState(_) => {}
        other => panic!("expected InvalidState, got {other:?}"),
    }
}

#[tokio::test]
async fn test_worker_lifecycle_flags() {
    let h = harness();
    let worker = TimeoutWorker::new(h.engine.clone(), std::time::Duration::from_secs(600));
    assert!(!worker.is_running());

    worker.start();
    assert!(worker.is_running());
    // Starting twice is a no-op.
    worker.start();
    assert!(worker.is_running());

    worker.stop().await;
    assert!(!worker.is_running());
    // Stopping twice is a no-op too.
    worker.stop().await;
}

#[tokio::test]
async fn test_timeout_status_reports_the_deadline() {
    let h = harness();
    let settings = GameSettings {
        proposal_timeout_hours: Some(12),
        ..GameSettings::default()
    };
    let g = two_solo_game(&h, settings).await;

    let status = h.engine.timeout_status(g.game_id).await.unwrap();
    assert_eq!(status.phase, GamePhase::Proposal);
    assert_eq!(status.timeout_hours, Some(12));
    assert!(!status.expired);
    let expected = status.phase_started_at.unwrap() + chrono::Duration::hours(12);
    assert_eq!(status.deadline, Some(expected));

    h.clock.advance(chrono::Duration::hours(13));
    let status = h.engine.timeout_status(g.game_id).await.unwrap();
    assert!(status.expired);
}
