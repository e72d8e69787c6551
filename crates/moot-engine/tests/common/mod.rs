//! Shared harness for engine integration tests: an engine wired to the
//! in-memory store with a manual clock and a fixed seed.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use moot_core::model::{GameSettings, Persona, Player};
use moot_engine::Engine;
use moot_engine::lifecycle::ProposeInput;
use moot_test_support::{FixedSeed, ManualClock, MemoryStore, RecordingNotifier};

/// Fixed start instant used across the integration tests.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// A wired engine plus handles to its collaborators.
pub struct Harness {
    pub engine: Arc<Engine>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(start_time()));
    let notifier = Arc::new(RecordingNotifier::new());
    let engine = Arc::new(Engine::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        clock.clone(),
        Box::new(FixedSeed(0x5EED_CAFE)),
        notifier.clone(),
    ));
    Harness {
        engine,
        store,
        clock,
        notifier,
    }
}

/// A started game with its roster.
pub struct RunningGame {
    pub game_id: Uuid,
    pub host: Player,
    pub players: Vec<Player>,
    pub persona: Option<Persona>,
}

/// Two solo players (the host and one other), game started.
pub async fn two_solo_game(h: &Harness, settings: GameSettings) -> RunningGame {
    let (game, host) = h
        .engine
        .create_game("Border Crisis".to_owned(), settings, Uuid::new_v4())
        .await
        .unwrap();
    let second = h
        .engine
        .join_game(game.id, Uuid::new_v4(), None)
        .await
        .unwrap();
    h.engine.start_game(game.id, host.id).await.unwrap();
    RunningGame {
        game_id: game.id,
        host: host.clone(),
        players: vec![host, second],
        persona: None,
    }
}

/// A shared persona (host + one member, host leads) plus one solo
/// player, game started. `players` is [host, member, solo].
pub async fn shared_persona_game(h: &Harness, settings: GameSettings) -> RunningGame {
    let (game, host) = h
        .engine
        .create_game("Summit Talks".to_owned(), settings, Uuid::new_v4())
        .await
        .unwrap();
    let persona = h
        .engine
        .create_persona(
            game.id,
            host.id,
            "The Ministry".to_owned(),
            false,
            None,
            None,
        )
        .await
        .unwrap();
    let host = h
        .engine
        .claim_persona(game.id, host.id, persona.id)
        .await
        .unwrap();
    let member = h
        .engine
        .join_game(game.id, Uuid::new_v4(), Some(persona.id))
        .await
        .unwrap();
    let solo = h
        .engine
        .join_game(game.id, Uuid::new_v4(), None)
        .await
        .unwrap();
    h.engine.start_game(game.id, host.id).await.unwrap();
    RunningGame {
        game_id: game.id,
        host: host.clone(),
        players: vec![host, member, solo],
        persona: Some(persona),
    }
}

/// A minimal proposal body.
pub fn proposal(description: &str) -> ProposeInput {
    ProposeInput {
        description: description.to_owned(),
        desired_outcome: "It works out".to_owned(),
        opening_arguments: vec!["We have prepared for this".to_owned()],
    }
}
