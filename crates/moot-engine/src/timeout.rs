//! Timeout worker: a single-flight recurring sweep that force-advances
//! phases whose configured deadline has silently passed.
//!
//! Argumentation and voting can be completed on a unit's behalf, so the
//! sweep synthesizes placeholder input and follows the normal success
//! paths. Proposal and narration need a human decision; the sweep only
//! notifies the host and records the stall.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use uuid::Uuid;

use moot_core::error::CoreError;
use moot_core::model::{ActionStatus, Argument, ArgumentKind, Game, GamePhase, audit_kind};
use moot_core::notify::NotificationKind;

use crate::engine::Engine;
use crate::units;

/// Default sweep interval.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Text of an argument synthesized for a silent unit.
const PLACEHOLDER_ARGUMENT: &str = "No argument was offered before the deadline.";

/// Deadline report for one game, as returned by `timeout_status`.
#[derive(Debug, Clone, Serialize)]
pub struct TimeoutStatus {
    /// The game.
    pub game_id: Uuid,
    /// Its current phase.
    pub phase: GamePhase,
    /// When the phase began.
    pub phase_started_at: Option<DateTime<Utc>>,
    /// Configured timeout for the phase, `None` when infinite/untimed.
    pub timeout_hours: Option<i64>,
    /// Absolute deadline, when one exists.
    pub deadline: Option<DateTime<Utc>>,
    /// Whether the deadline has passed.
    pub expired: bool,
}

/// Tally of one sweep.
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepOutcome {
    /// Whether the sweep was skipped because another was in flight.
    pub skipped: bool,
    /// Games inspected.
    pub games_checked: usize,
    /// Games whose phase deadline had passed and were acted on.
    pub timeouts_processed: usize,
    /// Games whose processing failed; failures never abort the sweep.
    pub failures: usize,
}

impl Engine {
    /// Reports the current phase deadline of a game.
    ///
    /// # Errors
    ///
    /// `NotFound` for an absent or soft-deleted game.
    pub async fn timeout_status(&self, game_id: Uuid) -> Result<TimeoutStatus, CoreError> {
        let game = self.load_game(game_id).await?;
        let timeout_hours = effective_timeout(&game);
        let deadline = match (game.phase_started_at, timeout_hours) {
            (Some(started), Some(hours)) => Some(started + chrono::Duration::hours(hours)),
            _ => None,
        };
        Ok(TimeoutStatus {
            game_id,
            phase: game.current_phase,
            phase_started_at: game.phase_started_at,
            timeout_hours,
            deadline,
            expired: deadline.is_some_and(|d| self.clock.now() >= d),
        })
    }

    /// Applies the timeout policy to one game. Returns the audit kind
    /// recorded when the deadline had passed and something was done.
    pub(crate) async fn sweep_game(&self, game: &Game) -> Result<Option<&'static str>, CoreError> {
        let Some(started) = game.phase_started_at else {
            return Ok(None);
        };
        let Some(hours) = effective_timeout(game) else {
            return Ok(None);
        };
        if self.clock.now() < started + chrono::Duration::hours(hours) {
            return Ok(None);
        }

        match game.current_phase {
            GamePhase::Argumentation => self.timeout_argumentation(game).await,
            GamePhase::Voting => self.timeout_voting(game).await,
            GamePhase::Proposal => {
                self.notify_stalled(game, audit_kind::PROPOSAL_TIMEOUT).await?;
                Ok(Some(audit_kind::PROPOSAL_TIMEOUT))
            }
            GamePhase::Narration => {
                self.notify_stalled(game, audit_kind::NARRATION_TIMEOUT)
                    .await?;
                Ok(Some(audit_kind::NARRATION_TIMEOUT))
            }
            GamePhase::Waiting | GamePhase::Resolution | GamePhase::RoundSummary => Ok(None),
        }
    }

    /// Argumentation deadline: synthesize a placeholder supporting
    /// argument for every acting unit that has not argued, then follow
    /// the normal advance to voting.
    async fn timeout_argumentation(
        &self,
        game: &Game,
    ) -> Result<Option<&'static str>, CoreError> {
        let Some(action_id) = game.current_action_id else {
            return Ok(None);
        };
        let action = self.load_action(action_id).await?;
        if action.status != ActionStatus::Arguing {
            return Ok(None);
        }

        let players = self.roster.players_in_game(game.id).await?;
        let arguments = self.actions.arguments_for_action(action_id).await?;
        let arguers: HashSet<Uuid> = arguments.iter().map(|a| a.player_id).collect();
        let next_sequence = i32::try_from(arguments.len()).unwrap_or(i32::MAX);

        let mut auto_argued = Vec::new();
        for (i, unit) in units::acting_units(&players).iter().enumerate() {
            if unit.iter().any(|p| arguers.contains(&p.id)) {
                continue;
            }
            let Some(rep) = units::unit_representative(unit) else {
                continue;
            };
            let argument = Argument {
                id: Uuid::new_v4(),
                action_id,
                player_id: rep.id,
                kind: ArgumentKind::For,
                content: PLACEHOLDER_ARGUMENT.to_owned(),
                sequence: next_sequence
                    .saturating_add(i32::try_from(i).unwrap_or(i32::MAX))
                    .saturating_add(1),
                is_strong: false,
                is_placeholder: true,
                created_at: self.clock.now(),
            };
            self.actions.insert_argument(&argument).await?;
            auto_argued.push(rep.id);
        }

        self.open_voting(game, &action).await?;
        self.record_audit(
            game.id,
            audit_kind::ARGUMENTATION_TIMEOUT,
            serde_json::json!({
                "action_id": action_id,
                "auto_argued": auto_argued,
            }),
        )
        .await?;
        self.notify(
            NotificationKind::PhaseTimedOut,
            game.id,
            serde_json::json!({ "phase": GamePhase::Argumentation.as_str() }),
        )
        .await;
        Ok(Some(audit_kind::ARGUMENTATION_TIMEOUT))
    }

    /// Voting deadline: synthesize Uncertain, was-skipped votes for the
    /// silent units, then follow the threshold-reached path including
    /// resolution. A race with a concurrent human resolution is settled
    /// by the resolve-once guard; losing it is a no-op.
    async fn timeout_voting(&self, game: &Game) -> Result<Option<&'static str>, CoreError> {
        let Some(action_id) = game.current_action_id else {
            return Ok(None);
        };
        let mut action = self.load_action(action_id).await?;
        if action.status != ActionStatus::Voting {
            return Ok(None);
        }

        let synthesized = self.synthesize_missing_votes(game, &action).await?;
        action.voting_skipped = true;
        self.actions.update_action(&action).await?;

        match self.resolve_action(game, &action).await {
            Ok(()) | Err(CoreError::Conflict(_)) => {}
            Err(other) => return Err(other),
        }

        self.record_audit(
            game.id,
            audit_kind::VOTING_TIMEOUT,
            serde_json::json!({
                "action_id": action_id,
                "synthesized_for": synthesized,
            }),
        )
        .await?;
        self.notify(
            NotificationKind::PhaseTimedOut,
            game.id,
            serde_json::json!({ "phase": GamePhase::Voting.as_str() }),
        )
        .await;
        Ok(Some(audit_kind::VOTING_TIMEOUT))
    }

    /// No safe auto-action exists for this phase; tell the host and
    /// leave the phase alone.
    async fn notify_stalled(&self, game: &Game, kind: &'static str) -> Result<(), CoreError> {
        self.record_audit(
            game.id,
            kind,
            serde_json::json!({ "phase": game.current_phase.as_str() }),
        )
        .await?;
        self.notify(
            NotificationKind::HostAttentionNeeded,
            game.id,
            serde_json::json!({ "phase": game.current_phase.as_str() }),
        )
        .await;
        Ok(())
    }
}

/// The configured timeout for a game's current phase; negative values
/// are treated as infinite, matching the `-1` wire convention.
fn effective_timeout(game: &Game) -> Option<i64> {
    game.settings
        .timeout_hours_for(game.current_phase)
        .filter(|h| *h >= 0)
}

/// The recurring sweep. Owns its lifecycle — start/stop/is-running —
/// and is single-flight: a sweep beginning while another runs is a
/// no-op.
pub struct TimeoutWorker {
    engine: Arc<Engine>,
    interval: Duration,
    running: AtomicBool,
    sweeping: AtomicBool,
    shutdown: tokio::sync::Notify,
    handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl TimeoutWorker {
    /// Creates a worker sweeping at the given interval.
    #[must_use]
    pub fn new(engine: Arc<Engine>, interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            engine,
            interval,
            running: AtomicBool::new(false),
            sweeping: AtomicBool::new(false),
            shutdown: tokio::sync::Notify::new(),
            handle: std::sync::Mutex::new(None),
        })
    }

    /// Creates a worker with the default 300-second interval.
    #[must_use]
    pub fn with_default_interval(engine: Arc<Engine>) -> Arc<Self> {
        Self::new(engine, DEFAULT_SWEEP_INTERVAL)
    }

    /// Whether the recurring loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Starts the recurring loop. Idempotent.
    ///
    /// # Panics
    ///
    /// Panics if the handle mutex is poisoned.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let worker = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(worker.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        worker.sweep().await;
                    }
                    () = worker.shutdown.notified() => break,
                }
            }
        });
        *self.handle.lock().expect("worker handle poisoned") = Some(handle);
        tracing::info!(interval_secs = self.interval.as_secs(), "timeout worker started");
    }

    /// Stops the recurring loop and waits for it to finish. Idempotent.
    ///
    /// # Panics
    ///
    /// Panics if the handle mutex is poisoned.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        // notify_one stores a permit, so the loop stops even if it has
        // not reached its select yet.
        self.shutdown.notify_one();
        let handle = self.handle.lock().expect("worker handle poisoned").take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        tracing::info!("timeout worker stopped");
    }

    /// Runs one sweep over every candidate game. Per-game failures are
    /// logged and counted, never propagated — one broken game must not
    /// starve the others.
    pub async fn sweep(&self) -> SweepOutcome {
        if self
            .sweeping
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return SweepOutcome {
                skipped: true,
                ..SweepOutcome::default()
            };
        }

        let outcome = self.sweep_inner().await;
        self.sweeping.store(false, Ordering::SeqCst);
        outcome
    }

    async fn sweep_inner(&self) -> SweepOutcome {
        let mut outcome = SweepOutcome::default();
        let candidates = match self.engine.games.timeout_candidates().await {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::warn!(error = %err, "timeout sweep could not load candidates");
                outcome.failures = 1;
                return outcome;
            }
        };

        for game in candidates {
            outcome.games_checked += 1;
            match self.engine.sweep_game(&game).await {
                Ok(Some(kind)) => {
                    outcome.timeouts_processed += 1;
                    tracing::info!(game_id = %game.id, kind, "phase timeout processed");
                }
                Ok(None) => {}
                Err(err) => {
                    outcome.failures += 1;
                    tracing::warn!(game_id = %game.id, error = %err, "timeout processing failed");
                }
            }
        }
        outcome
    }
}
