//! Outbound notification port.
//!
//! Delivery is best-effort: the engine never awaits a notification for
//! correctness, failures are logged by the implementation and never
//! surfaced to the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of notifications the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// The game has started; round one is open for proposals.
    GameStarted,
    /// A new action has been proposed.
    ActionProposed,
    /// Argumentation on the current action is complete; voting is open.
    VotingOpened,
    /// The current action has been resolved.
    ActionResolved,
    /// A narration was submitted; the action is complete.
    NarrationSubmitted,
    /// All actions in the round are complete.
    RoundCompleted,
    /// A timed phase was force-advanced by the timeout sweep.
    PhaseTimedOut,
    /// A stalled phase needs a human decision from the host.
    HostAttentionNeeded,
}

/// Fire-and-forget notification port.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers a notification. Implementations swallow and log their own
    /// failures; callers ignore the outcome entirely.
    async fn notify(&self, kind: NotificationKind, game_id: Uuid, payload: serde_json::Value);
}

/// Notifier that writes notifications to the tracing log. Stands in for a
/// real delivery channel in deployments that have none configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, kind: NotificationKind, game_id: Uuid, payload: serde_json::Value) {
        tracing::info!(?kind, %game_id, %payload, "notification");
    }
}
