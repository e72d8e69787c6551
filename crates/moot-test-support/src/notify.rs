//! Test notifier — records every notification for assertions.

use std::sync::Mutex;

use async_trait::async_trait;
use moot_core::notify::{NotificationKind, Notifier};
use uuid::Uuid;

/// A notifier that records every delivery.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(NotificationKind, Uuid, serde_json::Value)>>,
}

impl RecordingNotifier {
    /// Creates an empty recording notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded notifications.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn sent(&self) -> Vec<(NotificationKind, Uuid, serde_json::Value)> {
        self.sent.lock().unwrap().clone()
    }

    /// Returns the kinds recorded so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.sent.lock().unwrap().iter().map(|(k, _, _)| *k).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, kind: NotificationKind, game_id: Uuid, payload: serde_json::Value) {
        self.sent.lock().unwrap().push((kind, game_id, payload));
    }
}
