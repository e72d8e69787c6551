//! Narrations: the prose record that completes an action.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The narration of one resolved action. Keyed 1:1 by action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Narration {
    /// Narration identifier.
    pub id: Uuid,
    /// The action this narrates; unique.
    pub action_id: Uuid,
    /// Author.
    pub author_id: Uuid,
    /// Narrative text.
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
