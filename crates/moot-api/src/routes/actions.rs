//! Action-level routes: the lifecycle operations on one action and its
//! arguments, votes, and narration.

use axum::extract::{Path, State};
use axum::routing::{patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use moot_core::model::{Action, Argument, ArgumentKind, Narration, VoteKind};
use moot_engine::lifecycle::ProposeInput;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /games/{id}/actions.
#[derive(Debug, Deserialize)]
pub struct ProposeRequest {
    /// The caller's player id.
    pub player_id: Uuid,
    /// What the acting unit attempts.
    pub description: String,
    /// What the initiator hopes happens.
    pub desired_outcome: String,
    /// Opening supporting arguments.
    #[serde(default)]
    pub opening_arguments: Vec<String>,
}

/// Request body for POST /{id}/arguments.
#[derive(Debug, Deserialize)]
pub struct AddArgumentRequest {
    /// The caller's player id.
    pub player_id: Uuid,
    /// Stance of the argument.
    pub kind: ArgumentKind,
    /// Argument text.
    pub content: String,
}

/// Request body for POST /{id}/votes.
#[derive(Debug, Deserialize)]
pub struct SubmitVoteRequest {
    /// The caller's player id.
    pub player_id: Uuid,
    /// The voter's read on the action.
    pub kind: VoteKind,
}

/// Request body for POST /{id}/narration.
#[derive(Debug, Deserialize)]
pub struct NarrationRequest {
    /// The caller's player id.
    pub player_id: Uuid,
    /// Narrative prose.
    pub content: String,
}

/// Request body carrying just the caller.
#[derive(Debug, Deserialize)]
pub struct CallerRequest {
    /// The caller's player id.
    pub player_id: Uuid,
}

/// Request body for PATCH /{id}.
#[derive(Debug, Deserialize)]
pub struct EditActionRequest {
    /// The caller's player id (must be the host).
    pub player_id: Uuid,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement desired outcome.
    pub desired_outcome: Option<String>,
}

/// Request body for PATCH /arguments/{id} and PATCH /{id}/narration.
#[derive(Debug, Deserialize)]
pub struct EditContentRequest {
    /// The caller's player id (must be the host).
    pub player_id: Uuid,
    /// Replacement text.
    pub content: String,
}

/// Progress snapshot returned by argumentation completion.
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    /// Units done so far.
    pub units_done: usize,
    /// Units required.
    pub units_required: usize,
    /// Whether the sub-phase advanced.
    pub advanced: bool,
}

/// POST /games/{id}/actions
#[instrument(skip(state, request), fields(game_id = %game_id, player_id = %request.player_id))]
async fn propose(
    State(state): State<AppState>,
    Path(game_id): Path<Uuid>,
    Json(request): Json<ProposeRequest>,
) -> Result<Json<Action>, ApiError> {
    let action = state
        .engine
        .propose(
            game_id,
            request.player_id,
            ProposeInput {
                description: request.description,
                desired_outcome: request.desired_outcome,
                opening_arguments: request.opening_arguments,
            },
        )
        .await?;
    Ok(Json(action))
}

/// POST /{id}/arguments
#[instrument(skip(state, request), fields(action_id = %action_id))]
async fn add_argument(
    State(state): State<AppState>,
    Path(action_id): Path<Uuid>,
    Json(request): Json<AddArgumentRequest>,
) -> Result<Json<Argument>, ApiError> {
    let argument = state
        .engine
        .add_argument(action_id, request.player_id, request.kind, request.content)
        .await?;
    Ok(Json(argument))
}

/// POST /{id}/argumentation-complete
#[instrument(skip(state, request), fields(action_id = %action_id))]
async fn complete_argumentation(
    State(state): State<AppState>,
    Path(action_id): Path<Uuid>,
    Json(request): Json<CallerRequest>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let progress = state
        .engine
        .complete_argumentation(action_id, request.player_id)
        .await?;
    Ok(Json(ProgressResponse {
        units_done: progress.units_done,
        units_required: progress.units_required,
        advanced: progress.voting_opened,
    }))
}

/// POST /{id}/votes
#[instrument(skip(state, request), fields(action_id = %action_id))]
async fn submit_vote(
    State(state): State<AppState>,
    Path(action_id): Path<Uuid>,
    Json(request): Json<SubmitVoteRequest>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let progress = state
        .engine
        .submit_vote(action_id, request.player_id, request.kind)
        .await?;
    Ok(Json(ProgressResponse {
        units_done: progress.units_covered,
        units_required: progress.units_required,
        advanced: progress.resolved,
    }))
}

/// POST /{id}/resolve
#[instrument(skip(state, request), fields(action_id = %action_id))]
async fn resolve(
    State(state): State<AppState>,
    Path(action_id): Path<Uuid>,
    Json(request): Json<CallerRequest>,
) -> Result<Json<Action>, ApiError> {
    let action = state.engine.resolve(action_id, request.player_id).await?;
    Ok(Json(action))
}

/// POST /{id}/narration
#[instrument(skip(state, request), fields(action_id = %action_id))]
async fn submit_narration(
    State(state): State<AppState>,
    Path(action_id): Path<Uuid>,
    Json(request): Json<NarrationRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = state
        .engine
        .submit_narration(action_id, request.player_id, request.content)
        .await?;
    Ok(Json(serde_json::json!({
        "narration": result.narration,
        "actions_completed": result.actions_completed,
        "total_actions_required": result.total_actions_required,
        "round_completed": result.round_completed,
    })))
}

/// POST /{id}/skip-argumentation
#[instrument(skip(state, request), fields(action_id = %action_id))]
async fn skip_argumentation(
    State(state): State<AppState>,
    Path(action_id): Path<Uuid>,
    Json(request): Json<CallerRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .engine
        .skip_argumentation(action_id, request.player_id)
        .await?;
    Ok(Json(serde_json::json!({ "skipped": true })))
}

/// POST /{id}/skip-voting
#[instrument(skip(state, request), fields(action_id = %action_id))]
async fn skip_voting(
    State(state): State<AppState>,
    Path(action_id): Path<Uuid>,
    Json(request): Json<CallerRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .engine
        .skip_voting(action_id, request.player_id)
        .await?;
    Ok(Json(serde_json::json!({ "skipped": true })))
}

/// POST /{id}/arbiter-review
#[instrument(skip(state, request), fields(action_id = %action_id))]
async fn arbiter_review(
    State(state): State<AppState>,
    Path(action_id): Path<Uuid>,
    Json(request): Json<CallerRequest>,
) -> Result<Json<Action>, ApiError> {
    let action = state
        .engine
        .complete_arbiter_review(action_id, request.player_id)
        .await?;
    Ok(Json(action))
}

/// POST /arguments/{id}/strong
#[instrument(skip(state, request), fields(argument_id = %argument_id))]
async fn mark_strong(
    State(state): State<AppState>,
    Path(argument_id): Path<Uuid>,
    Json(request): Json<CallerRequest>,
) -> Result<Json<Argument>, ApiError> {
    let argument = state
        .engine
        .mark_argument_strong(argument_id, request.player_id)
        .await?;
    Ok(Json(argument))
}

/// PATCH /{id}
#[instrument(skip(state, request), fields(action_id = %action_id))]
async fn edit_action(
    State(state): State<AppState>,
    Path(action_id): Path<Uuid>,
    Json(request): Json<EditActionRequest>,
) -> Result<Json<Action>, ApiError> {
    let action = state
        .engine
        .edit_action(
            action_id,
            request.player_id,
            request.description,
            request.desired_outcome,
        )
        .await?;
    Ok(Json(action))
}

/// PATCH /arguments/{id}
#[instrument(skip(state, request), fields(argument_id = %argument_id))]
async fn edit_argument(
    State(state): State<AppState>,
    Path(argument_id): Path<Uuid>,
    Json(request): Json<EditContentRequest>,
) -> Result<Json<Argument>, ApiError> {
    let argument = state
        .engine
        .edit_argument(argument_id, request.player_id, request.content)
        .await?;
    Ok(Json(argument))
}

/// PATCH /{id}/narration
#[instrument(skip(state, request), fields(action_id = %action_id))]
async fn edit_narration(
    State(state): State<AppState>,
    Path(action_id): Path<Uuid>,
    Json(request): Json<EditContentRequest>,
) -> Result<Json<Narration>, ApiError> {
    let narration = state
        .engine
        .edit_narration(action_id, request.player_id, request.content)
        .await?;
    Ok(Json(narration))
}

/// Returns the proposal route, mounted alongside the game routes so the
/// URL reads as "create an action in this game".
pub fn propose_router() -> Router<AppState> {
    Router::new().route("/{id}/actions", post(propose))
}

/// Returns the router for action-level operations. Mounted at
/// /api/v1/actions; argument routes live under /arguments.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", patch(edit_action))
        .route("/{id}/arguments", post(add_argument))
        .route("/{id}/argumentation-complete", post(complete_argumentation))
        .route("/{id}/votes", post(submit_vote))
        .route("/{id}/resolve", post(resolve))
        .route("/{id}/narration", post(submit_narration).patch(edit_narration))
        .route("/{id}/skip-argumentation", post(skip_argumentation))
        .route("/{id}/skip-voting", post(skip_voting))
        .route("/{id}/arbiter-review", post(arbiter_review))
}

/// Returns the router for argument-level operations. Mounted at
/// /api/v1/arguments.
pub fn arguments_router() -> Router<AppState> {
    Router::new()
        .route("/{id}", patch(edit_argument))
        .route("/{id}/strong", post(mark_strong))
}
