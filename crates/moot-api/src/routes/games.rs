//! Game-level routes: lifecycle, roster, rounds, and timeouts.
//!
//! Every mutating request carries the caller's resolved player id;
//! session resolution happens upstream of this service.

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use moot_core::model::{
    Game, GamePhase, GameSettings, NarrationMode, Persona, PersonaSharing, Player, Round,
};
use moot_engine::timeout::TimeoutStatus;

use crate::error::ApiError;
use crate::state::AppState;

/// Game settings as they appear on the wire. Timeout fields accept `-1`
/// for "infinite", which normalizes to no deadline.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsBody {
    /// Per-unit argument cap.
    pub argument_limit: Option<u32>,
    /// Proposal timeout in hours, `-1` = infinite.
    pub proposal_timeout_hours: Option<i64>,
    /// Argumentation timeout in hours, `-1` = infinite.
    pub argumentation_timeout_hours: Option<i64>,
    /// Voting timeout in hours, `-1` = infinite.
    pub voting_timeout_hours: Option<i64>,
    /// Narration timeout in hours, `-1` = infinite.
    pub narration_timeout_hours: Option<i64>,
    /// Resolution strategy id.
    pub resolution_method: Option<String>,
    /// Persona-sharing configuration.
    pub persona_sharing: Option<PersonaSharing>,
    /// Narration permission mode.
    pub narration_mode: Option<NarrationMode>,
}

impl SettingsBody {
    fn into_settings(self) -> GameSettings {
        let defaults = GameSettings::default();
        GameSettings {
            argument_limit: self.argument_limit.unwrap_or(defaults.argument_limit),
            proposal_timeout_hours: wire_hours(self.proposal_timeout_hours),
            argumentation_timeout_hours: wire_hours(self.argumentation_timeout_hours),
            voting_timeout_hours: wire_hours(self.voting_timeout_hours),
            narration_timeout_hours: wire_hours(self.narration_timeout_hours),
            resolution_method: self
                .resolution_method
                .unwrap_or(defaults.resolution_method),
            persona_sharing: self.persona_sharing.unwrap_or(defaults.persona_sharing),
            narration_mode: self.narration_mode.unwrap_or(defaults.narration_mode),
        }
    }
}

/// Normalizes wire timeout hours: `-1` (or any negative) means infinite.
fn wire_hours(hours: Option<i64>) -> Option<i64> {
    hours.filter(|h| *h >= 0)
}

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    /// Display name.
    pub name: String,
    /// The creating user; becomes the host.
    pub host_user_id: Uuid,
    /// Optional settings overrides.
    #[serde(default)]
    pub settings: SettingsBody,
}

/// Response body for game creation.
#[derive(Debug, Serialize)]
pub struct CreateGameResponse {
    /// The created game.
    pub game: Game,
    /// The host's player seat.
    pub host: Player,
}

/// Request body for POST /{id}/join.
#[derive(Debug, Deserialize)]
pub struct JoinGameRequest {
    /// The joining user.
    pub user_id: Uuid,
    /// Persona to claim on entry.
    pub persona_id: Option<Uuid>,
}

/// Request body carrying just the caller.
#[derive(Debug, Deserialize)]
pub struct CallerRequest {
    /// The caller's player id.
    pub player_id: Uuid,
}

/// Request body for POST /{id}/personas.
#[derive(Debug, Deserialize)]
pub struct CreatePersonaRequest {
    /// The caller's player id (must be the host).
    pub player_id: Uuid,
    /// Persona name.
    pub name: String,
    /// Whether the persona is the scripted NPC.
    #[serde(default)]
    pub is_npc: bool,
    /// Scripted action text for NPC personas.
    pub scripted_action: Option<String>,
    /// Scripted outcome text for NPC personas.
    pub scripted_outcome: Option<String>,
}

/// Request body for POST /{id}/claim-persona.
#[derive(Debug, Deserialize)]
pub struct ClaimPersonaRequest {
    /// The caller's player id.
    pub player_id: Uuid,
    /// The persona to claim.
    pub persona_id: Uuid,
}

/// Request body for POST /{id}/arbiter.
#[derive(Debug, Deserialize)]
pub struct AssignArbiterRequest {
    /// The caller's player id (must be the host).
    pub player_id: Uuid,
    /// The seat receiving (or losing) the role.
    pub target_player_id: Uuid,
    /// Grant or revoke.
    pub is_arbiter: bool,
}

/// Request body for POST /{id}/round-summary.
#[derive(Debug, Deserialize)]
pub struct RoundSummaryRequest {
    /// The caller's player id (must be the host).
    pub player_id: Uuid,
    /// Summary prose.
    pub content: String,
}

/// Request body for POST /{id}/transition.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    /// The caller's player id (must be the host).
    pub player_id: Uuid,
    /// Target phase; validated against the fixed transition table.
    pub to: GamePhase,
}

/// POST /
#[instrument(skip(state, request), fields(name = %request.name))]
async fn create_game(
    State(state): State<AppState>,
    Json(request): Json<CreateGameRequest>,
) -> Result<Json<CreateGameResponse>, ApiError> {
    let (game, host) = state
        .engine
        .create_game(
            request.name,
            request.settings.into_settings(),
            request.host_user_id,
        )
        .await?;
    info!(game_id = %game.id, "game created");
    Ok(Json(CreateGameResponse { game, host }))
}

/// POST /{id}/join
#[instrument(skip(state, request), fields(game_id = %game_id))]
async fn join_game(
    State(state): State<AppState>,
    Path(game_id): Path<Uuid>,
    Json(request): Json<JoinGameRequest>,
) -> Result<Json<Player>, ApiError> {
    let player = state
        .engine
        .join_game(game_id, request.user_id, request.persona_id)
        .await?;
    Ok(Json(player))
}

/// POST /{id}/leave
#[instrument(skip(state, request), fields(game_id = %game_id))]
async fn leave_game(
    State(state): State<AppState>,
    Path(game_id): Path<Uuid>,
    Json(request): Json<CallerRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.engine.leave_game(game_id, request.player_id).await?;
    Ok(Json(serde_json::json!({ "left": true })))
}

/// POST /{id}/rejoin
#[instrument(skip(state, request), fields(game_id = %game_id))]
async fn rejoin_game(
    State(state): State<AppState>,
    Path(game_id): Path<Uuid>,
    Json(request): Json<CallerRequest>,
) -> Result<Json<Player>, ApiError> {
    let player = state.engine.rejoin_game(game_id, request.player_id).await?;
    Ok(Json(player))
}

/// POST /{id}/start
#[instrument(skip(state, request), fields(game_id = %game_id))]
async fn start_game(
    State(state): State<AppState>,
    Path(game_id): Path<Uuid>,
    Json(request): Json<CallerRequest>,
) -> Result<Json<Game>, ApiError> {
    let game = state.engine.start_game(game_id, request.player_id).await?;
    info!(game_id = %game.id, "game started");
    Ok(Json(game))
}

/// POST /{id}/complete
#[instrument(skip(state, request), fields(game_id = %game_id))]
async fn complete_game(
    State(state): State<AppState>,
    Path(game_id): Path<Uuid>,
    Json(request): Json<CallerRequest>,
) -> Result<Json<Game>, ApiError> {
    let game = state
        .engine
        .complete_game(game_id, request.player_id)
        .await?;
    Ok(Json(game))
}

/// DELETE /{id}
#[instrument(skip(state, request), fields(game_id = %game_id))]
async fn delete_game(
    State(state): State<AppState>,
    Path(game_id): Path<Uuid>,
    Json(request): Json<CallerRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.engine.delete_game(game_id, request.player_id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// POST /{id}/personas
#[instrument(skip(state, request), fields(game_id = %game_id))]
async fn create_persona(
    State(state): State<AppState>,
    Path(game_id): Path<Uuid>,
    Json(request): Json<CreatePersonaRequest>,
) -> Result<Json<Persona>, ApiError> {
    let persona = state
        .engine
        .create_persona(
            game_id,
            request.player_id,
            request.name,
            request.is_npc,
            request.scripted_action,
            request.scripted_outcome,
        )
        .await?;
    Ok(Json(persona))
}

/// POST /{id}/claim-persona
#[instrument(skip(state, request), fields(game_id = %game_id))]
async fn claim_persona(
    State(state): State<AppState>,
    Path(game_id): Path<Uuid>,
    Json(request): Json<ClaimPersonaRequest>,
) -> Result<Json<Player>, ApiError> {
    let player = state
        .engine
        .claim_persona(game_id, request.player_id, request.persona_id)
        .await?;
    Ok(Json(player))
}

/// POST /{id}/arbiter
#[instrument(skip(state, request), fields(game_id = %game_id))]
async fn assign_arbiter(
    State(state): State<AppState>,
    Path(game_id): Path<Uuid>,
    Json(request): Json<AssignArbiterRequest>,
) -> Result<Json<Player>, ApiError> {
    let player = state
        .engine
        .assign_arbiter(
            game_id,
            request.player_id,
            request.target_player_id,
            request.is_arbiter,
        )
        .await?;
    Ok(Json(player))
}

/// POST /{id}/round-summary
#[instrument(skip(state, request), fields(game_id = %game_id))]
async fn round_summary(
    State(state): State<AppState>,
    Path(game_id): Path<Uuid>,
    Json(request): Json<RoundSummaryRequest>,
) -> Result<Json<Round>, ApiError> {
    let round = state
        .engine
        .submit_round_summary(game_id, request.player_id, request.content)
        .await?;
    Ok(Json(round))
}

/// POST /{id}/skip-to-next-action
#[instrument(skip(state, request), fields(game_id = %game_id))]
async fn skip_to_next_action(
    State(state): State<AppState>,
    Path(game_id): Path<Uuid>,
    Json(request): Json<CallerRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .engine
        .skip_to_next_action(game_id, request.player_id)
        .await?;
    Ok(Json(serde_json::json!({ "round_forced": true })))
}

/// POST /{id}/transition
#[instrument(skip(state, request), fields(game_id = %game_id))]
async fn transition(
    State(state): State<AppState>,
    Path(game_id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<Game>, ApiError> {
    let game = state
        .engine
        .host_transition_phase(game_id, request.player_id, request.to)
        .await?;
    Ok(Json(game))
}

/// GET /{id}/timeout
#[instrument(skip(state), fields(game_id = %game_id))]
async fn timeout_status(
    State(state): State<AppState>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<TimeoutStatus>, ApiError> {
    let status = state.engine.timeout_status(game_id).await?;
    Ok(Json(status))
}

/// Returns the router for game-level operations.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_game))
        .route("/{id}", delete(delete_game))
        .route("/{id}/join", post(join_game))
        .route("/{id}/leave", post(leave_game))
        .route("/{id}/rejoin", post(rejoin_game))
        .route("/{id}/start", post(start_game))
        .route("/{id}/complete", post(complete_game))
        .route("/{id}/personas", post(create_persona))
        .route("/{id}/claim-persona", post(claim_persona))
        .route("/{id}/arbiter", post(assign_arbiter))
        .route("/{id}/round-summary", post(round_summary))
        .route("/{id}/skip-to-next-action", post(skip_to_next_action))
        .route("/{id}/transition", post(transition))
        .route("/{id}/timeout", get(timeout_status))
}
