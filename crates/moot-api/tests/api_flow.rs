//! Integration tests for the HTTP transport over the in-memory store.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::{build_test_app, get_json, post_json};

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_app();
    let (status, body) = get_json(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

/// Drives one full action through the transport: create, join, start,
/// propose, argue, vote, narrate.
#[tokio::test]
async fn test_full_action_round_trip() {
    let app = build_test_app();

    // Create a game.
    let (status, created) = post_json(
        app.clone(),
        "/api/v1/games",
        &json!({
            "name": "Border Crisis",
            "host_user_id": Uuid::new_v4(),
            "settings": { "argumentation_timeout_hours": -1 }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let game_id = created["game"]["id"].as_str().unwrap().to_owned();
    let host_id = created["host"]["id"].as_str().unwrap().to_owned();

    // A second player joins and the host starts the game.
    let (status, second) = post_json(
        app.clone(),
        &format!("/api/v1/games/{game_id}/join"),
        &json!({ "user_id": Uuid::new_v4() }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let second_id = second["id"].as_str().unwrap().to_owned();

    let (status, started) = post_json(
        app.clone(),
        &format!("/api/v1/games/{game_id}/start"),
        &json!({ "player_id": host_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["current_phase"], "proposal");

    // The host proposes.
    let (status, action) = post_json(
        app.clone(),
        &format!("/api/v1/games/{game_id}/actions"),
        &json!({
            "player_id": host_id,
            "description": "Cross the river at night",
            "desired_outcome": "Reach the far bank unseen",
            "opening_arguments": ["The moon is new"]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let action_id = action["id"].as_str().unwrap().to_owned();
    assert_eq!(action["status"], "arguing");

    // Both units finish arguing.
    let (status, progress) = post_json(
        app.clone(),
        &format!("/api/v1/actions/{action_id}/argumentation-complete"),
        &json!({ "player_id": host_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["advanced"], false);

    let (status, progress) = post_json(
        app.clone(),
        &format!("/api/v1/actions/{action_id}/argumentation-complete"),
        &json!({ "player_id": second_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["advanced"], true);

    // Both vote; the second vote triggers resolution.
    let (status, _) = post_json(
        app.clone(),
        &format!("/api/v1/actions/{action_id}/votes"),
        &json!({ "player_id": host_id, "kind": "likely_success" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, progress) = post_json(
        app.clone(),
        &format!("/api/v1/actions/{action_id}/votes"),
        &json!({ "player_id": second_id, "kind": "likely_success" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["advanced"], true);

    // The initiator narrates; one of two actions is done.
    let (status, result) = post_json(
        app.clone(),
        &format!("/api/v1/actions/{action_id}/narration"),
        &json!({ "player_id": host_id, "content": "They slipped across unseen." }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["actions_completed"], 1);
    assert_eq!(result["total_actions_required"], 2);
    assert_eq!(result["round_completed"], false);

    // The deadline report is live.
    let (status, timeout) = get_json(app, &format!("/api/v1/games/{game_id}/timeout")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(timeout["phase"], "proposal");
    assert_eq!(timeout["expired"], false);
}

#[tokio::test]
async fn test_duplicate_vote_maps_to_409() {
    let app = build_test_app();

    let (_, created) = post_json(
        app.clone(),
        "/api/v1/games",
        &json!({ "name": "Quick", "host_user_id": Uuid::new_v4() }),
    )
    .await;
    let game_id = created["game"]["id"].as_str().unwrap().to_owned();
    let host_id = created["host"]["id"].as_str().unwrap().to_owned();
    let (_, second) = post_json(
        app.clone(),
        &format!("/api/v1/games/{game_id}/join"),
        &json!({ "user_id": Uuid::new_v4() }),
    )
    .await;
    let second_id = second["id"].as_str().unwrap().to_owned();
    post_json(
        app.clone(),
        &format!("/api/v1/games/{game_id}/start"),
        &json!({ "player_id": host_id }),
    )
    .await;
    let (_, action) = post_json(
        app.clone(),
        &format!("/api/v1/games/{game_id}/actions"),
        &json!({
            "player_id": host_id,
            "description": "Dig in",
            "desired_outcome": "Hold the line"
        }),
    )
    .await;
    let action_id = action["id"].as_str().unwrap().to_owned();
    post_json(
        app.clone(),
        &format!("/api/v1/actions/{action_id}/argumentation-complete"),
        &json!({ "player_id": host_id }),
    )
    .await;
    post_json(
        app.clone(),
        &format!("/api/v1/actions/{action_id}/argumentation-complete"),
        &json!({ "player_id": second_id }),
    )
    .await;

    let (status, _) = post_json(
        app.clone(),
        &format!("/api/v1/actions/{action_id}/votes"),
        &json!({ "player_id": host_id, "kind": "uncertain" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(
        app,
        &format!("/api/v1/actions/{action_id}/votes"),
        &json!({ "player_id": host_id, "kind": "uncertain" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_phase_violation_maps_to_422() {
    let app = build_test_app();

    let (_, created) = post_json(
        app.clone(),
        "/api/v1/games",
        &json!({ "name": "Lobbyists", "host_user_id": Uuid::new_v4() }),
    )
    .await;
    let game_id = created["game"]["id"].as_str().unwrap().to_owned();
    let host_id = created["host"]["id"].as_str().unwrap().to_owned();

    // Proposing before the game starts is an invalid state.
    let (status, body) = post_json(
        app.clone(),
        &format!("/api/v1/games/{game_id}/actions"),
        &json!({
            "player_id": host_id,
            "description": "Jump the gun",
            "desired_outcome": "Chaos"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_state");

    // So is a transition that skips a phase.
    let (status, body) = post_json(
        app,
        &format!("/api/v1/games/{game_id}/transition"),
        &json!({ "player_id": host_id, "to": "voting" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_state");
}

#[tokio::test]
async fn test_non_host_override_maps_to_403() {
    let app = build_test_app();

    let (_, created) = post_json(
        app.clone(),
        "/api/v1/games",
        &json!({ "name": "Coup", "host_user_id": Uuid::new_v4() }),
    )
    .await;
    let game_id = created["game"]["id"].as_str().unwrap().to_owned();
    let host_id = created["host"]["id"].as_str().unwrap().to_owned();
    let (_, second) = post_json(
        app.clone(),
        &format!("/api/v1/games/{game_id}/join"),
        &json!({ "user_id": Uuid::new_v4() }),
    )
    .await;
    let second_id = second["id"].as_str().unwrap().to_owned();
    post_json(
        app.clone(),
        &format!("/api/v1/games/{game_id}/start"),
        &json!({ "player_id": host_id }),
    )
    .await;
    let (_, action) = post_json(
        app.clone(),
        &format!("/api/v1/games/{game_id}/actions"),
        &json!({
            "player_id": host_id,
            "description": "March",
            "desired_outcome": "Glory"
        }),
    )
    .await;
    let action_id = action["id"].as_str().unwrap().to_owned();

    let (status, body) = post_json(
        app,
        &format!("/api/v1/actions/{action_id}/skip-argumentation"),
        &json!({ "player_id": second_id }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "permission_denied");
}

#[tokio::test]
async fn test_unknown_game_maps_to_404() {
    let app = build_test_app();
    let (status, body) = get_json(
        app,
        &format!("/api/v1/games/{}/timeout", Uuid::new_v4()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}
