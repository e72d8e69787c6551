//! Moot API server entry point.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use moot_core::clock::SystemClock;
use moot_core::notify::TracingNotifier;
use moot_core::rng::EntropySeed;
use moot_engine::Engine;
use moot_engine::timeout::{DEFAULT_SWEEP_INTERVAL, TimeoutWorker};
use moot_store::PgStore;

use moot_api::{routes, state};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Moot API server");

    // Read configuration from environment.
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| "DATABASE_URL environment variable must be set")?;
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|e| format!("PORT must be a valid u16: {e}"))?;
    let sweep_interval = std::env::var("SWEEP_INTERVAL_SECS")
        .ok()
        .map(|raw| raw.parse::<u64>())
        .transpose()
        .map_err(|e| format!("SWEEP_INTERVAL_SECS must be a valid u64: {e}"))?
        .map_or(DEFAULT_SWEEP_INTERVAL, Duration::from_secs);

    // Create database connection pool and apply the schema.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;
    let store = Arc::new(PgStore::new(pool));
    store.migrate().await?;

    // Wire the engine and its collaborators.
    let engine = Arc::new(Engine::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store,
        Arc::new(SystemClock),
        Box::new(EntropySeed),
        Arc::new(TracingNotifier),
    ));

    // Start the timeout worker.
    let worker = TimeoutWorker::new(engine.clone(), sweep_interval);
    worker.start();

    // Build router.
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app_state = state::AppState::new(engine);
    let app = Router::new()
        .merge(routes::health::router())
        .nest(
            "/api/v1/games",
            routes::games::router().merge(routes::actions::propose_router()),
        )
        .nest("/api/v1/actions", routes::actions::router())
        .nest("/api/v1/arguments", routes::actions::arguments_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| format!("invalid HOST:PORT combination: {e}"))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    worker.stop().await;
    Ok(())
}
