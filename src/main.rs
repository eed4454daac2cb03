//! Savings Ledger - Main Application Entry Point
//!
//! A REST API server for a personal finance ledger: one wallet per user and
//! any number of savings goals, optionally locked until a date, with
//! transfers between them.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: API key with SHA-256 hashing
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Build the ledger service and HTTP router
//! 5. Start server on configured port

use axum::{
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use savings_ledger::{
    Ledger, config, db, middleware,
    routes::{self, AppState},
    store::PgStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let ledger = Ledger::new(PgStore::new(pool.clone()), config.ledger_settings());
    let state = AppState::new(ledger);

    // Every ledger route requires an API key
    let authenticated_routes = routes::api_router(state.clone()).route_layer(
        axum_middleware::from_fn_with_state(pool.clone(), middleware::auth::auth_middleware),
    );

    let mut app = routes::public_router(state)
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http());

    if let Some(origin) = &config.cors_origin {
        let cors = CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true);
        app = app.layer(cors);
        tracing::info!(%origin, "CORS enabled");
    }

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
