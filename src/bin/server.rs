//! carbon_nigrani_server: REST server for the Carbon Nigrani dashboard.
//!
//! Reads config from env vars (a `.env` file is honoured):
//!   JWT_SECRET            token signing secret (required)
//!   DATABASE_URL          Postgres connection string
//!   PORT / BIND_HOST      listen address (default: 0.0.0.0:5001)
//!   FRONTEND_URL          allowed CORS origin
//!   CARBON_STOCKS_PATH    regional carbon-stock JSON
//!   EMISSION_FACTORS_PATH emission-factor CSV

use std::sync::Arc;

use anyhow::{Context, Result};
use carbon_nigrani::api::{build_router, cors_layer, AppState};
use carbon_nigrani::auth::JwtConfig;
use carbon_nigrani::config::AppConfig;
use carbon_nigrani::database::DatabaseManager;
use carbon_nigrani::emissions::{EmissionCalculator, ReferenceData};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,carbon_nigrani=debug,tower_http=debug".into()),
        )
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    config.log_summary();

    let reference = ReferenceData::load(&config.carbon_stocks_path, &config.emission_factors_path)
        .context("Failed to load reference data")?;
    let calculator = Arc::new(EmissionCalculator::new(Arc::new(reference)));

    let db = DatabaseManager::new(&config.database)
        .await
        .context("Failed to connect to database")?;

    let jwt = JwtConfig::from_secret(config.jwt_secret.as_bytes());
    let state = AppState::new(db.into_pool(), calculator, jwt);

    let app = build_router(state)
        .layer(cors_layer(config.frontend_origin.clone()))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!("carbon_nigrani_server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
