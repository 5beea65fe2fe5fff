//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging against a single inventory file. The workspace's main
//! `medflow-run` binary serves the same router.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use medflow_core::{inventory_from_env_value, HospitalStateStore};

/// Main entry point for the MedFlow REST API server
///
/// # Environment Variables
/// - `MEDFLOW_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `MEDFLOW_INVENTORY`: Inventory YAML file (default: built-in reference hospital)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the inventory cannot be read or fails validation,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MEDFLOW_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let inventory = inventory_from_env_value(std::env::var("MEDFLOW_INVENTORY").ok())?;
    let store = Arc::new(HospitalStateStore::new(&inventory)?);

    tracing::info!("-- Starting MedFlow REST API on {}", addr);

    let app = router(AppState::new(store));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
