use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use medflow_core::{inventory_from_env_value, HospitalStateStore};

/// Main entry point for the MedFlow application
///
/// Loads the hospital inventory once, fails fast if it is invalid, and serves the REST API
/// over a single process-wide hospital state store.
///
/// # Environment Variables
/// - `MEDFLOW_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `MEDFLOW_INVENTORY`: Inventory YAML file (default: built-in reference hospital)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If the inventory is invalid or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medflow=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("MEDFLOW_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let inventory = inventory_from_env_value(std::env::var("MEDFLOW_INVENTORY").ok())?;
    let store = Arc::new(HospitalStateStore::new(&inventory)?);

    tracing::info!("++ Starting MedFlow REST on {}", rest_addr);

    let rest_app = router(AppState::new(store));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, rest_app).await?;

    Ok(())
}
