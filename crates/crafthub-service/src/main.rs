//! CraftHub Service - HTTP API for the Minecraft companion site
//!
//! This is the main entry point for the crafthub service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crafthub_service::poller::{spawn_status_poller, HttpStatusSource};
use crafthub_service::{create_router, AppState, ServiceConfig};
use crafthub_store::PgStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,crafthub=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CraftHub Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        mojang_configured = %config.mojang_api_url.is_some(),
        status_poller_configured = %config.status_query_url.is_some(),
        admin_api_configured = %config.admin_api_key.is_some(),
        "Service configuration loaded"
    );

    // Connect to PostgreSQL and run migrations
    tracing::info!("Connecting to PostgreSQL");
    let store = Arc::new(PgStore::connect(&config.database_url).await?);

    // Build app state
    let state = AppState::new(store.clone(), config.clone());

    // Start the status poller when a query endpoint is configured
    if let Some(url) = &config.status_query_url {
        let source = Arc::new(HttpStatusSource::new(url));
        spawn_status_poller(store, &config, source);
        tracing::info!(url = %url, "Status poller started");
    } else {
        tracing::warn!("STATUS_QUERY_URL not set - status poller disabled");
    }

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
