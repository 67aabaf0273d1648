//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, auth, health, market, news, players, server, toplist};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `POST /v1/auth/register` - Register a new player account
/// - `POST /v1/auth/login` - Log in, returns a session token
/// - `GET /v1/players/:username` - Public player profile
/// - `GET /v1/market/items` - Shop catalog
/// - `GET /v1/news` - Paginated news listing
/// - `GET /v1/news/featured` - Featured posts for the landing page
/// - `GET /v1/toplist/donors` - Donor leaderboard
/// - `GET /v1/toplist/playtime` - Playtime leaderboard
/// - `GET /v1/server/status` - Latest game-server status snapshot
///
/// ## Players (session token auth)
/// - `GET /v1/players/me` - The caller's own profile
/// - `POST /v1/market/purchase` - Buy a catalog item
/// - `GET /v1/market/purchases` - The caller's purchase history
///
/// ## Admin (API key auth)
/// - `POST /v1/admin/grant` - Credit a player balance
/// - `POST /v1/admin/donations` - Record a donation
/// - `POST /v1/admin/news` - Publish a news post
/// - `POST /v1/admin/items` - Add a catalog item
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    Router::new()
        // Health (public)
        .route("/health", get(health::health))
        // Auth bridge
        .route("/v1/auth/register", post(auth::register))
        .route("/v1/auth/login", post(auth::login))
        // Players
        .route("/v1/players/me", get(players::get_me))
        .route("/v1/players/:username", get(players::get_player))
        // Market
        .route("/v1/market/items", get(market::list_items))
        .route("/v1/market/purchase", post(market::purchase))
        .route("/v1/market/purchases", get(market::list_purchases))
        // News
        .route("/v1/news", get(news::list_news))
        .route("/v1/news/featured", get(news::featured_news))
        // Toplists
        .route("/v1/toplist/donors", get(toplist::top_donors))
        .route("/v1/toplist/playtime", get(toplist::top_playtime))
        // Server status
        .route("/v1/server/status", get(server::get_status))
        // Admin
        .route("/v1/admin/grant", post(admin::grant))
        .route("/v1/admin/donations", post(admin::record_donation))
        .route("/v1/admin/news", post(admin::create_news))
        .route("/v1/admin/items", post(admin::create_item))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
