//! Game-server status handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crafthub_core::ServerStatus;

use crate::error::ApiError;
use crate::state::AppState;

/// Status snapshot as served to the site.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Display name of the game server.
    pub server_name: String,
    /// Players connected at poll time.
    pub online_players: i32,
    /// Slot capacity reported by the server.
    pub max_players: i32,
    /// Whether the server answered the last poll.
    pub is_online: bool,
    /// When the snapshot was taken.
    pub last_updated: String,
}

impl From<ServerStatus> for StatusResponse {
    fn from(status: ServerStatus) -> Self {
        Self {
            server_name: status.server_name,
            online_players: status.online_players,
            max_players: status.max_players,
            is_online: status.is_online,
            last_updated: status.last_updated.to_rfc3339(),
        }
    }
}

/// Return the latest polled snapshot, or an offline placeholder when the
/// poller has never written one.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, ApiError> {
    let status = state
        .store
        .latest_status()
        .await?
        .unwrap_or_else(|| ServerStatus::offline(&state.config.server_name));

    Ok(Json(StatusResponse::from(status)))
}
