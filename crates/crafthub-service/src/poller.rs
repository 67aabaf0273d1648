//! The server-status poller.
//!
//! A background task queries the game server's player counts on a fixed
//! interval and replaces the single status snapshot in the store. The
//! snapshot is owned by this poller alone; everything else only reads it.
//! When a poll fails the server is recorded as offline rather than leaving
//! a stale "online" snapshot behind.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use crafthub_core::ServerStatus;
use crafthub_store::Store;

use crate::config::ServiceConfig;

/// Timeout for a single status query.
const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors a status source can report.
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The query endpoint returned a non-success status.
    #[error("status query returned {0}")]
    Api(u16),
}

/// One sample of the game server's player counts.
#[derive(Debug, Clone, Copy)]
pub struct StatusSample {
    /// Whether the server reported itself reachable.
    pub online: bool,
    /// Players connected.
    pub online_players: i32,
    /// Slot capacity.
    pub max_players: i32,
}

/// Source of live player counts.
///
/// The production source queries an HTTP status endpoint; tests substitute
/// a canned source.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Query the current player counts.
    async fn query(&self) -> Result<StatusSample, StatusError>;
}

/// Status source backed by an HTTP JSON endpoint.
///
/// Expects the common status-API shape:
/// `{"online": true, "players": {"online": 12, "max": 100}}`.
#[derive(Debug, Clone)]
pub struct HttpStatusSource {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    online: bool,
    #[serde(default)]
    players: Option<PlayersPayload>,
}

#[derive(Debug, Deserialize)]
struct PlayersPayload {
    online: i32,
    max: i32,
}

impl HttpStatusSource {
    /// Create a source querying the given URL.
    #[must_use]
    pub fn new(url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(QUERY_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            url: url.to_owned(),
        }
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn query(&self) -> Result<StatusSample, StatusError> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(StatusError::Api(response.status().as_u16()));
        }

        let payload: StatusPayload = response.json().await?;
        let (online_players, max_players) = payload
            .players
            .map_or((0, 0), |players| (players.online, players.max));

        Ok(StatusSample {
            online: payload.online,
            online_players,
            max_players,
        })
    }
}

/// Run one poll cycle: query the source and replace the snapshot.
///
/// A query failure is recorded as an offline snapshot; a store failure is
/// logged and the stale snapshot stays in place until the next tick.
pub async fn refresh_once(store: &dyn Store, server_name: &str, source: &dyn StatusSource) {
    let status = match source.query().await {
        Ok(sample) => {
            tracing::debug!(
                online = sample.online,
                online_players = sample.online_players,
                max_players = sample.max_players,
                "Server status sampled"
            );
            ServerStatus {
                server_name: server_name.to_owned(),
                online_players: sample.online_players,
                max_players: sample.max_players,
                is_online: sample.online,
                last_updated: Utc::now(),
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Status query failed - recording server as offline");
            ServerStatus::offline(server_name)
        }
    };

    if let Err(e) = store.put_status(&status).await {
        tracing::error!(error = %e, "Failed to persist server status");
    }
}

/// Spawn the polling task. The first poll runs immediately.
pub fn spawn_status_poller(
    store: Arc<dyn Store>,
    config: &ServiceConfig,
    source: Arc<dyn StatusSource>,
) -> tokio::task::JoinHandle<()> {
    let server_name = config.server_name.clone();
    let poll_interval = Duration::from_secs(config.status_poll_seconds.max(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            refresh_once(store.as_ref(), &server_name, source.as_ref()).await;
        }
    })
}
