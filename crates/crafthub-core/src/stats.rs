//! Server statistics and leaderboard rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::Username;

/// Point-in-time game-server statistics.
///
/// A single versioned snapshot, written only by the status poller and read
/// by everything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStatus {
    /// Display name of the game server.
    pub server_name: String,

    /// Players connected at poll time.
    pub online_players: i32,

    /// Slot capacity reported by the server.
    pub max_players: i32,

    /// Whether the server answered the poll.
    pub is_online: bool,

    /// When the snapshot was taken.
    pub last_updated: DateTime<Utc>,
}

impl ServerStatus {
    /// Snapshot reported before the poller has ever run, or when it is
    /// disabled: offline, zero players, zero capacity.
    #[must_use]
    pub fn offline(server_name: &str) -> Self {
        Self {
            server_name: server_name.to_owned(),
            online_players: 0,
            max_players: 0,
            is_online: false,
            last_updated: Utc::now(),
        }
    }
}

/// One row of the donor leaderboard: donation total grouped by player.
///
/// Profile fields are optional because a donation can be recorded for a
/// player who never registered on the site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonorEntry {
    /// The donor.
    pub username: Username,

    /// Avatar from the profile, when one exists.
    pub avatar: Option<String>,

    /// Rank from the profile, when one exists.
    pub rank_name: Option<String>,

    /// Lifetime donation total in integer cents.
    pub total_cents: i64,
}

/// One row of the playtime leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaytimeEntry {
    /// The player.
    pub username: Username,

    /// Avatar from the profile.
    pub avatar: String,

    /// Display rank.
    pub rank_name: String,

    /// Accumulated playtime in seconds.
    pub total_playtime: i64,

    /// Whether the player is on the server right now.
    pub is_online: bool,
}
