//! Leaderboard handlers: top donors and top playtime.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crafthub_core::{DonorEntry, PlaytimeEntry};

use crate::error::ApiError;
use crate::state::AppState;

/// Rows shown on each leaderboard.
const TOPLIST_SIZE: usize = 50;

/// One donor leaderboard row.
#[derive(Debug, Serialize)]
pub struct DonorRow {
    /// Leaderboard position, starting at 1.
    pub rank: usize,
    /// The donor.
    pub username: String,
    /// Avatar, falling back to the site default for donors without a
    /// profile.
    pub avatar: String,
    /// Display rank, when the donor has a profile.
    pub rank_name: Option<String>,
    /// Lifetime donation total in integer cents.
    pub total_cents: i64,
    /// Donation total formatted for display, e.g. `$25.00`.
    pub total_formatted: String,
}

/// Donor leaderboard response.
#[derive(Debug, Serialize)]
pub struct DonorsResponse {
    /// Rows in descending order of donation total.
    pub donors: Vec<DonorRow>,
}

/// List the top donors by lifetime donation total.
pub async fn top_donors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DonorsResponse>, ApiError> {
    let entries = state.store.top_donors(TOPLIST_SIZE).await?;
    let default_avatar = state.config.default_avatar.clone();

    let donors = entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| donor_row(i + 1, entry, &default_avatar))
        .collect();

    Ok(Json(DonorsResponse { donors }))
}

fn donor_row(rank: usize, entry: DonorEntry, default_avatar: &str) -> DonorRow {
    DonorRow {
        rank,
        username: entry.username.to_string(),
        avatar: entry.avatar.unwrap_or_else(|| default_avatar.to_owned()),
        rank_name: entry.rank_name,
        total_cents: entry.total_cents,
        total_formatted: format_cents(entry.total_cents),
    }
}

/// One playtime leaderboard row.
#[derive(Debug, Serialize)]
pub struct PlaytimeRow {
    /// Leaderboard position, starting at 1.
    pub rank: usize,
    /// The player.
    pub username: String,
    /// Avatar from the profile.
    pub avatar: String,
    /// Display rank.
    pub rank_name: String,
    /// Accumulated playtime in seconds.
    pub total_playtime: i64,
    /// Playtime formatted for display, e.g. `42h 30m`.
    pub playtime_formatted: String,
    /// Whether the player is on the server right now.
    pub is_online: bool,
}

/// Playtime leaderboard response.
#[derive(Debug, Serialize)]
pub struct PlaytimeResponse {
    /// Rows in descending order of playtime.
    pub players: Vec<PlaytimeRow>,
}

/// List the players with the most accumulated playtime.
pub async fn top_playtime(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PlaytimeResponse>, ApiError> {
    let entries = state.store.top_playtime(TOPLIST_SIZE).await?;

    let players = entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| playtime_row(i + 1, entry))
        .collect();

    Ok(Json(PlaytimeResponse { players }))
}

fn playtime_row(rank: usize, entry: PlaytimeEntry) -> PlaytimeRow {
    PlaytimeRow {
        rank,
        username: entry.username.to_string(),
        avatar: entry.avatar,
        rank_name: entry.rank_name,
        total_playtime: entry.total_playtime,
        playtime_formatted: format_playtime(entry.total_playtime),
        is_online: entry.is_online,
    }
}

/// Format integer cents as a dollar amount.
fn format_cents(cents: i64) -> String {
    format!("${:.2}", cents as f64 / 100.0)
}

/// Format seconds as whole hours and minutes.
fn format_playtime(seconds: i64) -> String {
    let minutes = seconds.max(0) / 60;
    format!("{}h {}m", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cents_format_as_dollars() {
        assert_eq!(format_cents(0), "$0.00");
        assert_eq!(format_cents(5), "$0.05");
        assert_eq!(format_cents(2500), "$25.00");
        assert_eq!(format_cents(99_99), "$99.99");
    }

    #[test]
    fn playtime_formats_as_hours_and_minutes() {
        assert_eq!(format_playtime(0), "0h 0m");
        assert_eq!(format_playtime(59), "0h 0m");
        assert_eq!(format_playtime(60), "0h 1m");
        assert_eq!(format_playtime(3_600), "1h 0m");
        assert_eq!(format_playtime(153_000), "42h 30m");
        assert_eq!(format_playtime(-5), "0h 0m");
    }
}
