//! Player profile handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crafthub_core::{CredentialRecord, PlayerProfile, Username};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// The caller's own profile, including contact details.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// Account name.
    pub username: String,
    /// Contact address, if one was given at registration.
    pub email: Option<String>,
    /// Avatar URL or site-relative path.
    pub avatar: String,
    /// Primary balance.
    pub coins: i64,
    /// Secondary balance.
    pub tokens: i64,
    /// Display rank.
    pub rank_name: String,
    /// Profile creation time.
    pub join_date: String,
    /// Last site login.
    pub last_online: String,
    /// Accumulated in-game playtime in seconds.
    pub total_playtime: i64,
    /// Whether the player is on the game server right now.
    pub is_online: bool,
}

impl From<PlayerProfile> for ProfileResponse {
    fn from(profile: PlayerProfile) -> Self {
        Self {
            username: profile.username.to_string(),
            email: profile.email,
            avatar: profile.avatar,
            coins: profile.coins,
            tokens: profile.tokens,
            rank_name: profile.rank_name,
            join_date: profile.join_date.to_rfc3339(),
            last_online: profile.last_online.to_rfc3339(),
            total_playtime: profile.total_playtime,
            is_online: profile.is_online,
        }
    }
}

/// A profile as anyone may see it. No contact details.
#[derive(Debug, Serialize)]
pub struct PlayerView {
    /// Account name.
    pub username: String,
    /// Avatar URL or site-relative path.
    pub avatar: String,
    /// Display rank.
    pub rank_name: String,
    /// Profile creation time.
    pub join_date: String,
    /// Last in-game login, as recorded by the auth plugin. `None` for
    /// players who have never joined the game since registering.
    pub last_login_at: Option<String>,
    /// Accumulated in-game playtime in seconds.
    pub total_playtime: i64,
    /// Whether the player is on the game server right now.
    pub is_online: bool,
}

impl PlayerView {
    fn new(profile: PlayerProfile, credential: &CredentialRecord) -> Self {
        Self {
            username: profile.username.to_string(),
            avatar: profile.avatar,
            rank_name: profile.rank_name,
            join_date: profile.join_date.to_rfc3339(),
            last_login_at: credential.last_login_at().map(|t| t.to_rfc3339()),
            total_playtime: profile.total_playtime,
            is_online: profile.is_online,
        }
    }
}

/// Return the authenticated caller's profile.
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state.store.profile(&auth.username).await?.ok_or_else(|| {
        // A session guarantees a profile exists; login repairs missing ones.
        tracing::error!(username = %auth.username, "Authenticated player has no profile");
        ApiError::Internal("profile missing for authenticated player".into())
    })?;

    Ok(Json(ProfileResponse::from(profile)))
}

/// Return the public view of any player's profile.
///
/// Joins the profile with the registration metadata the auth plugin keeps.
pub async fn get_player(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<PlayerView>, ApiError> {
    let username = Username::parse(&username)?;

    let credential = state
        .store
        .credential(&username)
        .await?
        .ok_or_else(|| ApiError::NotFound("player not found".into()))?;
    let profile = state
        .store
        .profile(&username)
        .await?
        .ok_or_else(|| ApiError::NotFound("player not found".into()))?;

    Ok(Json(PlayerView::new(profile, &credential)))
}
