//! Registration and login handlers.
//!
//! These bridge two systems of record: the credential table owned by the
//! game's authentication plugin, and the site's own profile table. A
//! registration writes both; a login verifies against the first and
//! repairs the second if a past registration only got halfway.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use crafthub_core::{CredentialRecord, PlayerProfile, Username};

use crate::auth::issue_session;
use crate::crypto;
use crate::error::ApiError;
use crate::handlers::players::ProfileResponse;
use crate::state::AppState;

/// Registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Desired account name.
    pub username: String,
    /// Plaintext password; only its hash is stored.
    pub password: String,
    /// Contact address, optional.
    #[serde(default)]
    pub email: Option<String>,
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Account name.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// When the token expires.
    pub expires_at: String,
    /// The profile the session is bound to.
    pub profile: ProfileResponse,
}

/// Register a new player.
///
/// Responds with the created profile. Registration is sessionless: the new
/// player logs in afterwards like everyone else.
pub async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>), ApiError> {
    let username = Username::parse(&body.username)?;

    if !crypto::acceptable_password(&body.password) {
        return Err(ApiError::Validation(format!(
            "password must be {} to {} characters",
            crypto::MIN_PASSWORD_LEN,
            crypto::MAX_PASSWORD_LEN
        )));
    }

    // An empty address is the same as none at all
    let email = body
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_owned);
    if let Some(addr) = &email {
        if !looks_like_email(addr) {
            return Err(ApiError::Validation("email address is not valid".into()));
        }
    }

    // Friendly fast path; the insert below is what actually guarantees
    // uniqueness under concurrent registration.
    if state.store.credential(&username).await?.is_some() {
        return Err(ApiError::Conflict("username is already registered".into()));
    }

    let password_hash = crypto::hash_password(&body.password).map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        ApiError::Internal("password hashing failed".into())
    })?;

    let credential = CredentialRecord::new(
        username.clone(),
        password_hash,
        email.clone(),
        client_ip(&headers),
    );
    state.store.insert_credential(&credential).await?;

    let avatar = state.resolve_avatar(&username).await;
    let profile = PlayerProfile::new(username.clone(), email, avatar);
    if let Err(e) = state.store.upsert_profile(&profile).await {
        // The credential row is in; the login repair path finishes the job.
        tracing::warn!(
            username = %username,
            error = %e,
            "Profile write failed after credential insert - will repair on next login"
        );
        return Err(e.into());
    }

    tracing::info!(username = %username, "Player registered");

    Ok((StatusCode::CREATED, Json(ProfileResponse::from(profile))))
}

/// Log a player in and mint a session token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    // A name that cannot pass registration cannot have an account, so the
    // response is the same as for any other unknown name.
    let Ok(username) = Username::parse(&body.username) else {
        return Err(ApiError::InvalidCredentials);
    };

    let Some(credential) = state.store.credential(&username).await? else {
        tracing::debug!(username = %username, "Login failed: unknown username");
        return Err(ApiError::InvalidCredentials);
    };

    if !crypto::verify_password(&body.password, &credential.password) {
        tracing::debug!(username = %username, "Login failed: wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    // Repair path: a registration that wrote the credential but not the
    // profile leaves this login to finish the job.
    let mut profile = match state.store.profile(&username).await? {
        Some(profile) => profile,
        None => {
            let avatar = state.resolve_avatar(&username).await;
            let profile = PlayerProfile::new(username.clone(), credential.email.clone(), avatar);
            state.store.upsert_profile(&profile).await?;
            tracing::info!(username = %username, "Repaired missing profile on login");
            profile
        }
    };

    state.store.touch_last_online(&username).await?;
    // Keep the returned profile in step with the touch
    profile.last_online = chrono::Utc::now();

    let session = issue_session(&username, &state.config)?;

    tracing::info!(username = %username, "Player logged in");

    Ok(Json(SessionResponse {
        token: session.token,
        expires_at: session.expires_at.to_rfc3339(),
        profile: ProfileResponse::from(profile),
    }))
}

/// Minimal shape check for contact addresses.
fn looks_like_email(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Client address as reported by the reverse proxy, if any.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = forwarded.split(',').next()?.trim();
    if first.is_empty() {
        None
    } else {
        Some(first.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_check() {
        assert!(looks_like_email("steve@example.com"));
        assert!(looks_like_email("a.b+tag@mail.example.org"));
        assert!(!looks_like_email("no-at-sign"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("steve@nodot"));
        assert!(!looks_like_email("steve@.com"));
        assert!(!looks_like_email("steve@com."));
    }

    #[test]
    fn client_ip_takes_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.9, 10.0.0.1".parse().unwrap(),
        );
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.9"));

        assert!(client_ip(&HeaderMap::new()).is_none());
    }
}
