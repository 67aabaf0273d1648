//! Authentication middleware and extractors.
//!
//! This module provides:
//! - Session token minting and validation (HS256, signed with the
//!   service's own secret)
//! - `AuthUser` - player authentication via the session token
//! - `AdminAuth` - admin authentication for operator endpoints

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crafthub_core::Username;

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::state::AppState;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the account name the session is bound to.
    pub sub: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiration time (unix seconds).
    pub exp: i64,
}

/// A freshly minted session.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Signed bearer token.
    pub token: String,
    /// When the token stops being accepted.
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

/// Mint a session token bound to `username`.
///
/// # Errors
///
/// Returns `ApiError::Internal` if signing fails, which cannot be caused by
/// user input.
pub fn issue_session(
    username: &Username,
    config: &ServiceConfig,
) -> Result<IssuedSession, ApiError> {
    let now = chrono::Utc::now();
    let expires_at = now + chrono::Duration::hours(config.session_ttl_hours);
    let claims = SessionClaims {
        sub: username.as_str().to_owned(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.session_secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to sign session token");
        ApiError::Internal("failed to issue session".into())
    })?;

    Ok(IssuedSession { token, expires_at })
}

/// Validate a session token and return its claims.
fn verify_session(token: &str, secret: &str) -> Result<SessionClaims, ApiError> {
    let validation = Validation::new(Algorithm::HS256);

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "Session token validation failed");
        ApiError::Unauthorized
    })?;

    Ok(data.claims)
}

/// An authenticated player extracted from a session token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The account name the session is bound to.
    pub username: Username,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            // Extract the Authorization header
            let auth_header = parts
                .headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .ok_or(ApiError::Unauthorized)?;

            // Extract the Bearer token
            let token = auth_header
                .strip_prefix("Bearer ")
                .ok_or(ApiError::Unauthorized)?;

            let claims = verify_session(token, &state.config.session_secret)?;

            // A signed token can only carry a name that passed registration,
            // so a parse failure here means the token was minted by other code.
            let username = claims
                .sub
                .parse::<Username>()
                .map_err(|_| ApiError::Unauthorized)?;

            Ok(AuthUser { username })
        })
    }
}

/// Admin authentication via API key.
///
/// Used for operator endpoints like granting currency or publishing news.
/// Requires the `x-admin-key` header to match the configured admin key.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    /// Admin identifier (for audit logging).
    pub admin_id: String,
}

impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            // Check for x-admin-key header
            let admin_key = parts
                .headers
                .get("x-admin-key")
                .and_then(|v| v.to_str().ok())
                .ok_or(ApiError::Unauthorized)?;

            // Validate against the configured admin API key
            let expected_key = state
                .config
                .admin_api_key
                .as_ref()
                .ok_or(ApiError::Unauthorized)?;

            if admin_key != expected_key {
                return Err(ApiError::Unauthorized);
            }

            // Extract admin identifier from header if provided
            let admin_id = parts
                .headers
                .get("x-admin-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("admin")
                .to_string();

            tracing::info!(admin_id = %admin_id, "Admin authenticated");

            Ok(AdminAuth { admin_id })
        })
    }
}
