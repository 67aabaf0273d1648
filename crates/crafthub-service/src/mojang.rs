//! Mojang profile lookups for avatar resolution.
//!
//! Registration and the login repair path ask Mojang for the player's
//! profile UUID and derive an avatar URL from it. The lookup is best
//! effort: any failure falls back to the configured default avatar and
//! never aborts the caller.

use std::time::Duration;

use serde::Deserialize;
use uuid::Uuid;

use crafthub_core::Username;

/// Timeout for profile lookups. Kept short since registration waits on it.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Mojang profile API client.
#[derive(Debug, Clone)]
pub struct MojangClient {
    client: reqwest::Client,
    api_url: String,
    avatar_base: String,
}

/// The subset of the profile response this service reads.
#[derive(Debug, Deserialize)]
struct MojangProfile {
    id: String,
}

impl MojangClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `api_url` - Mojang API base URL (e.g. `"https://api.mojang.com"`)
    /// * `avatar_base` - avatar service base URL, keyed by profile UUID
    #[must_use]
    pub fn new(api_url: &str, avatar_base: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_owned(),
            avatar_base: avatar_base.trim_end_matches('/').to_owned(),
        }
    }

    /// Look up the avatar URL for a player, best effort.
    ///
    /// Returns `None` when no profile exists for the name or when the
    /// lookup fails for any reason; callers fall back to the default
    /// avatar.
    pub async fn avatar_url(&self, username: &Username) -> Option<String> {
        let url = format!(
            "{}/users/profiles/minecraft/{}",
            self.api_url,
            username.as_str()
        );

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(username = %username, error = %e, "Mojang profile lookup failed");
                return None;
            }
        };

        // Mojang reports an unknown name as 404 (204 from the legacy API)
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::NO_CONTENT {
            tracing::debug!(username = %username, "No Mojang profile for username");
            return None;
        }
        if !status.is_success() {
            tracing::warn!(
                username = %username,
                status = %status,
                "Mojang profile lookup returned non-success status"
            );
            return None;
        }

        let profile: MojangProfile = match response.json().await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(username = %username, error = %e, "Failed to parse Mojang profile response");
                return None;
            }
        };

        // The API returns the UUID without hyphens; parse_str takes both forms
        let uuid = match Uuid::parse_str(&profile.id) {
            Ok(uuid) => uuid,
            Err(_) => {
                tracing::warn!(username = %username, id = %profile.id, "Mojang profile id is not a UUID");
                return None;
            }
        };

        Some(format!("{}/{}?size=64", self.avatar_base, uuid.simple()))
    }
}
