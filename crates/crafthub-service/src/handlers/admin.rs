//! Admin handlers, all gated on the admin API key.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crafthub_core::{Currency, DomainError, ItemDraft, NewsDraft, Username};
use crafthub_store::StoreError;

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Request to add funds to a player's balance.
#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    /// The player to credit.
    pub username: String,
    /// Which balance to credit.
    pub currency: Currency,
    /// Amount in whole units. Must be positive.
    pub amount: i64,
}

/// Result of a grant.
#[derive(Debug, Serialize)]
pub struct GrantResponse {
    /// The credited player.
    pub username: String,
    /// The credited balance.
    pub currency: String,
    /// Balance after the credit.
    pub balance: i64,
}

/// Add funds to one of a player's balances.
pub async fn grant(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(body): Json<GrantRequest>,
) -> Result<Json<GrantResponse>, ApiError> {
    let username = Username::parse(&body.username)?;
    if body.amount <= 0 {
        return Err(DomainError::NonPositiveAmount(body.amount).into());
    }

    let balance = state
        .store
        .grant_currency(&username, body.currency, body.amount)
        .await
        .map_err(|err| match err {
            StoreError::NotFound => ApiError::NotFound("player not found".into()),
            other => ApiError::from(other),
        })?;

    tracing::info!(
        admin_id = %admin.admin_id,
        username = %username,
        currency = %body.currency,
        amount = body.amount,
        balance,
        "Currency granted"
    );

    Ok(Json(GrantResponse {
        username: username.to_string(),
        currency: body.currency.to_string(),
        balance,
    }))
}

/// Request to record a donation.
#[derive(Debug, Deserialize)]
pub struct DonationRequest {
    /// The donor. Does not need a site profile.
    pub username: String,
    /// Donated amount in integer cents. Must be positive.
    pub amount_cents: i64,
}

/// Confirmation that a donation was recorded.
#[derive(Debug, Serialize)]
pub struct DonationResponse {
    /// Always true on success.
    pub recorded: bool,
}

/// Record a donation for the donor leaderboard.
pub async fn record_donation(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(body): Json<DonationRequest>,
) -> Result<Json<DonationResponse>, ApiError> {
    let username = Username::parse(&body.username)?;
    if body.amount_cents <= 0 {
        return Err(DomainError::NonPositiveAmount(body.amount_cents).into());
    }

    state
        .store
        .record_donation(&username, body.amount_cents)
        .await?;

    tracing::info!(
        admin_id = %admin.admin_id,
        username = %username,
        amount_cents = body.amount_cents,
        "Donation recorded"
    );

    Ok(Json(DonationResponse { recorded: true }))
}

/// Response carrying the id the store assigned.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    /// Assigned id.
    pub id: i64,
}

/// Publish a news post.
pub async fn create_news(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(draft): Json<NewsDraft>,
) -> Result<Json<CreatedResponse>, ApiError> {
    draft.validate()?;

    let id = state.store.insert_news(&draft).await?;

    tracing::info!(
        admin_id = %admin.admin_id,
        id,
        title = %draft.title,
        "News post published"
    );

    Ok(Json(CreatedResponse { id }))
}

/// Add a catalog item.
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(draft): Json<ItemDraft>,
) -> Result<Json<CreatedResponse>, ApiError> {
    draft.validate()?;

    let id = state.store.insert_item(&draft).await?;

    tracing::info!(
        admin_id = %admin.admin_id,
        id,
        name = %draft.name,
        price = draft.price,
        currency = %draft.currency,
        "Catalog item added"
    );

    Ok(Json(CreatedResponse { id }))
}
