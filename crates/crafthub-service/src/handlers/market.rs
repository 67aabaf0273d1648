//! Market catalog and purchase handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crafthub_core::{MarketItem, PurchaseRecord, PurchaseSummary};
use crafthub_store::StoreError;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::fulfill;
use crate::state::AppState;

/// Default number of rows returned for purchase history.
const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Cap on rows returned for purchase history.
const MAX_HISTORY_LIMIT: usize = 100;

/// Catalog item as shown in the shop. The fulfillment command template
/// stays server-side.
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    /// Catalog id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Sales copy.
    pub description: String,
    /// Price in whole currency units.
    pub price: i64,
    /// Which balance the price is charged against.
    pub currency: String,
    /// Shop section.
    pub category: String,
    /// Image path, if any.
    pub image: Option<String>,
}

impl From<MarketItem> for ItemResponse {
    fn from(item: MarketItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            description: item.description,
            price: item.price,
            currency: item.currency.to_string(),
            category: item.category,
            image: item.image,
        }
    }
}

/// Query parameters for the catalog listing.
#[derive(Debug, Deserialize)]
pub struct ItemsQuery {
    /// Restrict to one shop section.
    pub category: Option<String>,
}

/// Shop catalog response.
#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    /// Active items, newest first.
    pub items: Vec<ItemResponse>,
    /// All sections with at least one active item.
    pub categories: Vec<String>,
}

/// List active catalog items, optionally restricted to one category.
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ItemsQuery>,
) -> Result<Json<ItemsResponse>, ApiError> {
    let items = state.store.list_items(query.category.as_deref()).await?;
    let categories = state.store.item_categories().await?;

    Ok(Json(ItemsResponse {
        items: items.into_iter().map(ItemResponse::from).collect(),
        categories,
    }))
}

/// Purchase request.
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    /// Catalog id of the item to buy.
    pub item_id: i64,
}

/// Purchase receipt.
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    /// Ledger id of the completed purchase.
    pub purchase_id: String,
    /// The purchased item.
    pub item_id: i64,
    /// Item display name.
    pub item_name: String,
    /// Price paid.
    pub price: i64,
    /// Currency the price was paid in.
    pub currency: String,
    /// Balance of that currency after the debit.
    pub new_balance: i64,
}

/// Buy an item: debit the balance, append the ledger row, emit the
/// fulfillment command.
pub async fn purchase(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<PurchaseRequest>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    // A retired item is indistinguishable from a missing one
    let item = state
        .store
        .item(body.item_id)
        .await?
        .filter(|item| item.is_active)
        .ok_or_else(|| ApiError::NotFound("item not found".into()))?;

    let record = PurchaseRecord::new(auth.username.clone(), &item);
    let command = item.render_command(&auth.username);

    // The balance check, the debit, and the ledger append are one atomic
    // store operation; two concurrent purchases can never both spend the
    // same funds.
    let new_balance = state
        .store
        .purchase_item(&auth.username, &item, &record)
        .await
        .map_err(|err| match err {
            // A session guarantees a profile exists; its absence here is a
            // bug, not a user error.
            StoreError::NotFound => {
                tracing::error!(
                    username = %auth.username,
                    item_id = item.id,
                    "Authenticated player has no profile during purchase"
                );
                ApiError::Internal("profile missing for authenticated player".into())
            }
            other => ApiError::from(other),
        })?;

    tracing::info!(
        username = %auth.username,
        item_id = item.id,
        purchase_id = %record.id,
        price = item.price,
        currency = %item.currency,
        new_balance,
        "Purchase completed"
    );

    // Fire-and-forget: the purchase stands whether or not delivery works
    fulfill::emit(state.fulfillment.clone(), record.id, command);

    Ok(Json(PurchaseResponse {
        purchase_id: record.id.to_string(),
        item_id: item.id,
        item_name: item.name,
        price: item.price,
        currency: item.currency.to_string(),
        new_balance,
    }))
}

/// Query parameters for purchase history.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Maximum rows to return.
    pub limit: Option<usize>,
}

/// One purchase history entry.
#[derive(Debug, Serialize)]
pub struct PurchaseHistoryEntry {
    /// Ledger id.
    pub purchase_id: String,
    /// Item bought.
    pub item_id: i64,
    /// Item display name.
    pub item_name: String,
    /// Item image, if any.
    pub item_image: Option<String>,
    /// Price paid.
    pub price: i64,
    /// Currency paid in.
    pub currency: String,
    /// Completion time.
    pub purchase_date: String,
}

impl From<PurchaseSummary> for PurchaseHistoryEntry {
    fn from(summary: PurchaseSummary) -> Self {
        Self {
            purchase_id: summary.purchase.id.to_string(),
            item_id: summary.purchase.item_id,
            item_name: summary.item_name,
            item_image: summary.item_image,
            price: summary.purchase.price,
            currency: summary.purchase.currency.to_string(),
            purchase_date: summary.purchase.purchase_date.to_rfc3339(),
        }
    }
}

/// Purchase history response.
#[derive(Debug, Serialize)]
pub struct PurchaseHistoryResponse {
    /// Ledger rows, newest first.
    pub purchases: Vec<PurchaseHistoryEntry>,
}

/// List the caller's purchases, newest first.
pub async fn list_purchases(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<PurchaseHistoryResponse>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(MAX_HISTORY_LIMIT);

    let purchases = state.store.purchases_by_user(&auth.username, limit).await?;

    Ok(Json(PurchaseHistoryResponse {
        purchases: purchases
            .into_iter()
            .map(PurchaseHistoryEntry::from)
            .collect(),
    }))
}
