//! Storage layer for the CraftHub companion-site backend.
//!
//! This crate persists credentials, player profiles, the market catalog, the
//! purchase ledger, news, donations, and the server-status snapshot.
//!
//! # Backends
//!
//! - [`PgStore`]: PostgreSQL via sqlx, the production backend. Runs the
//!   embedded [`MIGRATOR`] at startup.
//! - [`MemStore`]: a lock-guarded in-memory backend for tests.
//!
//! # Atomicity
//!
//! The one operation with real coordination requirements is
//! [`Store::purchase_item`]: the balance check, the debit, and the ledger
//! append must be indivisible so that two concurrent purchases can never
//! both spend the same funds. `PgStore` expresses it as a conditional
//! `UPDATE` inside a transaction; `MemStore` holds its write lock across the
//! whole step.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::{Result, StoreError};
pub use memory::MemStore;
pub use postgres::PgStore;

use async_trait::async_trait;

use crafthub_core::{
    CredentialRecord, Currency, DonorEntry, ItemDraft, MarketItem, NewsDraft, NewsPost,
    PlayerProfile, PlaytimeEntry, PurchaseRecord, PurchaseSummary, ServerStatus, Username,
};

/// Embedded migrations for the PostgreSQL backend.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// The storage trait defining all persistence operations.
///
/// This trait abstracts the storage layer, allowing different implementations
/// (PostgreSQL in production, in-memory for testing).
#[async_trait]
pub trait Store: Send + Sync {
    // =========================================================================
    // Credential Operations (plugin-owned table)
    // =========================================================================

    /// Get a credential record by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn credential(&self, username: &Username) -> Result<Option<CredentialRecord>>;

    /// Insert a new credential record.
    ///
    /// The uniqueness check and the insert are one atomic step; two
    /// concurrent registrations of the same name cannot both succeed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the username is already registered.
    async fn insert_credential(&self, record: &CredentialRecord) -> Result<()>;

    // =========================================================================
    // Profile Operations
    // =========================================================================

    /// Get a player profile by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn profile(&self, username: &Username) -> Result<Option<PlayerProfile>>;

    /// Insert or replace a player profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn upsert_profile(&self, profile: &PlayerProfile) -> Result<()>;

    /// Set a profile's `last_online` to the current time.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no profile exists for the username.
    async fn touch_last_online(&self, username: &Username) -> Result<()>;

    /// Add a positive amount to one of a profile's balances.
    ///
    /// Returns the new balance of that currency.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no profile exists for the username.
    async fn grant_currency(
        &self,
        username: &Username,
        currency: Currency,
        amount: i64,
    ) -> Result<i64>;

    // =========================================================================
    // Catalog Operations
    // =========================================================================

    /// Get a catalog item by id, active or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn item(&self, item_id: i64) -> Result<Option<MarketItem>>;

    /// List active catalog items, optionally restricted to one category,
    /// newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_items(&self, category: Option<&str>) -> Result<Vec<MarketItem>>;

    /// Distinct categories among active items, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn item_categories(&self) -> Result<Vec<String>>;

    /// Insert a catalog item and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn insert_item(&self, draft: &ItemDraft) -> Result<i64>;

    // =========================================================================
    // Purchase Ledger Operations
    // =========================================================================

    /// Debit the item's price from the buyer's balance and append the ledger
    /// row, as one atomic step. Returns the new balance of the debited
    /// currency.
    ///
    /// The debit is conditional: it applies only if the balance covers the
    /// price, so a profile balance can never go negative and two concurrent
    /// purchases can never both succeed on funds that cover only one.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if no profile exists for the username.
    /// - `StoreError::InsufficientFunds` if the balance is too low; nothing
    ///   is written.
    async fn purchase_item(
        &self,
        username: &Username,
        item: &MarketItem,
        record: &PurchaseRecord,
    ) -> Result<i64>;

    /// List a player's purchases joined with item display fields, newest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn purchases_by_user(
        &self,
        username: &Username,
        limit: usize,
    ) -> Result<Vec<PurchaseSummary>>;

    // =========================================================================
    // News Operations
    // =========================================================================

    /// One page of news posts, newest first, plus the total post count.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_news(&self, limit: usize, offset: usize) -> Result<(Vec<NewsPost>, u64)>;

    /// Featured posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn featured_news(&self, limit: usize) -> Result<Vec<NewsPost>>;

    /// Publish a news post and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn insert_news(&self, draft: &NewsDraft) -> Result<i64>;

    // =========================================================================
    // Toplist Operations
    // =========================================================================

    /// Donation totals grouped by donor, largest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn top_donors(&self, limit: usize) -> Result<Vec<DonorEntry>>;

    /// Profiles ranked by accumulated playtime, longest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn top_playtime(&self, limit: usize) -> Result<Vec<PlaytimeEntry>>;

    /// Record a donation in integer cents.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn record_donation(&self, username: &Username, amount_cents: i64) -> Result<()>;

    // =========================================================================
    // Server Status Operations
    // =========================================================================

    /// The latest status snapshot, if the poller has ever written one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn latest_status(&self) -> Result<Option<ServerStatus>>;

    /// Replace the status snapshot. Called only by the status poller.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn put_status(&self, status: &ServerStatus) -> Result<()>;
}
