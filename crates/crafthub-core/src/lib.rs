//! Core domain types for the CraftHub companion-site backend.
//!
//! This crate provides the foundational types used throughout the platform:
//!
//! - **Identifiers**: `Username`, `PurchaseId`
//! - **Identity**: `CredentialRecord` (plugin-compatible), `PlayerProfile`
//! - **Market**: `MarketItem`, `Currency`, `PurchaseRecord`
//! - **Site content**: `NewsPost`, `DonorEntry`, `PlaytimeEntry`, `ServerStatus`
//!
//! # Currency model
//!
//! Every player profile carries two independent balances, **coins** and
//! **tokens**. Both are stored as `i64` whole units and may never go
//! negative; the market purchase transaction is the only code path that
//! debits them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod credential;
pub mod error;
pub mod ids;
pub mod market;
pub mod news;
pub mod profile;
pub mod stats;

pub use credential::CredentialRecord;
pub use error::{DomainError, Result};
pub use ids::{IdError, PurchaseId, Username};
pub use market::{
    Currency, ItemDraft, MarketItem, PurchaseRecord, PurchaseSummary, USERNAME_PLACEHOLDER,
};
pub use news::{NewsDraft, NewsPost};
pub use profile::PlayerProfile;
pub use stats::{DonorEntry, PlaytimeEntry, ServerStatus};
