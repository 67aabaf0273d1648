//! Error types for domain validation.

use crate::ids::IdError;

/// Result type for domain-level validation.
pub type Result<T> = std::result::Result<T, DomainError>;

/// Errors produced when constructing or validating domain values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// An identifier failed validation.
    #[error(transparent)]
    Id(#[from] IdError),

    /// A currency name that is neither `coins` nor `tokens`.
    #[error("unknown currency: {0}")]
    UnknownCurrency(String),

    /// A price or amount that must be positive was not.
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(i64),

    /// A catalog draft is missing a required field.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A fulfillment template has no `{username}` placeholder.
    #[error("fulfillment command has no {{username}} placeholder")]
    MissingPlaceholder,
}
