//! Error types for CraftHub storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing database failed or is unreachable. The one retryable kind.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Record not found.
    #[error("not found")]
    NotFound,

    /// A uniqueness guarantee was violated, e.g. registering a taken username.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Balance too low for a debit.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Balance at the time of the attempt, in whole currency units.
        balance: i64,
        /// Price that could not be covered.
        required: i64,
    },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(db.message().to_owned())
            }
            _ => Self::Unavailable(err.to_string()),
        }
    }
}
