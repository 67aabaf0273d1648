//! The locally-owned player profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::Username;
use crate::market::Currency;

/// Rank assigned to every freshly created profile.
pub const DEFAULT_RANK: &str = "default";

/// The site's own record for a player: balances, rank, and presence data.
///
/// A profile exists for a username iff that username has completed at least
/// one successful registration or login. Balances never go negative; the
/// purchase transaction is the only debit path, and `total_playtime` /
/// `is_online` are written by the game server, not by this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    /// The account name, matching the credential record one-to-one.
    pub username: Username,

    /// Contact address captured at registration, if given.
    pub email: Option<String>,

    /// Avatar image URL or site-relative path.
    pub avatar: String,

    /// Primary balance, whole units. Never negative.
    pub coins: i64,

    /// Secondary balance, whole units. Never negative.
    pub tokens: i64,

    /// Display rank, e.g. `default`, `vip`, `premium`.
    pub rank_name: String,

    /// When the profile was created.
    pub join_date: DateTime<Utc>,

    /// Last time the player logged in to the site.
    pub last_online: DateTime<Utc>,

    /// Accumulated in-game playtime in seconds. Game-owned.
    pub total_playtime: i64,

    /// Whether the player is currently on the game server. Game-owned.
    pub is_online: bool,
}

impl PlayerProfile {
    /// Create a fresh profile with zero balances and the default rank.
    #[must_use]
    pub fn new(username: Username, email: Option<String>, avatar: String) -> Self {
        let now = Utc::now();
        Self {
            username,
            email,
            avatar,
            coins: 0,
            tokens: 0,
            rank_name: DEFAULT_RANK.to_owned(),
            join_date: now,
            last_online: now,
            total_playtime: 0,
            is_online: false,
        }
    }

    /// The balance for one currency kind.
    #[must_use]
    pub const fn balance(&self, currency: Currency) -> i64 {
        match currency {
            Currency::Coins => self.coins,
            Currency::Tokens => self.tokens,
        }
    }

    /// Check whether the profile can cover a price in the given currency.
    #[must_use]
    pub const fn can_afford(&self, currency: Currency, price: i64) -> bool {
        self.balance(currency) >= price
    }
}
