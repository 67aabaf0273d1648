//! Marketplace types: catalog items, currency kinds, and the purchase ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::ids::{PurchaseId, Username};

/// Placeholder substituted with the buyer's name in fulfillment templates.
pub const USERNAME_PLACEHOLDER: &str = "{username}";

/// Which of the two per-profile balances an amount is denominated in.
///
/// The two balances are fully independent; there is no conversion between
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    /// The primary balance, granted for donations and promotions.
    Coins,
    /// The secondary balance, earned in-game.
    Tokens,
}

impl Currency {
    /// Stable lowercase name, matching the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Coins => "coins",
            Self::Tokens => "tokens",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coins" => Ok(Self::Coins),
            "tokens" => Ok(Self::Tokens),
            other => Err(DomainError::UnknownCurrency(other.to_owned())),
        }
    }
}

/// A purchasable catalog entry.
///
/// Items are immutable once created; deactivating an item (`is_active =
/// false`) retires it from sale without disturbing ledger rows that
/// reference it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketItem {
    /// Catalog id, assigned by the store.
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Short sales copy shown in the shop.
    pub description: String,

    /// Price in whole currency units. Always positive.
    pub price: i64,

    /// Which balance the price is charged against.
    pub currency: Currency,

    /// Shop section, e.g. `ranks` or `kits`.
    pub category: String,

    /// Optional image path for the shop card.
    pub image: Option<String>,

    /// Fulfillment command template containing [`USERNAME_PLACEHOLDER`].
    pub command: String,

    /// Whether the item is currently on sale.
    pub is_active: bool,

    /// When the item was added to the catalog.
    pub created_at: DateTime<Utc>,
}

impl MarketItem {
    /// Substitute the buyer into the fulfillment command template.
    #[must_use]
    pub fn render_command(&self, username: &Username) -> String {
        self.command.replace(USERNAME_PLACEHOLDER, username.as_str())
    }
}

/// Input for creating a catalog item; the store assigns id and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDraft {
    /// Display name.
    pub name: String,
    /// Short sales copy.
    pub description: String,
    /// Price in whole currency units.
    pub price: i64,
    /// Which balance the price is charged against.
    pub currency: Currency,
    /// Shop section.
    pub category: String,
    /// Optional image path.
    pub image: Option<String>,
    /// Fulfillment command template.
    pub command: String,
    /// Whether the item goes on sale immediately. Defaults to on sale.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl ItemDraft {
    /// Check the draft before it reaches the store.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] when the name is empty, the price is not
    /// positive, or the command template lacks the `{username}` placeholder.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::MissingField("name"));
        }
        if self.price <= 0 {
            return Err(DomainError::NonPositiveAmount(self.price));
        }
        if !self.command.contains(USERNAME_PLACEHOLDER) {
            return Err(DomainError::MissingPlaceholder);
        }
        Ok(())
    }
}

/// One append-only ledger row recording a completed purchase.
///
/// A row exists iff exactly one successful debit happened atomically with
/// its insertion. Rows are never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// Ledger id (ULID, time-ordered).
    pub id: PurchaseId,

    /// The buyer.
    pub username: Username,

    /// The catalog item that was bought.
    pub item_id: i64,

    /// Price paid, in whole units of `currency`.
    pub price: i64,

    /// Which balance was debited.
    pub currency: Currency,

    /// When the purchase completed.
    pub purchase_date: DateTime<Utc>,
}

impl PurchaseRecord {
    /// Create the ledger entry for a purchase of `item` by `username`.
    #[must_use]
    pub fn new(username: Username, item: &MarketItem) -> Self {
        Self {
            id: PurchaseId::generate(),
            username,
            item_id: item.id,
            price: item.price,
            currency: item.currency,
            purchase_date: Utc::now(),
        }
    }
}

/// A ledger row joined with catalog display fields, for purchase history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseSummary {
    /// The ledger row itself.
    pub purchase: PurchaseRecord,
    /// Name of the purchased item at display time.
    pub item_name: String,
    /// Image of the purchased item, if any.
    pub item_image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kit_item() -> MarketItem {
        MarketItem {
            id: 3,
            name: "Diamond Kit".into(),
            description: "Full diamond armor and tools".into(),
            price: 250,
            currency: Currency::Tokens,
            category: "kits".into(),
            image: None,
            command: "kit diamond {username}".into(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn currency_parse_roundtrip() {
        assert_eq!("coins".parse::<Currency>().unwrap(), Currency::Coins);
        assert_eq!("tokens".parse::<Currency>().unwrap(), Currency::Tokens);
        assert_eq!(Currency::Coins.as_str(), "coins");
        assert!("gems".parse::<Currency>().is_err());
    }

    #[test]
    fn currency_serde_uses_snake_case() {
        assert_eq!(serde_json::to_string(&Currency::Tokens).unwrap(), "\"tokens\"");
        let parsed: Currency = serde_json::from_str("\"coins\"").unwrap();
        assert_eq!(parsed, Currency::Coins);
    }

    #[test]
    fn render_command_substitutes_buyer() {
        let item = kit_item();
        let buyer = Username::parse("Steve").unwrap();
        assert_eq!(item.render_command(&buyer), "kit diamond Steve");
    }

    #[test]
    fn render_command_handles_repeated_placeholder() {
        let mut item = kit_item();
        item.command = "msg {username} kit sent to {username}".into();
        let buyer = Username::parse("Alex").unwrap();
        assert_eq!(item.render_command(&buyer), "msg Alex kit sent to Alex");
    }

    #[test]
    fn purchase_record_copies_item_terms() {
        let item = kit_item();
        let buyer = Username::parse("Steve").unwrap();
        let record = PurchaseRecord::new(buyer.clone(), &item);
        assert_eq!(record.username, buyer);
        assert_eq!(record.item_id, 3);
        assert_eq!(record.price, 250);
        assert_eq!(record.currency, Currency::Tokens);
    }

    #[test]
    fn item_draft_deserializes_active_by_default() {
        let draft: ItemDraft = serde_json::from_str(
            r#"{
                "name": "Gold Kit",
                "description": "Gold armor",
                "price": 100,
                "currency": "tokens",
                "category": "kits",
                "command": "kit gold {username}"
            }"#,
        )
        .unwrap();
        assert!(draft.is_active);
        assert!(draft.image.is_none());
    }

    #[test]
    fn item_draft_validation() {
        let good = ItemDraft {
            name: "VIP Rank".into(),
            description: String::new(),
            price: 500,
            currency: Currency::Coins,
            category: "ranks".into(),
            image: None,
            command: "lp user {username} parent add vip".into(),
            is_active: true,
        };
        assert!(good.validate().is_ok());

        let mut free = good.clone();
        free.price = 0;
        assert_eq!(free.validate(), Err(DomainError::NonPositiveAmount(0)));

        let mut blank = good.clone();
        blank.name = "   ".into();
        assert_eq!(blank.validate(), Err(DomainError::MissingField("name")));

        let mut untargeted = good;
        untargeted.command = "broadcast thanks!".into();
        assert_eq!(untargeted.validate(), Err(DomainError::MissingPlaceholder));
    }
}
