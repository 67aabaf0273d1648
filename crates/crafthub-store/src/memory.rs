//! In-memory store used by tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use crafthub_core::{
    CredentialRecord, Currency, DonorEntry, ItemDraft, MarketItem, NewsDraft, NewsPost,
    PlayerProfile, PlaytimeEntry, PurchaseRecord, PurchaseSummary, ServerStatus, Username,
};

use crate::error::{Result, StoreError};
use crate::Store;

#[derive(Default)]
struct Inner {
    credentials: HashMap<String, CredentialRecord>,
    profiles: HashMap<String, PlayerProfile>,
    items: HashMap<i64, MarketItem>,
    next_item_id: i64,
    purchases: Vec<PurchaseRecord>,
    news: Vec<NewsPost>,
    next_news_id: i64,
    donations: Vec<(Username, i64)>,
    status: Option<ServerStatus>,
}

/// An in-memory [`Store`] for tests.
///
/// All state lives behind one `RwLock`; `purchase_item` holds the write
/// lock across the balance check, the debit, and the ledger append, which
/// gives it the same indivisibility the SQL backend gets from its
/// conditional update. No lock is ever held across an await point.
#[derive(Default)]
pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ledger rows, across all players.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    #[must_use]
    pub fn purchase_count(&self) -> usize {
        self.inner.read().expect("lock poisoned").purchases.len()
    }

    fn lock_write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_owned()))
    }

    fn lock_read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_owned()))
    }
}

#[async_trait]
impl Store for MemStore {
    // =========================================================================
    // Credential Operations
    // =========================================================================

    async fn credential(&self, username: &Username) -> Result<Option<CredentialRecord>> {
        Ok(self.lock_read()?.credentials.get(username.as_str()).cloned())
    }

    async fn insert_credential(&self, record: &CredentialRecord) -> Result<()> {
        let mut inner = self.lock_write()?;
        if inner.credentials.contains_key(record.username.as_str()) {
            return Err(StoreError::Conflict(format!(
                "username already registered: {}",
                record.username
            )));
        }
        inner
            .credentials
            .insert(record.username.as_str().to_owned(), record.clone());
        Ok(())
    }

    // =========================================================================
    // Profile Operations
    // =========================================================================

    async fn profile(&self, username: &Username) -> Result<Option<PlayerProfile>> {
        Ok(self.lock_read()?.profiles.get(username.as_str()).cloned())
    }

    async fn upsert_profile(&self, profile: &PlayerProfile) -> Result<()> {
        self.lock_write()?
            .profiles
            .insert(profile.username.as_str().to_owned(), profile.clone());
        Ok(())
    }

    async fn touch_last_online(&self, username: &Username) -> Result<()> {
        let mut inner = self.lock_write()?;
        let profile = inner
            .profiles
            .get_mut(username.as_str())
            .ok_or(StoreError::NotFound)?;
        profile.last_online = Utc::now();
        Ok(())
    }

    async fn grant_currency(
        &self,
        username: &Username,
        currency: Currency,
        amount: i64,
    ) -> Result<i64> {
        let mut inner = self.lock_write()?;
        let profile = inner
            .profiles
            .get_mut(username.as_str())
            .ok_or(StoreError::NotFound)?;
        let balance = match currency {
            Currency::Coins => {
                profile.coins += amount;
                profile.coins
            }
            Currency::Tokens => {
                profile.tokens += amount;
                profile.tokens
            }
        };
        Ok(balance)
    }

    // =========================================================================
    // Catalog Operations
    // =========================================================================

    async fn item(&self, item_id: i64) -> Result<Option<MarketItem>> {
        Ok(self.lock_read()?.items.get(&item_id).cloned())
    }

    async fn list_items(&self, category: Option<&str>) -> Result<Vec<MarketItem>> {
        let inner = self.lock_read()?;
        let mut items: Vec<MarketItem> = inner
            .items
            .values()
            .filter(|item| item.is_active)
            .filter(|item| category.map_or(true, |c| item.category == c))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then(a.price.cmp(&b.price))
                .then(a.id.cmp(&b.id))
        });
        Ok(items)
    }

    async fn item_categories(&self) -> Result<Vec<String>> {
        let inner = self.lock_read()?;
        let mut categories: Vec<String> = inner
            .items
            .values()
            .filter(|item| item.is_active)
            .map(|item| item.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    async fn insert_item(&self, draft: &ItemDraft) -> Result<i64> {
        let mut inner = self.lock_write()?;
        inner.next_item_id += 1;
        let id = inner.next_item_id;
        inner.items.insert(
            id,
            MarketItem {
                id,
                name: draft.name.clone(),
                description: draft.description.clone(),
                price: draft.price,
                currency: draft.currency,
                category: draft.category.clone(),
                image: draft.image.clone(),
                command: draft.command.clone(),
                is_active: draft.is_active,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    // =========================================================================
    // Purchase Ledger Operations
    // =========================================================================

    async fn purchase_item(
        &self,
        username: &Username,
        item: &MarketItem,
        record: &PurchaseRecord,
    ) -> Result<i64> {
        // One write lock across check, debit, and append.
        let mut inner = self.lock_write()?;
        let profile = inner
            .profiles
            .get_mut(username.as_str())
            .ok_or(StoreError::NotFound)?;

        let balance = profile.balance(item.currency);
        if balance < item.price {
            return Err(StoreError::InsufficientFunds {
                balance,
                required: item.price,
            });
        }

        let new_balance = balance - item.price;
        match item.currency {
            Currency::Coins => profile.coins = new_balance,
            Currency::Tokens => profile.tokens = new_balance,
        }
        inner.purchases.push(record.clone());
        Ok(new_balance)
    }

    async fn purchases_by_user(
        &self,
        username: &Username,
        limit: usize,
    ) -> Result<Vec<PurchaseSummary>> {
        let inner = self.lock_read()?;
        let mut rows: Vec<PurchaseSummary> = inner
            .purchases
            .iter()
            .filter(|p| &p.username == username)
            .map(|p| {
                let item = inner.items.get(&p.item_id);
                PurchaseSummary {
                    purchase: p.clone(),
                    item_name: item.map_or_else(String::new, |i| i.name.clone()),
                    item_image: item.and_then(|i| i.image.clone()),
                }
            })
            .collect();
        rows.sort_by(|a, b| b.purchase.purchase_date.cmp(&a.purchase.purchase_date));
        rows.truncate(limit);
        Ok(rows)
    }

    // =========================================================================
    // News Operations
    // =========================================================================

    async fn list_news(&self, limit: usize, offset: usize) -> Result<(Vec<NewsPost>, u64)> {
        let inner = self.lock_read()?;
        let total = inner.news.len() as u64;
        let mut posts = inner.news.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let page = posts.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    async fn featured_news(&self, limit: usize) -> Result<Vec<NewsPost>> {
        let inner = self.lock_read()?;
        let mut posts: Vec<NewsPost> = inner
            .news
            .iter()
            .filter(|post| post.is_featured)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        posts.truncate(limit);
        Ok(posts)
    }

    async fn insert_news(&self, draft: &NewsDraft) -> Result<i64> {
        let mut inner = self.lock_write()?;
        inner.next_news_id += 1;
        let id = inner.next_news_id;
        let now = Utc::now();
        inner.news.push(NewsPost {
            id,
            title: draft.title.clone(),
            content: draft.content.clone(),
            author: draft.author.clone(),
            image: draft.image.clone(),
            category: draft.category.clone(),
            is_featured: draft.is_featured,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    // =========================================================================
    // Toplist Operations
    // =========================================================================

    async fn top_donors(&self, limit: usize) -> Result<Vec<DonorEntry>> {
        let inner = self.lock_read()?;
        let mut totals: HashMap<&Username, i64> = HashMap::new();
        for (username, cents) in &inner.donations {
            *totals.entry(username).or_default() += cents;
        }
        let mut entries: Vec<DonorEntry> = totals
            .into_iter()
            .map(|(username, total_cents)| {
                let profile = inner.profiles.get(username.as_str());
                DonorEntry {
                    username: username.clone(),
                    avatar: profile.map(|p| p.avatar.clone()),
                    rank_name: profile.map(|p| p.rank_name.clone()),
                    total_cents,
                }
            })
            .collect();
        entries.sort_by(|a, b| {
            b.total_cents
                .cmp(&a.total_cents)
                .then_with(|| a.username.as_str().cmp(b.username.as_str()))
        });
        entries.truncate(limit);
        Ok(entries)
    }

    async fn top_playtime(&self, limit: usize) -> Result<Vec<PlaytimeEntry>> {
        let inner = self.lock_read()?;
        let mut entries: Vec<PlaytimeEntry> = inner
            .profiles
            .values()
            .map(|p| PlaytimeEntry {
                username: p.username.clone(),
                avatar: p.avatar.clone(),
                rank_name: p.rank_name.clone(),
                total_playtime: p.total_playtime,
                is_online: p.is_online,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.total_playtime
                .cmp(&a.total_playtime)
                .then_with(|| a.username.as_str().cmp(b.username.as_str()))
        });
        entries.truncate(limit);
        Ok(entries)
    }

    async fn record_donation(&self, username: &Username, amount_cents: i64) -> Result<()> {
        self.lock_write()?
            .donations
            .push((username.clone(), amount_cents));
        Ok(())
    }

    // =========================================================================
    // Server Status Operations
    // =========================================================================

    async fn latest_status(&self) -> Result<Option<ServerStatus>> {
        Ok(self.lock_read()?.status.clone())
    }

    async fn put_status(&self, status: &ServerStatus) -> Result<()> {
        self.lock_write()?.status = Some(status.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn name(raw: &str) -> Username {
        Username::parse(raw).unwrap()
    }

    fn credential(raw: &str) -> CredentialRecord {
        CredentialRecord::new(name(raw), "$argon2id$stub".to_owned(), None, None)
    }

    fn profile(raw: &str) -> PlayerProfile {
        PlayerProfile::new(name(raw), None, "/images/default-avatar.png".to_owned())
    }

    fn kit(price: i64, currency: Currency) -> MarketItem {
        MarketItem {
            id: 900,
            name: "Test Kit".to_owned(),
            description: String::new(),
            price,
            currency,
            category: "kits".to_owned(),
            image: None,
            command: "kit test {username}".to_owned(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn credential_insert_and_lookup() {
        let store = MemStore::new();
        store.insert_credential(&credential("Steve")).await.unwrap();

        let found = store.credential(&name("Steve")).await.unwrap();
        assert_eq!(found.unwrap().realname, "Steve");

        let missing = store.credential(&name("Alex")).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn duplicate_credential_conflicts() {
        let store = MemStore::new();
        store.insert_credential(&credential("Steve")).await.unwrap();
        let second = store.insert_credential(&credential("Steve")).await;
        assert!(matches!(second, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn grant_currency_accumulates() {
        let store = MemStore::new();
        store.upsert_profile(&profile("Alex")).await.unwrap();

        let coins = store
            .grant_currency(&name("Alex"), Currency::Coins, 300)
            .await
            .unwrap();
        assert_eq!(coins, 300);
        let coins = store
            .grant_currency(&name("Alex"), Currency::Coins, 200)
            .await
            .unwrap();
        assert_eq!(coins, 500);

        let tokens = store
            .grant_currency(&name("Alex"), Currency::Tokens, 50)
            .await
            .unwrap();
        assert_eq!(tokens, 50);

        let missing = store
            .grant_currency(&name("Ghost"), Currency::Coins, 10)
            .await;
        assert!(matches!(missing, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn purchase_debits_and_appends_once() {
        let store = MemStore::new();
        let mut buyer = profile("Steve");
        buyer.tokens = 250;
        store.upsert_profile(&buyer).await.unwrap();

        let item = kit(250, Currency::Tokens);
        let record = PurchaseRecord::new(name("Steve"), &item);
        let new_balance = store
            .purchase_item(&name("Steve"), &item, &record)
            .await
            .unwrap();

        assert_eq!(new_balance, 0);
        assert_eq!(store.purchase_count(), 1);
        let stored = store.profile(&name("Steve")).await.unwrap().unwrap();
        assert_eq!(stored.tokens, 0);
        assert_eq!(stored.coins, 0);
    }

    #[tokio::test]
    async fn purchase_with_short_balance_writes_nothing() {
        let store = MemStore::new();
        let mut buyer = profile("Steve");
        buyer.coins = 499;
        store.upsert_profile(&buyer).await.unwrap();

        let item = kit(500, Currency::Coins);
        let record = PurchaseRecord::new(name("Steve"), &item);
        let err = store
            .purchase_item(&name("Steve"), &item, &record)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::InsufficientFunds {
                balance: 499,
                required: 500
            }
        ));
        assert_eq!(store.purchase_count(), 0);
        let stored = store.profile(&name("Steve")).await.unwrap().unwrap();
        assert_eq!(stored.coins, 499);
    }

    #[tokio::test]
    async fn purchase_without_profile_is_not_found() {
        let store = MemStore::new();
        let item = kit(10, Currency::Coins);
        let record = PurchaseRecord::new(name("Ghost"), &item);
        let err = store
            .purchase_item(&name("Ghost"), &item, &record)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_purchases_cannot_double_spend() {
        let store = Arc::new(MemStore::new());
        let mut buyer = profile("Steve");
        buyer.coins = 500;
        store.upsert_profile(&buyer).await.unwrap();

        let item = kit(500, Currency::Coins);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let item = item.clone();
            handles.push(tokio::spawn(async move {
                let record = PurchaseRecord::new(name("Steve"), &item);
                store.purchase_item(&name("Steve"), &item, &record).await
            }));
        }

        let mut successes = 0;
        let mut short = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(balance) => {
                    successes += 1;
                    assert_eq!(balance, 0);
                }
                Err(StoreError::InsufficientFunds { .. }) => short += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(successes, 1, "only one purchase can be afforded");
        assert_eq!(short, 7);
        assert_eq!(store.purchase_count(), 1);
        let stored = store.profile(&name("Steve")).await.unwrap().unwrap();
        assert_eq!(stored.coins, 0);
    }

    #[tokio::test]
    async fn purchases_by_user_joins_item_fields_newest_first() {
        let store = MemStore::new();
        let mut buyer = profile("Alex");
        buyer.coins = 10_000;
        store.upsert_profile(&buyer).await.unwrap();

        let vip_id = store
            .insert_item(&ItemDraft {
                name: "VIP Rank".to_owned(),
                description: String::new(),
                price: 500,
                currency: Currency::Coins,
                category: "ranks".to_owned(),
                image: Some("/images/vip.png".to_owned()),
                command: "lp user {username} parent add vip".to_owned(),
                is_active: true,
            })
            .await
            .unwrap();
        let vip = store.item(vip_id).await.unwrap().unwrap();

        for _ in 0..3 {
            let record = PurchaseRecord::new(name("Alex"), &vip);
            store
                .purchase_item(&name("Alex"), &vip, &record)
                .await
                .unwrap();
        }

        let rows = store.purchases_by_user(&name("Alex"), 2).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].purchase.purchase_date >= rows[1].purchase.purchase_date);
        assert_eq!(rows[0].item_name, "VIP Rank");
        assert_eq!(rows[0].item_image.as_deref(), Some("/images/vip.png"));

        let none = store.purchases_by_user(&name("Steve"), 10).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn list_items_filters_inactive_and_by_category() {
        let store = MemStore::new();
        let drafts = [
            ("VIP Rank", "ranks", true),
            ("Premium Rank", "ranks", true),
            ("Diamond Kit", "kits", true),
            ("Retired Kit", "kits", false),
        ];
        for (name, category, active) in drafts {
            store
                .insert_item(&ItemDraft {
                    name: name.to_owned(),
                    description: String::new(),
                    price: 100,
                    currency: Currency::Coins,
                    category: category.to_owned(),
                    image: None,
                    command: "give {username} stone".to_owned(),
                    is_active: active,
                })
                .await
                .unwrap();
        }

        let all = store.list_items(None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|item| item.is_active));

        let kits = store.list_items(Some("kits")).await.unwrap();
        assert_eq!(kits.len(), 1);
        assert_eq!(kits[0].name, "Diamond Kit");

        let categories = store.item_categories().await.unwrap();
        assert_eq!(categories, vec!["kits".to_owned(), "ranks".to_owned()]);
    }

    #[tokio::test]
    async fn news_pagination_counts_everything() {
        let store = MemStore::new();
        for i in 0..13 {
            store
                .insert_news(&NewsDraft {
                    title: format!("Post {i}"),
                    content: "body".to_owned(),
                    author: "console".to_owned(),
                    image: None,
                    category: "general".to_owned(),
                    is_featured: i == 12,
                })
                .await
                .unwrap();
        }

        let (first_page, total) = store.list_news(10, 0).await.unwrap();
        assert_eq!(total, 13);
        assert_eq!(first_page.len(), 10);
        assert_eq!(first_page[0].title, "Post 12");

        let (last_page, _) = store.list_news(10, 10).await.unwrap();
        assert_eq!(last_page.len(), 3);

        let featured = store.featured_news(3).await.unwrap();
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].title, "Post 12");
    }

    #[tokio::test]
    async fn top_donors_groups_and_orders() {
        let store = MemStore::new();
        store.upsert_profile(&profile("Alex")).await.unwrap();

        store.record_donation(&name("Alex"), 500).await.unwrap();
        store.record_donation(&name("Alex"), 1500).await.unwrap();
        store.record_donation(&name("Steve"), 1000).await.unwrap();

        let donors = store.top_donors(10).await.unwrap();
        assert_eq!(donors.len(), 2);
        assert_eq!(donors[0].username.as_str(), "Alex");
        assert_eq!(donors[0].total_cents, 2000);
        assert!(donors[0].avatar.is_some());
        // Steve donated without ever registering on the site.
        assert_eq!(donors[1].total_cents, 1000);
        assert!(donors[1].avatar.is_none());
    }

    #[tokio::test]
    async fn top_playtime_orders_descending() {
        let store = MemStore::new();
        for (raw, seconds) in [("Alex", 7200), ("Steve", 36_000), ("Herobrine", 10)] {
            let mut p = profile(raw);
            p.total_playtime = seconds;
            store.upsert_profile(&p).await.unwrap();
        }

        let entries = store.top_playtime(2).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].username.as_str(), "Steve");
        assert_eq!(entries[1].username.as_str(), "Alex");
    }

    #[tokio::test]
    async fn status_snapshot_replaces_previous() {
        let store = MemStore::new();
        assert!(store.latest_status().await.unwrap().is_none());

        let mut snapshot = ServerStatus::offline("play.example.net");
        snapshot.is_online = true;
        snapshot.online_players = 17;
        snapshot.max_players = 100;
        store.put_status(&snapshot).await.unwrap();

        snapshot.online_players = 23;
        store.put_status(&snapshot).await.unwrap();

        let latest = store.latest_status().await.unwrap().unwrap();
        assert_eq!(latest.online_players, 23);
        assert!(latest.is_online);
    }

    #[tokio::test]
    async fn touch_last_online_moves_forward() {
        let store = MemStore::new();
        let mut p = profile("Alex");
        p.last_online = Utc::now() - chrono::Duration::hours(6);
        let before = p.last_online;
        store.upsert_profile(&p).await.unwrap();

        store.touch_last_online(&name("Alex")).await.unwrap();
        let after = store.profile(&name("Alex")).await.unwrap().unwrap();
        assert!(after.last_online > before);

        let missing = store.touch_last_online(&name("Ghost")).await;
        assert!(matches!(missing, Err(StoreError::NotFound)));
    }
}
