//! PostgreSQL store implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::str::FromStr;

use crafthub_core::{
    CredentialRecord, Currency, DonorEntry, ItemDraft, MarketItem, NewsDraft, NewsPost,
    PlayerProfile, PlaytimeEntry, PurchaseId, PurchaseRecord, PurchaseSummary, ServerStatus,
    Username,
};

use crate::error::{Result, StoreError};
use crate::Store;

/// Maximum connections held by the pool.
const MAX_CONNECTIONS: u32 = 5;

// SQL identifiers cannot be bound as parameters; the balance column name
// always comes from the enum, never from user input.
const fn balance_column(currency: Currency) -> &'static str {
    match currency {
        Currency::Coins => "coins",
        Currency::Tokens => "tokens",
    }
}

fn bind_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// PostgreSQL-backed [`Store`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing connection pool. Migrations are the caller's
    /// responsibility on this path.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the database and run pending migrations.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the connection or a migration
    /// fails.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await?;

        crate::MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migration failed: {e}")))?;
        tracing::info!("Database migrations applied");

        Ok(Self::new(pool))
    }

    /// The underlying pool, for health probes.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    // =========================================================================
    // Credential Operations
    // =========================================================================

    async fn credential(&self, username: &Username) -> Result<Option<CredentialRecord>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT
                username, realname, password, ip, lastlogin,
                x, y, z, world, regdate, regip, yaw, pitch, email,
                "isLogged" AS is_logged, "hasSession" AS has_session
            FROM authme
            WHERE username = $1
            "#,
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CredentialRow::into_record).transpose()
    }

    async fn insert_credential(&self, record: &CredentialRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO authme (
                username, realname, password, ip, lastlogin,
                x, y, z, world, regdate, regip, yaw, pitch, email,
                "isLogged", "hasSession"
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(record.username.as_str())
        .bind(&record.realname)
        .bind(&record.password)
        .bind(&record.ip)
        .bind(record.lastlogin)
        .bind(record.x)
        .bind(record.y)
        .bind(record.z)
        .bind(&record.world)
        .bind(record.regdate)
        .bind(&record.regip)
        .bind(record.yaw)
        .bind(record.pitch)
        .bind(&record.email)
        .bind(record.is_logged)
        .bind(record.has_session)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Profile Operations
    // =========================================================================

    async fn profile(&self, username: &Username) -> Result<Option<PlayerProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            SELECT
                username, email, avatar, coins, tokens, rank_name,
                join_date, last_online, total_playtime, is_online
            FROM website_users
            WHERE username = $1
            ",
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProfileRow::into_profile).transpose()
    }

    async fn upsert_profile(&self, profile: &PlayerProfile) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO website_users (
                username, email, avatar, coins, tokens, rank_name,
                join_date, last_online, total_playtime, is_online
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (username) DO UPDATE SET
                email = EXCLUDED.email,
                avatar = EXCLUDED.avatar,
                coins = EXCLUDED.coins,
                tokens = EXCLUDED.tokens,
                rank_name = EXCLUDED.rank_name,
                last_online = EXCLUDED.last_online,
                total_playtime = EXCLUDED.total_playtime,
                is_online = EXCLUDED.is_online
            ",
        )
        .bind(profile.username.as_str())
        .bind(&profile.email)
        .bind(&profile.avatar)
        .bind(profile.coins)
        .bind(profile.tokens)
        .bind(&profile.rank_name)
        .bind(profile.join_date)
        .bind(profile.last_online)
        .bind(profile.total_playtime)
        .bind(profile.is_online)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn touch_last_online(&self, username: &Username) -> Result<()> {
        let updated = sqlx::query("UPDATE website_users SET last_online = NOW() WHERE username = $1")
            .bind(username.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if updated == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn grant_currency(
        &self,
        username: &Username,
        currency: Currency,
        amount: i64,
    ) -> Result<i64> {
        let column = balance_column(currency);
        let sql = format!(
            "UPDATE website_users SET {column} = {column} + $2 \
             WHERE username = $1 RETURNING {column}"
        );

        let balance = sqlx::query_scalar::<_, i64>(&sql)
            .bind(username.as_str())
            .bind(amount)
            .fetch_optional(&self.pool)
            .await?;

        balance.ok_or(StoreError::NotFound)
    }

    // =========================================================================
    // Catalog Operations
    // =========================================================================

    async fn item(&self, item_id: i64) -> Result<Option<MarketItem>> {
        let row = sqlx::query_as::<_, ItemRow>(
            r"
            SELECT id, name, description, price, currency, category,
                   image, command, is_active, created_at
            FROM market_items
            WHERE id = $1
            ",
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ItemRow::into_item).transpose()
    }

    async fn list_items(&self, category: Option<&str>) -> Result<Vec<MarketItem>> {
        let rows = match category {
            Some(category) => {
                sqlx::query_as::<_, ItemRow>(
                    r"
                    SELECT id, name, description, price, currency, category,
                           image, command, is_active, created_at
                    FROM market_items
                    WHERE is_active = TRUE AND category = $1
                    ORDER BY category, price, id
                    ",
                )
                .bind(category)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ItemRow>(
                    r"
                    SELECT id, name, description, price, currency, category,
                           image, command, is_active, created_at
                    FROM market_items
                    WHERE is_active = TRUE
                    ORDER BY category, price, id
                    ",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(ItemRow::into_item).collect()
    }

    async fn item_categories(&self) -> Result<Vec<String>> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM market_items WHERE is_active = TRUE ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn insert_item(&self, draft: &ItemDraft) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r"
            INSERT INTO market_items (
                name, description, price, currency, category, image, command, is_active
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.currency.as_str())
        .bind(&draft.category)
        .bind(&draft.image)
        .bind(&draft.command)
        .bind(draft.is_active)
        .fetch_one(&self.pool)
        .await?;

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
        let column = balance_column(item.currency);
        let mut tx = self.pool.begin().await?;

        // Conditional debit: the balance check and the decrement are one
        // statement, so concurrent purchases serialize on the row and only
        // one can spend funds that cover only one.
        let debit = format!(
            "UPDATE website_users SET {column} = {column} - $2 \
             WHERE username = $1 AND {column} >= $2 RETURNING {column}"
        );
        let new_balance = sqlx::query_scalar::<_, i64>(&debit)
            .bind(username.as_str())
            .bind(item.price)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(new_balance) = new_balance else {
            // Nothing was debited; read back inside the transaction to tell
            // a short balance from a missing profile.
            let select = format!("SELECT {column} FROM website_users WHERE username = $1");
            let balance = sqlx::query_scalar::<_, i64>(&select)
                .bind(username.as_str())
                .fetch_optional(&mut *tx)
                .await?;
            tx.rollback().await?;
            return match balance {
                Some(balance) => Err(StoreError::InsufficientFunds {
                    balance,
                    required: item.price,
                }),
                None => Err(StoreError::NotFound),
            };
        };

        sqlx::query(
            r"
            INSERT INTO user_purchases (id, username, item_id, price, currency, purchase_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(record.id.to_string())
        .bind(record.username.as_str())
        .bind(record.item_id)
        .bind(record.price)
        .bind(record.currency.as_str())
        .bind(record.purchase_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(new_balance)
    }

    async fn purchases_by_user(
        &self,
        username: &Username,
        limit: usize,
    ) -> Result<Vec<PurchaseSummary>> {
        let rows = sqlx::query_as::<_, PurchaseSummaryRow>(
            r"
            SELECT p.id, p.username, p.item_id, p.price, p.currency, p.purchase_date,
                   m.name AS item_name, m.image AS item_image
            FROM user_purchases p
            JOIN market_items m ON m.id = p.item_id
            WHERE p.username = $1
            ORDER BY p.purchase_date DESC, p.id DESC
            LIMIT $2
            ",
        )
        .bind(username.as_str())
        .bind(bind_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(PurchaseSummaryRow::into_summary)
            .collect()
    }

    // =========================================================================
    // News Operations
    // =========================================================================

    async fn list_news(&self, limit: usize, offset: usize) -> Result<(Vec<NewsPost>, u64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM news")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, NewsRow>(
            r"
            SELECT id, title, content, author, image, category,
                   is_featured, created_at, updated_at
            FROM news
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(bind_limit(limit))
        .bind(bind_limit(offset))
        .fetch_all(&self.pool)
        .await?;

        let posts = rows.into_iter().map(NewsRow::into_post).collect();
        Ok((posts, u64::try_from(total).unwrap_or(0)))
    }

    async fn featured_news(&self, limit: usize) -> Result<Vec<NewsPost>> {
        let rows = sqlx::query_as::<_, NewsRow>(
            r"
            SELECT id, title, content, author, image, category,
                   is_featured, created_at, updated_at
            FROM news
            WHERE is_featured = TRUE
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            ",
        )
        .bind(bind_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(NewsRow::into_post).collect())
    }

    async fn insert_news(&self, draft: &NewsDraft) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r"
            INSERT INTO news (title, content, author, image, category, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(&draft.author)
        .bind(&draft.image)
        .bind(&draft.category)
        .bind(draft.is_featured)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    // =========================================================================
    // Toplist Operations
    // =========================================================================

    async fn top_donors(&self, limit: usize) -> Result<Vec<DonorEntry>> {
        let rows = sqlx::query_as::<_, DonorRow>(
            r"
            SELECT d.username,
                   w.avatar,
                   w.rank_name,
                   SUM(d.amount_cents)::BIGINT AS total_cents
            FROM donations d
            LEFT JOIN website_users w ON w.username = d.username
            GROUP BY d.username, w.avatar, w.rank_name
            ORDER BY total_cents DESC, d.username
            LIMIT $1
            ",
        )
        .bind(bind_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DonorRow::into_entry).collect()
    }

    async fn top_playtime(&self, limit: usize) -> Result<Vec<PlaytimeEntry>> {
        let rows = sqlx::query_as::<_, PlaytimeRow>(
            r"
            SELECT username, avatar, rank_name, total_playtime, is_online
            FROM website_users
            ORDER BY total_playtime DESC, username
            LIMIT $1
            ",
        )
        .bind(bind_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PlaytimeRow::into_entry).collect()
    }

    async fn record_donation(&self, username: &Username, amount_cents: i64) -> Result<()> {
        sqlx::query("INSERT INTO donations (username, amount_cents) VALUES ($1, $2)")
            .bind(username.as_str())
            .bind(amount_cents)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Server Status Operations
    // =========================================================================

    async fn latest_status(&self) -> Result<Option<ServerStatus>> {
        let row = sqlx::query_as::<_, StatusRow>(
            r"
            SELECT server_name, online_players, max_players, is_online, last_updated
            FROM server_stats
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StatusRow::into_status))
    }

    async fn put_status(&self, status: &ServerStatus) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO server_stats (id, server_name, online_players, max_players, is_online, last_updated)
            VALUES (1, $1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                server_name = EXCLUDED.server_name,
                online_players = EXCLUDED.online_players,
                max_players = EXCLUDED.max_players,
                is_online = EXCLUDED.is_online,
                last_updated = EXCLUDED.last_updated
            ",
        )
        .bind(&status.server_name)
        .bind(status.online_players)
        .bind(status.max_players)
        .bind(status.is_online)
        .bind(status.last_updated)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Row types
// ============================================================================

fn parse_username(raw: &str) -> Result<Username> {
    Username::parse(raw)
        .map_err(|e| StoreError::Unavailable(format!("invalid stored username {raw:?}: {e}")))
}

fn parse_currency(raw: &str) -> Result<Currency> {
    Currency::from_str(raw)
        .map_err(|e| StoreError::Unavailable(format!("invalid stored currency: {e}")))
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    username: String,
    realname: String,
    password: String,
    ip: Option<String>,
    lastlogin: Option<i64>,
    x: f64,
    y: f64,
    z: f64,
    world: String,
    regdate: i64,
    regip: Option<String>,
    yaw: Option<f32>,
    pitch: Option<f32>,
    email: Option<String>,
    is_logged: i16,
    has_session: i16,
}

impl CredentialRow {
    fn into_record(self) -> Result<CredentialRecord> {
        Ok(CredentialRecord {
            username: parse_username(&self.username)?,
            realname: self.realname,
            password: self.password,
            ip: self.ip,
            lastlogin: self.lastlogin,
            x: self.x,
            y: self.y,
            z: self.z,
            world: self.world,
            regdate: self.regdate,
            regip: self.regip,
            yaw: self.yaw,
            pitch: self.pitch,
            email: self.email,
            is_logged: self.is_logged,
            has_session: self.has_session,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    username: String,
    email: Option<String>,
    avatar: String,
    coins: i64,
    tokens: i64,
    rank_name: String,
    join_date: DateTime<Utc>,
    last_online: DateTime<Utc>,
    total_playtime: i64,
    is_online: bool,
}

impl ProfileRow {
    fn into_profile(self) -> Result<PlayerProfile> {
        Ok(PlayerProfile {
            username: parse_username(&self.username)?,
            email: self.email,
            avatar: self.avatar,
            coins: self.coins,
            tokens: self.tokens,
            rank_name: self.rank_name,
            join_date: self.join_date,
            last_online: self.last_online,
            total_playtime: self.total_playtime,
            is_online: self.is_online,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i64,
    name: String,
    description: String,
    price: i64,
    currency: String,
    category: String,
    image: Option<String>,
    command: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_item(self) -> Result<MarketItem> {
        Ok(MarketItem {
            id: self.id,
            name: self.name,
            description: self.description,
            price: self.price,
            currency: parse_currency(&self.currency)?,
            category: self.category,
            image: self.image,
            command: self.command,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PurchaseSummaryRow {
    id: String,
    username: String,
    item_id: i64,
    price: i64,
    currency: String,
    purchase_date: DateTime<Utc>,
    item_name: String,
    item_image: Option<String>,
}

impl PurchaseSummaryRow {
    fn into_summary(self) -> Result<PurchaseSummary> {
        let id = PurchaseId::from_str(&self.id)
            .map_err(|e| StoreError::Unavailable(format!("invalid stored purchase id: {e}")))?;
        Ok(PurchaseSummary {
            purchase: PurchaseRecord {
                id,
                username: parse_username(&self.username)?,
                item_id: self.item_id,
                price: self.price,
                currency: parse_currency(&self.currency)?,
                purchase_date: self.purchase_date,
            },
            item_name: self.item_name,
            item_image: self.item_image,
        })
    }
}

#[derive(sqlx::FromRow)]
struct NewsRow {
    id: i64,
    title: String,
    content: String,
    author: String,
    image: Option<String>,
    category: String,
    is_featured: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl NewsRow {
    fn into_post(self) -> NewsPost {
        NewsPost {
            id: self.id,
            title: self.title,
            content: self.content,
            author: self.author,
            image: self.image,
            category: self.category,
            is_featured: self.is_featured,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DonorRow {
    username: String,
    avatar: Option<String>,
    rank_name: Option<String>,
    total_cents: i64,
}

impl DonorRow {
    fn into_entry(self) -> Result<DonorEntry> {
        Ok(DonorEntry {
            username: parse_username(&self.username)?,
            avatar: self.avatar,
            rank_name: self.rank_name,
            total_cents: self.total_cents,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PlaytimeRow {
    username: String,
    avatar: String,
    rank_name: String,
    total_playtime: i64,
    is_online: bool,
}

impl PlaytimeRow {
    fn into_entry(self) -> Result<PlaytimeEntry> {
        Ok(PlaytimeEntry {
            username: parse_username(&self.username)?,
            avatar: self.avatar,
            rank_name: self.rank_name,
            total_playtime: self.total_playtime,
            is_online: self.is_online,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StatusRow {
    server_name: String,
    online_players: i32,
    max_players: i32,
    is_online: bool,
    last_updated: DateTime<Utc>,
}

impl StatusRow {
    fn into_status(self) -> ServerStatus {
        ServerStatus {
            server_name: self.server_name,
            online_players: self.online_players,
            max_players: self.max_players,
            is_online: self.is_online,
            last_updated: self.last_updated,
        }
    }
}
