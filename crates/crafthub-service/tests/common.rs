//! Common test utilities for crafthub integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::Router;
use axum_test::TestServer;
use serde_json::json;

use crafthub_core::PurchaseId;
use crafthub_service::{create_router, AppState, FulfillmentSink, ServiceConfig};
use crafthub_store::MemStore;

/// Session signing secret used by every test server.
pub const SESSION_SECRET: &str = "test-session-secret";

/// Admin API key used by every test server.
pub const ADMIN_KEY: &str = "test-admin-key";

/// A fulfillment sink that records every emitted command.
#[derive(Default)]
pub struct RecordingSink {
    commands: Mutex<Vec<(PurchaseId, String)>>,
}

impl RecordingSink {
    /// Snapshot of the commands emitted so far.
    pub fn commands(&self) -> Vec<(PurchaseId, String)> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl FulfillmentSink for RecordingSink {
    async fn deliver(&self, purchase_id: &PurchaseId, command: &str) {
        self.commands
            .lock()
            .unwrap()
            .push((*purchase_id, command.to_string()));
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The in-memory store behind the server.
    pub store: Arc<MemStore>,
    /// Captures fulfillment commands instead of logging them.
    pub sink: Arc<RecordingSink>,
}

impl TestHarness {
    /// Create a new test harness with a fresh in-memory store.
    ///
    /// Mojang lookups and the status poller are left unconfigured so tests
    /// never touch the network.
    pub fn new() -> Self {
        let store = Arc::new(MemStore::new());
        let sink = Arc::new(RecordingSink::default());

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            database_url: String::new(),
            session_secret: SESSION_SECRET.into(),
            session_ttl_hours: 24,
            admin_api_key: Some(ADMIN_KEY.into()),
            mojang_api_url: None,
            avatar_url_base: "https://crafatar.com/avatars".into(),
            default_avatar: "/images/default-avatar.png".into(),
            status_query_url: None,
            status_poll_seconds: 60,
            server_name: "TestCraft".into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        };

        let mut state = AppState::new(store.clone(), config);
        state.fulfillment = sink.clone();

        let router: Router = create_router(state);
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            sink,
        }
    }

    /// Register a player, asserting success.
    pub async fn register(&self, username: &str, password: &str) {
        let response = self
            .server
            .post("/v1/auth/register")
            .json(&json!({
                "username": username,
                "password": password,
                "email": format!("{}@example.net", username.to_lowercase()),
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
    }

    /// Log in an existing player, returning the session token.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .server
            .post("/v1/auth/login")
            .json(&json!({ "username": username, "password": password }))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        body["token"]
            .as_str()
            .expect("login response has a token")
            .to_string()
    }

    /// Register a player and log in, returning the session token.
    pub async fn register_and_login(&self, username: &str, password: &str) -> String {
        self.register(username, password).await;
        self.login(username, password).await
    }

    /// Seed an active catalog item through the admin API, returning its id.
    pub async fn seed_item(&self, name: &str, price: i64, currency: &str) -> i64 {
        let response = self
            .server
            .post("/v1/admin/items")
            .add_header("x-admin-key", ADMIN_KEY)
            .json(&json!({
                "name": name,
                "description": format!("{name} for testing"),
                "price": price,
                "currency": currency,
                "category": "kits",
                "command": format!("give {{username}} {name}"),
            }))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        body["id"].as_i64().expect("item id")
    }

    /// Credit a player's balance through the admin API.
    pub async fn grant(&self, username: &str, currency: &str, amount: i64) {
        let response = self
            .server
            .post("/v1/admin/grant")
            .add_header("x-admin-key", ADMIN_KEY)
            .json(&json!({
                "username": username,
                "currency": currency,
                "amount": amount,
            }))
            .await;
        response.assert_status_ok();
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Authorization header value for a session token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Sign a session token directly, bypassing login. Used for forged and
/// expired token cases.
pub fn mint_token(username: &str, secret: &str, ttl_hours: i64) -> String {
    #[derive(serde::Serialize)]
    struct Claims {
        sub: String,
        iat: i64,
        exp: i64,
    }

    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: username.to_string(),
        iat: now - 3600,
        exp: now + ttl_hours * 3600,
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("token signs")
}

/// Poll until `check` passes or the deadline expires. Used for asserting on
/// work done by spawned tasks.
pub async fn wait_until<F>(what: &str, mut check: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..100 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {what}");
}
