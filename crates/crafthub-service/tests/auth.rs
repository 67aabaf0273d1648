//! Auth bridge integration tests: registration, login, and sessions.

mod common;

use axum::http::StatusCode;
use common::{bearer, mint_token, TestHarness, SESSION_SECRET};
use crafthub_core::{CredentialRecord, Username};
use crafthub_store::Store;
use serde_json::json;

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn register_creates_credential_and_profile() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/auth/register")
        .json(&json!({
            "username": "Steve",
            "password": "hunter22",
            "email": "steve@example.net",
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    // The body is the created profile
    let body: serde_json::Value = response.json();
    assert_eq!(body["username"], "Steve");
    assert_eq!(body["avatar"], "/images/default-avatar.png");
    assert_eq!(body["email"], "steve@example.net");
    assert_eq!(body["coins"], 0);
    assert_eq!(body["tokens"], 0);
    // Registering does not log the player in
    assert!(body.get("token").is_none());

    let username = Username::parse("Steve").unwrap();
    let credential = harness
        .store
        .credential(&username)
        .await
        .unwrap()
        .expect("credential row exists");
    assert_eq!(credential.realname, "Steve");
    // The stored password is a hash, never the plaintext
    assert_ne!(credential.password, "hunter22");
    assert!(credential.password.starts_with("$argon2"));
    assert_eq!(credential.email.as_deref(), Some("steve@example.net"));
    assert!(credential.regdate > 0);

    let profile = harness
        .store
        .profile(&username)
        .await
        .unwrap()
        .expect("profile exists");
    assert_eq!(profile.coins, 0);
    assert_eq!(profile.tokens, 0);
    assert_eq!(profile.rank_name, "default");
}

#[tokio::test]
async fn register_duplicate_username_conflicts() {
    let harness = TestHarness::new();
    harness.register("Steve", "hunter22").await;

    let response = harness
        .server
        .post("/v1/auth/register")
        .json(&json!({
            "username": "Steve",
            "password": "different-pass",
            "email": "other@example.net",
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "conflict");

    // The original credential is untouched
    let username = Username::parse("Steve").unwrap();
    let credential = harness.store.credential(&username).await.unwrap().unwrap();
    assert!(
        crafthub_service::crypto::verify_password("hunter22", &credential.password),
        "first registration's password still applies"
    );
}

#[tokio::test]
async fn register_rejects_bad_usernames() {
    let harness = TestHarness::new();

    for bad in ["ab", "name with spaces", "dash-name", "x".repeat(17).as_str()] {
        let response = harness
            .server
            .post("/v1/auth/register")
            .json(&json!({
                "username": bad,
                "password": "hunter22",
                "email": "a@example.net",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"]["code"], "validation_error", "username {bad:?}");
    }
}

#[tokio::test]
async fn register_rejects_short_password_and_bad_email() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/auth/register")
        .json(&json!({
            "username": "Steve",
            "password": "short",
            "email": "steve@example.net",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = harness
        .server
        .post("/v1/auth/register")
        .json(&json!({
            "username": "Steve",
            "password": "hunter22",
            "email": "not-an-email",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // Neither attempt left a credential behind
    let username = Username::parse("Steve").unwrap();
    assert!(harness.store.credential(&username).await.unwrap().is_none());
}

#[tokio::test]
async fn register_without_email_is_accepted() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/auth/register")
        .json(&json!({ "username": "Steve", "password": "hunter22" }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let username = Username::parse("Steve").unwrap();
    let credential = harness.store.credential(&username).await.unwrap().unwrap();
    assert!(credential.email.is_none());
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn login_returns_working_session_token() {
    let harness = TestHarness::new();
    harness.register("Alex", "hunter22").await;

    let login = harness
        .server
        .post("/v1/auth/login")
        .json(&json!({ "username": "Alex", "password": "hunter22" }))
        .await;
    login.assert_status_ok();

    let body: serde_json::Value = login.json();
    let token = body["token"].as_str().expect("login returns a token");
    assert!(body["expires_at"].is_string());
    assert_eq!(body["profile"]["username"], "Alex");
    assert_eq!(body["profile"]["email"], "alex@example.net");

    let response = harness
        .server
        .get("/v1/players/me")
        .add_header("authorization", bearer(token))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["username"], "Alex");
    assert_eq!(body["email"], "alex@example.net");
}

#[tokio::test]
async fn login_failure_is_uniform_for_unknown_user_and_wrong_password() {
    let harness = TestHarness::new();
    harness.register("Alex", "hunter22").await;

    let wrong_password = harness
        .server
        .post("/v1/auth/login")
        .json(&json!({ "username": "Alex", "password": "not-it" }))
        .await;
    wrong_password.assert_status_unauthorized();

    let unknown_user = harness
        .server
        .post("/v1/auth/login")
        .json(&json!({ "username": "Nobody99", "password": "not-it" }))
        .await;
    unknown_user.assert_status_unauthorized();

    // The two failures are indistinguishable from outside
    let a: serde_json::Value = wrong_password.json();
    let b: serde_json::Value = unknown_user.json();
    assert_eq!(a, b);
    assert_eq!(a["error"]["code"], "invalid_credentials");
}

#[tokio::test]
async fn failed_login_leaves_no_trace() {
    let harness = TestHarness::new();
    harness.register("Alex", "hunter22").await;
    harness.login("Alex", "hunter22").await;

    let username = Username::parse("Alex").unwrap();
    let before = harness.store.profile(&username).await.unwrap().unwrap();

    let response = harness
        .server
        .post("/v1/auth/login")
        .json(&json!({ "username": "Alex", "password": "not-it" }))
        .await;
    response.assert_status_unauthorized();

    let after = harness.store.profile(&username).await.unwrap().unwrap();
    assert_eq!(before.last_online, after.last_online);
}

#[tokio::test]
async fn login_repairs_missing_profile() {
    let harness = TestHarness::new();

    // A credential row with no profile, as left behind by the in-game
    // registration path or an interrupted web registration.
    let username = Username::parse("Herobrine").unwrap();
    let hash = crafthub_service::crypto::hash_password("hunter22").unwrap();
    let record = CredentialRecord::new(
        username.clone(),
        hash,
        Some("h@example.net".to_owned()),
        None,
    );
    harness.store.insert_credential(&record).await.unwrap();
    assert!(harness.store.profile(&username).await.unwrap().is_none());

    let token = harness.login("Herobrine", "hunter22").await;

    let profile = harness
        .store
        .profile(&username)
        .await
        .unwrap()
        .expect("login created the profile");
    assert_eq!(profile.coins, 0);
    assert_eq!(profile.tokens, 0);
    assert_eq!(profile.rank_name, "default");
    assert_eq!(profile.email.as_deref(), Some("h@example.net"));

    // And the session works
    let response = harness
        .server
        .get("/v1/players/me")
        .add_header("authorization", bearer(&token))
        .await;
    response.assert_status_ok();
}

// ============================================================================
// Session tokens
// ============================================================================

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
    let harness = TestHarness::new();

    harness
        .server
        .get("/v1/players/me")
        .await
        .assert_status_unauthorized();

    harness
        .server
        .post("/v1/market/purchase")
        .json(&json!({ "item_id": 1 }))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn garbage_and_forged_tokens_are_unauthorized() {
    let harness = TestHarness::new();
    harness.register("Alex", "hunter22").await;

    let garbage = harness
        .server
        .get("/v1/players/me")
        .add_header("authorization", "Bearer not-a-jwt")
        .await;
    garbage.assert_status_unauthorized();

    // Signed with the wrong secret
    let forged = mint_token("Alex", "some-other-secret", 1);
    let response = harness
        .server
        .get("/v1/players/me")
        .add_header("authorization", bearer(&forged))
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn expired_tokens_are_unauthorized() {
    let harness = TestHarness::new();
    harness.register("Alex", "hunter22").await;

    // Expired two hours ago, well past any clock leeway
    let expired = mint_token("Alex", SESSION_SECRET, -2);
    let response = harness
        .server
        .get("/v1/players/me")
        .add_header("authorization", bearer(&expired))
        .await;

    response.assert_status_unauthorized();
}
