//! Integration tests for login, registration, logout and the login gate.

mod common;

use axum::http::{header::LOCATION, StatusCode};
use common::{album_form, TestApp};

#[tokio::test]
async fn test_login_page_renders() {
    let app = TestApp::new().await;

    let response = app.server().get("/login").await;

    response.assert_status_ok();
    assert!(response.text().contains("name=\"username\""));
}

#[tokio::test]
async fn test_login_success_sets_session_cookie() {
    let app = TestApp::new().await;
    app.create_test_user("alice", "password123").await;

    let response = app
        .server()
        .post("/login")
        .form(&[("username", "alice"), ("password", "password123")])
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header(LOCATION), "/");

    let cookie = response.cookie("session");
    assert!(!cookie.value().is_empty());
    assert_eq!(cookie.http_only(), Some(true));
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = TestApp::new().await;
    app.create_test_user("alice", "password123").await;

    let response = app
        .server()
        .post("/login")
        .form(&[("username", "alice"), ("password", "wrongpassword")])
        .await;

    response.assert_status_ok();
    assert!(response.text().contains("Invalid Login"));
    assert!(response.maybe_cookie("session").is_none());
}

#[tokio::test]
async fn test_login_nonexistent_user() {
    let app = TestApp::new().await;

    let response = app
        .server()
        .post("/login")
        .form(&[("username", "nobody"), ("password", "password123")])
        .await;

    assert!(response.text().contains("Invalid Login"));
}

#[tokio::test]
async fn test_login_disabled_account() {
    let app = TestApp::new().await;
    let user_id = app.create_test_user("alice", "password123").await;
    app.deactivate_user(user_id).await;

    let response = app
        .server()
        .post("/login")
        .form(&[("username", "alice"), ("password", "password123")])
        .await;

    assert!(response.text().contains("Account Disabled!"));
    assert!(response.maybe_cookie("session").is_none());
}

#[tokio::test]
async fn test_register_creates_user_and_logs_in() {
    let app = TestApp::new().await;

    let response = app
        .server()
        .post("/register")
        .form(&[
            ("username", "new.user"),
            ("email", "new@example.com"),
            ("password", "s3cret"),
        ])
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header(LOCATION), "/");
    assert!(!response.cookie("session").value().is_empty());
    assert_eq!(app.count("users").await, 1);

    // The new account can log in with its password.
    let response = app
        .server()
        .post("/login")
        .form(&[("username", "new.user"), ("password", "s3cret")])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_register_rejects_duplicate_username() {
    let app = TestApp::new().await;
    app.create_test_user("alice", "password123").await;

    let response = app
        .server()
        .post("/register")
        .form(&[("username", "alice"), ("password", "other")])
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response
        .text()
        .contains("A user with that username already exists."));
    assert_eq!(app.count("users").await, 1);
}

#[tokio::test]
async fn test_register_rejects_invalid_username() {
    let app = TestApp::new().await;

    let response = app
        .server()
        .post("/register")
        .form(&[("username", "bad name!"), ("password", "pw")])
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.text().contains("Enter a valid username"));
    assert_eq!(app.count("users").await, 0);
}

#[tokio::test]
async fn test_register_requires_password() {
    let app = TestApp::new().await;

    let response = app
        .server()
        .post("/register")
        .form(&[("username", "alice"), ("password", "")])
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.text().contains("This field is required."));
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::new().await;
    let (_, cookie) = app.login_as("alice").await;
    let (name, value) = cookie;

    let response = app.server().post("/logout").add_header(name, value).await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header(LOCATION), "/login");
    assert_eq!(response.cookie("session").value(), "");
}

#[tokio::test]
async fn test_index_redirects_anonymous_to_login() {
    let app = TestApp::new().await;

    let response = app.server().get("/").await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header(LOCATION), "/login");
}

#[tokio::test]
async fn test_index_rejects_forged_session() {
    let app = TestApp::new().await;
    let user_id = app.create_test_user("alice", "password123").await;

    let forged = musicapp::services::AuthService::new("some-other-secret".to_string())
        .create_token(user_id, "alice")
        .unwrap();

    let response = app
        .server()
        .get("/")
        .add_header(
            axum::http::header::COOKIE,
            axum::http::HeaderValue::from_str(&format!("session={}", forged)).unwrap(),
        )
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_session_of_disabled_account_is_anonymous() {
    let app = TestApp::new().await;
    let (alice, (name, value)) = app.login_as("alice").await;
    app.deactivate_user(alice).await;

    let response = app
        .server()
        .get("/")
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header(LOCATION), "/login");

    let response = app
        .server()
        .post("/albums/new")
        .add_header(name, value)
        .multipart(album_form("Kind of Blue", "Miles Davis", "Jazz", "cover.png"))
        .await;
    response.assert_status_ok();
    assert!(response.text().contains("action=\"/login\""));
    assert_eq!(app.count("albums").await, 0);
    assert_eq!(app.stored_files("covers"), 0);
}

#[tokio::test]
async fn test_session_of_deleted_account_is_anonymous() {
    let app = TestApp::new().await;
    let (alice, (name, value)) = app.login_as("alice").await;
    app.delete_user(alice).await;

    let response = app
        .server()
        .post("/albums/new")
        .add_header(name, value)
        .multipart(album_form("Kind of Blue", "Miles Davis", "Jazz", "cover.png"))
        .await;

    response.assert_status_ok();
    assert!(response.text().contains("action=\"/login\""));
    assert_eq!(app.count("albums").await, 0);
    assert_eq!(app.stored_files("covers"), 0);
}

#[tokio::test]
async fn test_api_rejects_token_of_disabled_account() {
    let app = TestApp::new().await;
    let alice = app.create_test_user("alice", "password123").await;
    let token = app.get_auth_token(alice, "alice");
    app.deactivate_user(alice).await;

    let (name, value) = app.auth_header(&token);
    let response = app.server().get("/api/auth/me").add_header(name, value).await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_api_bearer_wins_over_stale_cookie() {
    let app = TestApp::new().await;
    let alice = app.create_test_user("alice", "password123").await;
    let token = app.get_auth_token(alice, "alice");

    let (name, value) = app.auth_header(&token);
    let response = app
        .server()
        .get("/api/auth/me")
        .add_header(
            axum::http::header::COOKIE,
            axum::http::HeaderValue::from_static("session=expired-garbage"),
        )
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["username"], "alice");
}

#[tokio::test]
async fn test_api_login_trims_username() {
    let app = TestApp::new().await;
    app.create_test_user("alice", "password123").await;

    let response = app
        .server()
        .post("/api/auth/login")
        .json(&serde_json::json!({
            "username": "  alice ",
            "password": "password123"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["user"]["username"], "alice");
}

#[tokio::test]
async fn test_api_login_returns_token() {
    let app = TestApp::new().await;
    let user_id = app.create_test_user("alice", "password123").await;

    let response = app
        .server()
        .post("/api/auth/login")
        .json(&serde_json::json!({
            "username": "alice",
            "password": "password123"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["id"], user_id);
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_api_login_wrong_password() {
    let app = TestApp::new().await;
    app.create_test_user("alice", "password123").await;

    let response = app
        .server()
        .post("/api/auth/login")
        .json(&serde_json::json!({
            "username": "alice",
            "password": "wrong"
        }))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_api_login_disabled_account() {
    let app = TestApp::new().await;
    let user_id = app.create_test_user("alice", "password123").await;
    app.deactivate_user(user_id).await;

    let response = app
        .server()
        .post("/api/auth/login")
        .json(&serde_json::json!({
            "username": "alice",
            "password": "password123"
        }))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_api_me() {
    let app = TestApp::new().await;
    let user_id = app.create_test_user("alice", "password123").await;
    let token = app.get_auth_token(user_id, "alice");
    let (name, value) = app.auth_header(&token);

    let response = app.server().get("/api/auth/me").add_header(name, value).await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["username"], "alice");
    assert_eq!(body["is_active"], true);
}

#[tokio::test]
async fn test_api_me_without_token() {
    let app = TestApp::new().await;

    let response = app.server().get("/api/auth/me").await;

    response.assert_status_unauthorized();
}
