//! Authentication API endpoints.

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::db::{models::User, queries};
use crate::error::{AppError, Result};
use crate::middleware::Principal;
use crate::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response with JWT token.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Result of checking a username/password pair.
#[derive(Debug)]
pub enum LoginOutcome {
    Authenticated(User),
    InvalidCredentials,
    Disabled,
}

/// Checks credentials against the user table.
///
/// Unknown usernames still pay for one Argon2 verification.
pub async fn authenticate(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<LoginOutcome> {
    let user = {
        let db = state.db.lock().await;
        queries::find_user_by_username(&db, username)?
    };

    let auth_service = state.auth_service();
    let Some(user) = user else {
        auth_service.verify_dummy(password);
        return Ok(LoginOutcome::InvalidCredentials);
    };

    if !auth_service.verify_password(password, &user.password_hash)? {
        return Ok(LoginOutcome::InvalidCredentials);
    }
    if !user.is_active {
        return Ok(LoginOutcome::Disabled);
    }

    Ok(LoginOutcome::Authenticated(user))
}

/// POST /api/auth/login
///
/// Authenticates a user and returns a JWT token.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let username = body.username.trim();
    if username.is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let user = match authenticate(&state, username, &body.password).await? {
        LoginOutcome::Authenticated(user) => user,
        LoginOutcome::InvalidCredentials => return Err(AppError::Unauthorized),
        LoginOutcome::Disabled => {
            tracing::info!(username = %username, "Login refused for disabled account");
            return Err(AppError::Unauthorized);
        }
    };

    let token = state.auth_service().create_token(user.id, &user.username)?;

    tracing::info!(user_id = user.id, username = %user.username, "User logged in via API");

    Ok(Json(LoginResponse { token, user }))
}

/// GET /api/auth/me
///
/// Returns the current authenticated user's information.
pub async fn me(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<User>> {
    let db = state.db.lock().await;
    let user = queries::get_user(&db, principal.user_id)?;
    Ok(Json(user))
}
