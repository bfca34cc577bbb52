//! Session resolution and authentication gates.
//!
//! Every request gets a [`Session`] in its extensions, resolved from the
//! session cookie or a Bearer token. Handlers receive it explicitly instead
//! of reading ambient state.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde::Serialize;

use crate::db::queries;
use crate::error::{AppError, Result};
use crate::services::{AuthService, Claims};
use crate::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
        }
    }
}

/// Per-request authentication context.
#[derive(Debug, Clone, Default)]
pub struct Session {
    principal: Option<Principal>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.principal.as_ref().map(|p| p.user_id)
    }
}

/// Extracts the Bearer token from the Authorization header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolves the session from the cookie, falling back to a Bearer token.
///
/// A cookie that fails verification does not shadow a valid Bearer token.
/// Invalid or expired tokens yield an anonymous session.
pub fn resolve_session(auth_service: &AuthService, headers: &HeaderMap) -> Session {
    let jar = CookieJar::from_headers(headers);
    let cookie_token = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string());
    let bearer_token = extract_bearer_token(headers).map(str::to_string);

    cookie_token
        .into_iter()
        .chain(bearer_token)
        .filter(|token| !token.is_empty())
        .find_map(|token| auth_service.verify_token(&token).ok())
        .map(|claims| Session::authenticated(claims.into()))
        .unwrap_or_default()
}

/// Keeps the session only while its account exists and is active.
async fn confirm_account(state: &AppState, session: Session) -> Session {
    let Some(user_id) = session.user_id() else {
        return session;
    };

    let db = state.db.lock().await;
    match queries::get_user(&db, user_id) {
        Ok(user) if user.is_active => Session::authenticated(Principal {
            user_id: user.id,
            username: user.username,
        }),
        Ok(_) => {
            tracing::debug!(user_id, "Ignoring session of disabled account");
            Session::anonymous()
        }
        Err(AppError::NotFound(_)) => {
            tracing::debug!(user_id, "Ignoring session of deleted account");
            Session::anonymous()
        }
        Err(e) => {
            tracing::warn!(user_id, error = %e, "Failed to load session account");
            Session::anonymous()
        }
    }
}

/// Inserts the resolved [`Session`] into the request extensions.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let session = resolve_session(state.auth_service(), request.headers());
    let session = confirm_account(&state, session).await;
    request.extensions_mut().insert(session);
    next.run(request).await
}

fn current_principal(request: &Request<Body>) -> Option<Principal> {
    request
        .extensions()
        .get::<Session>()
        .and_then(Session::principal)
        .cloned()
}

/// Redirects anonymous requests to the login page, otherwise exposes the
/// [`Principal`] as its own extension.
///
/// Must be layered inside `session_middleware`.
pub async fn require_login(mut request: Request<Body>, next: Next) -> Response {
    match current_principal(&request) {
        Some(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        None => Redirect::to("/login").into_response(),
    }
}

/// Rejects anonymous API requests with 401 and exposes the [`Principal`]
/// as its own extension.
///
/// Must be layered inside `session_middleware`.
pub async fn require_auth(mut request: Request<Body>, next: Next) -> Result<Response> {
    let principal = current_principal(&request).ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
