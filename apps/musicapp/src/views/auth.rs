//! Authentication views

use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{
    cookie::{Cookie, CookieJar, SameSite},
    Form,
};

use crate::api::auth::{authenticate, LoginOutcome};
use crate::db::queries;
use crate::error::Result;
use crate::forms::{FormErrors, LoginForm, RegisterForm};
use crate::middleware::SESSION_COOKIE;
use crate::services::auth::TOKEN_EXPIRATION_SECS;
use crate::AppState;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

impl LoginTemplate {
    /// The login page shown in place of a page that needs a session.
    pub fn required() -> Self {
        Self { error: None }
    }
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub username: String,
    pub email: String,
    pub errors: FormErrors,
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.config.server.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(::time::Duration::seconds(TOKEN_EXPIRATION_SECS as i64))
        .build()
}

/// Render the login page
pub async fn login_page() -> impl IntoResponse {
    LoginTemplate { error: None }
}

/// Handle login form submission
pub async fn login_submit(
    State(state): State<AppState>,
    cookies: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let user = match authenticate(&state, form.username.trim(), &form.password).await? {
        LoginOutcome::Authenticated(user) => user,
        LoginOutcome::InvalidCredentials => {
            tracing::debug!(username = %form.username, "Invalid login attempt");
            return Ok(LoginTemplate {
                error: Some("Invalid Login".to_string()),
            }
            .into_response());
        }
        LoginOutcome::Disabled => {
            tracing::info!(username = %form.username, "Login refused for disabled account");
            return Ok(LoginTemplate {
                error: Some("Account Disabled!".to_string()),
            }
            .into_response());
        }
    };

    let token = state.auth_service().create_token(user.id, &user.username)?;
    tracing::info!(user_id = user.id, username = %user.username, "User logged in");

    Ok((cookies.add(session_cookie(&state, token)), Redirect::to("/")).into_response())
}

/// Render the registration page
pub async fn register_page() -> impl IntoResponse {
    RegisterTemplate {
        username: String::new(),
        email: String::new(),
        errors: FormErrors::new(),
    }
}

/// Handle registration form submission
pub async fn register_submit(
    State(state): State<AppState>,
    cookies: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let mut errors = form.validate();

    if !errors.has("username") {
        let db = state.db.lock().await;
        if queries::username_exists(&db, form.username())? {
            errors.add("username", "A user with that username already exists.");
        }
    }

    if !errors.is_empty() {
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            RegisterTemplate {
                username: form.username().to_string(),
                email: form.email.trim().to_string(),
                errors,
            },
        )
            .into_response());
    }

    let auth_service = state.auth_service();
    let password_hash = auth_service.hash_password(&form.password)?;
    let user_id = {
        let db = state.db.lock().await;
        queries::insert_user(&db, form.username(), form.email(), &password_hash)?
    };

    tracing::info!(user_id, username = %form.username(), "User registered");

    let token = auth_service.create_token(user_id, form.username())?;
    Ok((cookies.add(session_cookie(&state, token)), Redirect::to("/")).into_response())
}

/// Handle logout
pub async fn logout(cookies: CookieJar) -> impl IntoResponse {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(::time::Duration::ZERO)
        .build();

    (cookies.remove(cookie), Redirect::to("/login"))
}
