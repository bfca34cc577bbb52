//! Request middleware.

pub mod auth;

pub use auth::{
    require_auth, require_login, resolve_session, session_middleware, Principal, Session,
    SESSION_COOKIE,
};
