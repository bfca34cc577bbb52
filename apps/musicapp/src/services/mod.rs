//! Application services.

pub mod auth;
pub mod media;

pub use auth::{AuthService, Claims};
pub use media::{BlobStore, LocalBlobStore};
