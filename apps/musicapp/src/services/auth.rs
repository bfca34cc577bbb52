//! Authentication service.
//!
//! Provides password hashing with Argon2 and JWT session tokens.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Valid Argon2 hash that never matches; verified against for unknown
/// usernames so a failed login takes the same time either way.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nYXR0YWNr$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// JWT claims carried by the session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: i64,
    /// Username at the time the token was issued
    pub username: String,
    /// Expiration timestamp (Unix time)
    pub exp: usize,
    /// Issued at timestamp (Unix time)
    pub iat: usize,
}

/// Token expiration duration in seconds (24 hours).
pub const TOKEN_EXPIRATION_SECS: usize = 24 * 60 * 60;

/// Authentication service handling password hashing and JWT tokens.
pub struct AuthService {
    jwt_secret: String,
    argon2: Argon2<'static>,
}

impl AuthService {
    pub fn new(jwt_secret: String) -> Self {
        Self {
            jwt_secret,
            argon2: Argon2::default(),
        }
    }

    /// Hashes a password using Argon2, returning the PHC string.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Verifies a password against a stored hash.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash format: {}", e)))?;

        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Runs a verification that always fails, for logins with unknown usernames.
    pub fn verify_dummy(&self, password: &str) {
        let _ = self.verify_password(password, DUMMY_HASH);
    }

    pub fn create_token(&self, user_id: i64, username: &str) -> Result<String> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| AppError::Internal(format!("System time error: {}", e)))?
            .as_secs() as usize;

        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            exp: now + TOKEN_EXPIRATION_SECS,
            iat: now,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token creation failed: {}", e)))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            tracing::debug!("Token verification failed: {}", e);
            AppError::Unauthorized
        })?;

        Ok(token_data.claims)
    }
}
