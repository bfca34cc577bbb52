//! Configuration module for the music library.
//!
//! Loads configuration from `config.toml` with environment variable overrides.

use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::AppError;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

/// Server configuration
#[derive(Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub jwt_secret: Option<String>,
    /// Mark the session cookie `Secure` (requires HTTPS in front of the app).
    #[serde(default)]
    pub secure_cookies: bool,
}

// Custom Debug implementation to avoid exposing jwt_secret
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "jwt_secret",
                &self.jwt_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            jwt_secret: None,
            secure_cookies: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/musicapp.db")
}

/// Uploaded media (covers and audio files)
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_media_root")]
    pub root: PathBuf,
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: default_media_root(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

impl MediaConfig {
    /// Request body limit applied to upload routes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

fn default_media_root() -> PathBuf {
    PathBuf::from("./data/media")
}

fn default_max_upload_mb() -> usize {
    50
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. `config.toml` in current directory (optional)
    /// 3. Environment variables with `MUSICAPP_` prefix
    ///
    /// Environment variables use double underscore for nesting:
    /// - `MUSICAPP_SERVER__PORT=9000` sets `server.port`
    /// - `MUSICAPP_MEDIA__ROOT=/srv/media` sets `media.root`
    pub fn load() -> Result<Self, AppError> {
        Self::load_from("config.toml")
    }

    /// Load configuration from a specific file path.
    pub fn load_from(config_path: &str) -> Result<Self, AppError> {
        let config = ConfigLoader::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("server.secure_cookies", false)?
            .set_default("database.path", "./data/musicapp.db")?
            .set_default("media.root", "./data/media")?
            .set_default("media.max_upload_mb", 50)?
            .add_source(File::with_name(config_path).required(false))
            // MUSICAPP_SERVER__PORT=9000 -> server.port = 9000
            .add_source(
                Environment::with_prefix("MUSICAPP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.media.max_upload_mb == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "media.max_upload_mb must be greater than zero".to_string(),
            )));
        }

        Ok(())
    }

    /// Get the server socket address
    pub fn server_addr(&self) -> std::net::SocketAddr {
        use std::net::{IpAddr, Ipv4Addr, SocketAddr};
        let ip: IpAddr = self.server.host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid host '{}', using 0.0.0.0", self.server.host);
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        });
        SocketAddr::new(ip, self.server.port)
    }
}
