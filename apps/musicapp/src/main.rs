use rand::Rng;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use musicapp::config::Config;
use musicapp::services::{AuthService, LocalBlobStore};
use musicapp::{build_router, db, AppState};

fn init_tracing() {
    // RUST_LOG controls log levels.
    // Default: debug for our crate, info for axum, warn for dependencies
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("musicapp=debug,tower_http=debug,axum=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn random_secret() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// The configured signing secret, or a random one that dies with the process.
fn session_secret(configured: Option<String>) -> String {
    configured.unwrap_or_else(|| {
        tracing::warn!(
            "No JWT secret configured, sessions will not survive a restart. \
             Set MUSICAPP_SERVER__JWT_SECRET for production use"
        );
        random_secret()
    })
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    tracing::debug!(?config, "Configuration loaded");

    if let Some(parent) = config.database.path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::error!("Failed to create database directory {:?}: {}", parent, e);
            std::process::exit(1);
        }
    }
    if let Err(e) = std::fs::create_dir_all(&config.media.root) {
        tracing::error!("Failed to create media root {:?}: {}", config.media.root, e);
        std::process::exit(1);
    }

    let conn = match db::init_db(&config.database.path) {
        Ok(conn) => {
            tracing::info!("Database initialized at {:?}", config.database.path);
            conn
        }
        Err(e) => {
            tracing::error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let jwt_secret = session_secret(config.server.jwt_secret.clone());

    let media = Arc::new(LocalBlobStore::new(config.media.root.clone()));
    let addr = config.server_addr();
    let state = AppState::new(config, conn, AuthService::new(jwt_secret), media);
    let app = build_router(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("musicapp listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
