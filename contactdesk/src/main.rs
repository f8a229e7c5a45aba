//! # contactdesk
//!
//! Contact-form and user account backend over MongoDB.
//!
//! Accepts contact-form submissions, tracks whether each one has been handled,
//! and manages user accounts with bcrypt passwords and one-hour login tokens.
//!
//! ## Architecture
//!
//! - **Store**: `users` and `contacts` collections behind async storage traits,
//!   backed by MongoDB or, for local runs, process memory
//! - **Auth**: bcrypt hashing (cost 10) and HS256 JWT issuance at login
//! - **HTTP**: Axum router with permissive CORS, request IDs, tracing and graceful shutdown

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

mod auth;
mod config;
mod http;
mod model;
mod store;

use anyhow::Context;
use axum::serve;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::auth::TokenIssuer;
use crate::config::{load_env_file, AppConfig, Cli};
use crate::http::{router, AppState};
use crate::store::{MemoryStore, MongoStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file = load_env_file(None);
    init_logging().context("failed to initialize logging")?;
    match env_file {
        Ok(Some(path)) => info!(path = %path.display(), "loaded environment file"),
        Ok(None) => debug!("no .env file found"),
        Err(err) => warn!(error = %err, "failed to load .env file"),
    }

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli).context("failed to load configuration")?;
    info!(
        bind = %config.bind,
        in_memory = config.in_memory,
        database_configured = config.mongodb_uri.is_some(),
        database = ?config.database,
        token_secret_configured = config.jwt_secret.is_some(),
        "configuration loaded"
    );

    let store = if config.in_memory {
        warn!("using in-memory store; records are lost on exit");
        Store::from_backend(MemoryStore::new())
    } else {
        Store::from_backend(
            MongoStore::connect(config.mongodb_uri.as_deref(), config.database.as_deref()).await,
        )
    };

    let tokens = TokenIssuer::new(config.jwt_secret);
    if !tokens.is_configured() {
        warn!("JWT_SECRET is not set; every login will fail");
    }

    let app = router(AppState { store, tokens });
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    let shutdown = tokio::signal::ctrl_c();
    info!(bind = %config.bind, "contactdesk listening");

    serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown.await;
            info!("shutting down gracefully");
        })
        .await
        .context("server exited with error")
}

/// Initialize tracing subscriber with `RUST_LOG` env filter (default: `info`).
fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}
