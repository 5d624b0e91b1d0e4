mod models;
mod handlers;
mod services;
mod middleware;
mod config;
mod errors;
mod state;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
    middleware::from_fn,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use tower_sessions::cookie::SameSite;
use tracing_subscriber::EnvFilter;
use crate::{
    config::Config,
    services::{DockerRuntime, MethodCatalog, Provisioner, RedisService},
    state::AppState,
};

/// Web panel for provisioning per-user SS/SSR relays.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// Config file, defaults to config/default
    #[arg(short, long)]
    config: Option<PathBuf>,
}

pub(crate) fn app(state: AppState) -> Router {
    // Session store setup
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_name("session");

    Router::new()
        // Account routes
        .route("/api/user/signup", post(handlers::handle_signup))
        .route("/api/user/login", post(handlers::handle_login))
        .route("/api/user/auth/logout", get(handlers::handle_logout))

        // Panel routes
        .route("/api/user/auth/info", get(handlers::panel_info))
        .route("/api/user/auth/service/create", post(handlers::create_service))

        // Static files
        .nest_service("/static", ServeDir::new("static"))

        // Add middleware
        .layer(from_fn(middleware::require_auth))
        .layer(session_layer)

        // Add state
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Initialize Redis client
    let redis_client = Arc::new(
        redis::Client::open(config.redis.url.as_str()).context("Invalid Redis URL")?,
    );
    let store = Arc::new(RedisService::new(redis_client));

    let catalog = Arc::new(MethodCatalog::standard());
    let runtime = Arc::new(DockerRuntime::new(config.container.clone()));
    let provisioner = Provisioner::new(
        catalog.clone(),
        config.port_range(),
        config.host.address.clone(),
        store.clone(),
        runtime,
    );

    let state = AppState {
        store,
        provisioner: Arc::new(provisioner),
        catalog,
        config: config.clone(),
        bcrypt_cost: bcrypt::DEFAULT_COST,
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(
        "Server running on {}, relays published on {} ports {}..={}",
        addr,
        config.host.address,
        config.port_range().from(),
        config.port_range().to()
    );

    axum::serve(listener, app(state).into_make_service())
        .await
        .context("Failed to start server")?;
    Ok(())
}
