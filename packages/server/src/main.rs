use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use common::storage::{AssetStore, open_object_store};
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::coords::{CoordRegistry, spawn_sweeper};
use server::mail::LogMailer;
use server::state::AppState;
use server::utils::throttle::{self, LoginThrottle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = server::database::init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;

    let backend = open_object_store(&config.storage)
        .await
        .context("Failed to open asset storage")?;

    let coords = Arc::new(CoordRegistry::new());
    spawn_sweeper(
        coords.clone(),
        Duration::from_secs(config.session.coords_idle_ttl_secs),
        Duration::from_secs(config.session.sweep_interval_secs.max(1)),
    );

    let login_throttle = Arc::new(LoginThrottle::new(
        config.auth.max_login_attempts,
        Duration::from_secs(config.auth.login_lockout_secs),
    ));
    throttle::spawn_sweeper(
        login_throttle.clone(),
        Duration::from_secs(config.session.sweep_interval_secs.max(1)),
    );

    let state = AppState {
        db,
        assets: AssetStore::new(backend),
        coords,
        mailer: Arc::new(LogMailer::new(config.mail.sender.clone())),
        login_throttle,
        config: config.clone(),
    };

    let app = server::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
