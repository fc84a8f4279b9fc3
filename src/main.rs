use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::{net::TcpListener, sync::broadcast};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracing::info;

mod cache;
mod config;
mod content_loader;
mod error;
mod feeds;
mod hot_reload;
mod listing;
mod markdown;
mod metadata;
mod models;
mod render;
mod routes;
mod state;

use crate::cache::{ContentCache, ContentFingerprint};
use crate::config::Config;
use crate::content_loader::load_content;
use crate::hot_reload::start_content_watcher;
use crate::state::{AppState, RouterState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("RUST_ENV is set to development: {}", config.is_development);

    let fingerprint = ContentFingerprint::compute(&config.content_dir)
        .await
        .context("Failed to scan content directory")?;
    let content = load_content(&config.content_dir)
        .await
        .context("Failed to load initial content files")?;
    info!(
        post_count = content.posts.len(),
        file_count = fingerprint.file_count(),
        content_dir = %config.content_dir.display(),
        "Content loaded"
    );

    let state = Arc::new(AppState::new(
        ContentCache::new(content, fingerprint),
        config.content_dir.clone(),
        config.is_development,
    ));

    // Hot-reload setup
    let (tx, _rx) = broadcast::channel(1);
    if config.is_development {
        info!("Hot reload enabled. Check logs for file change events.");
        start_content_watcher(tx.clone(), state.clone());
    }

    let app = routes::router(RouterState {
        app_state: state,
        broadcaster: tx,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "listening");
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
