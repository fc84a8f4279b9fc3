use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::cache::ContentCache;
use crate::content_loader::SiteContent;

pub type RefreshBroadcaster = broadcast::Sender<()>;

pub struct AppState {
    pub cache: RwLock<ContentCache>,
    pub content_dir: PathBuf,
    pub is_development: bool,
}

impl AppState {
    pub fn new(cache: ContentCache, content_dir: PathBuf, is_development: bool) -> Self {
        Self {
            cache: RwLock::new(cache),
            content_dir,
            is_development,
        }
    }

    /// The current content snapshot. The lock is released before returning.
    pub async fn content(&self) -> Arc<SiteContent> {
        self.cache.read().await.snapshot()
    }
}

#[derive(Clone)]
pub struct RouterState {
    pub app_state: Arc<AppState>,
    pub broadcaster: RefreshBroadcaster,
}

impl axum::extract::FromRef<RouterState> for Arc<AppState> {
    fn from_ref(state: &RouterState) -> Self {
        state.app_state.clone()
    }
}

impl axum::extract::FromRef<RouterState> for RefreshBroadcaster {
    fn from_ref(state: &RouterState) -> Self {
        state.broadcaster.clone()
    }
}
