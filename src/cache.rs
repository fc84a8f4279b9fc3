//! Process-wide content cache.
//!
//! Content is parsed once and kept as an immutable `SiteContent` snapshot.
//! A reload only re-reads the content directory when its fingerprint has
//! moved on, or after the cache was explicitly invalidated.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use tokio::fs;

use crate::content_loader::SiteContent;
use crate::error::ContentError;

/// Identity of one file under the content directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileStamp {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: u64,
}

/// Every file under the content directory, sorted by path. Adding, removing,
/// renaming, or rewriting a file changes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFingerprint {
    pub files: Vec<FileStamp>,
}

impl ContentFingerprint {
    pub async fn compute(dir: &Path) -> Result<Self, ContentError> {
        let mut files = Vec::new();
        let mut pending: Vec<PathBuf> = vec![dir.to_path_buf()];

        while let Some(current) = pending.pop() {
            let mut entries = fs::read_dir(&current)
                .await
                .map_err(|e| ContentError::io(&current, e))?;

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| ContentError::io(&current, e))?
            {
                let path = entry.path();
                let metadata = entry
                    .metadata()
                    .await
                    .map_err(|e| ContentError::io(&path, e))?;

                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }

                files.push(FileStamp {
                    path,
                    modified: metadata.modified().ok(),
                    len: metadata.len(),
                });
            }
        }

        files.sort();
        Ok(Self { files })
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

pub struct ContentCache {
    content: Arc<SiteContent>,
    fingerprint: Option<ContentFingerprint>,
}

impl ContentCache {
    pub fn new(content: SiteContent, fingerprint: ContentFingerprint) -> Self {
        Self {
            content: Arc::new(content),
            fingerprint: Some(fingerprint),
        }
    }

    pub fn snapshot(&self) -> Arc<SiteContent> {
        Arc::clone(&self.content)
    }

    pub fn is_stale(&self, current: &ContentFingerprint) -> bool {
        self.fingerprint.as_ref() != Some(current)
    }

    /// Forces the next reload to re-read everything.
    pub fn invalidate(&mut self) {
        self.fingerprint = None;
    }

    pub fn store(&mut self, content: SiteContent, fingerprint: ContentFingerprint) {
        self.content = Arc::new(content);
        self.fingerprint = Some(fingerprint);
    }
}
