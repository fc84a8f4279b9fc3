use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid site config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse front matter in {path}: {message}")]
    FrontMatter { path: PathBuf, message: String },

    #[error("{path} has no publishedAt date")]
    MissingPublishedAt { path: PathBuf },

    #[error("{path} has an unreadable publishedAt date {value:?}")]
    InvalidDate { path: PathBuf, value: String },

    #[error("{path} has an invalid slug {slug:?}")]
    InvalidSlug { path: PathBuf, slug: String },

    #[error("duplicate slug {slug:?} in {first} and {second}")]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
}

impl ContentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
