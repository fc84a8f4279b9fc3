use std::path::PathBuf;

use serde::Deserialize;

const DEFAULT_CONTENT_DIR: &str = "content";
const DEFAULT_PORT: u16 = 8080;

/// Process settings read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub is_development: bool,
    pub port: u16,
    pub content_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let is_development = lookup("RUST_ENV")
            .map(|v| v == "development")
            .unwrap_or(false);
        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let content_dir = lookup("CONTENT_DIR")
            .filter(|dir| !dir.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_DIR.to_string())
            .into();

        Self {
            is_development,
            port,
            content_dir,
        }
    }
}

/// Site-wide settings from `site.toml` in the content directory.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub author: String,
    pub description: String,
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "My Portfolio".to_string(),
            author: "My Portfolio".to_string(),
            description: "Projects and writing.".to_string(),
            base_url: "http://localhost:8080".to_string(),
        }
    }
}

impl SiteConfig {
    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        let mut config: SiteConfig = toml::from_str(raw)?;
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(config)
    }

    /// Absolute URL for a site path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Up to two initials of the author name, for the avatar badge.
    pub fn author_initials(&self) -> String {
        self.author
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}
