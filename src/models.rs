use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;

/// Front-matter block at the top of a post file.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct FrontMatter {
    pub title: Option<String>,
    pub published_at: Option<String>,
    pub summary: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub demo: Option<String>,
    pub code: Option<String>,
    pub slug: Option<String>,
}

/// Descriptive fields of a post. Nothing here is required.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostMetadata {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub demo: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub slug: String,
    pub published_at: NaiveDateTime,
    pub metadata: PostMetadata,
    pub body_html: String,
}

impl Post {
    pub fn new(slug: impl Into<String>, published_at: NaiveDateTime) -> Self {
        Self {
            slug: slug.into(),
            published_at,
            metadata: PostMetadata::default(),
            body_html: String::new(),
        }
    }

    /// Title for display, falling back to the slug.
    pub fn title(&self) -> &str {
        self.metadata.title.as_deref().unwrap_or(&self.slug)
    }

    /// The project demo link, unless it is missing or marked as redacted.
    pub fn demo_link(&self) -> Option<&str> {
        self.metadata
            .demo
            .as_deref()
            .filter(|demo| !demo.is_empty() && *demo != "Redacted")
    }
}

/// Parses a `publishedAt` value. Date-only values mean midnight.
pub fn parse_published_at(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").ok()
}

/// Slugs are lowercase kebab-case so they can be used as URL path segments.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
