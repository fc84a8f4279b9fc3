//! SEO, social preview, and structured data for pages.

use chrono::{NaiveDateTime, Timelike};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{json, Value};

use crate::config::SiteConfig;
use crate::models::Post;

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageMetadata {
    pub title: String,
    pub description: Option<String>,
    pub canonical_url: String,
    pub image_url: String,
    /// Set for articles only.
    pub published_time: Option<String>,
}

impl PageMetadata {
    pub fn for_post(post: &Post, site: &SiteConfig) -> Self {
        Self {
            title: post.title().to_string(),
            description: post.metadata.summary.clone(),
            canonical_url: post_url(post, site),
            image_url: preview_image_url(post, site),
            published_time: Some(format_timestamp(post.published_at)),
        }
    }

    pub fn for_page(title: &str, path: &str, site: &SiteConfig) -> Self {
        Self {
            title: title.to_string(),
            description: Some(site.description.clone()),
            canonical_url: site.url_for(path),
            image_url: og_fallback_url(title, site),
            published_time: None,
        }
    }

    /// `<meta>` and `<link>` tags for the layout head.
    pub fn to_head_html(&self) -> String {
        let og_type = if self.published_time.is_some() { "article" } else { "website" };
        let mut head = String::new();

        push_meta(&mut head, "name", "description", self.description.as_deref());
        head.push_str(&format!(
            "<link rel=\"canonical\" href=\"{}\">\n",
            escape(&self.canonical_url)
        ));
        push_meta(&mut head, "property", "og:title", Some(&self.title));
        push_meta(&mut head, "property", "og:description", self.description.as_deref());
        push_meta(&mut head, "property", "og:type", Some(og_type));
        push_meta(&mut head, "property", "og:url", Some(&self.canonical_url));
        push_meta(&mut head, "property", "og:image", Some(&self.image_url));
        push_meta(
            &mut head,
            "property",
            "article:published_time",
            self.published_time.as_deref(),
        );
        push_meta(&mut head, "name", "twitter:card", Some("summary_large_image"));
        push_meta(&mut head, "name", "twitter:title", Some(&self.title));
        push_meta(&mut head, "name", "twitter:description", self.description.as_deref());
        push_meta(&mut head, "name", "twitter:image", Some(&self.image_url));
        head
    }
}

fn push_meta(head: &mut String, attr: &str, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        head.push_str(&format!(
            "<meta {attr}=\"{key}\" content=\"{}\">\n",
            escape(value)
        ));
    }
}

fn escape(value: &str) -> String {
    htmlescape::encode_minimal(value)
}

pub fn post_url(post: &Post, site: &SiteConfig) -> String {
    site.url_for(&format!("/blog/{}", post.slug))
}

/// The generated preview card, used when a page has no image of its own.
pub fn og_fallback_url(title: &str, site: &SiteConfig) -> String {
    format!("{}/og?title={}", site.base_url, encode_component(title))
}

/// The post image made absolute, or the generated preview card.
pub fn preview_image_url(post: &Post, site: &SiteConfig) -> String {
    match post.metadata.image.as_deref() {
        Some(image) if image.starts_with("http://") || image.starts_with("https://") => {
            image.to_string()
        }
        Some(image) => site.url_for(image),
        None => og_fallback_url(post.title(), site),
    }
}

/// Date-only when the post has no time of day.
pub fn format_timestamp(at: NaiveDateTime) -> String {
    if at.num_seconds_from_midnight() == 0 {
        at.format("%Y-%m-%d").to_string()
    } else {
        at.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

/// schema.org `BlogPosting` for a post page.
pub fn blog_posting_json_ld(post: &Post, site: &SiteConfig) -> Value {
    let published = format_timestamp(post.published_at);
    json!({
        "@context": "https://schema.org",
        "@type": "BlogPosting",
        "headline": post.title(),
        "datePublished": published,
        "dateModified": published,
        "description": post.metadata.summary,
        "image": preview_image_url(post, site),
        "url": post_url(post, site),
        "author": {
            "@type": "Person",
            "name": site.author,
        },
    })
}

/// Serializes JSON-LD for embedding in a `<script>` element.
pub fn json_ld_script(value: &Value) -> String {
    let json = value.to_string().replace("</", "<\\/");
    format!("<script type=\"application/ld+json\">{json}</script>")
}

pub fn twitter_share_url(post: &Post, site: &SiteConfig) -> String {
    format!(
        "https://twitter.com/intent/tweet?url={}&text={}",
        encode_component(&post_url(post, site)),
        encode_component(post.title())
    )
}

pub fn linkedin_share_url(post: &Post, site: &SiteConfig) -> String {
    format!(
        "https://www.linkedin.com/sharing/share-offsite/?url={}",
        encode_component(&post_url(post, site))
    )
}
