use std::collections::HashMap;
use std::path::{Path, PathBuf};

use gray_matter::{engine::YAML, Matter};
use tokio::fs;
use tracing::{debug, error, info};

use crate::cache::ContentFingerprint;
use crate::config::SiteConfig;
use crate::error::ContentError;
use crate::listing::list_by_recency;
use crate::markdown::render_markdown_to_html;
use crate::models::{is_valid_slug, parse_published_at, FrontMatter, Post, PostMetadata};
use crate::state::AppState;

const POSTS_DIR: &str = "posts";
const SITE_CONFIG_FILE: &str = "site.toml";

/// Everything a page render needs, loaded from the content directory.
#[derive(Debug, Default)]
pub struct SiteContent {
    pub site: SiteConfig,
    pub banner_html: String,
    pub layout_html: String,
    pub home_html: String,
    pub not_found_html: String, // supports {{slug}} placeholder
    /// Ordered most recent first.
    pub posts: Vec<Post>,
}

pub async fn load_content(dir: &Path) -> Result<SiteContent, ContentError> {
    let site = load_site_config(dir).await?;
    let banner_html = read_file(&dir.join("banner.html")).await?;
    let layout_html = read_file(&dir.join("layout.html")).await?;
    let not_found_html = read_file(&dir.join("not_found.html")).await?;

    let home_md = read_file(&dir.join("home.md")).await?;
    let matter = Matter::<YAML>::new();
    let home_body = match matter.parse::<FrontMatter>(&home_md) {
        Ok(parsed) => parsed.content,
        Err(e) => {
            error!("Failed to parse front matter of home.md: {}", e);
            home_md
        }
    };
    let home_html = render_markdown_to_html(&home_body);

    let posts = load_all_posts(dir).await?;

    Ok(SiteContent {
        site,
        banner_html,
        layout_html,
        home_html,
        not_found_html,
        posts: list_by_recency(&posts),
    })
}

async fn load_site_config(dir: &Path) -> Result<SiteConfig, ContentError> {
    let path = dir.join(SITE_CONFIG_FILE);
    match fs::read_to_string(&path).await {
        Ok(raw) => SiteConfig::parse(&raw).map_err(|source| ContentError::Config { path, source }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No {} found, using default site config", SITE_CONFIG_FILE);
            Ok(SiteConfig::default())
        }
        Err(e) => Err(ContentError::io(path, e)),
    }
}

async fn read_file(path: &Path) -> Result<String, ContentError> {
    fs::read_to_string(path)
        .await
        .map_err(|e| ContentError::io(path, e))
}

fn is_post_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "md" || ext == "mdx")
}

/// Loads every post under `<dir>/posts`. Unreadable or malformed files are
/// logged and skipped; a slug used by two files fails the whole load.
pub async fn load_all_posts(dir: &Path) -> Result<Vec<Post>, ContentError> {
    let posts_dir = dir.join(POSTS_DIR);
    let exists = fs::try_exists(&posts_dir)
        .await
        .map_err(|e| ContentError::io(&posts_dir, e))?;
    if !exists {
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&posts_dir)
        .await
        .map_err(|e| ContentError::io(&posts_dir, e))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ContentError::io(&posts_dir, e))?
    {
        let path = entry.path();
        if is_post_file(&path) {
            paths.push(path);
        }
    }
    // read_dir order is platform dependent
    paths.sort();

    let mut posts: Vec<Post> = Vec::with_capacity(paths.len());
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for path in paths {
        let post = match read_file(&path)
            .await
            .and_then(|file_content| parse_post(&path, &file_content))
        {
            Ok(post) => post,
            Err(e) => {
                error!("Skipping post: {}", e);
                continue;
            }
        };

        if let Some(first) = seen.get(&post.slug) {
            return Err(ContentError::DuplicateSlug {
                slug: post.slug,
                first: first.clone(),
                second: path,
            });
        }
        seen.insert(post.slug.clone(), path);
        posts.push(post);
    }

    debug!("Loaded {} posts from {}", posts.len(), posts_dir.display());
    Ok(posts)
}

/// Builds a post from one content file. The slug comes from the front-matter
/// when set, otherwise from the file name.
pub fn parse_post(path: &Path, file_content: &str) -> Result<Post, ContentError> {
    let matter = Matter::<YAML>::new();
    let parsed = matter
        .parse::<FrontMatter>(file_content)
        .map_err(|e| ContentError::FrontMatter {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    let front_matter = parsed.data.unwrap_or_default();

    let slug = match front_matter.slug {
        Some(slug) => slug,
        None => path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string(),
    };
    if !is_valid_slug(&slug) {
        return Err(ContentError::InvalidSlug {
            path: path.to_path_buf(),
            slug,
        });
    }

    let raw_date = front_matter
        .published_at
        .ok_or_else(|| ContentError::MissingPublishedAt {
            path: path.to_path_buf(),
        })?;
    let published_at =
        parse_published_at(&raw_date).ok_or_else(|| ContentError::InvalidDate {
            path: path.to_path_buf(),
            value: raw_date.clone(),
        })?;

    Ok(Post {
        slug,
        published_at,
        metadata: PostMetadata {
            title: front_matter.title,
            summary: front_matter.summary.filter(|s| !s.trim().is_empty()),
            image: front_matter.image.filter(|s| !s.trim().is_empty()),
            tags: front_matter.tags,
            demo: front_matter.demo,
            code: front_matter.code,
        },
        body_html: render_markdown_to_html(&parsed.content),
    })
}

/// Re-reads the content directory unless its fingerprint is unchanged.
/// On failure the previous snapshot stays in place.
pub async fn reload_content(app_state: &AppState) {
    let dir = &app_state.content_dir;
    let fingerprint = match ContentFingerprint::compute(dir).await {
        Ok(fingerprint) => fingerprint,
        Err(e) => {
            error!("Failed to fingerprint content: {}", e);
            return;
        }
    };

    if !app_state.cache.read().await.is_stale(&fingerprint) {
        debug!("Content unchanged, skipping reload");
        return;
    }

    info!("Reloading application content...");
    match load_content(dir).await {
        Ok(content) => {
            let post_count = content.posts.len();
            app_state.cache.write().await.store(content, fingerprint);
            info!(post_count, "Content successfully reloaded.");
        }
        Err(e) => {
            error!("Failed to reload content: {}", e);
        }
    }
}
