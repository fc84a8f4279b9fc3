//! Machine-readable outputs: sitemap, RSS feed, and the preview card image.

use crate::content_loader::SiteContent;
use crate::metadata::{format_timestamp, post_url};

fn escape(value: &str) -> String {
    htmlescape::encode_minimal(value)
}

pub fn sitemap_xml(content: &SiteContent) -> String {
    let site = &content.site;
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );

    let latest = content
        .posts
        .first()
        .map(|post| format_timestamp(post.published_at));
    for path in ["/", "/blog"] {
        xml.push_str(&format!("<url><loc>{}</loc>", escape(&site.url_for(path))));
        if let Some(latest) = &latest {
            xml.push_str(&format!("<lastmod>{latest}</lastmod>"));
        }
        xml.push_str("</url>\n");
    }

    for post in &content.posts {
        xml.push_str(&format!(
            "<url><loc>{}</loc><lastmod>{}</lastmod></url>\n",
            escape(&post_url(post, site)),
            format_timestamp(post.published_at)
        ));
    }

    xml.push_str("</urlset>\n");
    xml
}

pub fn rss_xml(content: &SiteContent) -> String {
    let site = &content.site;
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\">\n<channel>\n\
         <title>{}</title>\n<link>{}</link>\n<description>{}</description>\n",
        escape(&site.title),
        escape(&site.url_for("/")),
        escape(&site.description)
    );

    for post in &content.posts {
        let url = escape(&post_url(post, site));
        xml.push_str(&format!(
            "<item>\n<title>{}</title>\n<link>{url}</link>\n<guid>{url}</guid>\n<pubDate>{}</pubDate>\n",
            escape(post.title()),
            post.published_at.and_utc().to_rfc2822()
        ));
        if let Some(summary) = &post.metadata.summary {
            xml.push_str(&format!("<description>{}</description>\n", escape(summary)));
        }
        xml.push_str("</item>\n");
    }

    xml.push_str("</channel>\n</rss>\n");
    xml
}

const CARD_LINE_CHARS: usize = 28;
const CARD_MAX_LINES: usize = 3;

/// A 1200x630 SVG card with the title wrapped onto a few lines.
pub fn og_image_svg(title: &str, site_title: &str) -> String {
    let lines = wrap_title(title);
    let first_y = 315 - (lines.len() as i32 - 1) * 40;

    let mut text = String::new();
    for (i, line) in lines.iter().enumerate() {
        text.push_str(&format!(
            "<text x=\"80\" y=\"{}\" font-size=\"64\" font-weight=\"600\" fill=\"#ffffff\">{}</text>",
            first_y + i as i32 * 80,
            escape(line)
        ));
    }

    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"1200\" height=\"630\" viewBox=\"0 0 1200 630\">\
         <defs><linearGradient id=\"bg\" x1=\"0\" y1=\"0\" x2=\"1\" y2=\"1\">\
         <stop offset=\"0%\" stop-color=\"#4f46e5\"/><stop offset=\"100%\" stop-color=\"#9333ea\"/></linearGradient></defs>\
         <rect width=\"1200\" height=\"630\" fill=\"url(#bg)\"/>{text}\
         <text x=\"80\" y=\"570\" font-size=\"32\" fill=\"#e0e7ff\">{}</text></svg>",
        escape(site_title)
    )
}

fn wrap_title(title: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in title.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > CARD_LINE_CHARS {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.len() > CARD_MAX_LINES {
        lines.truncate(CARD_MAX_LINES);
        if let Some(last) = lines.last_mut() {
            last.push('…');
        }
    }
    lines
}
