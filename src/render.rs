use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::content_loader::SiteContent;
use crate::listing::{pick_related, RELATED_POSTS_LIMIT};
use crate::metadata::{
    blog_posting_json_ld, json_ld_script, linkedin_share_url, twitter_share_url, PageMetadata,
};
use crate::models::Post;

const HOT_RELOAD_SCRIPT: &str = r#"
<script>
    const socket = new WebSocket("ws://" + window.location.host + "/ws");
    socket.onmessage = (event) => {
        if (event.data === "reload") {
            window.location.reload();
        }
    };
</script>
"#;

const SIDEBAR_POSTS: usize = 5;

/// A rendered page body plus what the layout head needs.
pub struct Page {
    pub title: String,
    pub metadata: PageMetadata,
    pub body: String,
}

fn escape(value: &str) -> String {
    htmlescape::encode_minimal(value)
}

/// Replaces `{{ name }}` placeholders in one pass, so substituted values are
/// never scanned again. Unknown placeholders are left as they are.
pub fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start..].find("}}") else {
            break;
        };
        let key = rest[start + 2..start + len].trim();
        out.push_str(&rest[..start]);
        match values.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + len + 2]),
        }
        rest = &rest[start + len + 2..];
    }

    out.push_str(rest);
    out
}

pub fn render_with_layout(content: &SiteContent, page: &Page, is_development: bool) -> String {
    let title = if page.title == content.site.title {
        escape(&page.title)
    } else {
        format!("{} | {}", escape(&page.title), escape(&content.site.title))
    };
    let head = page.metadata.to_head_html();
    let sidebar = recent_posts_sidebar(&content.posts);

    let mut html = fill_placeholders(
        &content.layout_html,
        &[
            ("title", title.as_str()),
            ("head", head.as_str()),
            ("banner", content.banner_html.as_str()),
            ("posts", sidebar.as_str()),
            ("content", page.body.as_str()),
        ],
    );

    if is_development {
        // the layout's closing tag is the last one
        if let Some(at) = html.rfind("</body>") {
            html.insert_str(at, HOT_RELOAD_SCRIPT);
        }
    }

    html
}

fn recent_posts_sidebar(posts: &[Post]) -> String {
    posts
        .iter()
        .take(SIDEBAR_POSTS)
        .map(|post| {
            format!(
                "<li><a href=\"/blog/{}\" class=\"text-blue no-underline\">{}</a></li>",
                post.slug,
                escape(post.title())
            )
        })
        .collect()
}

/// `March 1, 2024`, optionally followed by the age, e.g. `(2mo ago)`.
pub fn format_date(at: NaiveDateTime, today: NaiveDate, include_relative: bool) -> String {
    let full_date = at.format("%B %-d, %Y").to_string();
    if !include_relative {
        return full_date;
    }

    let date = at.date();
    let years_ago = today.year() - date.year();
    let months_ago = today.month() as i64 - date.month() as i64;
    let days_ago = today.day() as i64 - date.day() as i64;

    let relative = if years_ago > 0 {
        format!("{years_ago}y ago")
    } else if months_ago > 0 {
        format!("{months_ago}mo ago")
    } else if days_ago > 0 {
        format!("{days_ago}d ago")
    } else {
        "Today".to_string()
    };

    format!("{full_date} ({relative})")
}

/// Post cards, in the order given.
pub fn post_list_html(posts: &[Post], today: NaiveDate) -> String {
    if posts.is_empty() {
        return "<p class=\"empty\">No posts yet.</p>".to_string();
    }

    let mut html = String::from("<div class=\"space-y-6 post-list\">");
    for post in posts {
        html.push_str(&format!(
            "<a href=\"/blog/{slug}\" class=\"block group post-card\"><div class=\"flex flex-col space-y-2\">\
             <div class=\"flex justify-between\"><h3>{title}</h3><time datetime=\"{datetime}\">{date}</time></div>",
            slug = post.slug,
            title = escape(post.title()),
            datetime = post.published_at.format("%Y-%m-%d"),
            date = format_date(post.published_at, today, false),
        ));
        if let Some(summary) = &post.metadata.summary {
            html.push_str(&format!("<p class=\"summary line-clamp-2\">{}</p>", escape(summary)));
        }
        html.push_str("<span class=\"read-more\">Read more &rarr;</span></div></a>");
    }
    html.push_str("</div>");
    html
}

pub fn home_page(content: &SiteContent, today: NaiveDate) -> Page {
    let site = &content.site;
    let body = format!(
        "<section><h1 class=\"mb-8 text-2xl font-semibold\">{}</h1>{}<div class=\"my-8\">{}</div></section>",
        escape(&site.title),
        content.home_html,
        post_list_html(&content.posts, today)
    );
    Page {
        title: site.title.clone(),
        metadata: PageMetadata::for_page(&site.title, "/", site),
        body,
    }
}

pub fn blog_index_page(content: &SiteContent, today: NaiveDate) -> Page {
    let body = format!(
        "<section><h1 class=\"mb-8 text-2xl font-semibold\">Blog</h1>{}</section>",
        post_list_html(&content.posts, today)
    );
    Page {
        title: "Blog".to_string(),
        metadata: PageMetadata::for_page("Blog", "/blog", &content.site),
        body,
    }
}

pub fn post_page(content: &SiteContent, post: &Post, today: NaiveDate) -> Page {
    let site = &content.site;
    let title = escape(post.title());
    let mut body = String::from("<section class=\"max-w-3xl mx-auto px-4\">");

    body.push_str(&json_ld_script(&blog_posting_json_ld(post, site)));

    body.push_str(&format!(
        "<nav class=\"breadcrumb\"><a href=\"/\">Home</a><span>/</span><a href=\"/blog\">Blog</a>\
         <span>/</span><span class=\"truncate\">{title}</span></nav>"
    ));

    if let Some(image) = &post.metadata.image {
        body.push_str(&format!(
            "<div class=\"featured-image\"><img src=\"{}\" alt=\"{title}\"></div>",
            escape(image)
        ));
    }

    body.push_str(&format!("<div class=\"article-header\"><h1>{title}</h1>"));
    if let Some(summary) = &post.metadata.summary {
        body.push_str(&format!("<p class=\"summary\">{}</p>", escape(summary)));
    }
    body.push_str(&format!(
        "<div class=\"byline\"><span class=\"avatar\">{}</span><div><p class=\"author\">{}</p>\
         <time datetime=\"{}\">{}</time></div></div>",
        escape(&site.author_initials()),
        escape(&site.author),
        post.published_at.format("%Y-%m-%d"),
        format_date(post.published_at, today, true)
    ));
    if !post.metadata.tags.is_empty() {
        body.push_str("<ul class=\"tags\">");
        for tag in &post.metadata.tags {
            body.push_str(&format!("<li>{}</li>", escape(tag)));
        }
        body.push_str("</ul>");
    }
    body.push_str("</div>");

    let demo = post.demo_link();
    let code = post.metadata.code.as_deref().filter(|c| !c.is_empty());
    if demo.is_some() || code.is_some() {
        body.push_str("<div class=\"project-links\">");
        if let Some(demo) = demo {
            body.push_str(&format!("<a href=\"{}\" class=\"button\">Live link</a>", escape(demo)));
        }
        if let Some(code) = code {
            body.push_str(&format!("<a href=\"{}\" class=\"button\">Code</a>", escape(code)));
        }
        body.push_str("</div>");
    }

    body.push_str(&format!("<article class=\"prose\">{}</article>", post.body_html));

    body.push_str(&format!(
        "<div class=\"article-footer\"><a href=\"/blog\">Back to All Posts</a><div class=\"share\">\
         <a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">Share on Twitter</a>\
         <a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">Share on LinkedIn</a></div></div>",
        escape(&twitter_share_url(post, site)),
        escape(&linkedin_share_url(post, site))
    ));

    let related = pick_related(&content.posts, &post.slug, RELATED_POSTS_LIMIT);
    if !related.is_empty() {
        body.push_str(&related_posts_html(&related, today));
    }

    body.push_str("</section>");

    Page {
        title: post.title().to_string(),
        metadata: PageMetadata::for_post(post, site),
        body,
    }
}

fn related_posts_html(related: &[Post], today: NaiveDate) -> String {
    let mut html = String::from("<div class=\"related\"><h2>Related Articles</h2><div class=\"grid\">");
    for post in related {
        html.push_str(&format!(
            "<a href=\"/blog/{}\" class=\"related-card\"><h3>{}</h3><time>{}</time>",
            post.slug,
            escape(post.title()),
            format_date(post.published_at, today, false)
        ));
        if let Some(summary) = &post.metadata.summary {
            html.push_str(&format!("<p class=\"line-clamp-2\">{}</p>", escape(summary)));
        }
        html.push_str("</a>");
    }
    html.push_str("</div></div>");
    html
}

pub fn not_found_page(content: &SiteContent, slug: &str) -> Page {
    let slug = escape(slug);
    let body = fill_placeholders(&content.not_found_html, &[("slug", slug.as_str())]);
    Page {
        title: "Not Found".to_string(),
        metadata: PageMetadata::for_page("Not Found", "/", &content.site),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::models::parse_published_at;
    use scraper::{Html, Selector};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
    }

    fn post(slug: &str, title: &str, date: &str) -> Post {
        let mut post = Post::new(slug, parse_published_at(date).unwrap());
        post.metadata.title = Some(title.to_string());
        post
    }

    fn content(posts: Vec<Post>) -> SiteContent {
        SiteContent {
            site: SiteConfig {
                title: "Jane Doe".to_string(),
                author: "Jane Doe".to_string(),
                base_url: "https://jane.dev".to_string(),
                ..SiteConfig::default()
            },
            layout_html: "<html><head><title>{{ title }}</title>{{ head }}</head><body>{{ banner }}<ul>{{ posts }}</ul><main>{{ content }}</main></body></html>".to_string(),
            banner_html: "<header>JD</header>".to_string(),
            home_html: "<p>I build data pipelines.</p>".to_string(),
            not_found_html: "<p>Nothing at {{slug}}</p>".to_string(),
            posts,
        }
    }

    fn select(doc: &Html, selector: &str) -> Vec<String> {
        let selector = Selector::parse(selector).unwrap();
        doc.select(&selector)
            .map(|el| el.text().collect::<String>())
            .collect()
    }

    #[test]
    fn fills_placeholders_once() {
        let out = fill_placeholders(
            "{{ a }}-{{b}}-{{ missing }}-{{",
            &[("a", "{{ b }}"), ("b", "B")],
        );
        assert_eq!(out, "{{ b }}-B-{{ missing }}-{{");
    }

    #[test]
    fn formats_dates() {
        let at = parse_published_at("2024-03-01").unwrap();
        assert_eq!(format_date(at, today(), false), "March 1, 2024");
        assert_eq!(format_date(at, today(), true), "March 1, 2024 (2mo ago)");

        let at = parse_published_at("2022-12-25").unwrap();
        assert_eq!(format_date(at, today(), true), "December 25, 2022 (2y ago)");

        let at = parse_published_at("2024-05-07").unwrap();
        assert_eq!(format_date(at, today(), true), "May 7, 2024 (3d ago)");

        let at = parse_published_at("2024-05-10").unwrap();
        assert_eq!(format_date(at, today(), true), "May 10, 2024 (Today)");
    }

    #[test]
    fn home_lists_posts_in_given_order() {
        let mut first = post("b", "Newest", "2024-03-01");
        first.metadata.summary = Some("Short <summary>".to_string());
        let content = content(vec![first, post("a", "Older", "2024-01-01")]);

        let page = home_page(&content, today());
        let doc = Html::parse_fragment(&page.body);
        assert_eq!(select(&doc, ".post-card h3"), vec!["Newest", "Older"]);
        assert_eq!(select(&doc, ".post-card .summary"), vec!["Short <summary>"]);
        assert!(page.body.contains("<p>I build data pipelines.</p>"));
    }

    #[test]
    fn empty_blog_index_says_so() {
        let page = blog_index_page(&content(Vec::new()), today());
        assert!(page.body.contains("No posts yet."));
    }

    #[test]
    fn post_page_shows_related_posts_without_itself() {
        let posts = vec![
            post("d", "Four", "2024-04-01"),
            post("c", "Three", "2024-03-01"),
            post("b", "Two", "2024-02-01"),
            post("a", "One", "2024-01-01"),
        ];
        let content = content(posts);
        let current = &content.posts[1];

        let page = post_page(&content, current, today());
        let doc = Html::parse_fragment(&page.body);
        assert_eq!(select(&doc, ".related-card h3"), vec!["Four", "Two", "One"]);
        assert_eq!(select(&doc, ".breadcrumb .truncate"), vec!["Three"]);
        assert!(page.body.contains("application/ld+json"));
        assert!(page.body.contains("March 1, 2024 (2mo ago)"));
    }

    #[test]
    fn single_post_has_no_related_section() {
        let content = content(vec![post("only", "Only", "2024-01-01")]);
        let page = post_page(&content, &content.posts[0], today());
        assert!(!page.body.contains("Related Articles"));
    }

    #[test]
    fn post_page_optional_fields() {
        let mut full = post("full", "Full", "2024-01-01");
        full.metadata.image = Some("/img/full.png".to_string());
        full.metadata.tags = vec!["rust".to_string()];
        full.metadata.demo = Some("https://demo.example.com".to_string());
        full.metadata.code = Some("https://github.com/jane/full".to_string());
        let mut redacted = post("redacted", "Redacted", "2024-01-02");
        redacted.metadata.demo = Some("Redacted".to_string());
        redacted.metadata.code = Some("https://github.com/jane/r".to_string());
        let content = content(vec![redacted, full]);

        let page = post_page(&content, &content.posts[1], today());
        let doc = Html::parse_fragment(&page.body);
        assert_eq!(select(&doc, ".project-links a"), vec!["Live link", "Code"]);
        assert_eq!(select(&doc, ".tags li"), vec!["rust"]);
        assert!(page.body.contains("<img src=\"/img/full.png\" alt=\"Full\">"));

        let page = post_page(&content, &content.posts[0], today());
        let doc = Html::parse_fragment(&page.body);
        assert_eq!(select(&doc, ".project-links a"), vec!["Code"]);
        assert!(select(&doc, ".featured-image").is_empty());
    }

    #[test]
    fn layout_injects_head_sidebar_and_reload_script() {
        let content = content(vec![post("a", "A <b>", "2024-01-01")]);
        let page = blog_index_page(&content, today());

        let html = render_with_layout(&content, &page, false);
        assert!(html.contains("<title>Blog | Jane Doe</title>"));
        assert!(html.contains("<li><a href=\"/blog/a\" class=\"text-blue no-underline\">A &lt;b&gt;</a></li>"));
        assert!(html.contains("og:title"));
        assert!(!html.contains("WebSocket"));

        let html = render_with_layout(&content, &page, true);
        assert!(html.contains("WebSocket"));
    }

    #[test]
    fn reload_script_goes_before_the_last_body_close_only() {
        let mut content = content(Vec::new());
        content.layout_html = "<body><main>{{ content }}</main></body>".to_string();
        let page = Page {
            title: "Raw".to_string(),
            metadata: PageMetadata::for_page("Raw", "/", &content.site),
            body: "<iframe srcdoc=\"<body></body>\"></iframe>".to_string(),
        };

        let html = render_with_layout(&content, &page, true);
        assert_eq!(html.matches("WebSocket").count(), 1);
        assert!(html.contains("srcdoc=\"<body></body>\""));
        assert!(html.ends_with(&format!("</main>{HOT_RELOAD_SCRIPT}</body>")));
    }

    #[test]
    fn not_found_escapes_slug() {
        let page = not_found_page(&content(Vec::new()), "<script>");
        assert_eq!(page.body, "<p>Nothing at &lt;script&gt;</p>");
    }
}
