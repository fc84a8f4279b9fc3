use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_MATH);
    options
}

/// Renders a post or page body. Headings get anchor ids, external links
/// open in a new tab, and `\( \)` / `\[ \]` math is rendered with KaTeX.
pub fn render_markdown_to_html(markdown: &str) -> String {
    let normalized_markdown = normalize_latex_delimiters(markdown);
    let events: Vec<Event> = Parser::new_ext(&normalized_markdown, markdown_options())
        .map(|event| match event {
            Event::InlineMath(math) => boxed_html(render_math_html(&math, false)),
            Event::DisplayMath(math) => boxed_html(render_math_html(&math, true)),
            other => other,
        })
        .collect();

    let mut html_out = String::new();
    html::push_html(&mut html_out, decorate(events).into_iter());
    html_out
}

fn boxed_html<'a>(html: String) -> Event<'a> {
    Event::Html(CowStr::Boxed(html.into_boxed_str()))
}

fn decorate(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut external_links = Vec::new();
    let mut i = 0;

    while i < events.len() {
        match &events[i] {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let anchor = match id {
                    Some(id) => id.to_string(),
                    None => slugify(&heading_text(&events[i + 1..])),
                };
                out.push(Event::Start(Tag::Heading {
                    level: *level,
                    id: Some(CowStr::from(anchor.clone())),
                    classes: classes.clone(),
                    attrs: attrs.clone(),
                }));
                if !anchor.is_empty() {
                    out.push(Event::InlineHtml(CowStr::from(format!(
                        "<a href=\"#{}\" class=\"anchor\"></a>",
                        htmlescape::encode_minimal(&anchor)
                    ))));
                }
            }
            Event::Start(Tag::Link {
                dest_url, title, ..
            }) if is_external(dest_url) => {
                let mut open = format!(
                    "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\"",
                    htmlescape::encode_minimal(dest_url)
                );
                if !title.is_empty() {
                    open.push_str(&format!(" title=\"{}\"", htmlescape::encode_minimal(title)));
                }
                open.push('>');
                out.push(Event::InlineHtml(CowStr::from(open)));
                external_links.push(true);
            }
            Event::Start(Tag::Link { .. }) => {
                out.push(events[i].clone());
                external_links.push(false);
            }
            Event::End(TagEnd::Link) => {
                if external_links.pop().unwrap_or(false) {
                    out.push(Event::InlineHtml(CowStr::Borrowed("</a>")));
                } else {
                    out.push(events[i].clone());
                }
            }
            other => out.push(other.clone()),
        }
        i += 1;
    }

    out
}

fn heading_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            _ => {}
        }
    }
    text
}

fn is_external(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Heading anchor ids: lowercase words joined by `-`, `&` spelled out.
pub fn slugify(text: &str) -> String {
    let lowered = text.trim().to_lowercase().replace('&', " and ");
    let mut slug = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            slug.push(ch);
        } else if (ch.is_whitespace() || ch == '-') && !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn normalize_latex_delimiters(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some((start, open, close, display_mode)) = next_delimiter(rest) {
        let content_start = start + open.len();
        let Some(close_at) = rest[content_start..].find(close) else {
            out.push_str(&rest[..content_start]);
            rest = &rest[content_start..];
            continue;
        };

        let content = &rest[content_start..content_start + close_at];
        out.push_str(&rest[..start]);
        let fence = if display_mode || content.contains('\n') { "$$" } else { "$" };
        out.push_str(fence);
        out.push_str(content);
        out.push_str(fence);
        rest = &rest[content_start + close_at + close.len()..];
    }

    out.push_str(rest);
    out
}

fn next_delimiter(input: &str) -> Option<(usize, &'static str, &'static str, bool)> {
    let inline = input.find("\\(").map(|at| (at, "\\(", "\\)", false));
    let display = input.find("\\[").map(|at| (at, "\\[", "\\]", true));
    match (inline, display) {
        (Some(a), Some(b)) => Some(if a.0 < b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn render_math_html(source: &str, display_mode: bool) -> String {
    let mut opts = katex::Opts::builder();
    opts.display_mode(display_mode);

    opts.build()
        .ok()
        .and_then(|opts| katex::render_with_opts(source, opts).ok())
        .unwrap_or_else(|| fallback_math_html(source, display_mode))
}

fn fallback_math_html(source: &str, display_mode: bool) -> String {
    let class_name = if display_mode { "math math-display" } else { "math math-inline" };
    format!(
        "<span class=\"{class_name}\">{}</span>",
        htmlescape::encode_minimal(source)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_math_with_latex_paren_and_bracket_delimiters() {
        let input = "\\(x^2\\) and \\[y^2\\]";
        let output = render_markdown_to_html(input);
        assert!(output.contains("katex"));
    }

    #[test]
    fn renders_multiline_paren_delimited_math() {
        let input = "Start \\( \\frac{2.24T}{2.08T}\n\\approx 1.077 \\) end";
        let output = render_markdown_to_html(input);
        assert!(output.contains("katex"));
    }

    #[test]
    fn renders_math_from_shipped_post() {
        let post = include_str!("../content/posts/query-planner-notes.md");
        let output = render_markdown_to_html(post);
        assert!(output.contains("katex"));
    }

    #[test]
    fn unclosed_delimiter_is_left_alone() {
        assert_eq!(normalize_latex_delimiters("a \\( b"), "a \\( b");
        assert_eq!(normalize_latex_delimiters("\\[x\\] \\(y\\)"), "$$x$$ $y$");
    }

    #[test]
    fn renders_tables_and_strikethrough() {
        let output = render_markdown_to_html("| a |\n|---|\n| 1 |\n\n~~old~~");
        assert!(output.contains("<table>"));
        assert!(output.contains("<del>old</del>"));
    }

    #[test]
    fn headings_get_anchor_ids() {
        let output = render_markdown_to_html("## Loading & Parsing `front-matter`");
        assert!(output.contains("<h2 id=\"loading-and-parsing-front-matter\">"));
        assert!(output.contains("<a href=\"#loading-and-parsing-front-matter\" class=\"anchor\"></a>"));
    }

    #[test]
    fn external_links_open_in_new_tab() {
        let output = render_markdown_to_html("[site](https://example.com) and [post](/blog/a)");
        assert!(output.contains(
            "<a href=\"https://example.com\" target=\"_blank\" rel=\"noopener noreferrer\">site</a>"
        ));
        assert!(output.contains("<a href=\"/blog/a\">post</a>"));
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Hello,   World -- Again "), "hello-world-again");
        assert_eq!(slugify("Rust & SQL"), "rust-and-sql");
    }
}
