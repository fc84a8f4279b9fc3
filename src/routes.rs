use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::{get, get_service},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tower_http::services::{ServeDir, ServeFile};
use tracing::debug;

use crate::feeds::{og_image_svg, rss_xml, sitemap_xml};
use crate::hot_reload::ws_handler;
use crate::listing::find_post;
use crate::render::{
    blog_index_page, home_page, not_found_page, post_page, render_with_layout,
};
use crate::state::{AppState, RouterState};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn router(router_state: RouterState) -> Router {
    let static_dir = router_state.app_state.content_dir.join("static");
    let favicon_ico = get_service(ServeFile::new(static_dir.join("favicon.ico")));
    let favicon_png = get_service(ServeFile::new(static_dir.join("favicon.png")));

    Router::new()
        .route("/", get(homepage))
        .route("/blog", get(blog_index))
        .route("/blog/{slug}", get(render_post))
        .route("/sitemap.xml", get(sitemap))
        .route("/rss", get(rss))
        .route("/og", get(og_image))
        .nest_service("/static", get_service(ServeDir::new(static_dir)))
        .route_service("/favicon.ico", favicon_ico)
        .route_service("/favicon.png", favicon_png)
        .route("/ws", get(ws_handler))
        .fallback(fallback)
        .with_state(router_state)
}

async fn homepage(State(state): State<Arc<AppState>>) -> Html<String> {
    let content = state.content().await;
    let page = home_page(&content, today());
    Html(render_with_layout(&content, &page, state.is_development))
}

async fn blog_index(State(state): State<Arc<AppState>>) -> Html<String> {
    let content = state.content().await;
    let page = blog_index_page(&content, today());
    Html(render_with_layout(&content, &page, state.is_development))
}

async fn render_post(
    Path(slug): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let content = state.content().await;
    match find_post(&content.posts, &slug) {
        Some(post) => {
            let page = post_page(&content, post, today());
            Html(render_with_layout(&content, &page, state.is_development)).into_response()
        }
        None => not_found(&state, &slug).await,
    }
}

async fn fallback(uri: Uri, State(state): State<Arc<AppState>>) -> Response {
    not_found(&state, uri.path().trim_start_matches('/')).await
}

async fn not_found(state: &AppState, slug: &str) -> Response {
    debug!(slug, "Not found");
    let content = state.content().await;
    let page = not_found_page(&content, slug);
    (
        StatusCode::NOT_FOUND,
        Html(render_with_layout(&content, &page, state.is_development)),
    )
        .into_response()
}

async fn sitemap(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let content = state.content().await;
    (
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        sitemap_xml(&content),
    )
}

async fn rss(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let content = state.content().await;
    (
        [(header::CONTENT_TYPE, "application/rss+xml; charset=utf-8")],
        rss_xml(&content),
    )
}

#[derive(Deserialize)]
struct OgQuery {
    title: Option<String>,
}

async fn og_image(
    Query(query): Query<OgQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let content = state.content().await;
    let title = query
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| content.site.title.clone());
    (
        [(header::CONTENT_TYPE, "image/svg+xml")],
        og_image_svg(&title, &content.site.title),
    )
}
