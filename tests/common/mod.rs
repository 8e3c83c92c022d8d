// Each integration test file is a separate binary; helpers not used in every
// binary would otherwise trigger dead_code warnings from clippy.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, Redirect},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use tempfile::TempDir;
use url::Url;

use link_card::error::{LinkCardError, LinkCardResult};
use link_card::fetch::{FetchedPage, PageFetcher};
use link_card::{LinkCardCache, LinkCardOptions, LinkMetadata, Node};

pub const OG_PAGE: &str = r#"<!doctype html>
<html><head>
  <title>Fallback Title</title>
  <meta property="og:title" content="Test Site">
  <meta content="Test Description" property="og:description">
  <meta property="og:image" content="/images/card.png">
  <meta property="og:site_name" content="Test &amp; Co">
</head><body></body></html>"#;

// ============================================================================
// Fake fetcher
// ============================================================================

/// Serves canned HTML per URL and records every request. URLs without a
/// page fail with a 500.
#[derive(Clone, Default)]
pub struct FakeFetcher {
    pages: Arc<HashMap<String, String>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeFetcher {
    pub fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: Arc::new(
                pages
                    .iter()
                    .map(|(url, html)| (url.to_string(), html.to_string()))
                    .collect(),
            ),
            calls: Arc::default(),
        }
    }

    /// A fetcher for which every request fails.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl PageFetcher for FakeFetcher {
    async fn fetch_page(&self, url: &str, _timeout: Duration) -> LinkCardResult<FetchedPage> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some(body) => Ok(FetchedPage {
                final_url: Url::parse(url)?,
                body: body.clone(),
            }),
            None => Err(LinkCardError::Status(
                reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            )),
        }
    }
}

// ============================================================================
// In-process HTTP origin
// ============================================================================

pub struct MockSite {
    pub base: String,
    pub hits: Arc<AtomicUsize>,
}

impl MockSite {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn hit_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn og_page(State(hits): State<Arc<AtomicUsize>>) -> Html<&'static str> {
    hits.fetch_add(1, Ordering::SeqCst);
    Html(OG_PAGE)
}

async fn echo_headers(
    State(hits): State<Arc<AtomicUsize>>,
    headers: HeaderMap,
) -> Html<String> {
    hits.fetch_add(1, Ordering::SeqCst);
    let get = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    Html(format!(
        r#"<meta property="og:title" content="{}"><meta property="og:description" content="{}">"#,
        get(header::USER_AGENT),
        get(header::ACCEPT),
    ))
}

async fn missing(State(hits): State<Arc<AtomicUsize>>) -> StatusCode {
    hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::NOT_FOUND
}

async fn slow(State(hits): State<Arc<AtomicUsize>>) -> Html<&'static str> {
    hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(10)).await;
    Html(OG_PAGE)
}

/// Start an HTTP server on a random local port serving:
/// `/article` (full OG page), `/headers` (echoes UA and Accept as OG tags),
/// `/missing` (404), `/slow` (10 s delay) and `/moved` (redirect to
/// `/article`).
pub async fn spawn_site() -> MockSite {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/article", get(og_page))
        .route("/headers", get(echo_headers))
        .route("/missing", get(missing))
        .route("/slow", get(slow))
        .route("/moved", get(|| async { Redirect::temporary("/article") }))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock site");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockSite {
        base: format!("http://{addr}"),
        hits,
    }
}

// ============================================================================
// Trees, options and cache files
// ============================================================================

pub fn url_paragraph(url: &str) -> Node {
    Node::paragraph(vec![Node::text(url)])
}

pub fn link_paragraph(url: &str) -> Node {
    Node::paragraph(vec![Node::link(url, vec![Node::text(url)])])
}

/// Options pointing the cache at a file inside `dir`.
pub fn options_in(dir: &TempDir) -> LinkCardOptions {
    LinkCardOptions {
        cache_path: dir.path().join("cache/link-cards.json"),
        fetch_timeout: Duration::from_millis(500),
        ..Default::default()
    }
}

pub fn metadata(url: &str, title: &str, fetched_at: DateTime<Utc>) -> LinkMetadata {
    LinkMetadata {
        url: url.to_string(),
        title: title.to_string(),
        description: format!("About {title}"),
        image: String::new(),
        site_name: "cached.example".to_string(),
        fetched_at,
    }
}

pub async fn write_cache(path: &Path, entries: &[LinkMetadata]) {
    let cache: LinkCardCache = entries
        .iter()
        .map(|e| (e.url.clone(), e.clone()))
        .collect();
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.unwrap();
    }
    tokio::fs::write(path, serde_json::to_string_pretty(&cache).unwrap())
        .await
        .unwrap();
}

pub async fn read_cache(path: &Path) -> LinkCardCache {
    let content = tokio::fs::read_to_string(path)
        .await
        .expect("cache file should exist");
    serde_json::from_str(&content).expect("cache file should be valid JSON")
}

pub fn cache_path(options: &LinkCardOptions) -> PathBuf {
    options.cache_path.clone()
}

/// The HTML payload of the `index`-th child of the root.
pub fn html_at(tree: &Node, index: usize) -> &str {
    match &tree.children().expect("tree has children")[index] {
        Node::Html(html) => &html.value,
        other => panic!("expected html node at {index}, got {other:?}"),
    }
}
