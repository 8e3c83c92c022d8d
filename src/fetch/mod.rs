use std::future::Future;
use std::time::Duration;

use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client as ReqwestClient;
use url::Url;

use crate::error::{LinkCardError, LinkCardResult};
use crate::html::extract::{
    extract_first_match, DESCRIPTION_PATTERNS, IMAGE_PATTERNS, SITE_NAME_PATTERNS, TITLE_PATTERNS,
};
use crate::models::LinkMetadata;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; LinkCardBot/1.0; +https://github.com)";
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml";

/// A successfully fetched HTML page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Where the response actually came from, after redirects.
    pub final_url: Url,
    pub body: String,
}

/// One GET per call, aborted after `timeout`. Non-2xx responses are errors.
pub trait PageFetcher: Send + Sync {
    fn fetch_page(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = LinkCardResult<FetchedPage>> + Send;
}

// ── HTTP implementation ────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: ReqwestClient,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(user_agent: impl Into<String>) -> LinkCardResult<Self> {
        let client = ReqwestClient::builder().build()?;
        Ok(Self {
            client,
            user_agent: user_agent.into(),
        })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str, timeout: Duration) -> LinkCardResult<FetchedPage> {
        let request = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, ACCEPT_HTML)
            .send();

        // The deadline covers the body as well as the headers.
        let page = tokio::time::timeout(timeout, async {
            let response = request.await?;
            let status = response.status();
            if !status.is_success() {
                return Err(LinkCardError::Status(status));
            }
            let final_url = response.url().clone();
            let body = response.text().await?;
            Ok::<_, LinkCardError>(FetchedPage { final_url, body })
        })
        .await
        .map_err(|_| LinkCardError::Timeout)??;

        Ok(page)
    }
}

// ── Metadata extraction ────────────────────────────────────────────────────

/// Build link metadata from a fetched page.
///
/// Falls back to `<title>` and then the requested URL for the title, to
/// `<meta name="description">` for the description, and to the response
/// hostname for the site name. Relative `og:image` values are resolved
/// against the response origin.
pub fn extract_metadata(requested_url: &str, page: &FetchedPage) -> LinkMetadata {
    let html = page.body.as_str();

    let mut title = extract_first_match(html, &TITLE_PATTERNS);
    if title.is_empty() {
        title = requested_url.to_string();
    }

    let description = extract_first_match(html, &DESCRIPTION_PATTERNS);

    let image = resolve_image(&extract_first_match(html, &IMAGE_PATTERNS), &page.final_url);

    let mut site_name = extract_first_match(html, &SITE_NAME_PATTERNS);
    if site_name.is_empty() {
        site_name = page.final_url.host_str().unwrap_or_default().to_string();
    }

    LinkMetadata {
        url: requested_url.to_string(),
        title,
        description,
        image,
        site_name,
        fetched_at: chrono::Utc::now(),
    }
}

fn resolve_image(image: &str, page_url: &Url) -> String {
    if image.is_empty() || image.starts_with("http") {
        return image.to_string();
    }
    Url::parse(&page_url.origin().ascii_serialization())
        .and_then(|origin| origin.join(image))
        .map(String::from)
        .unwrap_or_else(|e| {
            tracing::debug!(error = %e, image, "Dropping unresolvable og:image");
            String::new()
        })
}

/// Fetch `url` and extract its metadata. Never fails: any error yields
/// [`LinkMetadata::unresolved`], which callers detect by its empty title.
pub async fn fetch_metadata<F: PageFetcher>(
    fetcher: &F,
    url: &str,
    timeout: Duration,
) -> LinkMetadata {
    match fetcher.fetch_page(url, timeout).await {
        Ok(page) => extract_metadata(url, &page),
        Err(e) => {
            tracing::warn!(error = %e, url = %url, "Failed to fetch link card metadata");
            LinkMetadata::unresolved(url)
        }
    }
}

// ── Unit tests ─────────────────────────────────────────────────────────────
