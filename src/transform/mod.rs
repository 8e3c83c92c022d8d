//! The link-card transformer: finds standalone URL paragraphs, resolves
//! their Open Graph metadata through the cache, and swaps the paragraphs for
//! HTML nodes.

pub mod render;
pub mod scanner;

use std::collections::HashSet;

use futures::future::join_all;
use tracing::{debug, info};

use crate::cache::{is_valid, CacheManager};
use crate::config::{LinkCardOptions, OutputMode};
use crate::error::LinkCardResult;
use crate::fetch::{fetch_metadata, HttpFetcher, PageFetcher};
use crate::models::{LinkCardCache, LinkMetadata, Literal, Node};

pub use render::{render_card, render_fallback, render_headless, render_marker};
pub use scanner::{collect_standalone_urls, standalone_url, StandaloneUrlMatch};

/// Rewrites standalone URL paragraphs into link cards, one document at a
/// time.
///
/// Holds a [`CacheManager`] so every document transformed by this instance
/// (and by any other holder of the same manager) shares one in-memory cache.
pub struct LinkCardTransformer<F = HttpFetcher> {
    options: LinkCardOptions,
    cache: CacheManager,
    fetcher: F,
}

impl LinkCardTransformer<HttpFetcher> {
    /// Transformer backed by a real HTTP client.
    pub fn new(options: LinkCardOptions, cache: CacheManager) -> LinkCardResult<Self> {
        let fetcher = HttpFetcher::new(options.user_agent.clone())?;
        Ok(Self::with_fetcher(options, cache, fetcher))
    }
}

impl<F: PageFetcher> LinkCardTransformer<F> {
    pub fn with_fetcher(options: LinkCardOptions, cache: CacheManager, fetcher: F) -> Self {
        Self {
            options,
            cache,
            fetcher,
        }
    }

    pub fn options(&self) -> &LinkCardOptions {
        &self.options
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Transform one document in place.
    ///
    /// All fetches and the cache write finish before the tree is touched.
    /// Paragraphs whose URL could not be resolved become plain links when
    /// `fallback_on_error` is set and are left alone otherwise.
    pub async fn transform(&self, tree: &mut Node) {
        let cache_path = self.options.cache_path.as_path();
        let mut cache = self.cache.load(cache_path).await;

        let matches = collect_standalone_urls(tree);
        if matches.is_empty() {
            return;
        }

        let mut seen = HashSet::new();
        let to_fetch: Vec<&str> = matches
            .iter()
            .map(|m| m.url.as_str())
            .filter(|url| seen.insert(*url))
            .filter(|url| match cache.get(*url) {
                Some(entry) if self.is_fresh(entry) => {
                    debug!(url = %url, "Link card cache hit");
                    false
                }
                _ => true,
            })
            .collect();

        let mut new_entries = LinkCardCache::new();
        if !to_fetch.is_empty() {
            info!(count = to_fetch.len(), "Fetching link card metadata");

            let timeout = self.options.fetch_timeout;
            let results = join_all(
                to_fetch
                    .iter()
                    .map(|url| fetch_metadata(&self.fetcher, url, timeout)),
            )
            .await;

            for meta in results {
                cache.insert(meta.url.clone(), meta.clone());
                new_entries.insert(meta.url.clone(), meta);
            }
        }

        if !new_entries.is_empty() {
            self.cache.save(cache_path, new_entries).await;
        }

        // Back to front, so splicing never shifts a match still to come.
        for m in matches.iter().rev() {
            let html = match cache.get(&m.url) {
                Some(meta) if meta.is_resolved() => self.render(meta),
                _ if self.options.fallback_on_error => render_fallback(&m.url),
                _ => {
                    debug!(url = %m.url, "Leaving unresolved URL paragraph as text");
                    continue;
                }
            };
            replace_paragraph(tree, m, html);
        }
    }

    /// Resolved entries live for `cache_max_age`; failed fetches only for
    /// `failed_cache_max_age`, so they get retried on a later build.
    fn is_fresh(&self, entry: &LinkMetadata) -> bool {
        let max_age = if entry.is_resolved() {
            self.options.cache_max_age
        } else {
            self.options.failed_cache_max_age
        };
        is_valid(entry, max_age)
    }

    fn render(&self, meta: &LinkMetadata) -> String {
        match self.options.mode {
            OutputMode::Card => render_card(meta, &self.options.class_name),
            OutputMode::Headless => render_headless(meta, &self.options.class_name),
            OutputMode::Marker => render_marker(meta, &self.options.tag_name),
        }
    }
}

fn replace_paragraph(tree: &mut Node, m: &StandaloneUrlMatch, html: String) {
    let Some(siblings) = tree
        .descendant_mut(&m.parent_path)
        .and_then(Node::children_mut)
    else {
        return;
    };
    // The card keeps the paragraph's source span.
    if let Some(slot) = siblings.get_mut(m.index) {
        if matches!(slot, Node::Paragraph(_)) {
            *slot = Node::Html(Literal {
                value: html,
                position: m.position,
                ..Default::default()
            });
        }
    }
}
