//! Regex-based Open Graph meta-tag extraction.
//!
//! Pages put `property`/`name` before or after `content`, so every meta tag
//! is listed in both attribute orders.

use once_cell::sync::Lazy;
use regex::Regex;

use super::decode_entities;

fn meta_patterns(attr: &str, key: &str) -> [Regex; 2] {
    let key = regex::escape(key);
    [
        Regex::new(&format!(
            r#"(?i)<meta[^>]*{attr}=["']{key}["'][^>]*content=["']([^"']+)["']"#
        ))
        .unwrap(),
        Regex::new(&format!(
            r#"(?i)<meta[^>]*content=["']([^"']+)["'][^>]*{attr}=["']{key}["']"#
        ))
        .unwrap(),
    ]
}

/// `og:title`, then the `<title>` element.
pub static TITLE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    let mut patterns = meta_patterns("property", "og:title").to_vec();
    patterns.push(Regex::new(r"(?i)<title[^>]*>([^<]+)</title>").unwrap());
    patterns
});

/// `og:description`, then `<meta name="description">`.
pub static DESCRIPTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    let mut patterns = meta_patterns("property", "og:description").to_vec();
    patterns.extend(meta_patterns("name", "description"));
    patterns
});

pub static IMAGE_PATTERNS: Lazy<Vec<Regex>> =
    Lazy::new(|| meta_patterns("property", "og:image").to_vec());

pub static SITE_NAME_PATTERNS: Lazy<Vec<Regex>> =
    Lazy::new(|| meta_patterns("property", "og:site_name").to_vec());

/// Return the first capture group of the first pattern that matches,
/// trimmed and entity-decoded, or an empty string.
pub fn extract_first_match(html: &str, patterns: &[Regex]) -> String {
    patterns
        .iter()
        .filter_map(|re| re.captures(html))
        .find_map(|caps| caps.get(1).filter(|m| !m.as_str().is_empty()))
        .map(|m| decode_entities(m.as_str().trim()))
        .unwrap_or_default()
}
