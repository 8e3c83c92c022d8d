use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Open Graph metadata resolved for one URL, as stored in the cache file.
///
/// Every field defaults when missing so older or hand-edited cache files
/// still load. An entry with an empty `title` is an unresolved (failed)
/// fetch; see [`LinkMetadata::is_resolved`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkMetadata {
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_string")]
    pub image: String,
    #[serde(deserialize_with = "lenient_string")]
    pub site_name: String,
    #[serde(with = "iso8601")]
    pub fetched_at: DateTime<Utc>,
}

impl LinkMetadata {
    /// The record written when a fetch fails: only `url` and `fetched_at` set.
    pub fn unresolved(url: impl Into<String>) -> Self {
        LinkMetadata {
            url: url.into(),
            fetched_at: Utc::now(),
            ..Default::default()
        }
    }

    /// `true` when the entry carries enough data to render a card.
    pub fn is_resolved(&self) -> bool {
        !self.title.is_empty()
    }
}

/// URL → metadata. Ordered so the pretty-printed cache file is stable
/// between writes.
pub type LinkCardCache = BTreeMap<String, LinkMetadata>;

/// `null` reads as an empty string; numbers and booleans keep their JSON
/// text. Objects and arrays read as empty.
fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match serde_json::Value::deserialize(d)? {
        serde_json::Value::String(s) => s,
        v @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_)) => v.to_string(),
        _ => String::new(),
    })
}

/// `fetchedAt` is written as `2026-01-01T00:00:00.000Z`. Anything that does
/// not parse reads back as the Unix epoch, which every TTL treats as expired.
mod iso8601 {
    use super::*;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = Option::<serde_json::Value>::deserialize(d)?;
        Ok(raw
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_default())
    }
}
