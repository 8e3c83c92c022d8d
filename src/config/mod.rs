use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::fetch::DEFAULT_USER_AGENT;

pub const DEFAULT_CACHE_PATH: &str = "./src/cache/link-cards.json";
pub const DEFAULT_CACHE_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);
pub const DEFAULT_FAILED_CACHE_MAX_AGE: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_CLASS_NAME: &str = "link-card";
pub const DEFAULT_TAG_NAME: &str = "link-card";

/// Which HTML shape replaces a standalone URL paragraph.
///
/// In option files this is the `headless` key: `false` for the full card,
/// `true` for the data-attribute anchor, `"marker"` for the custom element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Card,
    Headless,
    Marker,
}

impl OutputMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "false" => Some(OutputMode::Card),
            "true" => Some(OutputMode::Headless),
            "marker" => Some(OutputMode::Marker),
            _ => None,
        }
    }
}

impl Serialize for OutputMode {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            OutputMode::Card => s.serialize_bool(false),
            OutputMode::Headless => s.serialize_bool(true),
            OutputMode::Marker => s.serialize_str("marker"),
        }
    }
}

impl<'de> Deserialize<'de> for OutputMode {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Name(String),
        }

        match Raw::deserialize(d)? {
            Raw::Flag(false) => Ok(OutputMode::Card),
            Raw::Flag(true) => Ok(OutputMode::Headless),
            Raw::Name(name) => OutputMode::parse(&name).ok_or_else(|| {
                de::Error::invalid_value(de::Unexpected::Str(&name), &r#"false, true or "marker""#)
            }),
        }
    }
}

/// Link-card transformer options, as passed by the surrounding pipeline.
///
/// Durations are milliseconds in JSON. Every key is optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkCardOptions {
    pub cache_path: PathBuf,
    #[serde(with = "millis")]
    pub cache_max_age: Duration,
    /// How long a failed fetch stays cached before it is retried.
    #[serde(with = "millis")]
    pub failed_cache_max_age: Duration,
    #[serde(with = "millis")]
    pub fetch_timeout: Duration,
    pub class_name: String,
    pub fallback_on_error: bool,
    #[serde(rename = "headless")]
    pub mode: OutputMode,
    /// Custom element name used in marker mode.
    pub tag_name: String,
    pub user_agent: String,
}

impl Default for LinkCardOptions {
    fn default() -> Self {
        LinkCardOptions {
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            failed_cache_max_age: DEFAULT_FAILED_CACHE_MAX_AGE,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            class_name: DEFAULT_CLASS_NAME.to_string(),
            fallback_on_error: true,
            mode: OutputMode::Card,
            tag_name: DEFAULT_TAG_NAME.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl LinkCardOptions {
    /// Read options from `LINK_CARD_*` environment variables (and `.env`).
    /// Unset or unparseable variables keep their defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = LinkCardOptions::default();
        LinkCardOptions {
            cache_path: env::var("LINK_CARD_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_path),
            cache_max_age: env_millis("LINK_CARD_CACHE_MAX_AGE_MS")
                .unwrap_or(defaults.cache_max_age),
            failed_cache_max_age: env_millis("LINK_CARD_FAILED_CACHE_MAX_AGE_MS")
                .unwrap_or(defaults.failed_cache_max_age),
            fetch_timeout: env_millis("LINK_CARD_FETCH_TIMEOUT_MS")
                .unwrap_or(defaults.fetch_timeout),
            class_name: env::var("LINK_CARD_CLASS_NAME").unwrap_or(defaults.class_name),
            fallback_on_error: env::var("LINK_CARD_FALLBACK_ON_ERROR")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.fallback_on_error),
            mode: env::var("LINK_CARD_HEADLESS")
                .ok()
                .and_then(|v| OutputMode::parse(&v))
                .unwrap_or(defaults.mode),
            tag_name: env::var("LINK_CARD_TAG_NAME").unwrap_or(defaults.tag_name),
            user_agent: env::var("LINK_CARD_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .map(Duration::from_millis)
}

mod millis {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
