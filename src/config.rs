// mirigana/src/config.rs
//
// Configuration types: persisted settings, engine selection, site selectors

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::attach::DEFAULT_RETRY_DELAY_MS;
use crate::backend::DEFAULT_ENDPOINT;
use crate::cache::DEFAULT_CACHE_CAPACITY;

/// Storage keys shared with the extension's persisted state
pub mod keys {
    pub const EXTENSION_ENABLED: &str = "extension_enabled";
    pub const FURIGANA_SIZE_PERCENTAGE: &str = "furigana_size_percentage";
    pub const FURIGANA_COLOR: &str = "furigana_color";
    pub const FURIGANA_SELECTABLE: &str = "furigana_selectable";
    pub const FILTER_LIST: &str = "filter_list";
    pub const SELECTORS: &str = "selectors";
    pub const CURRENT_PARSE_ENGINE: &str = "current_parse_engine";
    pub const TOKEN_HISTORY: &str = "token_history";
}

/// Tokenization engine selection. Read once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ParseEngine {
    /// Bundled dictionary analyzer
    #[default]
    #[serde(rename = "local")]
    Local,
    /// Remote NLP service
    #[serde(rename = "remote")]
    Remote,
}

impl fmt::Display for ParseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl ParseEngine {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }

    /// Parse a persisted key, falling back to the default for unknown values
    pub fn from_key(key: &str) -> Self {
        match key {
            "remote" => Self::Remote,
            "local" => Self::Local,
            _ => Self::default(),
        }
    }
}

pub const MAX_PCT: u8 = 100;

/// Round a stored or transmitted size to a whole percentage in `0..=100`
pub fn clamp_pct(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, MAX_PCT as f64) as u8
}

fn deserialize_pct<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    f64::deserialize(deserializer).map(clamp_pct)
}

fn deserialize_pct_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
    Option::<f64>::deserialize(deserializer).map(|v| v.map(clamp_pct))
}

/// Visual settings snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub enabled: bool,
    /// Furigana size as a percentage of the base text
    #[serde(deserialize_with = "deserialize_pct")]
    pub pct: u8,
    pub color: String,
    #[serde(alias = "furiganaSelectable")]
    pub furigana_selectable: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            pct: 50,
            color: "inherit".to_string(),
            furigana_selectable: false,
        }
    }
}

impl Settings {
    /// Merge a partial update into this snapshot
    pub fn merge(&mut self, patch: &SettingsPatch) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(pct) = patch.pct {
            self.pct = pct.min(MAX_PCT);
        }
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
        if let Some(selectable) = patch.furigana_selectable {
            self.furigana_selectable = selectable;
        }
    }
}

/// Partial settings, as carried by SETTING_CHANGED
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(
        default,
        deserialize_with = "deserialize_pct_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub pct: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, alias = "furiganaSelectable", skip_serializing_if = "Option::is_none")]
    pub furigana_selectable: Option<bool>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none()
            && self.pct.is_none()
            && self.color.is_none()
            && self.furigana_selectable.is_none()
    }
}

/// Per-site selectors for the generic observer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorConfig {
    pub site: String,
    /// Container to observe
    pub component: String,
    /// Elements whose text should be annotated
    #[serde(default)]
    pub queries: Vec<String>,
}

impl SelectorConfig {
    pub fn new(site: &str, component: &str, queries: &[&str]) -> Self {
        Self {
            site: site.to_string(),
            component: component.to_string(),
            queries: queries.iter().map(|q| q.to_string()).collect(),
        }
    }

    /// Add a query if not already present. Returns true when added.
    pub fn add_query(&mut self, query: &str) -> bool {
        if self.queries.iter().any(|q| q == query) {
            return false;
        }
        self.queries.push(query.to_string());
        true
    }
}

/// Pipeline tunables. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub cache_capacity: usize,
    pub endpoint: String,
    /// Delay before the generic observer is probed
    pub retry_delay_ms: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}
