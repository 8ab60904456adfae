//! Storage façades over the extension's persisted key-value state
//!
//! Four façades (`filter`, `selector`, `setting`, `token`) share one store.
//! STORAGE_ACCESS invokes them generically by name; every fault comes back
//! as `{success: false, error}` instead of escaping the message handler.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{clamp_pct, keys, ParseEngine, SelectorConfig, Settings, SettingsPatch};

/// Storage errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    UnknownStorage(String),
    UnknownMethod { storage: String, func: String },
    BadParams(String),
    Serialization(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownStorage(name) => write!(f, "Unknown storage: {}", name),
            Self::UnknownMethod { storage, func } => {
                write!(f, "Unknown method: {}.{}", storage, func)
            }
            Self::BadParams(msg) => write!(f, "Bad params: {}", msg),
            Self::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// Persisted key-value state
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value);
    fn remove(&mut self, key: &str);
}

/// In-memory store, hydrated from and snapshotted back to the host's storage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    values: Map<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a persisted object. `null` yields an empty store.
    pub fn from_snapshot(snapshot: Value) -> Result<Self, StorageError> {
        match snapshot {
            Value::Object(values) => Ok(Self { values }),
            Value::Null => Ok(Self::default()),
            other => Err(StorageError::BadParams(format!("snapshot must be an object, got {}", other))),
        }
    }

    pub fn snapshot(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}

/// STORAGE_ACCESS reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ret: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<Value, StorageError>> for StorageResponse {
    fn from(result: Result<Value, StorageError>) -> Self {
        match result {
            Ok(ret) => Self {
                success: true,
                ret: Some(ret),
                error: None,
            },
            Err(e) => Self {
                success: false,
                ret: None,
                error: Some(e.to_string()),
            },
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, StorageError> {
    serde_json::to_value(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn param<T: DeserializeOwned>(params: &[Value], index: usize, name: &str) -> Result<T, StorageError> {
    let value = params
        .get(index)
        .cloned()
        .ok_or_else(|| StorageError::BadParams(format!("missing `{}`", name)))?;
    serde_json::from_value(value).map_err(|e| StorageError::BadParams(format!("`{}`: {}", name, e)))
}

/// The four storage façades over one store
pub struct Storages<S> {
    store: S,
}

impl<S: KeyValueStore> Storages<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.store
            .get(key)
            .filter(|v| !v.is_null())
            .and_then(|v| serde_json::from_value(v).ok())
    }

    fn write<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let value = to_json(value)?;
        self.store.set(key, value);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // filter
    // ---------------------------------------------------------------------

    pub fn filters(&self) -> Vec<String> {
        self.read(keys::FILTER_LIST).unwrap_or_default()
    }

    pub fn set_filters(&mut self, filters: Vec<String>) -> Result<(), StorageError> {
        self.write(keys::FILTER_LIST, &filters)
    }

    pub fn add_filter(&mut self, word: &str) -> Result<Vec<String>, StorageError> {
        let mut filters = self.filters();
        if !filters.iter().any(|f| f == word) {
            filters.push(word.to_string());
            self.write(keys::FILTER_LIST, &filters)?;
        }
        Ok(filters)
    }

    pub fn remove_filter(&mut self, word: &str) -> Result<Vec<String>, StorageError> {
        let mut filters = self.filters();
        filters.retain(|f| f != word);
        self.write(keys::FILTER_LIST, &filters)?;
        Ok(filters)
    }

    // ---------------------------------------------------------------------
    // selector
    // ---------------------------------------------------------------------

    pub fn selectors(&self) -> Vec<SelectorConfig> {
        self.read(keys::SELECTORS).unwrap_or_default()
    }

    pub fn selector_for(&self, site: &str) -> Option<SelectorConfig> {
        self.selectors().into_iter().find(|s| s.site == site)
    }

    /// Add a query for a site, creating the site entry on first use
    pub fn add_selector(&mut self, site: &str, component: &str, query: &str) -> Result<SelectorConfig, StorageError> {
        let mut selectors = self.selectors();
        let config = match selectors.iter().position(|s| s.site == site) {
            Some(index) => {
                let existing = &mut selectors[index];
                if !component.is_empty() {
                    existing.component = component.to_string();
                }
                existing.add_query(query);
                existing.clone()
            }
            None => {
                let config = SelectorConfig::new(site, component, &[query]);
                selectors.push(config.clone());
                config
            }
        };
        self.write(keys::SELECTORS, &selectors)?;
        Ok(config)
    }

    pub fn remove_selector(&mut self, site: &str) -> Result<(), StorageError> {
        let mut selectors = self.selectors();
        selectors.retain(|s| s.site != site);
        self.write(keys::SELECTORS, &selectors)
    }

    // ---------------------------------------------------------------------
    // setting
    // ---------------------------------------------------------------------

    /// Current settings; missing or null keys fall back to defaults
    pub fn settings(&self) -> Settings {
        let defaults = Settings::default();
        Settings {
            enabled: self.read(keys::EXTENSION_ENABLED).unwrap_or(defaults.enabled),
            pct: self
                .read::<f64>(keys::FURIGANA_SIZE_PERCENTAGE)
                .map(clamp_pct)
                .unwrap_or(defaults.pct),
            color: self.read(keys::FURIGANA_COLOR).unwrap_or(defaults.color),
            furigana_selectable: self
                .read(keys::FURIGANA_SELECTABLE)
                .unwrap_or(defaults.furigana_selectable),
        }
    }

    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Result<Settings, StorageError> {
        let mut settings = self.settings();
        settings.merge(patch);
        if patch.enabled.is_some() {
            self.write(keys::EXTENSION_ENABLED, &settings.enabled)?;
        }
        if patch.pct.is_some() {
            self.write(keys::FURIGANA_SIZE_PERCENTAGE, &settings.pct)?;
        }
        if patch.color.is_some() {
            self.write(keys::FURIGANA_COLOR, &settings.color)?;
        }
        if patch.furigana_selectable.is_some() {
            self.write(keys::FURIGANA_SELECTABLE, &settings.furigana_selectable)?;
        }
        Ok(settings)
    }

    pub fn parse_engine(&self) -> ParseEngine {
        self.read::<String>(keys::CURRENT_PARSE_ENGINE)
            .map(|k| ParseEngine::from_key(&k))
            .unwrap_or_default()
    }

    // ---------------------------------------------------------------------
    // token
    // ---------------------------------------------------------------------

    pub fn token_history(&self) -> BTreeMap<String, u64> {
        self.read(keys::TOKEN_HISTORY).unwrap_or_default()
    }

    /// Count one more sighting of an annotated surface
    pub fn add_token(&mut self, surface: &str) -> Result<u64, StorageError> {
        let mut history = self.token_history();
        let count = history.entry(surface.to_string()).or_insert(0);
        *count += 1;
        let count = *count;
        self.write(keys::TOKEN_HISTORY, &history)?;
        Ok(count)
    }

    pub fn clear_tokens(&mut self) {
        self.store.remove(keys::TOKEN_HISTORY);
    }

    // ---------------------------------------------------------------------
    // generic access
    // ---------------------------------------------------------------------

    /// Invoke `storage.func(...params)`
    pub fn invoke(&mut self, storage: &str, func: &str, params: &[Value]) -> Result<Value, StorageError> {
        let unknown = || StorageError::UnknownMethod {
            storage: storage.to_string(),
            func: func.to_string(),
        };

        match storage {
            "filter" => match func {
                "get" => to_json(&self.filters()),
                "set" => {
                    self.set_filters(param(params, 0, "filters")?)?;
                    Ok(Value::Null)
                }
                "add" => to_json(&self.add_filter(&param::<String>(params, 0, "word")?)?),
                "remove" => to_json(&self.remove_filter(&param::<String>(params, 0, "word")?)?),
                _ => Err(unknown()),
            },
            "selector" => match func {
                "get" => {
                    let site: String = param(params, 0, "site")?;
                    match self.selector_for(&site) {
                        Some(config) => to_json(&config),
                        None => Ok(Value::Object(Map::new())),
                    }
                }
                "getAll" => to_json(&self.selectors()),
                "add" => {
                    let site: String = param(params, 0, "site")?;
                    let component: String = param(params, 1, "component")?;
                    let query: String = param(params, 2, "query")?;
                    to_json(&self.add_selector(&site, &component, &query)?)
                }
                "remove" => {
                    self.remove_selector(&param::<String>(params, 0, "site")?)?;
                    Ok(Value::Null)
                }
                _ => Err(unknown()),
            },
            "setting" => match func {
                "get" => to_json(&self.settings()),
                "set" => {
                    let patch: SettingsPatch = param(params, 0, "settings")?;
                    to_json(&self.update_settings(&patch)?)
                }
                _ => Err(unknown()),
            },
            "token" => match func {
                "get" => to_json(&self.token_history()),
                "add" => to_json(&self.add_token(&param::<String>(params, 0, "surface")?)?),
                "clear" => {
                    self.clear_tokens();
                    Ok(Value::Null)
                }
                _ => Err(unknown()),
            },
            other => Err(StorageError::UnknownStorage(other.to_string())),
        }
    }
}
