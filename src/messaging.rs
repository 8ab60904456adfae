//! Message bridge
//!
//! Every extension message is one `Request` variant, keyed by its `event`
//! tag, and every handled request answers with one `Reply`. Broadcasts
//! (SETTING_CHANGED, SELECTOR_ADDED, ACTIVATE_ELEMENT_PICKER) carry no reply;
//! they are consumed by the content runtime.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::Tokenize;
use crate::config::{SelectorConfig, Settings, SettingsPatch};
use crate::dispatch::{DispatchRouter, SharedCache};
use crate::storage::{MemoryStore, StorageResponse, Storages};
use crate::token::TokenSequence;

/// Storages shared between the hub and the token-history hook
pub type SharedStorages = Rc<RefCell<Storages<MemoryStore>>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum Request {
    #[serde(rename = "REQUEST_TOKEN")]
    RequestToken { tweets: Vec<String> },
    #[serde(rename = "LOAD_SETTINGS")]
    LoadSettings,
    #[serde(rename = "LOAD_FILTERS")]
    LoadFilters,
    #[serde(rename = "LOAD_SELECTORS")]
    LoadSelectors,
    #[serde(rename = "LOAD_EXTENSION_INFO")]
    LoadExtensionInfo,
    #[serde(rename = "STORAGE_ACCESS")]
    StorageAccess {
        storage: String,
        func: String,
        #[serde(default)]
        params: Vec<Value>,
    },
    #[serde(rename = "SETTING_CHANGED")]
    SettingChanged { settings: SettingsPatch },
    #[serde(rename = "SELECTOR_ADDED")]
    SelectorAdded { selector: (String, String, String) },
    #[serde(rename = "ACTIVATE_ELEMENT_PICKER")]
    ActivateElementPicker,
}

impl Request {
    /// Parse a raw message. Unknown events yield `None`.
    pub fn parse(message: Value) -> Option<Self> {
        match serde_json::from_value(message) {
            Ok(request) => Some(request),
            Err(e) => {
                crate::console_debug!("[MessageHub] ignoring message: {}", e);
                None
            }
        }
    }

    pub fn event(&self) -> &'static str {
        match self {
            Self::RequestToken { .. } => "REQUEST_TOKEN",
            Self::LoadSettings => "LOAD_SETTINGS",
            Self::LoadFilters => "LOAD_FILTERS",
            Self::LoadSelectors => "LOAD_SELECTORS",
            Self::LoadExtensionInfo => "LOAD_EXTENSION_INFO",
            Self::StorageAccess { .. } => "STORAGE_ACCESS",
            Self::SettingChanged { .. } => "SETTING_CHANGED",
            Self::SelectorAdded { .. } => "SELECTOR_ADDED",
            Self::ActivateElementPicker => "ACTIVATE_ELEMENT_PICKER",
        }
    }

    /// Fire-and-forget notifications with no reply
    pub fn is_broadcast(&self) -> bool {
        matches!(
            self,
            Self::SettingChanged { .. } | Self::SelectorAdded { .. } | Self::ActivateElementPicker
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    /// One sequence per requested text, or null when tokenization failed
    Tokens(Option<Vec<TokenSequence>>),
    Settings(Settings),
    Filters { filters: Vec<String> },
    Selectors { selectors: Vec<SelectorConfig> },
    Info { info: Value },
    Storage(StorageResponse),
    /// Broadcasts and unknown events
    None,
}

/// Background-side request handler
pub struct MessageHub<B> {
    router: DispatchRouter<B>,
    storages: SharedStorages,
    info: Value,
}

impl<B: Tokenize> MessageHub<B> {
    /// Wire a hub; freshly tokenized surfaces are recorded in token history
    pub fn new(backend: B, cache: SharedCache, storages: SharedStorages, info: Value) -> Self {
        let history = storages.clone();
        let router = DispatchRouter::new(backend, cache).on_fresh(move |_, tokens| {
            let mut storages = history.borrow_mut();
            for token in tokens.iter().filter(|t| t.has_reading()) {
                if let Err(e) = storages.add_token(&token.surface) {
                    crate::console_warn!("[MessageHub] token history write failed: {}", e);
                }
            }
        });
        Self {
            router,
            storages,
            info,
        }
    }

    pub fn router(&self) -> &DispatchRouter<B> {
        &self.router
    }

    pub fn storages(&self) -> &SharedStorages {
        &self.storages
    }

    pub async fn handle(&self, request: Request) -> Reply {
        match request {
            Request::RequestToken { tweets } => Reply::Tokens(self.router.resolve(&tweets).await.ok()),
            Request::LoadSettings => Reply::Settings(self.storages.borrow().settings()),
            Request::LoadFilters => Reply::Filters {
                filters: self.storages.borrow().filters(),
            },
            Request::LoadSelectors => Reply::Selectors {
                selectors: self.storages.borrow().selectors(),
            },
            Request::LoadExtensionInfo => Reply::Info {
                info: self.info.clone(),
            },
            Request::StorageAccess { storage, func, params } => {
                let result = self.storages.borrow_mut().invoke(&storage, &func, &params);
                Reply::Storage(result.into())
            }
            Request::SettingChanged { .. } | Request::SelectorAdded { .. } | Request::ActivateElementPicker => {
                Reply::None
            }
        }
    }

    /// Parse and handle a raw message
    pub async fn handle_value(&self, message: Value) -> Reply {
        match Request::parse(message) {
            Some(request) => self.handle(request).await,
            None => Reply::None,
        }
    }
}
