//! MiriBackground: the extension worker's message hub
//!
//! Holds the persisted state (hydrated from and snapshotted back to the
//! extension storage by the JS host), the shared token cache and the engine.
//! Every message resolves to a reply; nothing rejects.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Promise;
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::backend::Engine;
use crate::cache::{CacheStats, TokenCache};
use crate::config::ParseEngine;
use crate::dispatch::DispatchStats;
use crate::messaging::{MessageHub, Reply, SharedStorages};
use crate::site::SiteMatcher;
use crate::storage::{MemoryStore, Storages};

use super::bridge::{FetchTransport, JsAnalyzer};
use super::{from_js, pipeline_config, to_js, WebEngine};

#[derive(Serialize)]
struct BackgroundStats {
    engine: ParseEngine,
    dispatch: DispatchStats,
    cache: CacheStats,
}

#[wasm_bindgen]
pub struct MiriBackground {
    hub: Rc<MessageHub<WebEngine>>,
    sites: SiteMatcher,
}

#[wasm_bindgen]
impl MiriBackground {
    /// Build the hub.
    ///
    /// # Arguments
    /// * `snapshot` - persisted storage object (the engine selection is read from it once)
    /// * `analyzer` - object with `tokenize(text)`, required for the local engine
    /// * `info` - extension metadata for LOAD_EXTENSION_INFO
    /// * `sites` - content-script match patterns
    /// * `config` - optional pipeline tunables
    #[wasm_bindgen(constructor)]
    pub fn new(
        snapshot: JsValue,
        analyzer: JsValue,
        info: JsValue,
        sites: JsValue,
        config: JsValue,
    ) -> Result<MiriBackground, JsValue> {
        let config = pipeline_config(config)?;
        let store = MemoryStore::from_snapshot(from_js(snapshot, "snapshot")?)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let storages: SharedStorages = Rc::new(RefCell::new(Storages::new(store)));

        let kind = storages.borrow().parse_engine();
        let engine: WebEngine = Engine::select(kind, JsAnalyzer::from_js(analyzer), FetchTransport, &config.endpoint)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let patterns: Vec<String> = from_js(sites, "site patterns")?;
        let sites = SiteMatcher::new(&patterns).map_err(|e| JsValue::from_str(&format!("Invalid site pattern: {}", e)))?;

        let info: Value = from_js(info, "extension info")?;
        let cache = Rc::new(RefCell::new(TokenCache::new(config.cache_capacity)));
        let hub = MessageHub::new(engine, cache, storages, info);

        crate::console_log!("[MessageHub] ready ({} engine)", kind);
        Ok(MiriBackground {
            hub: Rc::new(hub),
            sites,
        })
    }

    /// Replace the in-memory state with a fresh storage snapshot.
    ///
    /// The engine selection is not re-read; switching engines needs a reload.
    pub fn hydrate(&self, snapshot: JsValue) -> Result<(), JsValue> {
        let store = MemoryStore::from_snapshot(from_js(snapshot, "snapshot")?)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        *self.hub.storages().borrow_mut().store_mut() = store;
        Ok(())
    }

    /// Current state, for persisting
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_js(&self.hub.storages().borrow().store().snapshot())
    }

    /// Handle one extension message. Resolves to the reply (null for broadcasts).
    pub fn handle(&self, message: JsValue) -> Promise {
        let hub = Rc::clone(&self.hub);
        future_to_promise(async move {
            let reply = match from_js::<Value>(message, "message") {
                Ok(message) => hub.handle_value(message).await,
                Err(e) => {
                    crate::console_warn!("[MessageHub] {:?}", e);
                    Reply::None
                }
            };
            Ok(to_js(&reply).unwrap_or_else(|e| {
                crate::console_error!("[MessageHub] reply not serializable: {:?}", e);
                JsValue::NULL
            }))
        })
    }

    /// Whether the page action should be enabled for `url`
    #[wasm_bindgen(js_name = isSupportedUrl)]
    pub fn is_supported_url(&self, url: &str) -> bool {
        self.sites.is_supported(url)
    }

    /// Dispatch and cache counters
    pub fn stats(&self) -> JsValue {
        let router = self.hub.router();
        let stats = BackgroundStats {
            engine: router.backend().kind(),
            dispatch: router.stats(),
            cache: router.cache().borrow().stats(),
        };
        to_js(&stats).unwrap_or(JsValue::NULL)
    }
}
