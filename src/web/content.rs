//! MiriContent: the content-script runtime
//!
//! One instance per document load. Drives the attachment state machine from
//! real events (start, retry timer, SELECTOR_ADDED), wires the winning
//! strategy to a `MutationObserver`, and spawns one dispatch per flush.
//!
//! Batches go to the worker as REQUEST_TOKEN by default, so every tab shares
//! one engine and one cache. `MiriContent.direct` runs an engine in the page
//! instead.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Array;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{MutationObserver, MutationObserverInit};

use crate::attach::{AttachStep, Attacher};
use crate::backend::{Engine, RelayEngine, Tokenize, TokenizeError};
use crate::cache::CacheStats;
use crate::config::{ParseEngine, PipelineConfig, SelectorConfig, Settings};
use crate::dispatch::{DispatchRouter, DispatchStats};
use crate::dom::{DomDocument, RawTextUnit};
use crate::messaging::Request;
use crate::miri::Miri;
use crate::reconcile::ReconcileReport;
use crate::style;
use crate::token::TokenSequence;

use super::bridge::{FetchTransport, JsAnalyzer, JsHooks, JsMessenger};
use super::dom::{mutation_records, WebDocument, WebNode};
use super::{from_js, pipeline_config, to_js, WebEngine};

/// Where a content runtime gets its tokens
pub enum ContentBackend {
    /// The worker's REQUEST_TOKEN handler
    Relay(RelayEngine<JsMessenger>),
    /// An engine running in the page
    Direct(WebEngine),
}

impl ContentBackend {
    pub fn name(&self) -> String {
        match self {
            Self::Relay(_) => "relay".to_string(),
            Self::Direct(engine) => engine.kind().to_string(),
        }
    }
}

impl Tokenize for ContentBackend {
    async fn tokenize(&self, texts: &[String]) -> Result<Vec<TokenSequence>, TokenizeError> {
        match self {
            Self::Relay(relay) => relay.tokenize(texts).await,
            Self::Direct(engine) => engine.tokenize(texts).await,
        }
    }
}

#[derive(Serialize)]
struct ContentStats {
    state: &'static str,
    backend: String,
    dispatch: DispatchStats,
    cache: CacheStats,
    reconcile: ReconcileReport,
}

struct ContentRuntime {
    doc: WebDocument,
    attacher: RefCell<Attacher>,
    miri: Miri<ContentBackend, JsHooks>,
    selector: RefCell<Option<SelectorConfig>>,
    observer: RefCell<Option<MutationObserver>>,
}

impl ContentRuntime {
    fn begin(self: &Rc<Self>) {
        let step = self.attacher.borrow_mut().start(&self.doc);
        self.advance(step);
    }

    fn on_timer(self: &Rc<Self>) {
        let config = self.selector.borrow().clone();
        let step = self.attacher.borrow_mut().on_timer(&self.doc, config);
        self.advance(step);
    }

    fn on_selector_added(self: &Rc<Self>, site: &str, component: &str, query: &str) {
        if site == self.doc.host() {
            let mut stored = self.selector.borrow_mut();
            let config = stored.get_or_insert_with(|| SelectorConfig::new(site, component, &[]));
            config.add_query(query);
        }
        let config = self.selector.borrow().clone();
        let step = self
            .attacher
            .borrow_mut()
            .on_selector_added(&self.doc, (site, component, query), config);
        self.advance(step);
    }

    fn advance(self: &Rc<Self>, step: AttachStep<WebNode>) {
        match step {
            AttachStep::Attached { root, initial, .. } => {
                if let Err(e) = self.observe(&root) {
                    crate::console_error!("[Miri] observer setup failed: {:?}", e);
                    return;
                }
                self.flush(initial);
            }
            AttachStep::RetryAfter(delay_ms) => self.schedule_retry(delay_ms),
            AttachStep::AwaitSelector => {
                crate::console_log!("[Miri] no selector for {}, waiting", self.doc.host());
            }
            AttachStep::Rescan(units) => self.flush(units),
            AttachStep::Ignored => {}
        }
    }

    fn observe(self: &Rc<Self>, root: &WebNode) -> Result<(), JsValue> {
        let runtime = Rc::clone(self);
        let callback = Closure::<dyn FnMut(Array, MutationObserver)>::new(
            move |records: Array, _observer: MutationObserver| {
                let mutations = mutation_records(&records);
                let bag = runtime.attacher.borrow().collect(&runtime.doc, &mutations);
                runtime.flush(bag);
            },
        );

        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        observer.observe_with_options(root.node(), &options)?;

        // the observer lives as long as the page
        callback.forget();
        *self.observer.borrow_mut() = Some(observer);
        Ok(())
    }

    fn schedule_retry(self: &Rc<Self>, delay_ms: u32) {
        let runtime = Rc::clone(self);
        let callback = Closure::once_into_js(move || runtime.on_timer());
        let scheduled = web_sys::window()
            .ok_or_else(|| JsValue::from_str("no window"))
            .and_then(|w| {
                w.set_timeout_with_callback_and_timeout_and_arguments_0(
                    callback.unchecked_ref(),
                    delay_ms as i32,
                )
            });
        if let Err(e) = scheduled {
            crate::console_error!("[Miri] retry timer failed: {:?}", e);
        }
    }

    fn flush(self: &Rc<Self>, units: Vec<RawTextUnit<WebNode>>) {
        if units.is_empty() {
            return;
        }
        let runtime = Rc::clone(self);
        spawn_local(async move {
            runtime.miri.add_tweets(units).await;
        });
    }
}

/// Content-script entry point
#[wasm_bindgen]
pub struct MiriContent {
    runtime: Rc<ContentRuntime>,
}

impl MiriContent {
    fn build(backend: ContentBackend, hooks: JsValue, config: PipelineConfig) -> Result<MiriContent, JsValue> {
        let doc = WebDocument::current().ok_or_else(|| JsValue::from_str("No document available"))?;
        let name = backend.name();

        let router = DispatchRouter::with_capacity(backend, config.cache_capacity);
        let runtime = ContentRuntime {
            doc,
            attacher: RefCell::new(Attacher::new(config.retry_delay_ms)),
            miri: Miri::new(router, JsHooks::new(hooks)),
            selector: RefCell::new(None),
            observer: RefCell::new(None),
        };

        crate::console_log!("[Miri] content runtime ready ({} backend)", name);
        Ok(MiriContent {
            runtime: Rc::new(runtime),
        })
    }
}

#[wasm_bindgen]
impl MiriContent {
    /// Build the pipeline for the current page, tokenizing through the worker.
    ///
    /// # Arguments
    /// * `hooks` - render and style callbacks, plus `sendMessage(message) -> Promise`
    /// * `config` - optional pipeline tunables
    #[wasm_bindgen(constructor)]
    pub fn new(hooks: JsValue, config: JsValue) -> Result<MiriContent, JsValue> {
        let messenger = JsMessenger::from_hooks(&hooks)
            .ok_or_else(|| JsValue::from_str("hooks.sendMessage is required"))?;
        Self::build(ContentBackend::Relay(RelayEngine::new(messenger)), hooks, pipeline_config(config)?)
    }

    /// Build the pipeline with its own in-page engine.
    ///
    /// # Arguments
    /// * `engine` - persisted engine key (`local` / `remote`)
    /// * `analyzer` - object with `tokenize(text)`, required for `local`
    /// * `hooks` - render and style callbacks
    /// * `config` - optional pipeline tunables
    pub fn direct(engine: &str, analyzer: JsValue, hooks: JsValue, config: JsValue) -> Result<MiriContent, JsValue> {
        let config = pipeline_config(config)?;
        let engine = Engine::select(
            ParseEngine::from_key(engine),
            JsAnalyzer::from_js(analyzer),
            FetchTransport,
            &config.endpoint,
        )
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Self::build(ContentBackend::Direct(engine), hooks, config)
    }

    /// Try to attach an observer.
    ///
    /// `selector` is the stored selector config for this host, or null.
    pub fn start(&self, selector: JsValue) {
        let selector = serde_wasm_bindgen::from_value::<Option<SelectorConfig>>(selector)
            .ok()
            .flatten();
        *self.runtime.selector.borrow_mut() = selector;
        self.runtime.begin();
    }

    /// Apply the full settings snapshot once on load
    #[wasm_bindgen(js_name = applySettings)]
    pub fn apply_settings(&self, settings: JsValue) -> Result<(), JsValue> {
        let settings: Settings = from_js(settings, "settings")?;
        style::apply_settings(self.runtime.miri.renderer(), &settings);
        Ok(())
    }

    /// Handle a broadcast. Returns false for messages this runtime ignores.
    #[wasm_bindgen(js_name = onMessage)]
    pub fn on_message(&self, message: JsValue) -> bool {
        let Ok(request) = serde_wasm_bindgen::from_value::<Request>(message) else {
            return false;
        };

        match request {
            Request::SettingChanged { settings } => {
                style::apply_patch(self.runtime.miri.renderer(), &settings);
            }
            Request::SelectorAdded { selector } => {
                let (site, component, query) = selector;
                self.runtime.on_selector_added(&site, &component, &query);
            }
            other => {
                crate::console_debug!("[Miri] ignoring {}", other.event());
                return false;
            }
        }
        true
    }

    /// Current attachment state
    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        self.runtime.attacher.borrow().state_name().to_string()
    }

    /// Pipeline counters
    pub fn stats(&self) -> JsValue {
        let miri = &self.runtime.miri;
        let stats = ContentStats {
            state: self.runtime.attacher.borrow().state_name(),
            backend: miri.router().backend().name(),
            dispatch: miri.dispatch_stats(),
            cache: miri.router().cache().borrow().stats(),
            reconcile: miri.totals(),
        };
        to_js(&stats).unwrap_or(JsValue::NULL)
    }
}
