//! JS collaborators: fetch transport, worker messenger, analyzer object,
//! render/style hooks

use js_sys::{Array, Function, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, Response};

use serde_json::Value;

use crate::backend::{Analyzer, HttpResponse, HttpTransport, MessageTransport, TokenizeError};
use crate::reconcile::Renderer;
use crate::style::StyleSink;
use crate::token::{Morpheme, Token};

use super::dom::WebNode;
use super::to_js;

#[wasm_bindgen]
extern "C" {
    /// Global `fetch`, present in both pages and service workers
    #[wasm_bindgen(js_name = fetch)]
    fn global_fetch(request: &Request) -> Promise;
}

fn js_error(e: JsValue) -> String {
    e.as_string()
        .or_else(|| {
            e.dyn_ref::<js_sys::Error>()
                .map(|err| String::from(err.message()))
        })
        .unwrap_or_else(|| format!("{:?}", e))
}

/// `fetch`-backed POST
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

impl HttpTransport for FetchTransport {
    async fn post_json(&self, url: &str, body: String) -> Result<HttpResponse, TokenizeError> {
        let transport = |e: JsValue| TokenizeError::Transport(js_error(e));

        let headers = Headers::new().map_err(transport)?;
        headers
            .set("Content-Type", "application/json")
            .map_err(transport)?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(&body));

        let request = Request::new_with_str_and_init(url, &init).map_err(transport)?;
        let response: Response = JsFuture::from(global_fetch(&request))
            .await
            .map_err(transport)?
            .dyn_into()
            .map_err(transport)?;

        let status = response.status();
        let text = JsFuture::from(response.text().map_err(transport)?)
            .await
            .map_err(transport)?;

        Ok(HttpResponse {
            status,
            body: text.as_string().unwrap_or_default(),
        })
    }
}

/// `hooks.sendMessage(message) -> Promise<reply>`, usually wrapping
/// `chrome.runtime.sendMessage`
pub struct JsMessenger {
    target: JsValue,
    send: Function,
}

impl JsMessenger {
    /// `None` when the hooks object has no `sendMessage`
    pub fn from_hooks(hooks: &JsValue) -> Option<Self> {
        let send = Reflect::get(hooks, &JsValue::from_str("sendMessage"))
            .ok()?
            .dyn_into::<Function>()
            .ok()?;
        Some(Self {
            target: hooks.clone(),
            send,
        })
    }
}

impl MessageTransport for JsMessenger {
    async fn send(&self, message: Value) -> Result<Value, TokenizeError> {
        let transport = |e: JsValue| TokenizeError::Transport(js_error(e));

        let message = to_js(&message).map_err(transport)?;
        let sent = self.send.call1(&self.target, &message).map_err(transport)?;
        let reply = JsFuture::from(Promise::resolve(&sent)).await.map_err(transport)?;

        if reply.is_null() || reply.is_undefined() {
            return Ok(Value::Null);
        }
        serde_wasm_bindgen::from_value(reply).map_err(|e| TokenizeError::Malformed(e.to_string()))
    }
}

/// Analyzer object exposing `tokenize(text) -> [{surface_form, reading}]`
pub struct JsAnalyzer {
    target: JsValue,
    tokenize: Function,
}

impl JsAnalyzer {
    /// `None` for null/undefined or an object without `tokenize`
    pub fn from_js(target: JsValue) -> Option<Self> {
        if target.is_null() || target.is_undefined() {
            return None;
        }
        let tokenize = Reflect::get(&target, &JsValue::from_str("tokenize"))
            .ok()?
            .dyn_into::<Function>()
            .ok()?;
        Some(Self { target, tokenize })
    }
}

impl Analyzer for JsAnalyzer {
    fn analyze(&self, text: &str) -> Result<Vec<Morpheme>, TokenizeError> {
        let value = self
            .tokenize
            .call1(&self.target, &JsValue::from_str(text))
            .map_err(|e| TokenizeError::Analyzer(js_error(e)))?;
        serde_wasm_bindgen::from_value::<Vec<Morpheme>>(value)
            .map_err(|e| TokenizeError::Analyzer(e.to_string()))
    }
}

/// Host-page hooks for ruby injection and style updates
#[derive(Clone)]
pub struct JsHooks {
    hooks: JsValue,
}

impl JsHooks {
    pub fn new(hooks: JsValue) -> Self {
        Self { hooks }
    }

    fn call(&self, name: &str, args: &[JsValue]) {
        let hook = Reflect::get(&self.hooks, &JsValue::from_str(name))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok());
        let Some(hook) = hook else {
            crate::console_debug!("[Miri] no `{}` hook", name);
            return;
        };

        let args: Array = args.iter().collect();
        if let Err(e) = hook.apply(&self.hooks, &args) {
            crate::console_error!("[Miri] `{}` hook threw: {}", name, js_error(e));
        }
    }
}

impl Renderer<WebNode> for JsHooks {
    fn render(&self, anchor: &WebNode, tokens: &[Token]) {
        match serde_wasm_bindgen::to_value(tokens) {
            Ok(tokens) => self.call("renderRuby", &[anchor.node().clone().into(), tokens]),
            Err(e) => crate::console_error!("[Miri] token serialization failed: {}", e),
        }
    }
}

impl StyleSink for JsHooks {
    fn set_visibility(&self, style: &str, visible: bool) {
        self.call("setRubyVisibility", &[style.into(), visible.into()]);
    }

    fn set_size(&self, style: &str, pct: u8) {
        self.call("updateRubySizeStyle", &[style.into(), pct.into()]);
    }

    fn set_color(&self, style: &str, color: &str) {
        self.call("updateRubyColorStyle", &[style.into(), color.into()]);
    }

    fn set_selectable(&self, style: &str, selectable: bool) {
        self.call("updateSelectStyle", &[style.into(), selectable.into()]);
    }
}
