//! Browser bindings
//!
//! - `dom.rs` - WebNode / WebDocument over `web_sys`
//! - `bridge.rs` - fetch transport, worker messenger, JS analyzer, render and style hooks
//! - `content.rs` - MiriContent: observers + pipeline for one page
//! - `background.rs` - MiriBackground: message hub for the extension worker

pub mod background;
pub mod bridge;
pub mod content;
pub mod dom;

pub use background::MiriBackground;
pub use bridge::{FetchTransport, JsAnalyzer, JsHooks, JsMessenger};
pub use content::{ContentBackend, MiriContent};
pub use dom::{WebDocument, WebNode};

use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::JsValue;

use crate::backend::Engine;
use crate::config::PipelineConfig;

/// Engine as configured in the browser
pub type WebEngine = Engine<JsAnalyzer, FetchTransport>;

/// Serialize to plain JS objects (no `Map`s)
pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Serialization failed: {}", e)))
}

pub(crate) fn from_js<T: DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&format!("Invalid {}: {}", what, e)))
}

/// Optional pipeline config; null/undefined means defaults
pub(crate) fn pipeline_config(config: JsValue) -> Result<PipelineConfig, JsValue> {
    if config.is_null() || config.is_undefined() {
        return Ok(PipelineConfig::default());
    }
    from_js(config, "pipeline config")
}
