//! Mirigana: furigana for Japanese timelines
//!
//! A Rust/WASM implementation of the Mirigana annotation pipeline.
//!
//! # Architecture
//!
//! ## Pipeline
//! - `observer/` - Mutation observers: timeline, deck and generic strategies
//! - `attach.rs` - Attacher: observer attachment state machine
//! - `dispatch.rs` - DispatchRouter: cache-first batch tokenization
//! - `cache.rs` - TokenCache: bounded text → tokens cache
//! - `backend/` - Tokenization backends (local analyzer, remote service, worker relay)
//! - `reconcile.rs` - Anchor reconciliation
//! - `miri.rs` - Miri: per-document pipeline owner
//!
//! ## Bridge
//! - `messaging.rs` - MessageHub: typed extension messages
//! - `storage.rs` - Storage façades over persisted state
//! - `style.rs` - Settings → ruby styles
//! - `site.rs` - Supported-site matching
//! - `web/` - Browser bindings (`MiriContent`, `MiriBackground`)
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { MiriBackground, MiriContent } from 'mirigana';
//!
//! await init();
//!
//! // background worker
//! const hub = new MiriBackground(await chrome.storage.local.get(), analyzer, info, sites);
//! chrome.runtime.onMessage.addListener((msg, _sender, reply) => {
//!   hub.handle(msg).then(reply);
//!   return true;
//! });
//!
//! // content script; batches go to the worker as REQUEST_TOKEN
//! const miri = new MiriContent({ ...hooks, sendMessage: (m) => chrome.runtime.sendMessage(m) });
//! miri.applySettings(settings);
//! miri.start(selectorForHost);
//! chrome.runtime.onMessage.addListener((msg) => miri.onMessage(msg));
//! ```

#[macro_use]
pub mod log;

pub mod attach;
pub mod backend;
pub mod cache;
pub mod config;
pub mod dispatch;
pub mod dom;
pub mod messaging;
pub mod miri;
pub mod observer;
pub mod reconcile;
pub mod site;
pub mod storage;
pub mod style;
pub mod token;
pub mod web;

#[cfg(test)]
mod tests;

pub use attach::{AttachState, AttachStep, Attacher};
pub use backend::{Engine, Tokenize, TokenizeError};
pub use cache::TokenCache;
pub use config::{ParseEngine, PipelineConfig, SelectorConfig, Settings, SettingsPatch};
pub use dispatch::DispatchRouter;
pub use messaging::{MessageHub, Reply, Request};
pub use miri::Miri;
pub use token::{Token, TokenSequence};
pub use web::{MiriBackground, MiriContent};

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("mirigana v{}", env!("CARGO_PKG_VERSION"))
}
