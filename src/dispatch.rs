//! DispatchRouter: cache-first batch tokenization
//!
//! # Algorithm
//! 1. Normalize every text and look it up in the shared cache
//! 2. Collect misses, deduplicated by text, in first-occurrence order
//! 3. All hits: answer from cache without touching the backend
//! 4. Otherwise one backend call for the misses; merge results back
//!    positionally, writing each fresh sequence into the cache
//! 5. Backend failure fails the whole request; nothing is cached
//!
//! The cache is the only state shared between concurrent dispatches. It is
//! never borrowed across the backend await, so interleaved flushes are safe;
//! two flushes missing on the same text both write, last write wins.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::backend::{Tokenize, TokenizeError};
use crate::cache::{normalize_key, TokenCache};
use crate::dom::RawTextUnit;
use crate::token::{Token, TokenSequence};

/// Shared handle to the process-lifetime cache
pub type SharedCache = Rc<RefCell<TokenCache>>;

/// Hook for freshly tokenized texts (token history)
pub type FreshHook = Box<dyn Fn(&str, &[Token])>;

/// Dispatch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStats {
    /// Requests received
    pub requests: u64,
    /// Texts answered from cache
    pub cache_hits: u64,
    /// Backend calls issued
    pub backend_calls: u64,
    /// Unique texts sent to the backend
    pub texts_sent: u64,
    /// Backend calls that failed
    pub failures: u64,
}

pub struct DispatchRouter<B> {
    cache: SharedCache,
    backend: B,
    on_fresh: Option<FreshHook>,
    stats: Cell<DispatchStats>,
}

impl<B: Tokenize> DispatchRouter<B> {
    pub fn new(backend: B, cache: SharedCache) -> Self {
        Self {
            cache,
            backend,
            on_fresh: None,
            stats: Cell::new(DispatchStats::default()),
        }
    }

    /// Router with its own cache of the given capacity
    pub fn with_capacity(backend: B, capacity: usize) -> Self {
        Self::new(backend, Rc::new(RefCell::new(TokenCache::new(capacity))))
    }

    /// Call `hook` once per freshly tokenized text, after it is cached
    pub fn on_fresh(mut self, hook: impl Fn(&str, &[Token]) + 'static) -> Self {
        self.on_fresh = Some(Box::new(hook));
        self
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats.get()
    }

    fn bump(&self, f: impl FnOnce(&mut DispatchStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    /// Resolve one token sequence per input text, in input order.
    pub async fn resolve(&self, texts: &[String]) -> Result<Vec<TokenSequence>, TokenizeError> {
        self.bump(|s| s.requests += 1);

        let keys: Vec<String> = texts.iter().map(|t| normalize_key(t)).collect();

        let mut slots: Vec<Option<TokenSequence>> = {
            let mut cache = self.cache.borrow_mut();
            keys.iter().map(|k| cache.lookup(k)).collect()
        };
        let hits = slots.iter().filter(|s| s.is_some()).count() as u64;
        self.bump(|s| s.cache_hits += hits);

        let mut seen = HashSet::new();
        let unresolved: Vec<String> = keys
            .iter()
            .zip(&slots)
            .filter(|(_, slot)| slot.is_none())
            .filter(|(k, _)| seen.insert(k.as_str()))
            .map(|(k, _)| k.clone())
            .collect();

        if unresolved.is_empty() {
            return Ok(slots.into_iter().flatten().collect());
        }

        self.bump(|s| {
            s.backend_calls += 1;
            s.texts_sent += unresolved.len() as u64;
        });

        let fresh = match self.backend.tokenize(&unresolved).await {
            Ok(fresh) if fresh.len() == unresolved.len() => fresh,
            Ok(fresh) => {
                self.bump(|s| s.failures += 1);
                return Err(TokenizeError::LengthMismatch {
                    expected: unresolved.len(),
                    got: fresh.len(),
                });
            }
            Err(e) => {
                self.bump(|s| s.failures += 1);
                crate::console_warn!("[DispatchRouter] backend failed for {} texts: {}", unresolved.len(), e);
                return Err(e);
            }
        };

        let fresh: HashMap<&str, TokenSequence> = unresolved
            .iter()
            .map(String::as_str)
            .zip(fresh)
            .collect();

        {
            let mut cache = self.cache.borrow_mut();
            for (key, tokens) in &fresh {
                cache.insert(key.to_string(), tokens.clone());
            }
        }
        if let Some(hook) = &self.on_fresh {
            for key in &unresolved {
                if let Some(tokens) = fresh.get(key.as_str()) {
                    hook(key, tokens);
                }
            }
        }

        for (key, slot) in keys.iter().zip(slots.iter_mut()) {
            if slot.is_none() {
                *slot = fresh.get(key.as_str()).cloned();
            }
        }
        Ok(slots.into_iter().flatten().collect())
    }

    /// Resolve a flush bag, pairing every unit with its tokens.
    ///
    /// Units sharing a text share one backend line item and receive the same
    /// sequence.
    pub async fn dispatch<N>(
        &self,
        bag: Vec<RawTextUnit<N>>,
    ) -> Result<Vec<(RawTextUnit<N>, TokenSequence)>, TokenizeError> {
        if bag.is_empty() {
            return Ok(Vec::new());
        }
        let texts: Vec<String> = bag.iter().map(|u| u.text.clone()).collect();
        let tokens = self.resolve(&texts).await?;
        Ok(bag.into_iter().zip(tokens).collect())
    }
}
