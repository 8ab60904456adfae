//! TokenCache: bounded text → token sequence store
//!
//! Read before every dispatch, written only after a successful backend call.
//! Eviction is FIFO by first insertion; overwriting an existing key keeps its
//! slot, so identical concurrent writes never churn the queue.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::token::TokenSequence;

/// Default number of cached texts
pub const DEFAULT_CACHE_CAPACITY: usize = 2000;

/// Normalize source text into a cache key
pub fn normalize_key(text: &str) -> String {
    text.trim().to_string()
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

pub struct TokenCache {
    entries: HashMap<String, TokenSequence>,
    order: VecDeque<String>,
    capacity: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl TokenCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Look up a key, counting the hit or miss
    pub fn lookup(&mut self, key: &str) -> Option<TokenSequence> {
        match self.entries.get(key) {
            Some(tokens) => {
                self.hits += 1;
                Some(tokens.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Peek without touching the counters
    pub fn get(&self, key: &str) -> Option<&TokenSequence> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Store tokens for a key. Last write wins.
    pub fn insert(&mut self, key: String, tokens: TokenSequence) {
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = tokens;
            return;
        }

        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                    self.evictions += 1;
                }
                None => break,
            }
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, tokens);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }
}
