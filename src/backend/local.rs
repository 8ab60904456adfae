//! LocalEngine: adapter over a dictionary-based morphological analyzer
//!
//! The analyzer itself is a black box (kuromoji, built once from the bundled
//! dictionary by the host). Analysis is synchronous; the async veneer only
//! keeps the contract uniform with the remote path. One analyzer error fails
//! the whole batch.

use crate::token::{rebuild_tokens, Morpheme, TokenSequence};

use super::{Tokenize, TokenizeError};

/// Morphological analyzer
pub trait Analyzer {
    fn analyze(&self, text: &str) -> Result<Vec<Morpheme>, TokenizeError>;
}

pub struct LocalEngine<A> {
    analyzer: A,
}

impl<A: Analyzer> LocalEngine<A> {
    pub fn new(analyzer: A) -> Self {
        Self { analyzer }
    }

    /// Tokenize one text synchronously
    pub fn tokenize_one(&self, text: &str) -> Result<TokenSequence, TokenizeError> {
        Ok(rebuild_tokens(&self.analyzer.analyze(text)?))
    }
}

impl<A: Analyzer> Tokenize for LocalEngine<A> {
    async fn tokenize(&self, texts: &[String]) -> Result<Vec<TokenSequence>, TokenizeError> {
        texts.iter().map(|t| self.tokenize_one(t)).collect()
    }
}
