//! Tokenization backends
//!
//! One capability, two engines plus a relay:
//! - `local.rs` - LocalEngine: dictionary-based analyzer, built once
//! - `remote.rs` - RemoteService: one JSON POST per batch, all-or-nothing
//! - `relay.rs` - RelayEngine: forwards batches to the worker as REQUEST_TOKEN
//!
//! The engine is picked once at startup from the persisted `ParseEngine`.
//! Switching engines requires reloading the extension.

pub mod local;
pub mod relay;
pub mod remote;

pub use local::*;
pub use relay::*;
pub use remote::*;

use crate::config::ParseEngine;
use crate::token::TokenSequence;

/// Tokenization errors. Any of these fails the whole batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    /// Request never produced a response
    Transport(String),
    /// Response status outside 2xx
    Status(u16),
    /// Body was not a JSON array of token sequences
    Malformed(String),
    /// Response length differs from the request length
    LengthMismatch { expected: usize, got: usize },
    /// Selected engine could not be constructed
    EngineUnavailable(String),
    /// The local analyzer threw or returned something unreadable
    Analyzer(String),
}

impl std::fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "Transport failed: {}", msg),
            Self::Status(code) => write!(f, "Unexpected status: {}", code),
            Self::Malformed(msg) => write!(f, "Malformed response: {}", msg),
            Self::LengthMismatch { expected, got } => {
                write!(f, "Length mismatch: expected {}, got {}", expected, got)
            }
            Self::EngineUnavailable(msg) => write!(f, "Engine unavailable: {}", msg),
            Self::Analyzer(msg) => write!(f, "Analyzer failed: {}", msg),
        }
    }
}

impl std::error::Error for TokenizeError {}

/// Batch tokenization contract.
///
/// On success the output has exactly one sequence per input, in input order.
#[allow(async_fn_in_trait)]
pub trait Tokenize {
    async fn tokenize(&self, texts: &[String]) -> Result<Vec<TokenSequence>, TokenizeError>;
}

/// The configured backend
pub enum Engine<A, T> {
    Local(LocalEngine<A>),
    Remote(RemoteService<T>),
}

impl<A: Analyzer, T: HttpTransport> Engine<A, T> {
    /// Build the engine named by the persisted selection.
    ///
    /// The local engine needs an analyzer; without one the selection cannot be honored.
    pub fn select(
        kind: ParseEngine,
        analyzer: Option<A>,
        transport: T,
        endpoint: &str,
    ) -> Result<Self, TokenizeError> {
        match kind {
            ParseEngine::Local => analyzer
                .map(|a| Engine::Local(LocalEngine::new(a)))
                .ok_or_else(|| TokenizeError::EngineUnavailable("no analyzer loaded".to_string())),
            ParseEngine::Remote => Ok(Engine::Remote(RemoteService::new(transport, endpoint))),
        }
    }

    pub fn kind(&self) -> ParseEngine {
        match self {
            Engine::Local(_) => ParseEngine::Local,
            Engine::Remote(_) => ParseEngine::Remote,
        }
    }
}

impl<A: Analyzer, T: HttpTransport> Tokenize for Engine<A, T> {
    async fn tokenize(&self, texts: &[String]) -> Result<Vec<TokenSequence>, TokenizeError> {
        match self {
            Engine::Local(engine) => engine.tokenize(texts).await,
            Engine::Remote(service) => service.tokenize(texts).await,
        }
    }
}
