//! RelayEngine: tokenization delegated to the extension worker
//!
//! The content script posts each batch as a REQUEST_TOKEN message and the
//! worker's `MessageHub` answers from its shared cache and configured engine.
//! A null reply, an unreadable reply or one of the wrong length fails the
//! whole batch.

use serde_json::Value;

use crate::messaging::Request;
use crate::token::TokenSequence;

use super::{Tokenize, TokenizeError};

/// Channel to the worker. `web::JsMessenger` in the browser.
#[allow(async_fn_in_trait)]
pub trait MessageTransport {
    /// Send one message and wait for its reply
    async fn send(&self, message: Value) -> Result<Value, TokenizeError>;
}

pub struct RelayEngine<M> {
    messenger: M,
}

impl<M: MessageTransport> RelayEngine<M> {
    pub fn new(messenger: M) -> Self {
        Self { messenger }
    }
}

/// Decode a REQUEST_TOKEN reply, enforcing the positional contract
pub fn decode_reply(reply: Value, expected: usize) -> Result<Vec<TokenSequence>, TokenizeError> {
    if reply.is_null() {
        return Err(TokenizeError::Transport("worker returned no tokens".to_string()));
    }

    let sequences: Vec<TokenSequence> =
        serde_json::from_value(reply).map_err(|e| TokenizeError::Malformed(e.to_string()))?;

    if sequences.len() != expected {
        return Err(TokenizeError::LengthMismatch {
            expected,
            got: sequences.len(),
        });
    }

    Ok(sequences)
}

impl<M: MessageTransport> Tokenize for RelayEngine<M> {
    async fn tokenize(&self, texts: &[String]) -> Result<Vec<TokenSequence>, TokenizeError> {
        let request = Request::RequestToken {
            tweets: texts.to_vec(),
        };
        let message = serde_json::to_value(&request).map_err(|e| TokenizeError::Malformed(e.to_string()))?;
        let reply = self.messenger.send(message).await?;
        decode_reply(reply, texts.len())
    }
}
