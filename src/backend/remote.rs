//! RemoteService: HTTP NLP backend
//!
//! Serializes the batch as a JSON array, POSTs it once, and expects a JSON
//! array of token sequences back. Transport errors, non-2xx status, a body
//! that does not parse, or a length mismatch all fail the entire batch.
//! No retry, no partial credit, no batching of its own.

use crate::token::TokenSequence;

use super::{Tokenize, TokenizeError};

/// Default NLP endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.mirigana.app/nlp";

/// Raw HTTP response as seen by the adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// POST transport. `web::FetchTransport` in the browser.
#[allow(async_fn_in_trait)]
pub trait HttpTransport {
    async fn post_json(&self, url: &str, body: String) -> Result<HttpResponse, TokenizeError>;
}

pub struct RemoteService<T> {
    transport: T,
    endpoint: String,
}

impl<T: HttpTransport> RemoteService<T> {
    pub fn new(transport: T, endpoint: &str) -> Self {
        Self {
            transport,
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Decode a service response, enforcing the positional contract
pub fn decode_response(response: &HttpResponse, expected: usize) -> Result<Vec<TokenSequence>, TokenizeError> {
    if !response.is_success() {
        return Err(TokenizeError::Status(response.status));
    }

    let sequences: Vec<TokenSequence> = serde_json::from_str(&response.body)
        .map_err(|e| TokenizeError::Malformed(e.to_string()))?;

    if sequences.len() != expected {
        return Err(TokenizeError::LengthMismatch {
            expected,
            got: sequences.len(),
        });
    }

    Ok(sequences)
}

impl<T: HttpTransport> Tokenize for RemoteService<T> {
    async fn tokenize(&self, texts: &[String]) -> Result<Vec<TokenSequence>, TokenizeError> {
        let body = serde_json::to_string(texts).map_err(|e| TokenizeError::Malformed(e.to_string()))?;
        let response = self.transport.post_json(&self.endpoint, body).await?;
        decode_response(&response, texts.len())
    }
}
