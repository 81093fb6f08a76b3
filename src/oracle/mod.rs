//! External semantic matching.
//!
//! The alignment engine never judges semantic similarity itself. When the oracle strategy
//! is requested it hands both sequences to a [`SemanticMatcher`] and treats whatever comes
//! back as untrusted input (see [`crate::alignment::oracle`]).
//!
//! - [`SemanticMatcher`]: the consumed capability
//! - [`TocCombiner`]: merges two TOCs into one; no local logic beyond JSON parsing
//! - [`openai::OpenAiClient`]: chat-completions backed implementation of both

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::record::Record;

pub mod openai;

/// Failures of the external call itself
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("matcher request failed: {0}")]
    Transport(String),

    #[error("matcher request timed out after {0:?}")]
    Timeout(Duration),

    #[error("matcher returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("matcher returned a malformed response: {0}")]
    MalformedResponse(String),
}

/// Judges which records of two sequences correspond.
///
/// Implementations return the raw response body. The expected shape is
/// `{"rows": [{"masterIndex": 0, "candidateIndex": 2, "rationale": "..."}]}` with `null`
/// for an absent side, but callers must not rely on it.
#[async_trait]
pub trait SemanticMatcher: Send + Sync {
    /// Single round trip; no retries
    async fn match_sequences(
        &self,
        master: &[Record],
        candidate: &[Record],
    ) -> Result<serde_json::Value, OracleError>;
}

/// Merges two TOCs of arbitrary JSON shape into a single structure
#[async_trait]
pub trait TocCombiner: Send + Sync {
    async fn combine(
        &self,
        toc1: &serde_json::Value,
        toc2: &serde_json::Value,
    ) -> Result<serde_json::Value, OracleError>;
}
