//! Retrieval adapter errors.
//!
//! These never cross the orchestrator boundary as failures: the pipeline
//! degrades a failed retrieval to an empty fragment list. They exist so
//! the degradation site has status and body context to log.

/// Errors raised by the knowledge-retrieval client.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// Transport-level failure reaching the service.
    #[error("retrieval request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the service, with a bounded body excerpt.
    #[error("retrieval service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Bounded excerpt of the response body.
        body: String,
    },

    /// Response body did not match the expected schema.
    #[error("malformed retrieval response: {0}")]
    Parse(#[from] serde_json::Error),

    /// API key could not be encoded as a header value.
    #[error("invalid API key header: {message}")]
    Auth {
        /// Underlying encoding failure.
        message: String,
    },
}
