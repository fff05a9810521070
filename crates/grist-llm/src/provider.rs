//! Generator trait and shared generation types.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use grist_core::messages::HistoryEntry;

/// Lazy sequence of generated text increments.
///
/// Finite: terminates when the remote service signals completion. Not
/// restartable — regeneration requires a new [`Generator::stream`] call.
pub type TokenStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Inputs for one generation call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationRequest {
    /// Current user message.
    pub message: String,
    /// Grounding text injected into the instructional template.
    pub grounding: String,
    /// Bounded recent history, fragment-stripped, oldest first.
    pub history: Vec<HistoryEntry>,
    /// Per-call temperature override; `None` uses the configured default.
    /// Passed through unclamped.
    pub temperature: Option<f64>,
}

/// The generation seam the orchestrator depends on.
///
/// Fail-closed contract: neither method returns an error. A remote or
/// transport failure surfaces as a single user-visible error string — the
/// only stream item, or the whole blocking answer — so the caller always
/// has something coherent to display and persist.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Stream the answer as text increments.
    async fn stream(&self, request: &GenerationRequest) -> TokenStream;

    /// Produce the complete answer in one call.
    async fn complete(&self, request: &GenerationRequest) -> String;
}

/// Internal generation failures, converted to visible text at the trait
/// surface.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Transport-level failure reaching the service.
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the service, with a bounded body excerpt.
    #[error("generation service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Bounded excerpt of the response body.
        body: String,
    },

    /// Response body did not match the expected schema.
    #[error("malformed generation response: {0}")]
    Parse(#[from] serde_json::Error),

    /// API key could not be encoded as a header value.
    #[error("invalid API key header: {message}")]
    Auth {
        /// Underlying encoding failure.
        message: String,
    },
}

impl GenerationError {
    /// The user-visible text substituted for the answer.
    #[must_use]
    pub fn user_message(&self) -> String {
        format!("Generation service error: {self}")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
