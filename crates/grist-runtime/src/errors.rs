//! Pipeline-level errors.
//!
//! Adapter failures are typed at their own crates and degrade inside the
//! orchestrator: empty fragments, substituted answer text, empty
//! thumbnails. What remains here are the failures that abort a turn
//! before the pipeline runs.

/// Errors that abort a turn.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// No orchestrator is registered under the requested agent id.
    #[error("unknown agent: {0}")]
    UnknownAgent(String),
}
