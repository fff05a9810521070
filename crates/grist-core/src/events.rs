//! Turn event protocol.
//!
//! [`TurnEvent`] is the sole channel through which orchestration progress
//! is observable. Events are produced in a strict order per turn:
//! `status` → `fragments` → `status` → `token`* → `message` → `end`, with
//! `error` replacing the tail when the pipeline fails. Events are transient
//! (never persisted) and are framed for transport by the runtime's emitter.

use serde::{Deserialize, Serialize};

use crate::fragments::{DocumentRef, Fragment};
use crate::messages::TurnMessage;

/// A discriminated turn-progress event.
///
/// Every variant except `end` carries the owning conversation identifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TurnEvent {
    /// Stage transition notice with display text.
    #[serde(rename = "status")]
    Status {
        /// Human-readable stage description.
        content: String,
        /// Owning conversation identifier.
        thread_id: String,
    },

    /// Normalized retrieval metadata (not the raw grounding text).
    #[serde(rename = "fragments")]
    Fragments {
        /// Fragments in ordinal order; empty when retrieval degraded.
        fragments: Vec<Fragment>,
        /// Pre-thumbnail per-document rollups.
        doc_refs: Vec<DocumentRef>,
        /// Owning conversation identifier.
        thread_id: String,
    },

    /// Incremental generated text.
    #[serde(rename = "token")]
    Token {
        /// The increment.
        content: String,
        /// Cumulative answer so far.
        full_content: String,
        /// Owning conversation identifier.
        thread_id: String,
    },

    /// Terminal payload: the complete, enriched turn result.
    #[serde(rename = "message")]
    Message {
        /// Finalized turn message.
        message: TurnMessage,
        /// Owning conversation identifier.
        thread_id: String,
    },

    /// Pipeline failure notice; the turn persisted nothing.
    #[serde(rename = "error")]
    Error {
        /// Human-readable error message.
        content: String,
        /// Owning conversation identifier.
        thread_id: String,
    },

    /// Stream closure marker, emitted exactly once per turn.
    #[serde(rename = "end")]
    End,
}

impl TurnEvent {
    /// Event kind string (for type discrimination).
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Fragments { .. } => "fragments",
            Self::Token { .. } => "token",
            Self::Message { .. } => "message",
            Self::Error { .. } => "error",
            Self::End => "end",
        }
    }

    /// Owning conversation identifier, absent on `end`.
    #[must_use]
    pub fn thread_id(&self) -> Option<&str> {
        match self {
            Self::Status { thread_id, .. }
            | Self::Fragments { thread_id, .. }
            | Self::Token { thread_id, .. }
            | Self::Message { thread_id, .. }
            | Self::Error { thread_id, .. } => Some(thread_id),
            Self::End => None,
        }
    }

    /// Build a `status` event.
    #[must_use]
    pub fn status(content: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self::Status {
            content: content.into(),
            thread_id: thread_id.into(),
        }
    }

    /// Build an `error` event.
    #[must_use]
    pub fn error(content: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self::Error {
            content: content.into(),
            thread_id: thread_id.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
