//! # grist-retrieval
//!
//! Knowledge-retrieval adapter.
//!
//! [`client::RetrievalClient`] talks to the remote knowledge-retrieval
//! service (fragment search, document thumbnails, fragment images) behind
//! the [`client::KnowledgeRetriever`] seam the orchestrator depends on.
//! [`normalize`] turns the service's heterogeneous chunk schema into the
//! uniform [`grist_core::fragments::Fragment`] list and grounding text.

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod normalize;
pub mod types;

pub use client::{KnowledgeRetriever, RetrievalClient};
pub use errors::RetrievalError;
pub use normalize::{EMPTY_GROUNDING, Retrieved, normalize};
