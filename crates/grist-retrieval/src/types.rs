//! Wire types for the knowledge-retrieval service.
//!
//! The service's chunk schema is inconsistent across API variants: the
//! document identifier and display name each appear under several field
//! names depending on the endpoint generation. [`RawChunk`] models every
//! variant as optional; [`crate::normalize`] resolves them through a fixed
//! priority order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Request body for `POST /api/v1/retrieval`.
#[derive(Clone, Debug, Serialize)]
pub struct RetrievalRequest {
    /// User query to search for.
    pub question: String,
    /// Knowledge bases to search.
    pub dataset_ids: Vec<String>,
    /// Reranker model identifier.
    pub rerank_id: String,
    /// Minimum similarity for returned fragments.
    pub similarity_threshold: f64,
    /// Number of fragments requested.
    pub size: u32,
    /// Candidate pool size before reranking.
    pub top_k: u32,
    /// Whether to consult the knowledge graph.
    pub use_kg: bool,
    /// Blend weight between vector and term similarity.
    pub vector_similarity_weight: f64,
}

/// One retrieved chunk, all variant fields optional.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawChunk {
    /// Stable chunk identifier.
    pub id: Option<String>,
    /// Chunk text content.
    pub content: Option<String>,
    /// Document identifier (newer variant).
    pub document_id: Option<String>,
    /// Document identifier (older variant).
    pub doc_id: Option<String>,
    /// Document display name (explicit field).
    pub document_name: Option<String>,
    /// Document display name (keyword field).
    pub document_keyword: Option<String>,
    /// Document display name (legacy keyword field).
    pub docnm_kwd: Option<String>,
    /// Document display name (oldest variant).
    pub doc_name: Option<String>,
    /// Image reference for the chunk.
    pub image_id: Option<String>,
    /// Position rows of `[page, x1, x2, y1, y2]`.
    pub positions: Option<Vec<Vec<i64>>>,
    /// Similarity score.
    pub similarity: Option<f64>,
    /// Page numbers, one per position row.
    pub page_num_int: Option<Vec<u32>>,
}

/// Per-document summary in a retrieval response.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawDocAgg {
    /// Document identifier.
    pub doc_id: Option<String>,
    /// Document display name.
    pub doc_name: Option<String>,
    /// Number of chunks retrieved from this document.
    pub count: Option<u32>,
}

/// `data` envelope of a retrieval response.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RetrievalData {
    /// Retrieved chunks, in relevance order.
    pub chunks: Option<Vec<RawChunk>>,
    /// Per-document summaries.
    pub doc_aggs: Option<Vec<RawDocAgg>>,
}

/// Top-level retrieval response.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RetrievalResponse {
    /// Service status code (0 = success).
    pub code: Option<i64>,
    /// Response payload.
    pub data: Option<RetrievalData>,
}

/// Response of `GET /v1/document/thumbnails`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ThumbnailResponse {
    /// Service status code (0 = success).
    pub code: Option<i64>,
    /// Map of document id to thumbnail path (relative to the service base).
    pub data: Option<HashMap<String, String>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
