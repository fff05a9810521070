//! Knowledge-retrieval service client.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use grist_core::text::excerpt;
use grist_settings::RetrievalSettings;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, error, instrument, warn};

use crate::errors::RetrievalError;
use crate::normalize::{Retrieved, normalize};
use crate::types::{RetrievalRequest, RetrievalResponse, ThumbnailResponse};

/// Byte budget for response-body excerpts carried in errors.
const BODY_EXCERPT_BYTES: usize = 2048;

/// The retrieval seam the orchestrator depends on.
///
/// `retrieve` failures are typed so the caller can log context before
/// degrading; `fetch_thumbnails` is error-tolerant by contract because a
/// thumbnail failure must never fail a turn.
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    /// Search a knowledge base and normalize the result.
    async fn retrieve(&self, question: &str, kb_id: &str) -> Result<Retrieved, RetrievalError>;

    /// Resolve thumbnail URLs for the given documents.
    ///
    /// Returns an empty map on any failure; missing documents are simply
    /// absent from the map.
    async fn fetch_thumbnails(&self, doc_ids: &[String]) -> HashMap<String, String>;

    /// Fetch the binary image referenced by a fragment.
    async fn fetch_image(&self, image_id: &str) -> Result<Bytes, RetrievalError>;

    /// Viewer URL for a document, given its inferred file extension.
    fn viewer_url(&self, doc_id: &str, ext: &str) -> String;
}

/// HTTP client for the knowledge-retrieval service.
pub struct RetrievalClient {
    config: RetrievalSettings,
    client: reqwest::Client,
}

impl RetrievalClient {
    /// Create a new client.
    #[must_use]
    pub fn new(config: RetrievalSettings) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Create a new client with a shared HTTP client.
    #[must_use]
    pub fn with_client(config: RetrievalSettings, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Service base URL with any trailing slash removed.
    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Bearer auth and JSON content type.
    fn build_headers(&self) -> Result<HeaderMap, RetrievalError> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth_value = format!("Bearer {}", self.config.api_key);
        let _ = headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value).map_err(|e| RetrievalError::Auth {
                message: e.to_string(),
            })?,
        );
        Ok(headers)
    }

    /// Build the search request from configured knobs.
    fn build_request(&self, question: &str, kb_id: &str) -> RetrievalRequest {
        RetrievalRequest {
            question: question.to_owned(),
            dataset_ids: vec![kb_id.to_owned()],
            rerank_id: self.config.rerank_id.clone(),
            similarity_threshold: self.config.similarity_threshold,
            size: self.config.size,
            top_k: self.config.top_k,
            use_kg: self.config.use_knowledge_graph,
            vector_similarity_weight: self.config.vector_similarity_weight,
        }
    }
}

#[async_trait]
impl KnowledgeRetriever for RetrievalClient {
    #[instrument(skip_all, fields(kb_id))]
    async fn retrieve(&self, question: &str, kb_id: &str) -> Result<Retrieved, RetrievalError> {
        let request = self.build_request(question, kb_id);
        let url = format!("{}/api/v1/retrieval", self.base_url());

        debug!(
            kb_id,
            size = request.size,
            top_k = request.top_k,
            "sending retrieval request"
        );

        let response = self
            .client
            .post(&url)
            .headers(self.build_headers()?)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "retrieval API error");
            return Err(RetrievalError::Status {
                status: status.as_u16(),
                body: excerpt(&body, BODY_EXCERPT_BYTES),
            });
        }

        let body = response.text().await?;
        let parsed: RetrievalResponse = serde_json::from_str(&body)?;
        let retrieved = normalize(&parsed);
        debug!(
            fragments = retrieved.fragments.len(),
            documents = retrieved.doc_refs.len(),
            "retrieval normalized"
        );
        Ok(retrieved)
    }

    #[instrument(skip_all, fields(docs = doc_ids.len()))]
    async fn fetch_thumbnails(&self, doc_ids: &[String]) -> HashMap<String, String> {
        if doc_ids.is_empty() {
            return HashMap::new();
        }
        let url = format!("{}/v1/document/thumbnails", self.base_url());

        let headers = match self.build_headers() {
            Ok(h) => h,
            Err(e) => {
                warn!(error = %e, "thumbnail resolution skipped");
                return HashMap::new();
            }
        };
        let result = self
            .client
            .get(&url)
            .headers(headers)
            .query(&[("doc_ids", doc_ids.join(","))])
            .send()
            .await;

        let response = match result {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!(status = r.status().as_u16(), "thumbnail resolution failed");
                return HashMap::new();
            }
            Err(e) => {
                warn!(error = %e, "thumbnail resolution failed");
                return HashMap::new();
            }
        };

        match response.json::<ThumbnailResponse>().await {
            Ok(parsed) if parsed.code == Some(0) => parsed
                .data
                .unwrap_or_default()
                .into_iter()
                .map(|(doc_id, path)| (doc_id, format!("{}{path}", self.base_url())))
                .collect(),
            Ok(parsed) => {
                warn!(code = ?parsed.code, "thumbnail response not usable");
                HashMap::new()
            }
            Err(e) => {
                warn!(error = %e, "malformed thumbnail response");
                HashMap::new()
            }
        }
    }

    #[instrument(skip_all, fields(image_id))]
    async fn fetch_image(&self, image_id: &str) -> Result<Bytes, RetrievalError> {
        let url = format!("{}/v1/document/image/{image_id}", self.base_url());
        let response = self
            .client
            .get(&url)
            .headers(self.build_headers()?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), image_id, "image fetch failed");
            return Err(RetrievalError::Status {
                status: status.as_u16(),
                body: excerpt(&body, BODY_EXCERPT_BYTES),
            });
        }
        Ok(response.bytes().await?)
    }

    fn viewer_url(&self, doc_id: &str, ext: &str) -> String {
        format!(
            "{}/document/{doc_id}?ext={ext}&prefix=document",
            self.base_url()
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
