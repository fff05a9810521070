//! Settings schema with compiled defaults.

use serde::{Deserialize, Serialize};

/// Root settings for the pipeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GristSettings {
    /// Knowledge-retrieval service settings.
    pub retrieval: RetrievalSettings,
    /// Text-generation service settings.
    pub generation: GenerationSettings,
    /// Session store settings.
    pub session: SessionSettings,
}

/// Knowledge-retrieval service settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrievalSettings {
    /// Service base URL.
    pub base_url: String,
    /// Bearer token for the service.
    pub api_key: String,
    /// Reranker model identifier passed through to the service.
    pub rerank_id: String,
    /// Minimum similarity for returned fragments.
    pub similarity_threshold: f64,
    /// Number of fragments requested per turn.
    pub size: u32,
    /// Candidate pool size before reranking.
    pub top_k: u32,
    /// Whether the service should consult its knowledge graph.
    pub use_knowledge_graph: bool,
    /// Blend weight between vector and term similarity.
    pub vector_similarity_weight: f64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9380".into(),
            api_key: String::new(),
            rerank_id: "bce-reranker-base_v1@Xinference".into(),
            similarity_threshold: 0.2,
            size: 10,
            top_k: 1024,
            use_knowledge_graph: false,
            vector_similarity_weight: 0.3,
        }
    }
}

/// Text-generation service settings (OpenAI-compatible endpoint).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationSettings {
    /// Service base URL, including the `/v1` segment.
    pub base_url: String,
    /// API key for the service.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Default sampling temperature; per-call overrides pass through unclamped.
    pub temperature: f64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/v1".into(),
            api_key: String::new(),
            model: "Qwen2.5-72B-Instruct".into(),
            temperature: 0.1,
        }
    }
}

/// Session store settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// Hard cap on messages retained per session.
    pub max_messages: usize,
    /// Number of recent exchanges handed to the generator as context.
    pub history_turns: usize,
    /// Age after which an external sweeper may evict a session.
    pub max_age_hours: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_messages: 50,
            history_turns: 5,
            max_age_hours: 24,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_are_camel_case() {
        let json = serde_json::to_value(GristSettings::default()).unwrap();
        assert!(json["retrieval"].get("similarityThreshold").is_some());
        assert!(json["retrieval"].get("useKnowledgeGraph").is_some());
        assert!(json["generation"].get("baseUrl").is_some());
        assert!(json["session"].get("maxMessages").is_some());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: GristSettings =
            serde_json::from_value(serde_json::json!({"generation": {"model": "other-model"}}))
                .unwrap();
        assert_eq!(settings.generation.model, "other-model");
        assert_eq!(settings.generation.temperature, 0.1);
        assert_eq!(settings.session.max_messages, 50);
    }

    #[test]
    fn roundtrip_preserves_values() {
        let mut settings = GristSettings::default();
        settings.retrieval.size = 25;
        settings.session.history_turns = 3;
        let json = serde_json::to_string(&settings).unwrap();
        let back: GristSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, back);
    }
}
