//! # grist-settings
//!
//! Layered configuration for the grist knowledge-chat pipeline.
//!
//! Settings are resolved from three layers (in priority order):
//! 1. **Compiled defaults** — [`GristSettings::default()`]
//! 2. **User file** — `~/.grist/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `GRIST_*` overrides (highest priority)
//!
//! There is no process-global settings cache: [`load_settings`] returns a
//! value the caller owns and injects into the components that need it.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = GristSettings::default();
        assert_eq!(settings.retrieval.similarity_threshold, 0.2);
        assert_eq!(settings.retrieval.size, 10);
        assert_eq!(settings.retrieval.top_k, 1024);
        assert!(!settings.retrieval.use_knowledge_graph);
        assert_eq!(settings.retrieval.vector_similarity_weight, 0.3);
        assert_eq!(settings.generation.temperature, 0.1);
        assert_eq!(settings.session.max_messages, 50);
        assert_eq!(settings.session.history_turns, 5);
        assert_eq!(settings.session.max_age_hours, 24);
    }

    #[test]
    fn deep_merge_re_exported() {
        let a = serde_json::json!({"x": 1});
        let b = serde_json::json!({"y": 2});
        let merged = deep_merge(a, b);
        assert_eq!(merged["x"], 1);
        assert_eq!(merged["y"], 2);
    }
}
