//! Settings resolution: defaults → file → environment.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::errors::Result;
use crate::types::GristSettings;

/// Default settings file location: `~/.grist/settings.json`.
#[must_use]
pub fn settings_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".grist")
        .join("settings.json")
}

/// Resolve settings from the default path with env overrides.
///
/// A missing file is not an error; defaults apply.
pub fn load_settings() -> Result<GristSettings> {
    load_settings_from_path(&settings_path())
}

/// Resolve settings from a specific file path with env overrides.
pub fn load_settings_from_path(path: &Path) -> Result<GristSettings> {
    let defaults = serde_json::to_value(GristSettings::default())?;

    let merged = if path.exists() {
        let raw = std::fs::read_to_string(path)?;
        let file: Value = serde_json::from_str(&raw)?;
        tracing::debug!(?path, "settings file merged over defaults");
        deep_merge(defaults, file)
    } else {
        tracing::debug!(?path, "no settings file, using defaults");
        defaults
    };

    let mut settings: GristSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Deep-merge `overlay` into `base`.
///
/// Objects merge recursively; any other overlay value replaces the base
/// value wholesale.
#[must_use]
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                let _ = base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Apply `GRIST_*` environment overrides (highest priority).
fn apply_env_overrides(settings: &mut GristSettings) {
    if let Ok(v) = std::env::var("GRIST_RETRIEVAL_BASE_URL") {
        settings.retrieval.base_url = v;
    }
    if let Ok(v) = std::env::var("GRIST_RETRIEVAL_API_KEY") {
        settings.retrieval.api_key = v;
    }
    if let Ok(v) = std::env::var("GRIST_GENERATION_BASE_URL") {
        settings.generation.base_url = v;
    }
    if let Ok(v) = std::env::var("GRIST_GENERATION_API_KEY") {
        settings.generation.api_key = v;
    }
    if let Ok(v) = std::env::var("GRIST_GENERATION_MODEL") {
        settings.generation.model = v;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
