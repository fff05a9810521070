//! Retrieved knowledge fragments and per-document rollups.
//!
//! - [`Fragment`]: a single retrieved knowledge unit with provenance
//! - [`DocumentRef`]: per-document fragment count, known at retrieval time
//! - [`DocumentAggregate`]: document rollup enriched with display assets,
//!   built only after generation completes

use serde::{Deserialize, Serialize};

/// A single retrieved knowledge unit.
///
/// The `ordinal` is assigned at retrieval time (1-based, in retrieval order)
/// and is the only numbering an answer's inline citation markers may
/// reference. Wire field names follow the retrieval service's chunk schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// One-based position in the retrieval result.
    #[serde(rename = "index")]
    pub ordinal: usize,
    /// Stable fragment identifier.
    #[serde(rename = "chunk_id")]
    pub id: String,
    /// Fragment text content.
    pub content: String,
    /// Source document identifier.
    pub document_id: String,
    /// Source document display name.
    pub document_name: String,
    /// Optional image reference for the fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    /// Raw position hints: rows of `[page, x1, x2, y1, y2]`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positions: Vec<Vec<i64>>,
    /// Similarity score reported by the retrieval service.
    pub similarity: f64,
    /// Resolved page number, serialized as a one-element list on the wire.
    #[serde(
        rename = "page_num_int",
        default,
        with = "page_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub page: Option<u32>,
}

/// Per-document fragment count, known before thumbnail resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Document identifier.
    pub doc_id: String,
    /// Document display name.
    pub doc_name: String,
    /// Number of fragments retrieved from this document.
    pub count: u32,
}

/// Per-document rollup with resolved display assets.
///
/// Built after generation completes: thumbnail resolution is a second
/// remote call the pipeline defers until the answer text is finalized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAggregate {
    /// Document identifier.
    pub doc_id: String,
    /// Document display name.
    pub doc_name: String,
    /// Number of fragments retrieved from this document.
    pub count: u32,
    /// Resolved thumbnail URL, empty when resolution failed.
    pub thumbnail_url: String,
    /// Viewer URL derived from document id and inferred file extension.
    pub document_url: String,
}

/// Infer a lowercase file extension from a document name.
///
/// Falls back to `pdf` when the name has no extension.
#[must_use]
pub fn infer_extension(doc_name: &str) -> String {
    match doc_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_lowercase(),
        _ => "pdf".to_owned(),
    }
}

/// Wire codec for `page_num_int`: an optional page stored as `[page]`.
mod page_list {
    use serde::de::Deserializer;
    use serde::ser::Serializer;
    use serde::{Deserialize, Serialize};

    pub fn serialize<S: Serializer>(page: &Option<u32>, ser: S) -> Result<S::Ok, S::Error> {
        match page {
            Some(p) => [*p].serialize(ser),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<u32>, D::Error> {
        let pages: Option<Vec<u32>> = Option::deserialize(de)?;
        Ok(pages.and_then(|p| p.first().copied()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(ordinal: usize) -> Fragment {
        Fragment {
            ordinal,
            id: format!("frag-{ordinal}"),
            content: "refunds are processed within 14 days".into(),
            document_id: "doc-1".into(),
            document_name: "policy.pdf".into(),
            image_id: None,
            positions: vec![],
            similarity: 0.87,
            page: None,
        }
    }

    #[test]
    fn fragment_wire_names() {
        let json = serde_json::to_value(fragment(1)).unwrap();
        assert_eq!(json["index"], 1);
        assert_eq!(json["chunk_id"], "frag-1");
        assert_eq!(json["document_name"], "policy.pdf");
        assert!(json.get("image_id").is_none());
        assert!(json.get("page_num_int").is_none());
    }

    #[test]
    fn fragment_page_serialized_as_list() {
        let mut frag = fragment(2);
        frag.page = Some(6);
        let json = serde_json::to_value(&frag).unwrap();
        assert_eq!(json["page_num_int"], serde_json::json!([6]));
    }

    #[test]
    fn fragment_page_deserialized_from_list() {
        let json = serde_json::json!({
            "index": 1,
            "chunk_id": "c1",
            "content": "text",
            "document_id": "d1",
            "document_name": "a.pdf",
            "similarity": 0.5,
            "page_num_int": [6, 6, 7]
        });
        let frag: Fragment = serde_json::from_value(json).unwrap();
        assert_eq!(frag.page, Some(6));
    }

    #[test]
    fn fragment_serde_roundtrip() {
        let mut frag = fragment(3);
        frag.image_id = Some("img-9".into());
        frag.positions = vec![vec![6, 10, 20, 30, 40]];
        frag.page = Some(6);
        let json = serde_json::to_string(&frag).unwrap();
        let back: Fragment = serde_json::from_str(&json).unwrap();
        assert_eq!(frag, back);
    }

    #[test]
    fn document_aggregate_roundtrip() {
        let agg = DocumentAggregate {
            doc_id: "d1".into(),
            doc_name: "policy.pdf".into(),
            count: 2,
            thumbnail_url: "http://kb.local/thumb/d1.png".into(),
            document_url: "http://kb.local/document/d1?ext=pdf&prefix=document".into(),
        };
        let json = serde_json::to_string(&agg).unwrap();
        let back: DocumentAggregate = serde_json::from_str(&json).unwrap();
        assert_eq!(agg, back);
    }

    // ── infer_extension ──────────────────────────────────────────────────

    #[test]
    fn extension_lowercased() {
        assert_eq!(infer_extension("Report.PDF"), "pdf");
        assert_eq!(infer_extension("notes.Docx"), "docx");
    }

    #[test]
    fn extension_last_dot_wins() {
        assert_eq!(infer_extension("archive.tar.gz"), "gz");
    }

    #[test]
    fn extension_defaults_to_pdf() {
        assert_eq!(infer_extension("README"), "pdf");
        assert_eq!(infer_extension("trailing."), "pdf");
        assert_eq!(infer_extension(""), "pdf");
    }
}
