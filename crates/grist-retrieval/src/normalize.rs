//! Retrieval response normalization.
//!
//! Turns the service's heterogeneous chunk schema into an ordered
//! [`Fragment`] list, the grounding text handed to the generator, and
//! the pre-thumbnail document refs. An empty or missing chunk list is a
//! valid result, not an error.

use std::collections::HashMap;

use grist_core::fragments::{DocumentRef, Fragment};

use crate::types::{RawChunk, RetrievalResponse};

/// Grounding text substituted when retrieval produced no fragments.
pub const EMPTY_GROUNDING: &str = "No relevant knowledge base content is available.";

/// Normalized outcome of one retrieval call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Retrieved {
    /// Fragment contents tagged with their ordinals, ready for the
    /// generation prompt.
    pub grounding: String,
    /// Fragments in ordinal order (`1..=k`).
    pub fragments: Vec<Fragment>,
    /// Per-document refs, thumbnail resolution still pending.
    pub doc_refs: Vec<DocumentRef>,
}

impl Retrieved {
    /// The explicit "no fragments" result.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            grounding: EMPTY_GROUNDING.to_owned(),
            fragments: Vec::new(),
            doc_refs: Vec::new(),
        }
    }
}

/// Normalize a raw retrieval response.
///
/// Ordinals are assigned `1..=k` in retrieval order; the grounding text is
/// `[ID:n] <content>` blocks joined by blank lines. Document identifier and
/// name are resolved through the fixed priority chains documented on
/// [`resolve_doc_name`].
#[must_use]
pub fn normalize(response: &RetrievalResponse) -> Retrieved {
    let Some(data) = &response.data else {
        return Retrieved::empty();
    };
    let chunks = match &data.chunks {
        Some(chunks) if !chunks.is_empty() => chunks,
        _ => return Retrieved::empty(),
    };

    let doc_refs: Vec<DocumentRef> = data
        .doc_aggs
        .iter()
        .flatten()
        .map(|agg| DocumentRef {
            doc_id: agg.doc_id.clone().unwrap_or_default(),
            doc_name: agg.doc_name.clone().unwrap_or_default(),
            count: agg.count.unwrap_or_default(),
        })
        .collect();
    let name_by_doc: HashMap<&str, &str> = doc_refs
        .iter()
        .map(|d| (d.doc_id.as_str(), d.doc_name.as_str()))
        .collect();

    let mut grounding = String::new();
    let mut fragments = Vec::with_capacity(chunks.len());

    for (i, chunk) in chunks.iter().enumerate() {
        let ordinal = i + 1;
        let content = chunk.content.clone().unwrap_or_default();
        grounding.push_str(&format!("[ID:{ordinal}] {content}\n\n"));

        let document_id = resolve_doc_id(chunk);
        fragments.push(Fragment {
            ordinal,
            id: chunk.id.clone().unwrap_or_default(),
            content,
            document_name: resolve_doc_name(chunk, &document_id, &name_by_doc),
            document_id,
            image_id: chunk.image_id.clone().filter(|s| !s.is_empty()),
            positions: chunk.positions.clone().unwrap_or_default(),
            similarity: chunk.similarity.unwrap_or_default(),
            page: resolve_page(chunk),
        });
    }

    Retrieved {
        grounding: grounding.trim_end().to_owned(),
        fragments,
        doc_refs,
    }
}

/// Document identifier: `document_id` → `doc_id` → empty.
fn resolve_doc_id(chunk: &RawChunk) -> String {
    chunk
        .document_id
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| chunk.doc_id.clone().filter(|s| !s.is_empty()))
        .unwrap_or_default()
}

/// Document display name, resolved through the fixed priority chain:
/// `document_name` → `document_keyword` → `docnm_kwd` → doc-agg map by
/// document id → `doc_name` → empty.
fn resolve_doc_name(chunk: &RawChunk, doc_id: &str, name_by_doc: &HashMap<&str, &str>) -> String {
    let own = [
        &chunk.document_name,
        &chunk.document_keyword,
        &chunk.docnm_kwd,
    ]
    .into_iter()
    .find_map(|field| field.clone().filter(|s| !s.is_empty()));
    if let Some(name) = own {
        return name;
    }
    if let Some(name) = name_by_doc.get(doc_id).filter(|n| !n.is_empty()) {
        return (*name).to_owned();
    }
    chunk
        .doc_name
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_default()
}

/// Page number: first `page_num_int` entry, else the leading coordinate of
/// the first position row.
fn resolve_page(chunk: &RawChunk) -> Option<u32> {
    if let Some(page) = chunk.page_num_int.as_ref().and_then(|p| p.first()) {
        return Some(*page);
    }
    chunk
        .positions
        .as_ref()
        .and_then(|rows| rows.first())
        .and_then(|row| row.first())
        .and_then(|&p| u32::try_from(p).ok())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RawDocAgg, RetrievalData};

    fn response_with_chunks(chunks: Vec<RawChunk>, doc_aggs: Vec<RawDocAgg>) -> RetrievalResponse {
        RetrievalResponse {
            code: Some(0),
            data: Some(RetrievalData {
                chunks: Some(chunks),
                doc_aggs: Some(doc_aggs),
            }),
        }
    }

    fn chunk(content: &str) -> RawChunk {
        RawChunk {
            id: Some("c1".into()),
            content: Some(content.into()),
            similarity: Some(0.9),
            ..RawChunk::default()
        }
    }

    // ── empty handling ───────────────────────────────────────────────────

    #[test]
    fn missing_data_is_empty_result() {
        let retrieved = normalize(&RetrievalResponse::default());
        assert_eq!(retrieved, Retrieved::empty());
        assert_eq!(retrieved.grounding, EMPTY_GROUNDING);
    }

    #[test]
    fn empty_chunk_list_is_empty_result() {
        let retrieved = normalize(&response_with_chunks(vec![], vec![]));
        assert!(retrieved.fragments.is_empty());
        assert_eq!(retrieved.grounding, EMPTY_GROUNDING);
    }

    // ── ordinals and grounding ───────────────────────────────────────────

    #[test]
    fn ordinals_are_one_based_in_retrieval_order() {
        let retrieved = normalize(&response_with_chunks(
            vec![chunk("first"), chunk("second"), chunk("third")],
            vec![],
        ));
        let ordinals: Vec<usize> = retrieved.fragments.iter().map(|f| f.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);
    }

    #[test]
    fn grounding_tags_contents_with_ordinals() {
        let retrieved = normalize(&response_with_chunks(
            vec![chunk("alpha"), chunk("beta")],
            vec![],
        ));
        assert_eq!(retrieved.grounding, "[ID:1] alpha\n\n[ID:2] beta");
    }

    // ── document name priority chain ─────────────────────────────────────

    #[test]
    fn explicit_name_field_wins() {
        let mut c = chunk("x");
        c.document_name = Some("explicit.pdf".into());
        c.document_keyword = Some("keyword.pdf".into());
        c.docnm_kwd = Some("legacy.pdf".into());
        let retrieved = normalize(&response_with_chunks(vec![c], vec![]));
        assert_eq!(retrieved.fragments[0].document_name, "explicit.pdf");
    }

    #[test]
    fn keyword_field_beats_legacy_keyword() {
        let mut c = chunk("x");
        c.document_keyword = Some("keyword.pdf".into());
        c.docnm_kwd = Some("legacy.pdf".into());
        let retrieved = normalize(&response_with_chunks(vec![c], vec![]));
        assert_eq!(retrieved.fragments[0].document_name, "keyword.pdf");
    }

    #[test]
    fn doc_agg_map_fills_in_when_chunk_fields_absent() {
        let mut c = chunk("x");
        c.doc_id = Some("d7".into());
        let aggs = vec![RawDocAgg {
            doc_id: Some("d7".into()),
            doc_name: Some("from-aggs.pdf".into()),
            count: Some(1),
        }];
        let retrieved = normalize(&response_with_chunks(vec![c], aggs));
        assert_eq!(retrieved.fragments[0].document_name, "from-aggs.pdf");
    }

    #[test]
    fn doc_name_field_is_last_resort_before_empty() {
        let mut c = chunk("x");
        c.doc_name = Some("oldest.pdf".into());
        let retrieved = normalize(&response_with_chunks(vec![c], vec![]));
        assert_eq!(retrieved.fragments[0].document_name, "oldest.pdf");
    }

    #[test]
    fn unresolvable_name_is_empty_string() {
        let retrieved = normalize(&response_with_chunks(vec![chunk("x")], vec![]));
        assert_eq!(retrieved.fragments[0].document_name, "");
    }

    #[test]
    fn empty_string_fields_do_not_shadow_fallbacks() {
        let mut c = chunk("x");
        c.document_name = Some(String::new());
        c.docnm_kwd = Some("legacy.pdf".into());
        let retrieved = normalize(&response_with_chunks(vec![c], vec![]));
        assert_eq!(retrieved.fragments[0].document_name, "legacy.pdf");
    }

    // ── document id ──────────────────────────────────────────────────────

    #[test]
    fn document_id_prefers_newer_field() {
        let mut c = chunk("x");
        c.document_id = Some("new-id".into());
        c.doc_id = Some("old-id".into());
        let retrieved = normalize(&response_with_chunks(vec![c], vec![]));
        assert_eq!(retrieved.fragments[0].document_id, "new-id");
    }

    // ── page inference ───────────────────────────────────────────────────

    #[test]
    fn page_from_page_num_int() {
        let mut c = chunk("x");
        c.page_num_int = Some(vec![6, 6, 7]);
        c.positions = Some(vec![vec![9, 1, 2, 3, 4]]);
        let retrieved = normalize(&response_with_chunks(vec![c], vec![]));
        assert_eq!(retrieved.fragments[0].page, Some(6));
    }

    #[test]
    fn page_inferred_from_positions_when_list_absent() {
        let mut c = chunk("x");
        c.positions = Some(vec![vec![4, 10, 20, 30, 40], vec![5, 0, 0, 0, 0]]);
        let retrieved = normalize(&response_with_chunks(vec![c], vec![]));
        assert_eq!(retrieved.fragments[0].page, Some(4));
    }

    #[test]
    fn page_absent_when_no_hints() {
        let retrieved = normalize(&response_with_chunks(vec![chunk("x")], vec![]));
        assert_eq!(retrieved.fragments[0].page, None);
    }

    // ── doc refs ─────────────────────────────────────────────────────────

    #[test]
    fn doc_refs_pass_through_counts() {
        let aggs = vec![
            RawDocAgg {
                doc_id: Some("d1".into()),
                doc_name: Some("a.pdf".into()),
                count: Some(3),
            },
            RawDocAgg {
                doc_id: Some("d2".into()),
                doc_name: Some("b.pdf".into()),
                count: None,
            },
        ];
        let retrieved = normalize(&response_with_chunks(vec![chunk("x")], aggs));
        assert_eq!(retrieved.doc_refs.len(), 2);
        assert_eq!(retrieved.doc_refs[0].count, 3);
        assert_eq!(retrieved.doc_refs[1].count, 0);
    }
}
