//! Conversation messages and finalized turn results.
//!
//! - [`Message`]: one session entry, immutable once appended
//! - [`HistoryEntry`]: fragment-stripped `{role, content}` pair handed to
//!   the generation adapter as recent context
//! - [`TurnMessage`]: the finalized result of one turn

use serde::{Deserialize, Serialize};

use crate::fragments::{DocumentAggregate, Fragment};

/// Message author role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End-user message.
    User,
    /// Generated assistant message.
    Assistant,
}

impl Role {
    /// Wire string for the role (`user` / `assistant`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single conversation entry owned by a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author role.
    pub role: Role,
    /// Text content.
    pub content: String,
    /// Fragments cited by the message (assistant messages only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fragments: Vec<Fragment>,
    /// ISO 8601 creation time.
    pub timestamp: String,
}

impl Message {
    /// Create a message stamped with the current UTC time.
    #[must_use]
    pub fn now(role: Role, content: impl Into<String>, fragments: Vec<Fragment>) -> Self {
        Self {
            role,
            content: content.into(),
            fragments,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Fragment-stripped history pair for generation context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Author role.
    pub role: Role,
    /// Text content.
    pub content: String,
}

impl From<&Message> for HistoryEntry {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}

/// The finalized result of one turn.
///
/// Payload of the terminal `message` event in streaming mode and the
/// return value of the blocking call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnMessage {
    /// Unique message id.
    pub id: String,
    /// Complete, citation-annotated answer text.
    pub content: String,
    /// Fragments the answer may cite, in ordinal order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fragments: Vec<Fragment>,
    /// Enriched per-document rollups (streaming mode only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub doc_aggs: Vec<DocumentAggregate>,
    /// Owning conversation identifier.
    pub thread_id: String,
    /// Logical agent that produced the turn.
    pub agent_id: String,
}

impl TurnMessage {
    /// Create a turn message with a fresh uuid.
    #[must_use]
    pub fn new(
        content: impl Into<String>,
        fragments: Vec<Fragment>,
        doc_aggs: Vec<DocumentAggregate>,
        thread_id: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            fragments,
            doc_aggs,
            thread_id: thread_id.into(),
            agent_id: agent_id.into(),
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
    fn role_wire_strings() {
        assert_eq!(serde_json::to_value(Role::User).unwrap(), "user");
        assert_eq!(serde_json::to_value(Role::Assistant).unwrap(), "assistant");
        assert_eq!(Role::User.as_str(), "user");
    }

    #[test]
    fn message_now_stamps_timestamp() {
        let msg = Message::now(Role::User, "hello", vec![]);
        assert_eq!(msg.role, Role::User);
        assert!(!msg.timestamp.is_empty());
        assert!(msg.fragments.is_empty());
    }

    #[test]
    fn message_empty_fragments_omitted_on_wire() {
        let msg = Message::now(Role::User, "hello", vec![]);
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("fragments").is_none());
    }

    #[test]
    fn history_entry_strips_fragments() {
        let frag = Fragment {
            ordinal: 1,
            id: "c1".into(),
            content: "body".into(),
            document_id: "d1".into(),
            document_name: "a.pdf".into(),
            image_id: None,
            positions: vec![],
            similarity: 0.9,
            page: None,
        };
        let msg = Message::now(Role::Assistant, "answer", vec![frag]);
        let entry = HistoryEntry::from(&msg);
        assert_eq!(entry.role, Role::Assistant);
        assert_eq!(entry.content, "answer");
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("fragments").is_none());
    }

    #[test]
    fn turn_message_unique_ids() {
        let a = TurnMessage::new("x", vec![], vec![], "t1", "knowledge-chat");
        let b = TurnMessage::new("x", vec![], vec![], "t1", "knowledge-chat");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn turn_message_serde_roundtrip() {
        let msg = TurnMessage::new("answer [ID:1]", vec![], vec![], "t1", "knowledge-chat");
        let json = serde_json::to_string(&msg).unwrap();
        let back: TurnMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, back);
    }
}
