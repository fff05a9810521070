//! In-memory session store.
//!
//! Holds per-conversation message history for the process lifetime.
//! Sessions are created implicitly on first reference; mutation is
//! append-only at single-session granularity, so one lock over the map
//! suffices — no cross-session structural sharing exists.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use grist_core::fragments::Fragment;
use grist_core::messages::{HistoryEntry, Message, Role};
use parking_lot::Mutex;
use tracing::{debug, info};

/// Default hard cap on messages retained per session.
pub const DEFAULT_MAX_MESSAGES: usize = 50;

/// One conversation's state.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    /// Opaque conversation identifier.
    pub id: String,
    /// Ordered messages, oldest first; bounded by the store cap.
    pub messages: Vec<Message>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last append time.
    pub updated_at: DateTime<Utc>,
}

impl Session {
    fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Listing entry for a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    /// Conversation identifier.
    pub thread_id: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last append time.
    pub updated_at: DateTime<Utc>,
    /// Current message count.
    pub message_count: usize,
}

/// Bounded in-memory session store.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    max_messages: usize,
}

impl SessionStore {
    /// Create a store with the given per-session message cap.
    #[must_use]
    pub fn new(max_messages: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_messages,
        }
    }

    /// Create a session if absent. Creating an existing session is a no-op.
    pub fn create_session(&self, thread_id: &str) {
        let mut sessions = self.sessions.lock();
        let _ = sessions
            .entry(thread_id.to_owned())
            .or_insert_with(|| Session::new(thread_id));
    }

    /// Snapshot of a session, if it exists.
    #[must_use]
    pub fn get_session(&self, thread_id: &str) -> Option<Session> {
        self.sessions.lock().get(thread_id).cloned()
    }

    /// Append a message, creating the session implicitly if absent.
    ///
    /// Enforces the message cap: once exceeded, the oldest entries are
    /// dropped so the most recent `max_messages` are kept contiguously.
    pub fn append_message(
        &self,
        thread_id: &str,
        role: Role,
        content: impl Into<String>,
        fragments: Vec<Fragment>,
    ) {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .entry(thread_id.to_owned())
            .or_insert_with(|| Session::new(thread_id));
        session.messages.push(Message::now(role, content, fragments));
        if session.messages.len() > self.max_messages {
            let overflow = session.messages.len() - self.max_messages;
            let _ = session.messages.drain(..overflow);
        }
        session.updated_at = Utc::now();
        debug!(thread_id, messages = session.messages.len(), "message appended");
    }

    /// The most recent `max_turns * 2` messages, oldest first, with
    /// fragment data stripped.
    #[must_use]
    pub fn recent_history(&self, thread_id: &str, max_turns: usize) -> Vec<HistoryEntry> {
        let sessions = self.sessions.lock();
        let Some(session) = sessions.get(thread_id) else {
            return Vec::new();
        };
        let take = max_turns * 2;
        let skip = session.messages.len().saturating_sub(take);
        session.messages[skip..].iter().map(HistoryEntry::from).collect()
    }

    /// Summaries of all sessions, in no particular order.
    #[must_use]
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        self.sessions
            .lock()
            .values()
            .map(|session| SessionSummary {
                thread_id: session.id.clone(),
                created_at: session.created_at,
                updated_at: session.updated_at,
                message_count: session.messages.len(),
            })
            .collect()
    }

    /// Remove a session. Returns whether it existed.
    pub fn delete_session(&self, thread_id: &str) -> bool {
        self.sessions.lock().remove(thread_id).is_some()
    }

    /// Evict sessions whose last update is older than `max_age_hours`.
    /// Returns the number evicted.
    pub fn evict_older_than(&self, max_age_hours: u64) -> usize {
        let cutoff = Utc::now() - Duration::hours(max_age_hours as i64);
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, session| session.updated_at > cutoff);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, max_age_hours, "expired sessions evicted");
        }
        evicted
    }

    /// Backdate a session's `updated_at` (test support for eviction).
    #[cfg(test)]
    fn backdate(&self, thread_id: &str, hours: i64) {
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.get_mut(thread_id) {
            session.updated_at = Utc::now() - Duration::hours(hours);
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment() -> Fragment {
        Fragment {
            ordinal: 1,
            id: "c1".into(),
            content: "body".into(),
            document_id: "d1".into(),
            document_name: "a.pdf".into(),
            image_id: None,
            positions: vec![],
            similarity: 0.8,
            page: None,
        }
    }

    // ── create / get ─────────────────────────────────────────────────────

    #[test]
    fn get_unknown_session_is_none() {
        let store = SessionStore::default();
        assert!(store.get_session("nope").is_none());
    }

    #[test]
    fn create_then_get() {
        let store = SessionStore::default();
        store.create_session("t1");
        let session = store.get_session("t1").unwrap();
        assert_eq!(session.id, "t1");
        assert!(session.messages.is_empty());
    }

    #[test]
    fn create_existing_session_is_noop() {
        let store = SessionStore::default();
        store.create_session("t1");
        store.append_message("t1", Role::User, "hello", vec![]);
        store.create_session("t1");
        assert_eq!(store.get_session("t1").unwrap().messages.len(), 1);
    }

    #[test]
    fn get_session_is_idempotent() {
        let store = SessionStore::default();
        store.append_message("t1", Role::User, "hello", vec![]);
        let first = store.get_session("t1").unwrap();
        let second = store.get_session("t1").unwrap();
        assert_eq!(first, second);
    }

    // ── append ───────────────────────────────────────────────────────────

    #[test]
    fn append_creates_session_implicitly() {
        let store = SessionStore::default();
        store.append_message("t1", Role::User, "hello", vec![]);
        let session = store.get_session("t1").unwrap();
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].content, "hello");
    }

    #[test]
    fn append_reflects_as_last_element() {
        let store = SessionStore::default();
        store.append_message("t1", Role::User, "first", vec![]);
        store.append_message("t1", Role::Assistant, "second", vec![fragment()]);
        let session = store.get_session("t1").unwrap();
        let last = session.messages.last().unwrap();
        assert_eq!(last.content, "second");
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.fragments.len(), 1);
    }

    #[test]
    fn cap_drops_oldest_first() {
        let store = SessionStore::new(4);
        for i in 0..10 {
            store.append_message("t1", Role::User, format!("msg-{i}"), vec![]);
        }
        let session = store.get_session("t1").unwrap();
        assert_eq!(session.messages.len(), 4);
        let contents: Vec<&str> = session.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["msg-6", "msg-7", "msg-8", "msg-9"]);
    }

    #[test]
    fn cap_never_exceeded_at_any_point() {
        let store = SessionStore::new(3);
        for i in 0..20 {
            store.append_message("t1", Role::User, format!("m{i}"), vec![]);
            assert!(store.get_session("t1").unwrap().messages.len() <= 3);
        }
    }

    // ── recent history ───────────────────────────────────────────────────

    #[test]
    fn history_unknown_session_is_empty() {
        let store = SessionStore::default();
        assert!(store.recent_history("nope", 5).is_empty());
    }

    #[test]
    fn history_bounded_by_twice_max_turns() {
        let store = SessionStore::default();
        for i in 0..20 {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            store.append_message("t1", role, format!("m{i}"), vec![]);
        }
        let history = store.recent_history("t1", 3);
        assert_eq!(history.len(), 6);
        assert_eq!(history[0].content, "m14");
        assert_eq!(history[5].content, "m19");
    }

    #[test]
    fn history_shorter_than_window_returned_whole() {
        let store = SessionStore::default();
        store.append_message("t1", Role::User, "only", vec![]);
        let history = store.recent_history("t1", 5);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn history_never_includes_fragments() {
        let store = SessionStore::default();
        store.append_message("t1", Role::Assistant, "answer", vec![fragment()]);
        let history = store.recent_history("t1", 5);
        let json = serde_json::to_value(&history).unwrap();
        assert!(json[0].get("fragments").is_none());
    }

    // ── listing / deletion ───────────────────────────────────────────────

    #[test]
    fn list_sessions_reports_counts() {
        let store = SessionStore::default();
        store.append_message("t1", Role::User, "a", vec![]);
        store.append_message("t1", Role::Assistant, "b", vec![]);
        store.append_message("t2", Role::User, "c", vec![]);
        let mut summaries = store.list_sessions();
        summaries.sort_by(|a, b| a.thread_id.cmp(&b.thread_id));
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].message_count, 2);
        assert_eq!(summaries[1].message_count, 1);
    }

    #[test]
    fn delete_session_reports_existence() {
        let store = SessionStore::default();
        store.create_session("t1");
        assert!(store.delete_session("t1"));
        assert!(!store.delete_session("t1"));
        assert!(store.get_session("t1").is_none());
    }

    // ── eviction ─────────────────────────────────────────────────────────

    #[test]
    fn eviction_removes_only_stale_sessions() {
        let store = SessionStore::default();
        store.append_message("stale", Role::User, "old", vec![]);
        store.append_message("fresh", Role::User, "new", vec![]);
        store.backdate("stale", 25);
        store.backdate("fresh", 1);

        let evicted = store.evict_older_than(24);
        assert_eq!(evicted, 1);
        assert!(store.get_session("stale").is_none());
        assert!(store.get_session("fresh").is_some());
    }

    #[test]
    fn eviction_on_empty_store_is_zero() {
        let store = SessionStore::default();
        assert_eq!(store.evict_older_than(24), 0);
    }
}
