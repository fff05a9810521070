//! Bounded diagnostic excerpts.
//!
//! Error payloads from remote services can be arbitrarily large; excerpts
//! keep them loggable. Slicing `&str` at a fixed byte offset panics inside
//! multi-byte characters, so the cut snaps to the nearest char boundary.

/// Shorten `s` to roughly `max_bytes` bytes for diagnostics.
///
/// Strings that fit are returned unchanged. Longer strings are cut at the
/// last char boundary at or before `max_bytes` and suffixed with `…`.
#[must_use]
pub fn excerpt(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_owned();
    }
    let cut = s
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= max_bytes)
        .last()
        .unwrap_or(0);
    format!("{}…", &s[..cut])
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
