//! Wire types and prompt template for the chat-completion endpoint.

use serde::{Deserialize, Serialize};

/// Instructional template the grounding text is substituted into.
///
/// The `{knowledge}` placeholder receives the `[ID:n]`-tagged fragment
/// contents; the citation rule refers to the same ordinals.
pub const GROUNDING_TEMPLATE: &str = "\
You are a professional AI assistant that answers the user's question from \
the provided knowledge base content.

Knowledge base content:
{knowledge}

Follow these rules:
1. Answer only from the knowledge base content; never invent information.
2. If the knowledge base contains no relevant information, say so explicitly.
3. Cite the supporting fragments inline with [1], [2] markers matching their identifiers.
4. Be accurate, concise, and well organized.
5. Ask the user to clarify when the question is unclear.

Answer the user's question from the knowledge base content.";

/// Render the system prompt for a grounding text.
#[must_use]
pub fn render_system_prompt(grounding: &str) -> String {
    GROUNDING_TEMPLATE.replace("{knowledge}", grounding)
}

/// One chat message in a completion request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessageParam {
    /// `system` / `user` / `assistant`.
    pub role: String,
    /// Message text.
    pub content: String,
}

/// Request body for `POST /chat/completions`.
#[derive(Clone, Debug, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// System prompt, history, then the current user message.
    pub messages: Vec<ChatMessageParam>,
    /// Sampling temperature, passed through unclamped.
    pub temperature: f64,
    /// Whether to stream increments.
    pub stream: bool,
}

/// One SSE frame of a streamed completion.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatChunk {
    /// Choice list; only the first is consumed.
    pub choices: Vec<ChunkChoice>,
}

/// A streamed choice.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChunkChoice {
    /// Incremental content delta.
    pub delta: ChunkDelta,
}

/// Delta payload of a streamed choice.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChunkDelta {
    /// Incremental text, absent on role/finish frames.
    pub content: Option<String>,
}

/// Response body of a blocking completion.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatCompletion {
    /// Choice list; only the first is consumed.
    pub choices: Vec<CompletionChoice>,
}

/// A blocking-completion choice.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CompletionChoice {
    /// The generated message.
    pub message: CompletionMessage,
}

/// Message payload of a blocking-completion choice.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CompletionMessage {
    /// Generated text.
    pub content: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_substitution() {
        let prompt = render_system_prompt("[ID:1] refunds within 14 days");
        assert!(prompt.contains("[ID:1] refunds within 14 days"));
        assert!(!prompt.contains("{knowledge}"));
    }

    #[test]
    fn chunk_tolerates_finish_frames() {
        let chunk: ChatChunk = serde_json::from_value(serde_json::json!({
            "choices": [{"delta": {}, "finish_reason": "stop"}]
        }))
        .unwrap();
        assert!(chunk.choices[0].delta.content.is_none());
    }

    #[test]
    fn completion_extracts_content() {
        let completion: ChatCompletion = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "hello"}}]
        }))
        .unwrap();
        assert_eq!(
            completion.choices[0].message.content.as_deref(),
            Some("hello")
        );
    }
}
