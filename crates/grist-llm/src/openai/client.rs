//! Chat-completion client: entry point and SSE handling.

use async_stream::stream;
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use grist_core::text::excerpt;
use grist_settings::GenerationSettings;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, error, instrument, warn};

use crate::provider::{GenerationError, GenerationRequest, Generator, TokenStream};

use super::types::{ChatChunk, ChatCompletion, ChatMessageParam, ChatRequest, render_system_prompt};

/// Byte budget for response-body excerpts carried in errors.
const BODY_EXCERPT_BYTES: usize = 2048;

/// SSE sentinel marking the end of a streamed completion.
const DONE_MARKER: &str = "[DONE]";

/// Generator backed by an OpenAI-compatible chat-completion endpoint.
pub struct OpenAiGenerator {
    config: GenerationSettings,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    /// Create a new generator.
    #[must_use]
    pub fn new(config: GenerationSettings) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Create a new generator with a shared HTTP client.
    #[must_use]
    pub fn with_client(config: GenerationSettings, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Service base URL with any trailing slash removed.
    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Bearer auth and JSON content type.
    fn build_headers(&self) -> Result<HeaderMap, GenerationError> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth_value = format!("Bearer {}", self.config.api_key);
        let _ = headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value).map_err(|e| GenerationError::Auth {
                message: e.to_string(),
            })?,
        );
        Ok(headers)
    }

    /// Assemble the message list: grounded system prompt, then recent
    /// history, then the current user message.
    fn build_messages(request: &GenerationRequest) -> Vec<ChatMessageParam> {
        let mut messages = vec![ChatMessageParam {
            role: "system".into(),
            content: render_system_prompt(&request.grounding),
        }];
        messages.extend(request.history.iter().map(|entry| ChatMessageParam {
            role: entry.role.as_str().into(),
            content: entry.content.clone(),
        }));
        messages.push(ChatMessageParam {
            role: "user".into(),
            content: request.message.clone(),
        });
        messages
    }

    /// Build the request body; temperature override passes through unclamped.
    fn build_request(&self, request: &GenerationRequest, stream: bool) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: Self::build_messages(request),
            temperature: request.temperature.unwrap_or(self.config.temperature),
            stream,
        }
    }

    /// Send a completion request and verify the HTTP status.
    async fn send(
        &self,
        body: &ChatRequest,
    ) -> Result<reqwest::Response, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url());
        debug!(
            model = %body.model,
            message_count = body.messages.len(),
            temperature = body.temperature,
            stream = body.stream,
            "sending generation request"
        );

        let response = self
            .client
            .post(&url)
            .headers(self.build_headers()?)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "generation API error");
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: excerpt(&body_text, BODY_EXCERPT_BYTES),
            });
        }
        Ok(response)
    }

    /// Open the stream; errors here become the single visible item.
    async fn try_stream(
        &self,
        request: &GenerationRequest,
    ) -> Result<TokenStream, GenerationError> {
        let body = self.build_request(request, true);
        let response = self.send(&body).await?;

        let mut frames = response.bytes_stream().eventsource();
        Ok(Box::pin(stream! {
            while let Some(frame) = frames.next().await {
                match frame {
                    Ok(frame) => {
                        if frame.data == DONE_MARKER {
                            break;
                        }
                        match serde_json::from_str::<ChatChunk>(&frame.data) {
                            Ok(chunk) => {
                                let delta = chunk
                                    .choices
                                    .into_iter()
                                    .next()
                                    .and_then(|c| c.delta.content);
                                if let Some(delta) = delta {
                                    yield delta;
                                }
                            }
                            Err(e) => warn!(error = %e, "skipping malformed stream frame"),
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "generation stream interrupted");
                        yield format!("Generation service error: {e}");
                        break;
                    }
                }
            }
        }))
    }

    async fn try_complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let body = self.build_request(request, false);
        let response = self.send(&body).await?;

        let body_text = response.text().await?;
        let completion: ChatCompletion = serde_json::from_str(&body_text)?;
        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn stream(&self, request: &GenerationRequest) -> TokenStream {
        match self.try_stream(request).await {
            Ok(stream) => stream,
            Err(e) => {
                error!(error = %e, "generation stream failed to open");
                let visible = e.user_message();
                Box::pin(futures::stream::once(async move { visible }))
            }
        }
    }

    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn complete(&self, request: &GenerationRequest) -> String {
        match self.try_complete(request).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(error = %e, "generation call failed");
                e.user_message()
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
