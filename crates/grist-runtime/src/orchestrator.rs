//! Turn orchestrator — the per-request pipeline state machine.
//!
//! One turn advances strictly through
//! `Init → Retrieving → Retrieved → Generating → Enriching → Persisting →
//! Done`, with `Failed` terminal from any non-terminal state. Adapter
//! failures degrade inside the pipeline (empty fragment list, substituted
//! answer text, empty thumbnails) so the caller still receives a terminal
//! `message` event; only pre-pipeline failures abort a turn.
//!
//! Streaming turns are lazy generators: dropping the consumer mid-stream
//! stops generation polling and skips persistence of the partial turn.

use std::pin::Pin;
use std::sync::Arc;

use async_stream::stream;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use grist_core::events::TurnEvent;
use grist_core::fragments::{DocumentAggregate, DocumentRef, Fragment, infer_extension};
use grist_core::messages::{Message, Role, TurnMessage};
use grist_llm::{GenerationRequest, Generator};
use grist_retrieval::{KnowledgeRetriever, RetrievalError, Retrieved};
use metrics::counter;
use tracing::{debug, info, instrument, warn};

use crate::store::SessionStore;

/// Boxed turn event stream.
pub type TurnEventStream = Pin<Box<dyn Stream<Item = TurnEvent> + Send>>;

/// Status text announced when retrieval begins.
const STATUS_RETRIEVING: &str = "Searching the knowledge base…";
/// Status text announced when generation begins.
const STATUS_GENERATING: &str = "Generating an answer…";

/// Static configuration of one logical agent.
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Logical agent identifier.
    pub agent_id: String,
    /// Display name.
    pub agent_name: String,
    /// Short description for listings.
    pub description: String,
    /// Knowledge base this agent retrieves from.
    pub knowledge_base_id: String,
    /// Recent exchanges handed to the generator as context.
    pub history_turns: usize,
}

/// Per-call options.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TurnOptions {
    /// Temperature override, passed through unclamped.
    pub temperature: Option<f64>,
}

/// Pipeline states, strictly sequential with no branching back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnState {
    /// Session resolution pending.
    Init,
    /// Retrieval call in flight.
    Retrieving,
    /// Grounding context built.
    Retrieved,
    /// Generation in flight.
    Generating,
    /// Thumbnail resolution in flight (streaming mode only).
    Enriching,
    /// Session append in flight.
    Persisting,
    /// Terminal success.
    Done,
    /// Terminal failure; nothing persisted.
    Failed,
}

impl TurnState {
    /// State name for logging.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Retrieving => "retrieving",
            Self::Retrieved => "retrieved",
            Self::Generating => "generating",
            Self::Enriching => "enriching",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Whether the state ends the turn.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Per-turn state tracker: transition logging and turn metrics.
pub(crate) struct TurnTracker {
    state: TurnState,
    thread_id: String,
}

impl TurnTracker {
    pub(crate) fn new(thread_id: String) -> Self {
        counter!("turns_started_total").increment(1);
        Self {
            state: TurnState::Init,
            thread_id,
        }
    }

    pub(crate) fn advance(&mut self, next: TurnState) {
        debug!(
            thread_id = %self.thread_id,
            from = self.state.as_str(),
            to = next.as_str(),
            "turn state"
        );
        self.state = next;
        if next == TurnState::Done {
            counter!("turns_completed_total").increment(1);
            info!(thread_id = %self.thread_id, "turn completed");
        }
    }

    pub(crate) fn fail(&mut self, error: &str) {
        counter!("turns_failed_total").increment(1);
        warn!(
            thread_id = %self.thread_id,
            from = self.state.as_str(),
            error,
            "turn failed"
        );
        self.state = TurnState::Failed;
    }
}

/// Drives one conversational turn end to end.
pub struct TurnOrchestrator {
    agent: AgentConfig,
    retriever: Arc<dyn KnowledgeRetriever>,
    generator: Arc<dyn Generator>,
    store: Arc<SessionStore>,
}

impl std::fmt::Debug for TurnOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnOrchestrator")
            .field("agent", &self.agent)
            .finish_non_exhaustive()
    }
}

impl TurnOrchestrator {
    /// Create an orchestrator from its collaborators.
    #[must_use]
    pub fn new(
        agent: AgentConfig,
        retriever: Arc<dyn KnowledgeRetriever>,
        generator: Arc<dyn Generator>,
        store: Arc<SessionStore>,
    ) -> Self {
        Self {
            agent,
            retriever,
            generator,
            store,
        }
    }

    /// The agent configuration.
    #[must_use]
    pub fn agent(&self) -> &AgentConfig {
        &self.agent
    }

    /// The session store.
    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Use the supplied conversation identifier or mint a fresh one.
    pub(crate) fn resolve_thread_id(thread_id: Option<String>) -> String {
        thread_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }

    /// Run a turn in streaming mode.
    ///
    /// The returned stream is finite and not restartable; it yields events
    /// in the order `status`, `fragments`, `status`, `token`*, `message`.
    /// The stream is lazy: if the consumer drops it mid-stream, generation
    /// polling stops and the partial turn is not persisted.
    pub fn stream_turn(
        self: Arc<Self>,
        message: impl Into<String>,
        thread_id: Option<String>,
        options: TurnOptions,
    ) -> TurnEventStream {
        let orchestrator = self;
        let message = message.into();
        let thread_id = Self::resolve_thread_id(thread_id);

        Box::pin(stream! {
            let mut tracker = TurnTracker::new(thread_id.clone());

            if orchestrator.store.get_session(&thread_id).is_none() {
                orchestrator.store.create_session(&thread_id);
            }
            tracker.advance(TurnState::Retrieving);
            yield TurnEvent::status(STATUS_RETRIEVING, thread_id.clone());

            let retrieved = orchestrator.retrieve_or_degrade(&message).await;
            tracker.advance(TurnState::Retrieved);
            yield TurnEvent::Fragments {
                fragments: retrieved.fragments.clone(),
                doc_refs: retrieved.doc_refs.clone(),
                thread_id: thread_id.clone(),
            };

            let history = orchestrator
                .store
                .recent_history(&thread_id, orchestrator.agent.history_turns);
            tracker.advance(TurnState::Generating);
            yield TurnEvent::status(STATUS_GENERATING, thread_id.clone());

            let request = GenerationRequest {
                message: message.clone(),
                grounding: retrieved.grounding.clone(),
                history,
                temperature: options.temperature,
            };
            let mut tokens = orchestrator.generator.stream(&request).await;
            let mut answer = String::new();
            while let Some(delta) = tokens.next().await {
                answer.push_str(&delta);
                yield TurnEvent::Token {
                    content: delta,
                    full_content: answer.clone(),
                    thread_id: thread_id.clone(),
                };
            }
            drop(tokens);

            tracker.advance(TurnState::Enriching);
            let doc_aggs = orchestrator.enrich_documents(&retrieved.doc_refs).await;

            tracker.advance(TurnState::Persisting);
            orchestrator.persist_turn(&thread_id, &message, &answer, retrieved.fragments.clone());

            tracker.advance(TurnState::Done);
            let final_message = TurnMessage::new(
                answer,
                retrieved.fragments,
                doc_aggs,
                thread_id.clone(),
                orchestrator.agent.agent_id.clone(),
            );
            yield TurnEvent::Message {
                message: final_message,
                thread_id: thread_id.clone(),
            };
        })
    }

    /// Run a turn in blocking mode: no intermediate events, no document
    /// enrichment, one assembled result.
    ///
    /// Generation failure still completes the turn — the substituted error
    /// text becomes the answer and is persisted like any other.
    #[instrument(skip_all, fields(agent = %self.agent.agent_id))]
    pub async fn invoke_turn(
        &self,
        message: impl Into<String> + Send,
        thread_id: Option<String>,
        options: TurnOptions,
    ) -> TurnMessage {
        let message = message.into();
        let thread_id = Self::resolve_thread_id(thread_id);
        let mut tracker = TurnTracker::new(thread_id.clone());

        if self.store.get_session(&thread_id).is_none() {
            self.store.create_session(&thread_id);
        }
        tracker.advance(TurnState::Retrieving);
        let retrieved = self.retrieve_or_degrade(&message).await;
        tracker.advance(TurnState::Retrieved);

        let history = self.store.recent_history(&thread_id, self.agent.history_turns);
        tracker.advance(TurnState::Generating);
        let request = GenerationRequest {
            message: message.clone(),
            grounding: retrieved.grounding.clone(),
            history,
            temperature: options.temperature,
        };
        let answer = self.generator.complete(&request).await;

        tracker.advance(TurnState::Persisting);
        self.persist_turn(&thread_id, &message, &answer, retrieved.fragments.clone());

        tracker.advance(TurnState::Done);
        TurnMessage::new(
            answer,
            retrieved.fragments,
            Vec::new(),
            thread_id,
            self.agent.agent_id.clone(),
        )
    }

    /// Full message history of a conversation, empty if unknown.
    #[must_use]
    pub fn get_history(&self, thread_id: &str) -> Vec<Message> {
        self.store
            .get_session(thread_id)
            .map(|session| session.messages)
            .unwrap_or_default()
    }

    /// Fetch a fragment's image, pass-through to the retrieval service.
    pub async fn fetch_fragment_image(&self, image_id: &str) -> Result<Bytes, RetrievalError> {
        self.retriever.fetch_image(image_id).await
    }

    /// Retrieve, degrading a failure to the explicit "no fragments" result.
    #[instrument(skip_all, fields(kb = %self.agent.knowledge_base_id))]
    async fn retrieve_or_degrade(&self, question: &str) -> Retrieved {
        match self
            .retriever
            .retrieve(question, &self.agent.knowledge_base_id)
            .await
        {
            Ok(retrieved) => retrieved,
            Err(e) => {
                warn!(error = %e, "retrieval failed, continuing with no fragments");
                Retrieved::empty()
            }
        }
    }

    /// Resolve thumbnails and build the enriched document rollups.
    ///
    /// Thumbnail failure leaves `thumbnail_url` empty; the viewer URL is
    /// always derivable from the document id and inferred extension.
    async fn enrich_documents(&self, doc_refs: &[DocumentRef]) -> Vec<DocumentAggregate> {
        if doc_refs.is_empty() {
            return Vec::new();
        }
        let doc_ids: Vec<String> = doc_refs.iter().map(|d| d.doc_id.clone()).collect();
        let thumbnails = self.retriever.fetch_thumbnails(&doc_ids).await;
        doc_refs
            .iter()
            .map(|doc| {
                let ext = infer_extension(&doc.doc_name);
                DocumentAggregate {
                    doc_id: doc.doc_id.clone(),
                    doc_name: doc.doc_name.clone(),
                    count: doc.count,
                    thumbnail_url: thumbnails.get(&doc.doc_id).cloned().unwrap_or_default(),
                    document_url: self.retriever.viewer_url(&doc.doc_id, &ext),
                }
            })
            .collect()
    }

    /// Append the user message and the finalized assistant message.
    fn persist_turn(
        &self,
        thread_id: &str,
        user_message: &str,
        answer: &str,
        fragments: Vec<Fragment>,
    ) {
        self.store
            .append_message(thread_id, Role::User, user_message, Vec::new());
        self.store
            .append_message(thread_id, Role::Assistant, answer, fragments);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
