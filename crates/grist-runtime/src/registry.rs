//! Logical agent registry.
//!
//! Orchestrators are constructed once at process start and registered
//! under their agent ids; callers resolve and invoke them through this
//! registry. There is no lazily-populated instance cache — construction
//! is explicit and the registry is immutable after startup.

use std::collections::HashMap;
use std::sync::Arc;

use grist_core::events::TurnEvent;
use grist_core::messages::TurnMessage;

use crate::errors::PipelineError;
use crate::orchestrator::{TurnEventStream, TurnOptions, TurnOrchestrator, TurnTracker};

/// Listing entry for a registered agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentInfo {
    /// Logical agent identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short description.
    pub description: String,
}

/// Maps logical agent ids to orchestrators.
pub struct AgentRegistry {
    agents: HashMap<String, Arc<TurnOrchestrator>>,
    default_id: String,
}

impl AgentRegistry {
    /// Create an empty registry with a default agent id.
    #[must_use]
    pub fn new(default_id: impl Into<String>) -> Self {
        Self {
            agents: HashMap::new(),
            default_id: default_id.into(),
        }
    }

    /// Register an orchestrator under its configured agent id.
    pub fn register(&mut self, orchestrator: Arc<TurnOrchestrator>) {
        let _ = self
            .agents
            .insert(orchestrator.agent().agent_id.clone(), orchestrator);
    }

    /// Resolve an agent, falling back to the default for `None` or empty.
    pub fn get(&self, agent_id: Option<&str>) -> Result<Arc<TurnOrchestrator>, PipelineError> {
        let id = agent_id.filter(|id| !id.is_empty()).unwrap_or(&self.default_id);
        self.agents
            .get(id)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownAgent(id.to_owned()))
    }

    /// All registered agents, sorted by id.
    #[must_use]
    pub fn list(&self) -> Vec<AgentInfo> {
        let mut infos: Vec<AgentInfo> = self
            .agents
            .values()
            .map(|orchestrator| {
                let agent = orchestrator.agent();
                AgentInfo {
                    id: agent.agent_id.clone(),
                    name: agent.agent_name.clone(),
                    description: agent.description.clone(),
                }
            })
            .collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }

    /// Stream a turn on the resolved agent.
    ///
    /// An unknown agent id yields a single `error` event instead of a
    /// pipeline; the framing layer still closes the stream with `end`.
    pub fn stream_turn(
        &self,
        agent_id: Option<&str>,
        message: impl Into<String>,
        thread_id: Option<String>,
        options: TurnOptions,
    ) -> TurnEventStream {
        match self.get(agent_id) {
            Ok(orchestrator) => orchestrator.stream_turn(message, thread_id, options),
            Err(e) => {
                let thread_id = TurnOrchestrator::resolve_thread_id(thread_id);
                let mut tracker = TurnTracker::new(thread_id.clone());
                tracker.fail(&e.to_string());
                let event =
                    TurnEvent::error(format!("Error while processing the request: {e}"), thread_id);
                Box::pin(futures::stream::once(async move { event }))
            }
        }
    }

    /// Run a blocking turn on the resolved agent.
    pub async fn invoke_turn(
        &self,
        agent_id: Option<&str>,
        message: impl Into<String> + Send,
        thread_id: Option<String>,
        options: TurnOptions,
    ) -> Result<TurnMessage, PipelineError> {
        let orchestrator = self.get(agent_id)?;
        Ok(orchestrator.invoke_turn(message, thread_id, options).await)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
