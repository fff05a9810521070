//! # grist-runtime
//!
//! Turn orchestration for the grist knowledge-chat pipeline.
//!
//! - [`orchestrator::TurnOrchestrator`]: drives one turn through
//!   retrieve → ground → generate → enrich → persist → finalize,
//!   streaming [`grist_core::events::TurnEvent`]s as it goes
//! - [`store::SessionStore`]: bounded, time-addressable per-conversation
//!   message history
//! - [`emitter`]: server-push framing for the event stream
//! - [`registry::AgentRegistry`]: logical agent id → orchestrator,
//!   constructed at process start and passed by reference
//!
//! ## Crate Position
//!
//! Top of the stack: depends on the adapter crates and `grist-core`.

#![deny(unsafe_code)]

pub mod emitter;
pub mod errors;
pub mod orchestrator;
pub mod registry;
pub mod store;

pub use errors::PipelineError;
pub use orchestrator::{AgentConfig, TurnEventStream, TurnOptions, TurnOrchestrator, TurnState};
pub use registry::{AgentInfo, AgentRegistry};
pub use store::{Session, SessionStore, SessionSummary};
