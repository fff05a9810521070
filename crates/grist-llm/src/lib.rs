//! # grist-llm
//!
//! Generation adapter for the grist knowledge-chat pipeline.
//!
//! [`provider::Generator`] is the seam the orchestrator depends on, with a
//! streaming (incremental) and a blocking (whole-answer) calling
//! convention. [`openai::OpenAiGenerator`] implements it against an
//! OpenAI-compatible chat-completion endpoint.
//!
//! Both calling conventions fail closed: on any remote error the caller
//! still receives a single user-visible error string, never an `Err`.

#![deny(unsafe_code)]

pub mod openai;
pub mod provider;

pub use openai::OpenAiGenerator;
pub use provider::{GenerationError, GenerationRequest, Generator, TokenStream};
