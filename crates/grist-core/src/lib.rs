//! # grist-core
//!
//! Foundation types for the grist knowledge-chat pipeline.
//!
//! This crate provides the shared vocabulary the other grist crates depend on:
//!
//! - **Fragments**: [`fragments::Fragment`] retrieved knowledge units with
//!   provenance, [`fragments::DocumentRef`] / [`fragments::DocumentAggregate`]
//!   per-document rollups
//! - **Messages**: [`messages::Message`] conversation entries,
//!   [`messages::HistoryEntry`] fragment-stripped context,
//!   [`messages::TurnMessage`] finalized turn results
//! - **Events**: [`events::TurnEvent`] — the discriminated stream protocol
//!   (`status`, `fragments`, `token`, `message`, `error`, `end`)
//! - **Text**: [`text::excerpt`] for bounded diagnostic excerpts
//! - **Logging**: [`logging::init_logging`] tracing subscriber setup
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other grist crates.

#![deny(unsafe_code)]

pub mod events;
pub mod fragments;
pub mod logging;
pub mod messages;
pub mod text;
