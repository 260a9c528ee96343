//! # veon-chat: Conversation Turns for VEON
//!
//! Glue between the chat front end and the retention core. One user message
//! is one turn:
//!
//! ```text
//! utterance ─▶ classifier ─▶ importance ─▶ add_memory
//!                                              │
//!                                              ▼
//!                 TurnOutcome ◀─ retrieve ◀─ global decay (─▶ prune)
//! ```
//!
//! Store work is synchronous, so each turn runs on tokio's blocking pool.
//!
//! ## Modules
//!
//! - `turn`: [`TurnProcessor`] and [`TurnOutcome`]
//! - `telemetry`: tracing subscriber setup from `[general]`
//! - `error`: [`ChatError`]

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod telemetry;
pub mod turn;

pub use error::ChatError;
pub use turn::{TurnOutcome, TurnProcessor};
