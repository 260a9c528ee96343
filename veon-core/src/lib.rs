//! # VEON Core Library
//!
//! Memory retention for the VEON chat companion. Every user utterance becomes
//! a memory record whose strength fades exponentially with time, at a rate set
//! by how emotionally salient the utterance was:
//!
//! - **Importance**: classifier confidence scaled into [0, 1]
//! - **Decay**: `strength × e^(−rate × hours)`, rate in [0.01, 0.2]
//! - **Retrieval**: live records ranked by importance, then recency
//! - **Pruning**: records below the floor are deleted for good
//!
//! Decay is lazy: it runs once per conversational turn, never on a timer.
//!
//! The store is injected ([`store::MemoryStore`]); [`store::SqliteStore`] is
//! the durable adapter and [`store::InMemoryStore`] backs tests.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod clock;
pub mod config;
pub mod coordinator;
pub mod decay;
pub mod engine;
pub mod error;
pub mod importance;
pub mod metrics;
pub mod pruning;
pub mod retrieval;
pub mod store;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{MemoryConfig, VeonConfig};
pub use coordinator::{DecayFailure, DecayReport};
pub use engine::MemoryEngine;
pub use error::{Result, VeonError};
pub use pruning::PruneReport;
pub use store::{InMemoryStore, MemoryFilter, MemoryStore, MemoryUpdate, SqliteStore};
pub use types::*;
