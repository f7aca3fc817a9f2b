// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! cr-sync: offline-first declaration synchronization controller.
//!
//! Reconciles a locally queued set of registration declarations with a
//! remote gateway, one declaration at a time, per action, with bounded
//! retries and error-kind classification.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────┐ tick ┌────────────┐ execute ┌────────────┐
//! │ Scheduler │─────►│ SyncEngine │────────►│ Transport  │
//! └───────────┘      │            │◄────────│  (trait)   │
//!                    └─────┬──────┘         └────────────┘
//!                 get_all/ │ dispatch
//!                          ▼
//!                    ┌────────────┐
//!                    │   Store    │  (declaration queue)
//!                    │  (trait)   │
//!                    └────────────┘
//! ```
//!
//! # Guarantees
//!
//! - At most one sync pass runs at a time; overlapping calls are no-ops
//! - Offline, nothing is dispatched and no network call is made
//! - One transport call per eligible declaration per pass, never more
//! - Failures retry up to a configured ceiling, then land in a distinct
//!   terminal status per error class (network vs. server)
//! - Workflow-terminal successes remove the local copy
//! - Declarations left hanging in flight are requeued after a staleness
//!   threshold

pub mod config;
pub mod connectivity;
pub mod engine;
pub mod error;
pub mod scheduler;
pub mod store;
pub mod transport;

pub use config::{Config, SyncSettings};
pub use connectivity::{AlwaysOnline, Connectivity, OnlineFlag};
pub use engine::{EngineConfig, SyncEngine, SyncReport};
pub use error::{Error, Result};
pub use scheduler::Scheduler;
pub use store::{DeclarationStore, JsonlStore, MemoryStore, StoreEvent};
pub use transport::{HttpTransport, Receipt, TransportClient, TransportError, TransportResult};

#[cfg(test)]
mod test_helpers;

#[cfg(test)]
mod engine_tests;
