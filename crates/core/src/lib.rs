// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! cr-core: Shared library for the civil-registration sync controller
//!
//! This crate provides the declaration data model, the status lifecycle
//! state machine, and the error type used by the cr-sync controller and
//! the crsyncd daemon.

pub mod declaration;
pub mod error;
pub mod lifecycle;

pub use declaration::{Action, Declaration, DeclarationPayload, EventKind, Status};
pub use error::{Error, Result};
pub use lifecycle::{next_on_failure, operation_name, FailureKind, FailureOutcome};
