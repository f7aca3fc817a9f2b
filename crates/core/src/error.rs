// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for cr-core operations.

use thiserror::Error;

/// All possible errors that can occur in cr-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("declaration not found: {0}")]
    DeclarationNotFound(String),

    #[error("invalid event kind: '{0}'\n  hint: valid kinds are: birth, death")]
    InvalidEventKind(String),

    #[error("invalid action: '{0}'\n  hint: valid actions are: submit_for_review, approve, register, reject, certify, load_review, load_certificate")]
    InvalidAction(String),

    #[error("invalid status: '{0}'")]
    InvalidStatus(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// Result type alias for cr-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
