// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for cr-sync tests.

#![allow(clippy::unwrap_used)]

use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use cr_core::{Action, Declaration, EventKind, Status};

use crate::error::Result;
use crate::store::{DeclarationStore, MemoryStore, StoreEvent};

/// Build a declaration with the given status and retry count.
pub fn make_declaration(id: &str, action: Action, status: Status, retries: u32) -> Declaration {
    let mut decl = Declaration::new(id, EventKind::Birth, action);
    decl.status = status;
    decl.retry_attempts = retries;
    decl
}

/// A declaration in the ready status for its action.
pub fn ready_declaration(id: &str, action: Action) -> Declaration {
    Declaration::new(id, EventKind::Birth, action)
}

/// Store wrapper that records every dispatched event.
pub struct RecordingStore {
    inner: MemoryStore,
    events: Mutex<Vec<StoreEvent>>,
}

impl RecordingStore {
    pub fn with_declarations(declarations: Vec<Declaration>) -> Self {
        RecordingStore {
            inner: MemoryStore::with_declarations(declarations),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<StoreEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn event_count(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn get(&self, id: &str) -> Option<Declaration> {
        self.inner.get(id)
    }
}

impl DeclarationStore for RecordingStore {
    fn get_all(&self) -> Result<Vec<Declaration>> {
        self.inner.get_all()
    }

    fn dispatch(&self, event: StoreEvent) -> Result<()> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        self.inner.dispatch(event)
    }
}

/// A declaration whose in-flight marker is older than any staleness
/// threshold used in tests.
pub fn stale_in_flight(id: &str, action: Action, status: Status) -> Declaration {
    let mut decl = make_declaration(id, action, status, 1);
    decl.modified_on = Utc::now() - chrono::Duration::hours(2);
    decl
}
