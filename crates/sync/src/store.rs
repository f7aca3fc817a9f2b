// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Declaration store abstraction.
//!
//! All declaration state lives behind this interface; the engine holds no
//! private mutable state besides its pass guard. Reads are synchronous and
//! mutation goes through dispatched events, so an in-memory fake can stand
//! in for the real store in tests.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use cr_core::Declaration;

use crate::error::{Error, Result};

/// A state-change event dispatched to the store.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// Insert or replace the declaration with the same id.
    Update(Declaration),
    /// Remove the declaration with the given id. No-op if absent.
    Delete(String),
}

/// The declaration store consumed by the sync engine.
pub trait DeclarationStore: Send + Sync {
    /// Snapshot of every resident declaration, in iteration order.
    fn get_all(&self) -> Result<Vec<Declaration>>;

    /// Apply a state-change event. Fire-and-forget from the caller's
    /// perspective; persistence is the store's concern.
    fn dispatch(&self, event: StoreEvent) -> Result<()>;
}

/// In-memory store for tests and embedders that own persistence.
pub struct MemoryStore {
    declarations: Mutex<Vec<Declaration>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        MemoryStore {
            declarations: Mutex::new(Vec::new()),
        }
    }

    /// Create a store pre-seeded with declarations.
    pub fn with_declarations(declarations: Vec<Declaration>) -> Self {
        MemoryStore {
            declarations: Mutex::new(declarations),
        }
    }

    /// Look up a declaration by id.
    pub fn get(&self, id: &str) -> Option<Declaration> {
        self.declarations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclarationStore for MemoryStore {
    fn get_all(&self) -> Result<Vec<Declaration>> {
        Ok(self
            .declarations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn dispatch(&self, event: StoreEvent) -> Result<()> {
        let mut declarations = self
            .declarations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match event {
            StoreEvent::Update(decl) => {
                if let Some(existing) = declarations.iter_mut().find(|d| d.id == decl.id) {
                    *existing = decl;
                } else {
                    declarations.push(decl);
                }
            }
            StoreEvent::Delete(id) => {
                declarations.retain(|d| d.id != id);
            }
        }
        Ok(())
    }
}

/// Durable JSONL-backed store, one declaration per line.
///
/// Mutations rewrite the whole file and fsync. The file is small (a local
/// work queue, not an archive), so rewrite-on-dispatch keeps the format
/// trivially recoverable.
pub struct JsonlStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles across dispatching threads.
    write_lock: Mutex<()>,
}

impl JsonlStore {
    /// Create or open a store file at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        OpenOptions::new().create(true).append(true).open(path)?;

        Ok(JsonlStore {
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    fn read_all(&self) -> Result<Vec<Declaration>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let reader = BufReader::new(file);
        let mut declarations = Vec::new();

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let decl: Declaration = serde_json::from_str(&line).map_err(|e| {
                Error::Store(format!("corrupt record on line {}: {e}", number + 1))
            })?;
            declarations.push(decl);
        }

        Ok(declarations)
    }

    fn write_all(&self, declarations: &[Declaration]) -> Result<()> {
        let mut file = File::create(&self.path)?;
        for decl in declarations {
            let json = serde_json::to_string(decl)?;
            writeln!(file, "{json}")?;
        }
        file.sync_all()?;
        Ok(())
    }
}

impl DeclarationStore for JsonlStore {
    fn get_all(&self) -> Result<Vec<Declaration>> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.read_all()
    }

    fn dispatch(&self, event: StoreEvent) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut declarations = self.read_all()?;
        match event {
            StoreEvent::Update(decl) => {
                if let Some(existing) = declarations.iter_mut().find(|d| d.id == decl.id) {
                    *existing = decl;
                } else {
                    declarations.push(decl);
                }
            }
            StoreEvent::Delete(id) => {
                declarations.retain(|d| d.id != id);
            }
        }
        self.write_all(&declarations)
    }
}
