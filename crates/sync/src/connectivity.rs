// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Online/offline signal consumed by the sync engine.
//!
//! The engine polls the signal synchronously at the start of every pass,
//! so implementations must be cheap and lock-free.

use std::sync::atomic::{AtomicBool, Ordering};

/// A boolean connectivity predicate.
pub trait Connectivity: Send + Sync {
    /// Returns true when the remote gateway is believed reachable.
    fn is_online(&self) -> bool;
}

/// Connectivity signal that always reports online.
///
/// For embedders that have no connectivity source of their own.
pub struct AlwaysOnline;

impl Connectivity for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// Shared connectivity flag settable from a background probe.
///
/// Uses an atomic for lock-free reads from the engine while a probe task
/// updates it.
pub struct OnlineFlag {
    online: AtomicBool,
}

impl OnlineFlag {
    /// Create a flag with the given initial state.
    pub fn new(initial: bool) -> Self {
        OnlineFlag {
            online: AtomicBool::new(initial),
        }
    }

    /// Update the flag from a probe result.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Release);
    }
}

impl Connectivity for OnlineFlag {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }
}

impl Default for OnlineFlag {
    fn default() -> Self {
        Self::new(true)
    }
}
