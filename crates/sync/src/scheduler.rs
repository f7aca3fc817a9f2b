// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Recurring sync trigger.
//!
//! A single spawned task runs the maintenance scan and one sync pass per
//! interval tick. The engine self-guards against overlapping passes, so
//! the scheduler needs no reentrancy protection of its own; it only
//! guarantees that repeated `start()` calls never accumulate timers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::engine::SyncEngine;

/// Recurring timer that drives the sync engine.
pub struct Scheduler {
    engine: Arc<SyncEngine>,
    interval: Duration,
    started: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Create a scheduler ticking at the given interval.
    pub fn new(engine: Arc<SyncEngine>, interval: Duration) -> Self {
        Scheduler {
            engine,
            interval,
            started: AtomicBool::new(false),
            handle: Mutex::new(None),
        }
    }

    /// Register the recurring timer.
    ///
    /// Returns true if the timer was registered, false if a previous
    /// `start()` already did; a second call never spawns a second timer.
    pub fn start(&self) -> bool {
        if self.started.swap(true, Ordering::AcqRel) {
            tracing::debug!("scheduler already started");
            return false;
        }

        let engine = Arc::clone(&self.engine);
        let period = self.interval;
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; consume it so ticks
            // land at interval boundaries.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = engine.requeue_hanging() {
                    tracing::error!("requeue scan failed: {e}");
                }
                engine.sync().await;
            }
        });

        let mut slot = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(task);
        true
    }

    /// Whether the timer has been registered.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Abort the recurring timer.
    ///
    /// A pass in progress may be cancelled at an await point; any
    /// declaration left marked in flight is recovered by the requeue scan.
    pub fn stop(&self) {
        let task = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
