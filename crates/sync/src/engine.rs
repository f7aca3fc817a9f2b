// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The sync engine: drives one idempotent pass over the declaration
//! store, advancing every eligible declaration by exactly one network
//! round trip.
//!
//! Mutual exclusion across passes is a single atomic flag; per-pass
//! fan-out waits for every branch to settle before the flag is released,
//! so a declaration's own operations are strictly serial across passes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;

use cr_core::lifecycle::{
    in_flight_status, next_on_failure, operation_name, ready_status, removes_on_success,
    success_status, FailureKind,
};
use cr_core::Declaration;

use crate::connectivity::Connectivity;
use crate::error::Result;
use crate::store::{DeclarationStore, StoreEvent};
use crate::transport::TransportClient;

/// Explicit engine tunables (no magic numbers in the pass logic).
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Prior failed attempts allowed before a failure goes terminal.
    pub retry_ceiling: u32,
    /// Age past which an in-flight declaration is considered hanging.
    pub stale_after: chrono::Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            retry_ceiling: 2,
            stale_after: chrono::Duration::seconds(900),
        }
    }
}

/// Outcome summary of one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// True when the pass was a guard no-op (already running or offline).
    pub skipped: bool,
    /// Declarations eligible at pass start.
    pub eligible: usize,
    /// Operations that completed successfully.
    pub succeeded: usize,
    /// Failures below the retry ceiling, returned to a ready status.
    pub retried: usize,
    /// Terminal failures (retry ceiling exhausted or store dispatch lost).
    pub failed: usize,
}

impl SyncReport {
    fn skipped() -> Self {
        SyncReport {
            skipped: true,
            ..Default::default()
        }
    }
}

enum BranchOutcome {
    Succeeded,
    Retried,
    Failed,
}

/// Releases the pass guard on every exit path, including panics in a
/// single declaration's handling.
struct PassGuard<'a>(&'a AtomicBool);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The offline-first declaration synchronization controller.
pub struct SyncEngine {
    store: Arc<dyn DeclarationStore>,
    transport: Arc<dyn TransportClient>,
    connectivity: Arc<dyn Connectivity>,
    config: EngineConfig,
    /// Pass mutual-exclusion guard. The only mutable state the engine owns.
    sync_running: AtomicBool,
}

impl SyncEngine {
    /// Create an engine over the given collaborators.
    pub fn new(
        store: Arc<dyn DeclarationStore>,
        transport: Arc<dyn TransportClient>,
        connectivity: Arc<dyn Connectivity>,
        config: EngineConfig,
    ) -> Self {
        SyncEngine {
            store,
            transport,
            connectivity,
            config,
            sync_running: AtomicBool::new(false),
        }
    }

    /// Run one sync pass.
    ///
    /// Silent no-op (reported as `skipped`) when a prior pass is still
    /// running or the environment is offline. Per-declaration failures
    /// are converted to status transitions and never abort the pass.
    pub async fn sync(&self) -> SyncReport {
        if self
            .sync_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("sync pass already running, skipping");
            return SyncReport::skipped();
        }
        let _guard = PassGuard(&self.sync_running);

        if !self.connectivity.is_online() {
            tracing::debug!("offline, skipping sync pass");
            return SyncReport::skipped();
        }

        let declarations = match self.store.get_all() {
            Ok(d) => d,
            Err(e) => {
                tracing::error!("store read failed, skipping sync pass: {e}");
                return SyncReport::skipped();
            }
        };

        let eligible: Vec<Declaration> = declarations
            .into_iter()
            .filter(|d| d.is_eligible())
            .collect();

        let mut report = SyncReport {
            eligible: eligible.len(),
            ..Default::default()
        };

        // One branch per declaration, awaited collectively. Completion
        // order is whatever the network returns.
        let branches: Vec<_> = eligible.into_iter().map(|d| self.sync_one(d)).collect();
        for outcome in join_all(branches).await {
            match outcome {
                BranchOutcome::Succeeded => report.succeeded += 1,
                BranchOutcome::Retried => report.retried += 1,
                BranchOutcome::Failed => report.failed += 1,
            }
        }

        if report.eligible > 0 {
            tracing::info!(
                eligible = report.eligible,
                succeeded = report.succeeded,
                retried = report.retried,
                failed = report.failed,
                "sync pass complete"
            );
        }
        report
    }

    /// Advance a single declaration by one network round trip.
    async fn sync_one(&self, mut decl: Declaration) -> BranchOutcome {
        // In-flight marker goes out before the network call so a reload
        // or concurrent pass sees "mid-flight".
        decl.status = in_flight_status(decl.action);
        decl.modified_on = Utc::now();
        if let Err(e) = self.store.dispatch(StoreEvent::Update(decl.clone())) {
            tracing::error!(id = %decl.id, "failed to mark declaration in flight: {e}");
            return BranchOutcome::Failed;
        }

        let operation = operation_name(decl.event, decl.action);
        let variables = serde_json::json!({
            "id": decl.id,
            "payload": decl.payload,
        });

        match self.transport.execute(operation, variables).await {
            Ok(receipt) => {
                decl.payload.merge_ids(
                    receipt.composition_id,
                    receipt.tracking_id,
                    receipt.registration_number,
                );
                decl.retry_attempts = 0;
                decl.status = success_status(decl.action);
                decl.modified_on = Utc::now();
                tracing::debug!(id = %decl.id, status = %decl.status, "operation succeeded");

                let id = decl.id.clone();
                let remove = removes_on_success(decl.action);
                if let Err(e) = self.store.dispatch(StoreEvent::Update(decl)) {
                    tracing::error!(id = %id, "failed to record success: {e}");
                    return BranchOutcome::Failed;
                }
                if remove {
                    // The server is authoritative now; drop the local copy.
                    if let Err(e) = self.store.dispatch(StoreEvent::Delete(id.clone())) {
                        tracing::error!(id = %id, "failed to remove completed declaration: {e}");
                        return BranchOutcome::Failed;
                    }
                }
                BranchOutcome::Succeeded
            }
            Err(err) => {
                let kind = if err.is_network() {
                    FailureKind::Network
                } else {
                    FailureKind::Server
                };
                let outcome =
                    next_on_failure(decl.action, kind, decl.retry_attempts, self.config.retry_ceiling);

                decl.status = outcome.status;
                decl.retry_attempts = outcome.retry_attempts;
                decl.modified_on = Utc::now();

                if outcome.terminal {
                    tracing::warn!(
                        id = %decl.id,
                        status = %decl.status,
                        attempts = decl.retry_attempts,
                        "retry ceiling exhausted: {err}"
                    );
                } else {
                    tracing::debug!(
                        id = %decl.id,
                        attempts = decl.retry_attempts,
                        "operation failed, will retry: {err}"
                    );
                }

                let terminal = outcome.terminal;
                let id = decl.id.clone();
                if let Err(e) = self.store.dispatch(StoreEvent::Update(decl)) {
                    tracing::error!(id = %id, "failed to record failure: {e}");
                    return BranchOutcome::Failed;
                }
                if terminal {
                    BranchOutcome::Failed
                } else {
                    BranchOutcome::Retried
                }
            }
        }
    }

    /// Requeue declarations stuck in an in-flight status.
    ///
    /// A tab reload or crash can leave a declaration marked in flight
    /// with no call actually outstanding. Anything in flight older than
    /// the staleness threshold is demoted back to its ready status so a
    /// future pass picks it up. Independent of the sync guard; the retry
    /// count is preserved (a requeue is the same attempt class).
    pub fn requeue_hanging(&self) -> Result<usize> {
        let now = Utc::now();
        let mut requeued = 0;

        for mut decl in self.store.get_all()? {
            if decl.status.is_in_flight() && now - decl.modified_on > self.config.stale_after {
                decl.status = ready_status(decl.action);
                decl.modified_on = now;
                tracing::warn!(id = %decl.id, status = %decl.status, "requeued hanging declaration");
                self.store.dispatch(StoreEvent::Update(decl))?;
                requeued += 1;
            }
        }

        Ok(requeued)
    }
}
