// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the sync engine: pass guard, offline gate, eligibility,
//! retry classification, terminal removal, and the hanging requeue.

#![allow(clippy::unwrap_used)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cr_core::{Action, Status};

use crate::connectivity::{AlwaysOnline, OnlineFlag};
use crate::engine::{EngineConfig, SyncEngine};
use crate::error::{Error, Result};
use crate::store::{DeclarationStore, StoreEvent};
use crate::test_helpers::{
    make_declaration, ready_declaration, stale_in_flight, RecordingStore,
};
use crate::transport::{Receipt, TransportClient, TransportError, TransportResult};
use crate::transport_tests::MockTransport;

fn test_config() -> EngineConfig {
    EngineConfig {
        retry_ceiling: 2,
        stale_after: chrono::Duration::seconds(900),
    }
}

fn make_engine(
    store: Arc<RecordingStore>,
    transport: Arc<MockTransport>,
) -> SyncEngine {
    SyncEngine::new(store, transport, Arc::new(AlwaysOnline), test_config())
}

// Offline gate

#[tokio::test]
async fn offline_sync_dispatches_nothing() {
    let store = Arc::new(RecordingStore::with_declarations(vec![
        ready_declaration("d1", Action::SubmitForReview),
        ready_declaration("d2", Action::Register),
    ]));
    let transport = Arc::new(MockTransport::new());
    let engine = SyncEngine::new(
        Arc::clone(&store) as Arc<dyn DeclarationStore>,
        Arc::clone(&transport) as Arc<dyn TransportClient>,
        Arc::new(OnlineFlag::new(false)),
        test_config(),
    );

    let report = engine.sync().await;

    assert!(report.skipped);
    assert_eq!(transport.call_count(), 0);
    assert_eq!(store.event_count(), 0);
}

// One call per eligible declaration, eligible only

#[tokio::test]
async fn sync_calls_transport_once_per_eligible_declaration() {
    let store = Arc::new(RecordingStore::with_declarations(vec![
        ready_declaration("d1", Action::SubmitForReview),
        make_declaration("d2", Action::SubmitForReview, Status::FailedNetwork, 3),
        make_declaration("d3", Action::SubmitForReview, Status::Failed, 3),
        make_declaration("d4", Action::SubmitForReview, Status::Submitted, 0),
    ]));
    let transport = Arc::new(MockTransport::new());
    let engine = make_engine(Arc::clone(&store), Arc::clone(&transport));

    let report = engine.sync().await;

    assert_eq!(report.eligible, 1);
    assert_eq!(transport.calls(), vec!["submitBirthDeclaration"]);
    // The already-submitted declaration was not touched
    assert_eq!(store.get("d4").unwrap().status, Status::Submitted);
}

#[tokio::test]
async fn in_flight_marker_is_dispatched_before_the_network_call() {
    let store = Arc::new(RecordingStore::with_declarations(vec![ready_declaration(
        "d1",
        Action::SubmitForReview,
    )]));
    let transport = Arc::new(MockTransport::new());
    let engine = make_engine(Arc::clone(&store), Arc::clone(&transport));

    engine.sync().await;

    let events = store.events();
    assert!(matches!(
        &events[0],
        StoreEvent::Update(d) if d.status == Status::Submitting
    ));
}

// Network failure below the ceiling retries

#[tokio::test]
async fn network_failure_below_ceiling_returns_to_ready() {
    let store = Arc::new(RecordingStore::with_declarations(vec![make_declaration(
        "d1",
        Action::SubmitForReview,
        Status::ReadyToSubmit,
        1,
    )]));
    let transport = Arc::new(MockTransport::new());
    transport.push_outcome(Err(TransportError::Network("connection reset".into())));
    let engine = make_engine(Arc::clone(&store), Arc::clone(&transport));

    let report = engine.sync().await;

    assert_eq!(report.retried, 1);
    let decl = store.get("d1").unwrap();
    assert_eq!(decl.status, Status::ReadyToSubmit);
    assert_eq!(decl.retry_attempts, 2);
}

// Failure at the ceiling goes terminal

#[tokio::test]
async fn network_failure_at_ceiling_goes_terminal() {
    let store = Arc::new(RecordingStore::with_declarations(vec![make_declaration(
        "d1",
        Action::SubmitForReview,
        Status::ReadyToSubmit,
        2,
    )]));
    let transport = Arc::new(MockTransport::new());
    transport.push_outcome(Err(TransportError::Network("connection reset".into())));
    let engine = make_engine(Arc::clone(&store), Arc::clone(&transport));

    let report = engine.sync().await;

    assert_eq!(report.failed, 1);
    let decl = store.get("d1").unwrap();
    assert_eq!(decl.status, Status::FailedNetwork);
    assert_eq!(decl.retry_attempts, 3);
}

#[tokio::test]
async fn server_failure_at_ceiling_lands_in_failed_not_failed_network() {
    let store = Arc::new(RecordingStore::with_declarations(vec![make_declaration(
        "d1",
        Action::Register,
        Status::ReadyToRegister,
        2,
    )]));
    let transport = Arc::new(MockTransport::new());
    transport.push_outcome(Err(TransportError::Server("validation rejected".into())));
    let engine = make_engine(Arc::clone(&store), Arc::clone(&transport));

    engine.sync().await;

    assert_eq!(store.get("d1").unwrap().status, Status::Failed);
}

// Success resets the retry count

#[tokio::test]
async fn success_resets_retry_attempts_and_merges_receipt() {
    let store = Arc::new(RecordingStore::with_declarations(vec![make_declaration(
        "d1",
        Action::SubmitForReview,
        Status::ReadyToSubmit,
        1,
    )]));
    let transport = Arc::new(MockTransport::new());
    transport.push_outcome(Ok(Receipt {
        composition_id: Some("comp-1".into()),
        tracking_id: Some("TRK-1".into()),
        registration_number: None,
    }));
    let engine = make_engine(Arc::clone(&store), Arc::clone(&transport));

    let report = engine.sync().await;

    assert_eq!(report.succeeded, 1);
    let decl = store.get("d1").unwrap();
    assert_eq!(decl.status, Status::Submitted);
    assert_eq!(decl.retry_attempts, 0);
    assert_eq!(decl.payload.composition_id.as_deref(), Some("comp-1"));
    assert_eq!(decl.payload.tracking_id.as_deref(), Some("TRK-1"));
}

// Workflow-terminal success dispatches update then delete

#[tokio::test]
async fn approve_success_updates_then_deletes() {
    let store = Arc::new(RecordingStore::with_declarations(vec![ready_declaration(
        "d1",
        Action::Approve,
    )]));
    let transport = Arc::new(MockTransport::new());
    let engine = make_engine(Arc::clone(&store), Arc::clone(&transport));

    engine.sync().await;

    let events = store.events();
    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0], StoreEvent::Update(d) if d.status == Status::Approving));
    assert!(matches!(&events[1], StoreEvent::Update(d) if d.status == Status::Approved));
    assert!(matches!(&events[2], StoreEvent::Delete(id) if id == "d1"));
    assert!(store.get("d1").is_none());
}

#[tokio::test]
async fn submit_success_stays_resident() {
    let store = Arc::new(RecordingStore::with_declarations(vec![ready_declaration(
        "d1",
        Action::SubmitForReview,
    )]));
    let transport = Arc::new(MockTransport::new());
    let engine = make_engine(Arc::clone(&store), Arc::clone(&transport));

    engine.sync().await;

    assert_eq!(store.get("d1").unwrap().status, Status::Submitted);
}

// Error isolation: one failing branch never aborts its siblings

#[tokio::test]
async fn failing_declaration_does_not_abort_siblings() {
    let store = Arc::new(RecordingStore::with_declarations(vec![
        ready_declaration("d1", Action::SubmitForReview),
        ready_declaration("d2", Action::SubmitForReview),
    ]));
    let transport = Arc::new(MockTransport::new());
    transport.push_outcome(Err(TransportError::Network("down".into())));
    // d2 falls through to the default success outcome
    let engine = make_engine(Arc::clone(&store), Arc::clone(&transport));

    let report = engine.sync().await;

    assert_eq!(report.eligible, 2);
    assert_eq!(report.retried, 1);
    assert_eq!(report.succeeded, 1);
    assert_eq!(store.get("d2").unwrap().status, Status::Submitted);
}

// Mutual exclusion across concurrent passes

struct GatedTransport {
    gate: Arc<tokio::sync::Semaphore>,
    calls: AtomicUsize,
}

impl TransportClient for GatedTransport {
    fn execute(
        &self,
        _operation: &'static str,
        _variables: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Receipt>> + Send + '_>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = Arc::clone(&self.gate);
        Box::pin(async move {
            let _permit = gate.acquire().await;
            Ok(Receipt::default())
        })
    }
}

#[tokio::test]
async fn concurrent_sync_is_a_silent_no_op() {
    let store = Arc::new(RecordingStore::with_declarations(vec![ready_declaration(
        "d1",
        Action::SubmitForReview,
    )]));
    let gate = Arc::new(tokio::sync::Semaphore::new(0));
    let transport = Arc::new(GatedTransport {
        gate: Arc::clone(&gate),
        calls: AtomicUsize::new(0),
    });
    let engine = Arc::new(SyncEngine::new(
        Arc::clone(&store) as Arc<dyn DeclarationStore>,
        Arc::clone(&transport) as Arc<dyn TransportClient>,
        Arc::new(AlwaysOnline),
        test_config(),
    ));

    let first = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.sync().await }
    });

    // Let the first pass reach its network await while holding the guard
    while transport.calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    let events_before = store.event_count();

    let second = engine.sync().await;
    assert!(second.skipped);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.event_count(), events_before);

    // Release the first pass; it completes normally
    gate.add_permits(1);
    let first = first.await.unwrap();
    assert!(!first.skipped);
    assert_eq!(first.succeeded, 1);

    // The guard is released: a later pass runs again
    let third = engine.sync().await;
    assert!(!third.skipped);
}

// Store failure isolation

struct FlakyStore {
    inner: RecordingStore,
    reject_id: String,
}

impl DeclarationStore for FlakyStore {
    fn get_all(&self) -> Result<Vec<cr_core::Declaration>> {
        self.inner.get_all()
    }

    fn dispatch(&self, event: StoreEvent) -> Result<()> {
        if let StoreEvent::Update(d) = &event {
            if d.id == self.reject_id {
                return Err(Error::Store("disk full".into()));
            }
        }
        self.inner.dispatch(event)
    }
}

#[tokio::test]
async fn store_dispatch_failure_counts_as_failed_and_spares_siblings() {
    let store = Arc::new(FlakyStore {
        inner: RecordingStore::with_declarations(vec![
            ready_declaration("bad", Action::SubmitForReview),
            ready_declaration("good", Action::SubmitForReview),
        ]),
        reject_id: "bad".into(),
    });
    let transport = Arc::new(MockTransport::new());
    let engine = SyncEngine::new(
        Arc::clone(&store) as Arc<dyn DeclarationStore>,
        Arc::clone(&transport) as Arc<dyn TransportClient>,
        Arc::new(AlwaysOnline),
        test_config(),
    );

    let report = engine.sync().await;

    assert_eq!(report.eligible, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.succeeded, 1);
    // The bad declaration never reached the network
    assert_eq!(transport.calls(), vec!["submitBirthDeclaration"]);
}

// Requeue hanging

#[tokio::test]
async fn requeue_demotes_stale_in_flight_declarations() {
    let store = Arc::new(RecordingStore::with_declarations(vec![stale_in_flight(
        "d1",
        Action::SubmitForReview,
        Status::Submitting,
    )]));
    let transport = Arc::new(MockTransport::new());
    let engine = make_engine(Arc::clone(&store), Arc::clone(&transport));

    let requeued = engine.requeue_hanging().unwrap();

    assert_eq!(requeued, 1);
    assert_eq!(store.event_count(), 1);
    let decl = store.get("d1").unwrap();
    assert_eq!(decl.status, Status::ReadyToSubmit);
    // Requeue resumes the same attempt class
    assert_eq!(decl.retry_attempts, 1);
}

#[tokio::test]
async fn requeue_ignores_fresh_in_flight_and_settled_declarations() {
    let store = Arc::new(RecordingStore::with_declarations(vec![
        make_declaration("fresh", Action::Register, Status::Registering, 0),
        make_declaration("settled", Action::SubmitForReview, Status::Submitted, 0),
        make_declaration("failed", Action::SubmitForReview, Status::Failed, 3),
    ]));
    let transport = Arc::new(MockTransport::new());
    let engine = make_engine(Arc::clone(&store), Arc::clone(&transport));

    let requeued = engine.requeue_hanging().unwrap();

    assert_eq!(requeued, 0);
    assert_eq!(store.event_count(), 0);
}

#[tokio::test]
async fn requeued_declaration_is_picked_up_by_the_next_pass() {
    let store = Arc::new(RecordingStore::with_declarations(vec![stale_in_flight(
        "d1",
        Action::Approve,
        Status::Approving,
    )]));
    let transport = Arc::new(MockTransport::new());
    let engine = make_engine(Arc::clone(&store), Arc::clone(&transport));

    engine.requeue_hanging().unwrap();
    let report = engine.sync().await;

    assert_eq!(report.eligible, 1);
    assert_eq!(transport.calls(), vec!["approveBirthDeclaration"]);
}
