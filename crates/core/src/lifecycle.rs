// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Status classifier for the declaration lifecycle.
//!
//! Pure functions mapping (action, outcome) to the next status. The sync
//! engine owns when transitions happen; this module owns what they are.
//!
//! Each action moves through a fixed status triple:
//!
//! ```text
//! ready ──pickup──► in-flight ──success──► success status (or delete)
//!                       │
//!                       └──failure──► ready (retry) | failed terminal
//! ```

use crate::declaration::{Action, EventKind, Status};

/// The ready status an action is picked up from.
///
/// Also the status a failed attempt below the retry ceiling returns to,
/// and the status a hanging in-flight declaration is requeued to.
pub fn ready_status(action: Action) -> Status {
    match action {
        Action::SubmitForReview => Status::ReadyToSubmit,
        Action::Approve => Status::ReadyToApprove,
        Action::Register => Status::ReadyToRegister,
        Action::Reject => Status::ReadyToReject,
        Action::Certify => Status::ReadyToCertify,
        Action::LoadReview | Action::LoadCertificate => Status::ReadyToDownload,
    }
}

/// The in-flight marker set synchronously before the network call starts.
pub fn in_flight_status(action: Action) -> Status {
    match action {
        Action::SubmitForReview => Status::Submitting,
        Action::Approve => Status::Approving,
        Action::Register => Status::Registering,
        Action::Reject => Status::Rejecting,
        Action::Certify => Status::Certifying,
        Action::LoadReview | Action::LoadCertificate => Status::Downloading,
    }
}

/// The status a successful operation lands in.
pub fn success_status(action: Action) -> Status {
    match action {
        Action::SubmitForReview => Status::Submitted,
        Action::Approve => Status::Approved,
        Action::Register => Status::Registered,
        Action::Reject => Status::Rejected,
        Action::Certify => Status::Certified,
        Action::LoadReview | Action::LoadCertificate => Status::Downloaded,
    }
}

/// Whether success completes the workflow and removes the local copy.
///
/// After approve/register/reject/certify the server is authoritative, so
/// the declaration is deleted from the local queue. Submitted and
/// downloaded records stay resident for follow-up actions.
pub fn removes_on_success(action: Action) -> bool {
    match action {
        Action::Approve | Action::Register | Action::Reject | Action::Certify => true,
        Action::SubmitForReview | Action::LoadReview | Action::LoadCertificate => false,
    }
}

/// Classification of a failed operation, mirroring the transport's
/// tagged error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transport-layer failure: no well-formed server response reached
    /// the client.
    Network,
    /// Well-formed error response, or anything not classified as network.
    Server,
}

/// The computed transition for a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureOutcome {
    /// Status to transition to.
    pub status: Status,
    /// New retry count (always the incremented value).
    pub retry_attempts: u32,
    /// True when the retry ceiling was exhausted.
    pub terminal: bool,
}

/// Decide retry-vs-terminal for a failed operation.
///
/// The pre-increment `retry_attempts` is compared with `>=` against the
/// ceiling; the returned record always carries the incremented count.
/// With ceiling 2, attempts 0 and 1 retry and the third failure is
/// terminal.
pub fn next_on_failure(
    action: Action,
    kind: FailureKind,
    retry_attempts: u32,
    ceiling: u32,
) -> FailureOutcome {
    if retry_attempts >= ceiling {
        let status = match kind {
            FailureKind::Network => Status::FailedNetwork,
            FailureKind::Server => Status::Failed,
        };
        FailureOutcome {
            status,
            retry_attempts: retry_attempts + 1,
            terminal: true,
        }
    } else {
        FailureOutcome {
            status: ready_status(action),
            retry_attempts: retry_attempts + 1,
            terminal: false,
        }
    }
}

/// The remote operation name for an (event, action) pair.
///
/// One named operation per declaration per pass; the transport receives
/// this name plus a variables object.
pub fn operation_name(event: EventKind, action: Action) -> &'static str {
    match (event, action) {
        (EventKind::Birth, Action::SubmitForReview) => "submitBirthDeclaration",
        (EventKind::Birth, Action::Approve) => "approveBirthDeclaration",
        (EventKind::Birth, Action::Register) => "registerBirthDeclaration",
        (EventKind::Birth, Action::Reject) => "rejectBirthDeclaration",
        (EventKind::Birth, Action::Certify) => "certifyBirthDeclaration",
        (EventKind::Birth, Action::LoadReview) => "fetchBirthDeclarationForReview",
        (EventKind::Birth, Action::LoadCertificate) => "fetchBirthDeclarationForCertificate",
        (EventKind::Death, Action::SubmitForReview) => "submitDeathDeclaration",
        (EventKind::Death, Action::Approve) => "approveDeathDeclaration",
        (EventKind::Death, Action::Register) => "registerDeathDeclaration",
        (EventKind::Death, Action::Reject) => "rejectDeathDeclaration",
        (EventKind::Death, Action::Certify) => "certifyDeathDeclaration",
        (EventKind::Death, Action::LoadReview) => "fetchDeathDeclarationForReview",
        (EventKind::Death, Action::LoadCertificate) => "fetchDeathDeclarationForCertificate",
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
