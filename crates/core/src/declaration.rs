// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Core declaration types for the civil-registration sync controller.
//!
//! This module contains the fundamental data types: Declaration,
//! DeclarationPayload, EventKind, Action, and Status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::lifecycle;

/// The kind of vital event a declaration records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Birth registration.
    Birth,
    /// Death registration.
    Death,
}

impl EventKind {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Birth => "birth",
            EventKind::Death => "death",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "birth" => Ok(EventKind::Birth),
            "death" => Ok(EventKind::Death),
            _ => Err(Error::InvalidEventKind(s.to_string())),
        }
    }
}

/// The workflow action a declaration is pursuing.
///
/// The action determines which remote operation is invoked and which
/// status transitions are legal (see [`crate::lifecycle`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Submit a freshly captured record for review.
    SubmitForReview,
    /// Approve (validate) a record under review.
    Approve,
    /// Register a validated record.
    Register,
    /// Reject a record back to the informant.
    Reject,
    /// Issue the certificate for a registered record.
    Certify,
    /// Download a remote record for local review.
    LoadReview,
    /// Download a registered record for certificate collection.
    LoadCertificate,
}

impl Action {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::SubmitForReview => "submit_for_review",
            Action::Approve => "approve",
            Action::Register => "register",
            Action::Reject => "reject",
            Action::Certify => "certify",
            Action::LoadReview => "load_review",
            Action::LoadCertificate => "load_certificate",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "submit_for_review" => Ok(Action::SubmitForReview),
            "approve" => Ok(Action::Approve),
            "register" => Ok(Action::Register),
            "reject" => Ok(Action::Reject),
            "certify" => Ok(Action::Certify),
            "load_review" => Ok(Action::LoadReview),
            "load_certificate" => Ok(Action::LoadCertificate),
            _ => Err(Error::InvalidAction(s.to_string())),
        }
    }
}

/// Lifecycle status of a declaration in the local queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Eligible for pickup by the next sync pass (submit).
    ReadyToSubmit,
    /// Submit operation in flight.
    Submitting,
    /// Submitted for review; resident until a follow-up action.
    Submitted,
    /// Eligible for pickup (approve).
    ReadyToApprove,
    /// Approve operation in flight.
    Approving,
    /// Approved on the server; the local copy is removed.
    Approved,
    /// Eligible for pickup (register).
    ReadyToRegister,
    /// Register operation in flight.
    Registering,
    /// Registered on the server; the local copy is removed.
    Registered,
    /// Eligible for pickup (reject).
    ReadyToReject,
    /// Reject operation in flight.
    Rejecting,
    /// Rejected on the server; the local copy is removed.
    Rejected,
    /// Eligible for pickup (certify).
    ReadyToCertify,
    /// Certify operation in flight.
    Certifying,
    /// Certified on the server; the local copy is removed.
    Certified,
    /// Eligible for pickup (load for review / certificate).
    ReadyToDownload,
    /// Download operation in flight.
    Downloading,
    /// Downloaded for local review; resident.
    Downloaded,
    /// Retry ceiling exhausted on a non-network error. Exits only via
    /// explicit user re-submission.
    Failed,
    /// Retry ceiling exhausted on a network-class error. Exits only via
    /// explicit user re-submission.
    FailedNetwork,
}

impl Status {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::ReadyToSubmit => "ready_to_submit",
            Status::Submitting => "submitting",
            Status::Submitted => "submitted",
            Status::ReadyToApprove => "ready_to_approve",
            Status::Approving => "approving",
            Status::Approved => "approved",
            Status::ReadyToRegister => "ready_to_register",
            Status::Registering => "registering",
            Status::Registered => "registered",
            Status::ReadyToReject => "ready_to_reject",
            Status::Rejecting => "rejecting",
            Status::Rejected => "rejected",
            Status::ReadyToCertify => "ready_to_certify",
            Status::Certifying => "certifying",
            Status::Certified => "certified",
            Status::ReadyToDownload => "ready_to_download",
            Status::Downloading => "downloading",
            Status::Downloaded => "downloaded",
            Status::Failed => "failed",
            Status::FailedNetwork => "failed_network",
        }
    }

    /// Returns true if an operation is marked in flight for this status.
    ///
    /// In-flight markers are set synchronously before the network call
    /// starts, so a reload or concurrent pass can detect "was mid-flight".
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Status::Submitting
                | Status::Approving
                | Status::Registering
                | Status::Rejecting
                | Status::Certifying
                | Status::Downloading
        )
    }

    /// Returns true if this is a retry-exhausted terminal failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Status::Failed | Status::FailedNetwork)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ready_to_submit" => Ok(Status::ReadyToSubmit),
            "submitting" => Ok(Status::Submitting),
            "submitted" => Ok(Status::Submitted),
            "ready_to_approve" => Ok(Status::ReadyToApprove),
            "approving" => Ok(Status::Approving),
            "approved" => Ok(Status::Approved),
            "ready_to_register" => Ok(Status::ReadyToRegister),
            "registering" => Ok(Status::Registering),
            "registered" => Ok(Status::Registered),
            "ready_to_reject" => Ok(Status::ReadyToReject),
            "rejecting" => Ok(Status::Rejecting),
            "rejected" => Ok(Status::Rejected),
            "ready_to_certify" => Ok(Status::ReadyToCertify),
            "certifying" => Ok(Status::Certifying),
            "certified" => Ok(Status::Certified),
            "ready_to_download" => Ok(Status::ReadyToDownload),
            "downloading" => Ok(Status::Downloading),
            "downloaded" => Ok(Status::Downloaded),
            "failed" => Ok(Status::Failed),
            "failed_network" => Ok(Status::FailedNetwork),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// Form data plus server-assigned identifiers.
///
/// Identifiers obtained from prior successful operations are
/// accumulated and never dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeclarationPayload {
    /// Captured form data, opaque to the controller.
    #[serde(default)]
    pub form: serde_json::Value,
    /// Server-assigned composition id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composition_id: Option<String>,
    /// Server-assigned tracking id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
    /// Server-assigned registration number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
}

impl DeclarationPayload {
    /// Merge server-assigned identifiers into the payload.
    ///
    /// A field is only overwritten when the incoming value is `Some`.
    pub fn merge_ids(
        &mut self,
        composition_id: Option<String>,
        tracking_id: Option<String>,
        registration_number: Option<String>,
    ) {
        if composition_id.is_some() {
            self.composition_id = composition_id;
        }
        if tracking_id.is_some() {
            self.tracking_id = tracking_id;
        }
        if registration_number.is_some() {
            self.registration_number = registration_number;
        }
    }
}

/// A locally queued registration declaration: the unit of sync work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    /// Opaque unique identifier, stable for the lifetime of the queue entry.
    pub id: String,
    /// The vital event this declaration records.
    pub event: EventKind,
    /// The workflow action being pursued.
    pub action: Action,
    /// Current lifecycle status.
    pub status: Status,
    /// Failed attempts for the current action. Absent deserializes to 0.
    #[serde(default)]
    pub retry_attempts: u32,
    /// Timestamp of the last local mutation.
    pub modified_on: DateTime<Utc>,
    /// Form data plus accumulated server-assigned identifiers.
    #[serde(default)]
    pub payload: DeclarationPayload,
}

impl Declaration {
    /// Create a new declaration in the ready status for its action.
    pub fn new(id: impl Into<String>, event: EventKind, action: Action) -> Self {
        Declaration {
            id: id.into(),
            event,
            action,
            status: lifecycle::ready_status(action),
            retry_attempts: 0,
            modified_on: Utc::now(),
            payload: DeclarationPayload::default(),
        }
    }

    /// Returns true if a sync pass may pick this declaration up.
    pub fn is_eligible(&self) -> bool {
        self.status == lifecycle::ready_status(self.action)
    }

    /// Explicit user re-submission out of a terminal failure status.
    ///
    /// Resets the declaration to its action's ready status with a fresh
    /// retry budget.
    pub fn reset_for_retry(&mut self) {
        self.status = lifecycle::ready_status(self.action);
        self.retry_attempts = 0;
        self.modified_on = Utc::now();
    }
}

#[cfg(test)]
#[path = "declaration_tests.rs"]
mod tests;
