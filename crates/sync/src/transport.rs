// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for the registration gateway.
//!
//! Provides a trait-based transport layer that enables:
//! - Real HTTP requests against the gateway for production
//! - Mock transports for unit testing
//!
//! Errors are tagged at the source: [`TransportError::Network`] means no
//! well-formed server response reached the client, everything else is
//! [`TransportError::Server`]. The engine's retry classification reads
//! only this tag, never the shape of an untyped exception.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Transport-layer failure: connection refused, DNS, timeout.
    #[error("network error: {0}")]
    Network(String),

    /// Well-formed error response, HTTP error status, or a malformed
    /// body. Anything not clearly a network failure lands here.
    #[error("server error: {0}")]
    Server(String),
}

impl TransportError {
    /// Returns true for connectivity-related failures.
    pub fn is_network(&self) -> bool {
        matches!(self, TransportError::Network(_))
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Server-assigned identifiers returned by a successful operation.
///
/// All fields are optional; the server returns whichever identifiers the
/// operation produced and the engine accumulates them into the payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub composition_id: Option<String>,
    pub tracking_id: Option<String>,
    pub registration_number: Option<String>,
}

/// Transport trait for executing one named gateway operation.
///
/// This trait abstracts over the actual transport mechanism, allowing
/// for easy testing with mock implementations.
pub trait TransportClient: Send + Sync {
    /// Execute a named operation with the given variables object.
    fn execute(
        &self,
        operation: &'static str,
        variables: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Receipt>> + Send + '_>>;
}

/// HTTP transport implementation using reqwest.
///
/// Posts `{ "operationName": ..., "variables": ... }` to the gateway URL
/// and reads the receipt from `data.<operationName>`.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    /// Create a transport for the given gateway URL.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client: {e}")))?;

        Ok(HttpTransport {
            client,
            url: url.into(),
        })
    }
}

impl TransportClient for HttpTransport {
    fn execute(
        &self,
        operation: &'static str,
        variables: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Receipt>> + Send + '_>> {
        Box::pin(async move {
            let body = serde_json::json!({
                "operationName": operation,
                "variables": variables,
            });

            // A send error means no response reached us: network class.
            let response = self
                .client
                .post(&self.url)
                .json(&body)
                .send()
                .await
                .map_err(|e| TransportError::Network(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::Server(format!("http status {status}")));
            }

            let body: serde_json::Value = response
                .json()
                .await
                .map_err(|e| TransportError::Server(format!("malformed response: {e}")))?;

            if let Some(errors) = body.get("errors").and_then(|e| e.as_array()) {
                if !errors.is_empty() {
                    return Err(TransportError::Server(format!(
                        "{operation} rejected: {}",
                        serde_json::Value::Array(errors.clone())
                    )));
                }
            }

            match body.get("data").and_then(|d| d.get(operation)) {
                Some(payload) => serde_json::from_value(payload.clone())
                    .map_err(|e| TransportError::Server(format!("malformed receipt: {e}"))),
                // Some operations return no identifiers at all.
                None => Ok(Receipt::default()),
            }
        })
    }
}
