// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration.
//!
//! Configuration is stored in a TOML file and includes:
//! - `url`: the registration gateway endpoint
//! - `store_path`: the JSONL declaration queue file
//! - `[sync]`: engine and scheduler tunables, all with defaults

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::EngineConfig;
use crate::error::Result;

/// Daemon configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Registration gateway URL.
    pub url: String,
    /// Path of the JSONL declaration queue.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// Engine and scheduler tunables.
    #[serde(default)]
    pub sync: SyncSettings,
}

/// Engine and scheduler tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Scheduler period in seconds (default: 300).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Prior failed attempts allowed before a failure goes terminal
    /// (default: 2, i.e. the third failure is terminal).
    #[serde(default = "default_retry_ceiling")]
    pub retry_ceiling: u32,
    /// Age in seconds past which an in-flight declaration is requeued
    /// (default: 900).
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    /// HTTP request timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("declarations.jsonl")
}

fn default_interval_secs() -> u64 {
    300
}

fn default_retry_ceiling() -> u32 {
    2
}

fn default_stale_after_secs() -> u64 {
    900
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            interval_secs: default_interval_secs(),
            retry_ceiling: default_retry_ceiling(),
            stale_after_secs: default_stale_after_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl SyncSettings {
    /// Engine tunables derived from the settings.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            retry_ceiling: self.retry_ceiling,
            stale_after: chrono::Duration::seconds(self.stale_after_secs as i64),
        }
    }

    /// Scheduler period.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// HTTP request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
