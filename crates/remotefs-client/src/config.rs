// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Client connection settings

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Remote address used when none is configured
pub const DEFAULT_REMOTE_ADDR: &str = "127.0.0.1:50000";

const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 16;

/// Where and how a client reaches the server.
///
/// Loaded from JSON (kebab-case keys) or assembled with [`ClientConfig::builder`].
/// Timeouts are off unless set; a stalled server then blocks the caller.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ClientConfig {
    pub remote: String,
    pub read_timeout_ms: Option<u64>,
    pub write_timeout_ms: Option<u64>,
    pub max_idle_connections: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            remote: DEFAULT_REMOTE_ADDR.to_string(),
            read_timeout_ms: None,
            write_timeout_ms: None,
            max_idle_connections: DEFAULT_MAX_IDLE_CONNECTIONS,
        }
    }
}

impl ClientConfig {
    /// Start building configuration for `remote`
    pub fn builder(remote: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: ClientConfig {
                remote: remote.into(),
                ..Default::default()
            },
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        self.write_timeout_ms.map(Duration::from_millis)
    }
}

/// Builder for [`ClientConfig`].
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the read timeout applied to each connection.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Set the write timeout applied to each connection.
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Upper bound on idle connections kept for reuse.
    pub fn max_idle_connections(mut self, max: usize) -> Self {
        self.config.max_idle_connections = max;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
