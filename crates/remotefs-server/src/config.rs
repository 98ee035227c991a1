// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Optional JSON configuration for the server binary

use anyhow::{Context, Result, anyhow};
use remotefs_core::{Capabilities, Op};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:50000";

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to listen on
    pub listen: Option<String>,
    /// Local directory copied into the served filesystem at startup
    pub seed_dir: Option<PathBuf>,
    /// Backend identity string
    pub identity: Option<String>,
    /// Operations the backend should not declare, by name
    pub disabled_ops: Vec<String>,
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn listen_addr(&self) -> &str {
        self.listen.as_deref().unwrap_or(DEFAULT_LISTEN_ADDR)
    }

    /// `base` minus the disabled operations
    pub fn capabilities(&self, base: Capabilities) -> Result<Capabilities> {
        self.disabled_ops.iter().try_fold(base, |caps, name| {
            let op = Op::from_name(name).ok_or_else(|| anyhow!("unknown operation '{}'", name))?;
            Ok(caps.without(op))
        })
    }
}
