// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! RemoteFS server executable - exports an in-memory filesystem over TCP

use anyhow::{Context, Result};
use clap::Parser;
use remotefs_core::{MemoryFs, PathFs};
use remotefs_logging::CliLoggingArgs;
use remotefs_server::{Listener, PathFsServer, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const COMPONENT: &str = "remotefs-server";

#[derive(Parser)]
#[command(name = "remotefs-server")]
#[command(about = "Serve an in-memory filesystem to RemoteFS mount clients")]
#[command(version, long_about = None)]
struct Cli {
    /// Address to listen on (default: 127.0.0.1:50000)
    #[arg(long)]
    listen: Option<String>,

    /// Copy this local directory into the served filesystem at startup
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Backend identity reported to clients
    #[arg(long)]
    identity: Option<String>,

    /// Operation the backend should not declare (repeatable)
    #[arg(long = "disable", value_name = "OP")]
    disabled_ops: Vec<String>,

    /// JSON configuration file; command-line flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    logging: CliLoggingArgs,
}

impl Cli {
    fn into_config(self) -> Result<(ServerConfig, CliLoggingArgs)> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };
        if self.listen.is_some() {
            config.listen = self.listen;
        }
        if self.seed.is_some() {
            config.seed_dir = self.seed;
        }
        if self.identity.is_some() {
            config.identity = self.identity;
        }
        config.disabled_ops.extend(self.disabled_ops);
        Ok((config, self.logging))
    }
}

fn build_backend(config: &ServerConfig) -> Result<MemoryFs> {
    let mut fs = MemoryFs::new();
    if let Some(identity) = &config.identity {
        fs = fs.with_identity(identity.clone());
    }
    let caps = config.capabilities(fs.capabilities())?;
    let fs = fs.with_capabilities(caps);

    match &config.seed_dir {
        Some(dir) => {
            fs.import_dir(dir)
                .with_context(|| format!("failed to import {}", dir.display()))?;
            info!(component = COMPONENT, dir = %dir.display(), "seeded filesystem");
        }
        None => {
            fs.write_file("file.txt", b"file.txt")
                .context("failed to create demo file")?;
        }
    }
    Ok(fs)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, logging) = cli.into_config()?;
    logging.init(COMPONENT)?;

    let fs = build_backend(&config)?;
    if logging.is_debug() {
        fs.set_debug(true)?;
    }

    let listener = Listener::bind(config.listen_addr(), PathFsServer::new(Arc::new(fs)))
        .with_context(|| format!("failed to listen on {}", config.listen_addr()))?;
    info!(
        component = COMPONENT,
        addr = %listener.local_addr()?,
        "RemoteFS server: initialized successfully"
    );

    listener.serve().context("listener failed")?;
    info!(component = COMPONENT, "RemoteFS server: shutting down");
    Ok(())
}
