// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! RemoteFS mount executable
//!
//! Connects to a RemoteFS server and mounts its filesystem with libfuse.
//! Runs until interrupted, then unmounts and exits.

use anyhow::{Context, Result};
use clap::Parser;
use remotefs_client::{ClientConfig, RemoteFs, TcpTransport};
use remotefs_logging::CliLoggingArgs;
use std::path::PathBuf;
use tracing::info;

const COMPONENT: &str = "remotefs-mount";

#[derive(Parser)]
#[command(name = "remotefs-mount")]
#[command(about = "Mount a remote RemoteFS filesystem")]
#[command(version, long_about = None)]
struct Args {
    /// Mount point for the filesystem
    mount_point: PathBuf,

    /// Server address (default: 127.0.0.1:50000)
    #[arg(long)]
    remote: Option<String>,

    /// Configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Allow other users to access the filesystem
    #[arg(long)]
    allow_other: bool,

    /// Auto unmount on process exit
    #[arg(long)]
    auto_unmount: bool,

    #[command(flatten)]
    logging: CliLoggingArgs,
}

fn load_config(config_path: Option<&PathBuf>, remote: Option<String>) -> Result<ClientConfig> {
    let mut config = match config_path {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if let Some(remote) = remote {
        config.remote = remote;
    }
    Ok(config)
}

fn connect(config: ClientConfig) -> Result<RemoteFs<TcpTransport>> {
    let remote = config.remote.clone();
    let transport = TcpTransport::connect(config)
        .with_context(|| format!("failed to connect to {remote}"))?;
    info!(component = COMPONENT, remote = %transport.remote_addr(), "connected");
    Ok(RemoteFs::new(transport))
}

#[cfg(all(feature = "fuse", target_os = "linux"))]
fn mount(args: &Args, fs: RemoteFs<TcpTransport>) -> Result<()> {
    use remotefs_fuse_host::PathFsFuse;
    use std::sync::mpsc;

    let mut mount_options = vec![fuser::MountOption::FSName("remotefs".to_string())];
    if args.allow_other {
        mount_options.push(fuser::MountOption::AllowOther);
    }
    if args.auto_unmount {
        mount_options.push(fuser::MountOption::AutoUnmount);
    }

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .context("failed to install interrupt handler")?;

    info!("Mounting filesystem...");
    let session = fuser::spawn_mount2(PathFsFuse::new(fs), &args.mount_point, &mount_options)
        .with_context(|| format!("failed to mount at {}", args.mount_point.display()))?;
    info!("RemoteFS mounted; waiting for interrupt");

    let _ = rx.recv();
    info!("Interrupted, unmounting");
    drop(session);
    Ok(())
}

#[cfg(not(all(feature = "fuse", target_os = "linux")))]
fn mount(_args: &Args, _fs: RemoteFs<TcpTransport>) -> Result<()> {
    info!("To enable FUSE support, compile with: cargo build --features fuse");
    anyhow::bail!("FUSE support not compiled in; cannot mount")
}

fn main() -> Result<()> {
    let args = Args::parse();
    args.logging.init(COMPONENT)?;

    info!("Starting RemoteFS mount");
    info!("Mount point: {}", args.mount_point.display());

    let config = load_config(args.config.as_ref(), args.remote.clone())?;
    info!("Configuration loaded: {:?}", config);

    let fs = connect(config)?;
    mount(&args, fs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use remotefs_client::DEFAULT_REMOTE_ADDR;
    use std::io::Write;
    use std::net::TcpListener;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_loading_default() {
        let config = load_config(None, None).unwrap();
        assert_eq!(config.remote, DEFAULT_REMOTE_ADDR);
        assert_eq!(config.read_timeout(), None);
    }

    #[test]
    fn test_remote_flag_overrides_config_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, r#"{{"remote": "10.0.0.1:7000", "read-timeout-ms": 250}}"#).unwrap();
        let path = temp_file.path().to_path_buf();

        let from_file = load_config(Some(&path), None).unwrap();
        assert_eq!(from_file.remote, "10.0.0.1:7000");

        let overridden = load_config(Some(&path), Some("127.0.0.1:9".to_string())).unwrap();
        assert_eq!(overridden.remote, "127.0.0.1:9");
        assert_eq!(overridden.read_timeout_ms, Some(250));
    }

    #[test]
    fn test_connect_failure_is_fatal() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = connect(ClientConfig::builder(addr.to_string()).build()).err().unwrap();
        assert!(err.to_string().contains("failed to connect"));
    }

    #[cfg(not(all(feature = "fuse", target_os = "linux")))]
    #[test]
    fn test_mount_without_fuse_support_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let fs = connect(ClientConfig::builder(addr.to_string()).build()).unwrap();
        let args = Args::try_parse_from(["remotefs-mount", "/mnt/remote"]).unwrap();

        let err = mount(&args, fs).unwrap_err();
        assert!(err.to_string().contains("FUSE support not compiled in"));
    }

    #[test]
    fn test_args_parse_with_remote_and_mount_point() {
        let args = Args::try_parse_from([
            "remotefs-mount",
            "/mnt/remote",
            "--remote",
            "192.168.1.5:50000",
            "--allow-other",
        ])
        .unwrap();
        assert_eq!(args.mount_point, PathBuf::from("/mnt/remote"));
        assert_eq!(args.remote.as_deref(), Some("192.168.1.5:50000"));
        assert!(args.allow_other);
        assert!(!args.auto_unmount);
    }
}
