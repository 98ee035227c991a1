// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! RemoteFS client: reaches a remote backend through the [`remotefs_core::PathFs`] contract
//!
//! ```no_run
//! use remotefs_client::{ClientConfig, RemoteFs, TcpTransport};
//! use remotefs_core::PathFs;
//!
//! let transport = TcpTransport::connect(ClientConfig::default())?;
//! let fs = RemoteFs::new(transport);
//! let entries = fs.opendir("", None)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod remote;
pub mod transport;

pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_REMOTE_ADDR};
pub use remote::RemoteFs;
pub use transport::{TcpTransport, Transport, TransportError};
