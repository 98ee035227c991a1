// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! RemoteFS server: exports a [`remotefs_core::PathFs`] backend over TCP

pub mod config;
pub mod listener;
pub mod server;

pub use config::{DEFAULT_LISTEN_ADDR, ServerConfig};
pub use listener::Listener;
pub use server::PathFsServer;
