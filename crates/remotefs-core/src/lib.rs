// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! RemoteFS Core: the path-based filesystem contract and its wire translators
//!
//! Backends implement [`PathFs`]. The server adapter drives a backend from
//! wire requests and the client adapter implements [`PathFs`] on top of a
//! transport, so mount glue sees the same contract on both sides.

pub mod convert;
pub mod error;
pub mod file;
pub mod filesystem;
pub mod memory;
pub mod types;

pub use error::{FsError, FsResult};
pub use file::{DataFile, File, snapshot};
pub use filesystem::{Capabilities, Op, PathFs, join_path, split_path};
pub use memory::MemoryFs;
pub use types::{Attr, Context, DirEntry, Owner, StatFs};
