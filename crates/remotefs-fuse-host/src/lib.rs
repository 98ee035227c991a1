// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! RemoteFS FUSE host: mounts a remote [`remotefs_core::PathFs`] backend locally
//!
//! The kernel-facing adapter is only built on Linux with the `fuse` feature.

#[cfg(all(feature = "fuse", target_os = "linux"))]
pub mod adapter;
pub mod errno;
pub mod inodes;

#[cfg(all(feature = "fuse", target_os = "linux"))]
pub use adapter::PathFsFuse;
pub use errno::to_errno;
pub use inodes::{InodeTable, ROOT_INO};
