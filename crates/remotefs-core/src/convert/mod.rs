// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Translators between local values and their wire forms

pub mod attr;
pub mod context;
pub mod dirent;
pub mod status;

pub use attr::{
    attr_from_wire, attr_to_wire, nanos_to_system_time, statfs_from_wire, statfs_to_wire,
    system_time_to_nanos,
};
pub use context::{context_from_wire, context_to_wire};
pub use dirent::{entries_from_wire, entries_to_wire};
pub use status::{error_to_wire, status_from_wire, status_to_wire};
