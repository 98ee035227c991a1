// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! RemoteFS Protocol: wire types, framing and validation
//!
//! This crate defines the SSZ schemas exchanged between a RemoteFS mount
//! client and the server exporting a path-based filesystem.

pub mod frame;
pub mod messages;
pub mod validation;

pub use frame::{
    FrameError, MAX_FRAME_LEN, MAX_SNAPSHOT_LEN, decode_ssz_message, encode_ssz_message, read_frame, write_frame,
};
pub use messages::{PROTOCOL_VERSION, Request, Response, Status, status_code};
pub use validation::*;
