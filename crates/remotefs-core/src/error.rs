// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for RemoteFS

use std::io;

/// Filesystem result codes. Success is the `Ok` side of [`FsResult`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("operation not permitted")]
    PermissionDenied,
    #[error("access denied")]
    AccessDenied,
    #[error("not implemented")]
    NotImplemented,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("not a directory")]
    NotADirectory,
    #[error("is a directory")]
    IsADirectory,
    #[error("directory not empty")]
    NotEmpty,
    #[error("no such attribute")]
    NoData,
    #[error("result out of range")]
    Range,
    #[error("name too long")]
    NameTooLong,
    #[error("no space left")]
    NoSpace,
    #[error("read-only filesystem")]
    ReadOnly,
    #[error("cross-device link")]
    CrossDevice,
    #[error("busy")]
    Busy,
    /// Generic I/O failure, also reported when the remote side could not be reached
    #[error("I/O error")]
    Io,
}

pub type FsResult<T> = Result<T, FsError>;

impl From<io::Error> for FsError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => FsError::NotFound,
            io::ErrorKind::AlreadyExists => FsError::AlreadyExists,
            io::ErrorKind::PermissionDenied => FsError::AccessDenied,
            io::ErrorKind::InvalidInput => FsError::InvalidArgument,
            _ => FsError::Io,
        }
    }
}
