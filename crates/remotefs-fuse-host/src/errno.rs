// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Mapping of filesystem results to kernel error numbers

use libc::c_int;
use remotefs_core::FsError;

/// The errno reported to the kernel for `err`
pub fn to_errno(err: FsError) -> c_int {
    match err {
        FsError::NotFound => libc::ENOENT,
        FsError::AlreadyExists => libc::EEXIST,
        FsError::PermissionDenied => libc::EPERM,
        FsError::AccessDenied => libc::EACCES,
        FsError::NotImplemented => libc::ENOSYS,
        FsError::InvalidArgument => libc::EINVAL,
        FsError::NotADirectory => libc::ENOTDIR,
        FsError::IsADirectory => libc::EISDIR,
        FsError::NotEmpty => libc::ENOTEMPTY,
        FsError::NoData => libc::ENODATA,
        FsError::Range => libc::ERANGE,
        FsError::NameTooLong => libc::ENAMETOOLONG,
        FsError::NoSpace => libc::ENOSPC,
        FsError::ReadOnly => libc::EROFS,
        FsError::CrossDevice => libc::EXDEV,
        FsError::Busy => libc::EBUSY,
        FsError::Io => libc::EIO,
    }
}
