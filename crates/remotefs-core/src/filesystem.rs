// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The path-based filesystem contract served over RemoteFS
//!
//! A backend implements [`PathFs`] and declares which operations it serves
//! through [`PathFs::capabilities`]. Operations it does not override answer
//! [`FsError::NotImplemented`]. Paths are relative to the filesystem root,
//! which is the empty string.

use crate::error::{FsError, FsResult};
use crate::file::File;
use crate::types::{Attr, Context, DirEntry, StatFs};
use std::fmt;
use std::time::SystemTime;

/// One operation of the [`PathFs`] contract
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Op {
    GetAttr,
    OpenDir,
    Open,
    Create,
    Chmod,
    Chown,
    Utimens,
    Truncate,
    Access,
    Link,
    Mkdir,
    Mknod,
    Rename,
    Rmdir,
    Unlink,
    GetXAttr,
    ListXAttr,
    RemoveXAttr,
    SetXAttr,
    Symlink,
    Readlink,
    StatFs,
    Identity,
    SetDebug,
}

impl Op {
    pub const ALL: [Op; 24] = [
        Op::GetAttr,
        Op::OpenDir,
        Op::Open,
        Op::Create,
        Op::Chmod,
        Op::Chown,
        Op::Utimens,
        Op::Truncate,
        Op::Access,
        Op::Link,
        Op::Mkdir,
        Op::Mknod,
        Op::Rename,
        Op::Rmdir,
        Op::Unlink,
        Op::GetXAttr,
        Op::ListXAttr,
        Op::RemoveXAttr,
        Op::SetXAttr,
        Op::Symlink,
        Op::Readlink,
        Op::StatFs,
        Op::Identity,
        Op::SetDebug,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Op::GetAttr => "getattr",
            Op::OpenDir => "opendir",
            Op::Open => "open",
            Op::Create => "create",
            Op::Chmod => "chmod",
            Op::Chown => "chown",
            Op::Utimens => "utimens",
            Op::Truncate => "truncate",
            Op::Access => "access",
            Op::Link => "link",
            Op::Mkdir => "mkdir",
            Op::Mknod => "mknod",
            Op::Rename => "rename",
            Op::Rmdir => "rmdir",
            Op::Unlink => "unlink",
            Op::GetXAttr => "getxattr",
            Op::ListXAttr => "listxattr",
            Op::RemoveXAttr => "removexattr",
            Op::SetXAttr => "setxattr",
            Op::Symlink => "symlink",
            Op::Readlink => "readlink",
            Op::StatFs => "statfs",
            Op::Identity => "identity",
            Op::SetDebug => "set_debug",
        }
    }

    pub fn from_name(name: &str) -> Option<Op> {
        Op::ALL.into_iter().find(|op| op.name() == name)
    }

    fn bit(self) -> u32 {
        1 << (self as u8)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of operations a backend declares it serves
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Capabilities(u32);

impl Capabilities {
    pub const fn none() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Self::from_ops(Op::ALL)
    }

    pub fn from_ops(ops: impl IntoIterator<Item = Op>) -> Self {
        ops.into_iter().fold(Self::none(), Self::with)
    }

    pub fn with(self, op: Op) -> Self {
        Self(self.0 | op.bit())
    }

    pub fn without(self, op: Op) -> Self {
        Self(self.0 & !op.bit())
    }

    pub fn supports(&self, op: Op) -> bool {
        self.0 & op.bit() != 0
    }

    pub fn ops(&self) -> impl Iterator<Item = Op> + '_ {
        Op::ALL.into_iter().filter(|op| self.supports(*op))
    }
}

/// Path-based filesystem backend
///
/// `ctx` identifies the calling process when known.
pub trait PathFs: Send + Sync {
    /// Operations this backend serves
    fn capabilities(&self) -> Capabilities;

    fn getattr(&self, _name: &str, _ctx: Option<&Context>) -> FsResult<Attr> {
        Err(FsError::NotImplemented)
    }

    /// List a directory
    fn opendir(&self, _name: &str, _ctx: Option<&Context>) -> FsResult<Vec<DirEntry>> {
        Err(FsError::NotImplemented)
    }

    fn open(&self, _name: &str, _flags: u32, _ctx: Option<&Context>) -> FsResult<Box<dyn File>> {
        Err(FsError::NotImplemented)
    }

    fn create(
        &self,
        _name: &str,
        _flags: u32,
        _mode: u32,
        _ctx: Option<&Context>,
    ) -> FsResult<Box<dyn File>> {
        Err(FsError::NotImplemented)
    }

    fn chmod(&self, _name: &str, _mode: u32, _ctx: Option<&Context>) -> FsResult<()> {
        Err(FsError::NotImplemented)
    }

    fn chown(&self, _name: &str, _uid: u32, _gid: u32, _ctx: Option<&Context>) -> FsResult<()> {
        Err(FsError::NotImplemented)
    }

    /// `None` leaves the corresponding timestamp unchanged
    fn utimens(
        &self,
        _name: &str,
        _atime: Option<SystemTime>,
        _mtime: Option<SystemTime>,
        _ctx: Option<&Context>,
    ) -> FsResult<()> {
        Err(FsError::NotImplemented)
    }

    fn truncate(&self, _name: &str, _size: u64, _ctx: Option<&Context>) -> FsResult<()> {
        Err(FsError::NotImplemented)
    }

    fn access(&self, _name: &str, _mask: u32, _ctx: Option<&Context>) -> FsResult<()> {
        Err(FsError::NotImplemented)
    }

    fn link(&self, _old_name: &str, _new_name: &str, _ctx: Option<&Context>) -> FsResult<()> {
        Err(FsError::NotImplemented)
    }

    fn mkdir(&self, _name: &str, _mode: u32, _ctx: Option<&Context>) -> FsResult<()> {
        Err(FsError::NotImplemented)
    }

    fn mknod(&self, _name: &str, _mode: u32, _dev: u32, _ctx: Option<&Context>) -> FsResult<()> {
        Err(FsError::NotImplemented)
    }

    fn rename(&self, _old_name: &str, _new_name: &str, _ctx: Option<&Context>) -> FsResult<()> {
        Err(FsError::NotImplemented)
    }

    fn rmdir(&self, _name: &str, _ctx: Option<&Context>) -> FsResult<()> {
        Err(FsError::NotImplemented)
    }

    fn unlink(&self, _name: &str, _ctx: Option<&Context>) -> FsResult<()> {
        Err(FsError::NotImplemented)
    }

    fn getxattr(&self, _name: &str, _attribute: &str, _ctx: Option<&Context>) -> FsResult<Vec<u8>> {
        Err(FsError::NotImplemented)
    }

    fn listxattr(&self, _name: &str, _ctx: Option<&Context>) -> FsResult<Vec<String>> {
        Err(FsError::NotImplemented)
    }

    fn removexattr(&self, _name: &str, _attribute: &str, _ctx: Option<&Context>) -> FsResult<()> {
        Err(FsError::NotImplemented)
    }

    fn setxattr(
        &self,
        _name: &str,
        _attribute: &str,
        _data: &[u8],
        _flags: u32,
        _ctx: Option<&Context>,
    ) -> FsResult<()> {
        Err(FsError::NotImplemented)
    }

    /// Create `link_name` pointing at `value`
    fn symlink(&self, _value: &str, _link_name: &str, _ctx: Option<&Context>) -> FsResult<()> {
        Err(FsError::NotImplemented)
    }

    fn readlink(&self, _name: &str, _ctx: Option<&Context>) -> FsResult<String> {
        Err(FsError::NotImplemented)
    }

    /// `Ok(None)` means the backend has no statistics to report
    fn statfs(&self, _name: &str) -> FsResult<Option<StatFs>> {
        Err(FsError::NotImplemented)
    }

    /// Human-readable name of the backend, for diagnostics
    fn identity(&self) -> FsResult<String> {
        Err(FsError::NotImplemented)
    }

    fn set_debug(&self, _debug: bool) -> FsResult<()> {
        Err(FsError::NotImplemented)
    }
}

/// Parent path and final component of a relative path. The root has no parent.
pub fn split_path(path: &str) -> Option<(&str, &str)> {
    if path.is_empty() {
        return None;
    }
    match path.rfind('/') {
        Some(idx) => Some((&path[..idx], &path[idx + 1..])),
        None => Some(("", path)),
    }
}

/// Join a directory path and a child name
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}
