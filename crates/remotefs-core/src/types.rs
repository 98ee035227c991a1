// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Local value types exchanged with a [`PathFs`](crate::PathFs) backend

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// File type mask and type bits of `Attr::mode`
pub const S_IFMT: u32 = 0o170000;
pub const S_IFSOCK: u32 = 0o140000;
pub const S_IFLNK: u32 = 0o120000;
pub const S_IFREG: u32 = 0o100000;
pub const S_IFBLK: u32 = 0o060000;
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFCHR: u32 = 0o020000;
pub const S_IFIFO: u32 = 0o010000;

/// Owning user and group
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Owner {
    pub uid: u32,
    pub gid: u32,
}

/// Identity of the process issuing a call.
///
/// `owner` is `None` when the caller's identity is unknown, which is
/// distinct from uid/gid 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Context {
    pub pid: u32,
    pub owner: Option<Owner>,
}

/// File metadata. Timestamps are split into whole seconds and nanoseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Attr {
    pub ino: u64,
    pub size: u64,
    pub blocks: u64,
    pub atime: u64,
    pub mtime: u64,
    pub ctime: u64,
    pub atimensec: u32,
    pub mtimensec: u32,
    pub ctimensec: u32,
    pub mode: u32,
    pub nlink: u32,
    pub owner: Owner,
    pub rdev: u32,
    pub blksize: u32,
    pub padding: u32,
}

impl Attr {
    pub fn file_type(&self) -> u32 {
        self.mode & S_IFMT
    }

    pub fn is_dir(&self) -> bool {
        self.file_type() == S_IFDIR
    }

    pub fn is_regular(&self) -> bool {
        self.file_type() == S_IFREG
    }

    pub fn is_symlink(&self) -> bool {
        self.file_type() == S_IFLNK
    }

    /// Permission bits without the file type
    pub fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }

    pub fn atime(&self) -> SystemTime {
        split_to_system_time(self.atime, self.atimensec)
    }

    pub fn mtime(&self) -> SystemTime {
        split_to_system_time(self.mtime, self.mtimensec)
    }

    pub fn ctime(&self) -> SystemTime {
        split_to_system_time(self.ctime, self.ctimensec)
    }

    pub fn set_atime(&mut self, time: SystemTime) {
        (self.atime, self.atimensec) = system_time_to_split(time);
    }

    pub fn set_mtime(&mut self, time: SystemTime) {
        (self.mtime, self.mtimensec) = system_time_to_split(time);
    }

    pub fn set_ctime(&mut self, time: SystemTime) {
        (self.ctime, self.ctimensec) = system_time_to_split(time);
    }
}

fn split_to_system_time(secs: u64, nsec: u32) -> SystemTime {
    UNIX_EPOCH + Duration::new(secs, nsec)
}

/// Times before the epoch clamp to the epoch in the unsigned split form
fn system_time_to_split(time: SystemTime) -> (u64, u32) {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => (d.as_secs(), d.subsec_nanos()),
        Err(_) => (0, 0),
    }
}

/// A single directory listing entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    /// Type bits (and optionally permissions) of the entry
    pub mode: u32,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, mode: u32) -> Self {
        Self {
            name: name.into(),
            mode,
        }
    }
}

/// Number of spare slots carried in [`StatFs`]
pub const STATFS_SPARE_SLOTS: usize = 6;

/// Filesystem statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatFs {
    pub blocks: u64,
    pub bfree: u64,
    pub bavail: u64,
    pub files: u64,
    pub ffree: u64,
    pub bsize: u32,
    pub name_len: u32,
    pub frsize: u32,
    pub padding: u32,
    pub spare: [u32; STATFS_SPARE_SLOTS],
}
