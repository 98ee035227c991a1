// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use crate::types::{Attr, Owner, STATFS_SPARE_SLOTS, StatFs};
use remotefs_proto::messages as wire;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub fn attr_to_wire(a: &Attr) -> wire::Attr {
    wire::Attr {
        ino: a.ino,
        size: a.size,
        blocks: a.blocks,
        atime: a.atime,
        mtime: a.mtime,
        ctime: a.ctime,
        atimensec: a.atimensec,
        mtimensec: a.mtimensec,
        ctimensec: a.ctimensec,
        mode: a.mode,
        nlink: a.nlink,
        owner: wire::Owner {
            uid: a.owner.uid,
            gid: a.owner.gid,
        },
        rdev: a.rdev,
        blksize: a.blksize,
        padding: a.padding,
    }
}

pub fn attr_from_wire(a: &wire::Attr) -> Attr {
    Attr {
        ino: a.ino,
        size: a.size,
        blocks: a.blocks,
        atime: a.atime,
        mtime: a.mtime,
        ctime: a.ctime,
        atimensec: a.atimensec,
        mtimensec: a.mtimensec,
        ctimensec: a.ctimensec,
        mode: a.mode,
        nlink: a.nlink,
        owner: Owner {
            uid: a.owner.uid,
            gid: a.owner.gid,
        },
        rdev: a.rdev,
        blksize: a.blksize,
        padding: a.padding,
    }
}

pub fn statfs_to_wire(s: &StatFs) -> wire::StatFs {
    wire::StatFs {
        blocks: s.blocks,
        bfree: s.bfree,
        bavail: s.bavail,
        files: s.files,
        ffree: s.ffree,
        bsize: s.bsize,
        name_len: s.name_len,
        frsize: s.frsize,
        padding: s.padding,
        spare: s.spare.to_vec(),
    }
}

/// Spare slots beyond [`STATFS_SPARE_SLOTS`] are dropped; missing ones stay zero.
pub fn statfs_from_wire(s: &wire::StatFs) -> StatFs {
    let mut spare = [0u32; STATFS_SPARE_SLOTS];
    for (slot, value) in spare.iter_mut().zip(s.spare.iter()) {
        *slot = *value;
    }
    StatFs {
        blocks: s.blocks,
        bfree: s.bfree,
        bavail: s.bavail,
        files: s.files,
        ffree: s.ffree,
        bsize: s.bsize,
        name_len: s.name_len,
        frsize: s.frsize,
        padding: s.padding,
        spare,
    }
}

/// Signed nanoseconds since the epoch, saturating at the `i64` range
pub fn system_time_to_nanos(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_nanos()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_nanos())
            .map(|n| -n)
            .unwrap_or(i64::MIN),
    }
}

pub fn nanos_to_system_time(nanos: i64) -> SystemTime {
    if nanos >= 0 {
        UNIX_EPOCH + Duration::from_nanos(nanos as u64)
    } else {
        UNIX_EPOCH - Duration::from_nanos(nanos.unsigned_abs())
    }
}
