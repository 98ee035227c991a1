// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! RemoteFS FUSE adapter implementation
//!
//! Maps FUSE operations onto a [`PathFs`] backend. Nothing is cached: every
//! kernel request becomes one backend call and replies carry a zero TTL.

#[cfg(not(all(feature = "fuse", target_os = "linux")))]
compile_error!("This module requires the 'fuse' feature on Linux");

use crate::errno::to_errno;
use crate::inodes::{InodeTable, ROOT_INO};
use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyCreate, ReplyData, ReplyDirectory, ReplyEmpty,
    ReplyEntry, ReplyOpen, ReplyStatfs, ReplyWrite, ReplyXattr, Request, TimeOrNow,
};
use libc::{EBADF, EINVAL, ENAMETOOLONG, ENOENT, ERANGE, c_int};
use remotefs_core::types::{S_IFBLK, S_IFCHR, S_IFDIR, S_IFIFO, S_IFLNK, S_IFMT, S_IFSOCK};
use remotefs_core::{Attr, Context, File, FsError, Owner, PathFs, join_path, split_path};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

const NAME_MAX: usize = 255;
const TTL: Duration = Duration::ZERO;

/// Reported by `statfs` when the backend has no usage figures
const FALLBACK_BLOCK_SIZE: u32 = 4096;

/// FUSE filesystem forwarding to a path-based backend
pub struct PathFsFuse<F: PathFs> {
    fs: F,
    inodes: InodeTable,
    handles: HashMap<u64, Box<dyn File>>,
    next_fh: u64,
}

impl<F: PathFs> PathFsFuse<F> {
    pub fn new(fs: F) -> Self {
        Self {
            fs,
            inodes: InodeTable::new(),
            handles: HashMap::new(),
            next_fh: 1,
        }
    }

    fn context(req: &Request) -> Context {
        Context {
            pid: req.pid(),
            owner: Some(Owner {
                uid: req.uid(),
                gid: req.gid(),
            }),
        }
    }

    fn resolve(&self, ino: u64) -> Result<String, c_int> {
        self.inodes.path(ino).map(str::to_string).ok_or(ENOENT)
    }

    fn child(&self, parent: u64, name: &OsStr) -> Result<String, c_int> {
        let name = name.to_str().ok_or(EINVAL)?;
        if name.len() > NAME_MAX {
            return Err(ENAMETOOLONG);
        }
        self.inodes.child_path(parent, name).ok_or(ENOENT)
    }

    fn attr_for(&mut self, path: &str, ctx: &Context) -> Result<FileAttr, c_int> {
        let attr = self.fs.getattr(path, Some(ctx)).map_err(to_errno)?;
        let ino = self.inodes.get_or_alloc(path);
        Ok(attr_to_fuse(&attr, ino))
    }

    /// Look up a freshly created node and answer with its entry
    fn reply_new_entry(&mut self, path: &str, ctx: &Context, reply: ReplyEntry) {
        match self.attr_for(path, ctx) {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(errno) => reply.error(errno),
        }
    }

    fn store_handle(&mut self, file: Box<dyn File>) -> u64 {
        let fh = self.next_fh;
        self.next_fh += 1;
        self.handles.insert(fh, file);
        fh
    }

    fn parent_ino(&mut self, path: &str) -> u64 {
        match split_path(path) {
            Some((parent, _)) => self.inodes.get_or_alloc(parent),
            None => ROOT_INO,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_setattr(
        &mut self,
        path: &str,
        ctx: &Context,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
        atime: Option<TimeOrNow>,
        mtime: Option<TimeOrNow>,
    ) -> Result<(), FsError> {
        if let Some(mode) = mode {
            self.fs.chmod(path, mode & 0o7777, Some(ctx))?;
        }
        if uid.is_some() || gid.is_some() {
            let current = self.fs.getattr(path, Some(ctx))?;
            self.fs.chown(
                path,
                uid.unwrap_or(current.owner.uid),
                gid.unwrap_or(current.owner.gid),
                Some(ctx),
            )?;
        }
        if let Some(size) = size {
            self.fs.truncate(path, size, Some(ctx))?;
        }
        if atime.is_some() || mtime.is_some() {
            self.fs
                .utimens(path, atime.map(resolve_time), mtime.map(resolve_time), Some(ctx))?;
        }
        Ok(())
    }
}

fn resolve_time(time: TimeOrNow) -> SystemTime {
    match time {
        TimeOrNow::SpecificTime(t) => t,
        TimeOrNow::Now => SystemTime::now(),
    }
}

fn file_type(mode: u32) -> FileType {
    match mode & S_IFMT {
        S_IFDIR => FileType::Directory,
        S_IFLNK => FileType::Symlink,
        S_IFCHR => FileType::CharDevice,
        S_IFBLK => FileType::BlockDevice,
        S_IFIFO => FileType::NamedPipe,
        S_IFSOCK => FileType::Socket,
        _ => FileType::RegularFile,
    }
}

/// Convert a backend attribute record to FUSE FileAttr under inode `ino`
fn attr_to_fuse(attr: &Attr, ino: u64) -> FileAttr {
    FileAttr {
        ino,
        size: attr.size,
        blocks: attr.blocks,
        atime: attr.atime(),
        mtime: attr.mtime(),
        ctime: attr.ctime(),
        crtime: attr.ctime(),
        kind: file_type(attr.mode),
        perm: attr.permissions() as u16,
        nlink: attr.nlink.max(1),
        uid: attr.owner.uid,
        gid: attr.owner.gid,
        rdev: attr.rdev,
        blksize: if attr.blksize == 0 { 512 } else { attr.blksize },
        flags: 0,
    }
}

/// Answer an xattr query honouring the kernel's size probe
fn reply_xattr(data: &[u8], size: u32, reply: ReplyXattr) {
    if size == 0 {
        reply.size(data.len() as u32);
    } else if data.len() <= size as usize {
        reply.data(data);
    } else {
        reply.error(ERANGE);
    }
}

macro_rules! try_reply {
    ($reply:ident, $expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(errno) => {
                $reply.error(errno);
                return;
            }
        }
    };
}

impl<F: PathFs + 'static> Filesystem for PathFsFuse<F> {
    fn lookup(&mut self, req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let path = try_reply!(reply, self.child(parent, name));
        debug!("lookup: {}", path);
        let ctx = Self::context(req);
        match self.attr_for(&path, &ctx) {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(errno) => reply.error(errno),
        }
    }

    fn getattr(&mut self, req: &Request, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        let path = try_reply!(reply, self.resolve(ino));
        let ctx = Self::context(req);
        match self.fs.getattr(&path, Some(&ctx)) {
            Ok(attr) => reply.attr(&TTL, &attr_to_fuse(&attr, ino)),
            Err(err) => reply.error(to_errno(err)),
        }
    }

    fn setattr(
        &mut self,
        req: &Request,
        ino: u64,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
        atime: Option<TimeOrNow>,
        mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        let path = try_reply!(reply, self.resolve(ino));
        debug!("setattr: {}", path);
        let ctx = Self::context(req);
        if let Err(err) = self.apply_setattr(&path, &ctx, mode, uid, gid, size, atime, mtime) {
            reply.error(to_errno(err));
            return;
        }
        match self.fs.getattr(&path, Some(&ctx)) {
            Ok(attr) => reply.attr(&TTL, &attr_to_fuse(&attr, ino)),
            Err(err) => reply.error(to_errno(err)),
        }
    }

    fn readlink(&mut self, req: &Request, ino: u64, reply: ReplyData) {
        let path = try_reply!(reply, self.resolve(ino));
        let ctx = Self::context(req);
        match self.fs.readlink(&path, Some(&ctx)) {
            Ok(target) => reply.data(target.as_bytes()),
            Err(err) => reply.error(to_errno(err)),
        }
    }

    fn mknod(
        &mut self,
        req: &Request,
        parent: u64,
        name: &OsStr,
        mode: u32,
        umask: u32,
        rdev: u32,
        reply: ReplyEntry,
    ) {
        let path = try_reply!(reply, self.child(parent, name));
        debug!("mknod: {} mode={:o}", path, mode);
        let ctx = Self::context(req);
        match self.fs.mknod(&path, mode & !(umask & 0o7777), rdev, Some(&ctx)) {
            Ok(()) => self.reply_new_entry(&path, &ctx, reply),
            Err(err) => reply.error(to_errno(err)),
        }
    }

    fn mkdir(
        &mut self,
        req: &Request,
        parent: u64,
        name: &OsStr,
        mode: u32,
        umask: u32,
        reply: ReplyEntry,
    ) {
        let path = try_reply!(reply, self.child(parent, name));
        debug!("mkdir: {} mode={:o}", path, mode);
        let ctx = Self::context(req);
        match self.fs.mkdir(&path, mode & !umask & 0o7777, Some(&ctx)) {
            Ok(()) => self.reply_new_entry(&path, &ctx, reply),
            Err(err) => reply.error(to_errno(err)),
        }
    }

    fn unlink(&mut self, req: &Request, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let path = try_reply!(reply, self.child(parent, name));
        debug!("unlink: {}", path);
        let ctx = Self::context(req);
        match self.fs.unlink(&path, Some(&ctx)) {
            Ok(()) => {
                self.inodes.forget(&path);
                reply.ok();
            }
            Err(err) => reply.error(to_errno(err)),
        }
    }

    fn rmdir(&mut self, req: &Request, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let path = try_reply!(reply, self.child(parent, name));
        debug!("rmdir: {}", path);
        let ctx = Self::context(req);
        match self.fs.rmdir(&path, Some(&ctx)) {
            Ok(()) => {
                self.inodes.forget(&path);
                reply.ok();
            }
            Err(err) => reply.error(to_errno(err)),
        }
    }

    fn symlink(
        &mut self,
        req: &Request,
        parent: u64,
        link_name: &OsStr,
        target: &Path,
        reply: ReplyEntry,
    ) {
        let path = try_reply!(reply, self.child(parent, link_name));
        let target = try_reply!(reply, target.to_str().ok_or(EINVAL));
        debug!("symlink: {} -> {}", path, target);
        let ctx = Self::context(req);
        match self.fs.symlink(target, &path, Some(&ctx)) {
            Ok(()) => self.reply_new_entry(&path, &ctx, reply),
            Err(err) => reply.error(to_errno(err)),
        }
    }

    fn rename(
        &mut self,
        req: &Request,
        parent: u64,
        name: &OsStr,
        newparent: u64,
        newname: &OsStr,
        _flags: u32,
        reply: ReplyEmpty,
    ) {
        let old = try_reply!(reply, self.child(parent, name));
        let new = try_reply!(reply, self.child(newparent, newname));
        debug!("rename: {} -> {}", old, new);
        let ctx = Self::context(req);
        match self.fs.rename(&old, &new, Some(&ctx)) {
            Ok(()) => {
                self.inodes.rename(&old, &new);
                reply.ok();
            }
            Err(err) => reply.error(to_errno(err)),
        }
    }

    fn link(
        &mut self,
        req: &Request,
        ino: u64,
        newparent: u64,
        newname: &OsStr,
        reply: ReplyEntry,
    ) {
        let old = try_reply!(reply, self.resolve(ino));
        let new = try_reply!(reply, self.child(newparent, newname));
        debug!("link: {} -> {}", new, old);
        let ctx = Self::context(req);
        match self.fs.link(&old, &new, Some(&ctx)) {
            Ok(()) => self.reply_new_entry(&new, &ctx, reply),
            Err(err) => reply.error(to_errno(err)),
        }
    }

    fn open(&mut self, req: &Request, ino: u64, flags: i32, reply: ReplyOpen) {
        let path = try_reply!(reply, self.resolve(ino));
        debug!("open: {} flags={:#x}", path, flags);
        let ctx = Self::context(req);
        match self.fs.open(&path, flags as u32, Some(&ctx)) {
            Ok(file) => {
                let fh = self.store_handle(file);
                reply.opened(fh, 0);
            }
            Err(err) => reply.error(to_errno(err)),
        }
    }

    fn read(
        &mut self,
        _req: &Request,
        _ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let file = try_reply!(reply, self.handles.get(&fh).ok_or(EBADF));
        let mut buf = vec![0u8; size as usize];
        match file.read(&mut buf, offset.max(0) as u64) {
            Ok(bytes_read) => {
                buf.truncate(bytes_read);
                reply.data(&buf);
            }
            Err(err) => reply.error(to_errno(err)),
        }
    }

    fn write(
        &mut self,
        _req: &Request,
        _ino: u64,
        fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        let file = try_reply!(reply, self.handles.get(&fh).ok_or(EBADF));
        match file.write(data, offset.max(0) as u64) {
            Ok(written) => reply.written(written as u32),
            Err(err) => reply.error(to_errno(err)),
        }
    }

    fn release(
        &mut self,
        _req: &Request,
        _ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        if self.handles.remove(&fh).is_none() {
            warn!("release of unknown handle {}", fh);
        }
        reply.ok();
    }

    fn readdir(
        &mut self,
        req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let path = try_reply!(reply, self.resolve(ino));
        let ctx = Self::context(req);
        let entries = match self.fs.opendir(&path, Some(&ctx)) {
            Ok(entries) => entries,
            Err(err) => {
                reply.error(to_errno(err));
                return;
            }
        };

        let parent = self.parent_ino(&path);
        let mut listing = vec![
            (ino, FileType::Directory, ".".to_string()),
            (parent, FileType::Directory, "..".to_string()),
        ];
        for entry in entries {
            let child = self.inodes.get_or_alloc(&join_path(&path, &entry.name));
            listing.push((child, file_type(entry.mode), entry.name));
        }

        for (i, (entry_ino, kind, name)) in listing.iter().enumerate().skip(offset.max(0) as usize)
        {
            if reply.add(*entry_ino, (i + 1) as i64, *kind, name) {
                break;
            }
        }
        reply.ok();
    }

    fn statfs(&mut self, _req: &Request, ino: u64, reply: ReplyStatfs) {
        let path = try_reply!(reply, self.resolve(ino));
        match self.fs.statfs(&path) {
            Ok(Some(stats)) => reply.statfs(
                stats.blocks,
                stats.bfree,
                stats.bavail,
                stats.files,
                stats.ffree,
                stats.bsize,
                stats.name_len,
                stats.frsize,
            ),
            Ok(None) => reply.statfs(
                0,
                0,
                0,
                0,
                0,
                FALLBACK_BLOCK_SIZE,
                NAME_MAX as u32,
                FALLBACK_BLOCK_SIZE,
            ),
            Err(err) => reply.error(to_errno(err)),
        }
    }

    fn setxattr(
        &mut self,
        req: &Request,
        ino: u64,
        name: &OsStr,
        value: &[u8],
        flags: i32,
        _position: u32,
        reply: ReplyEmpty,
    ) {
        let path = try_reply!(reply, self.resolve(ino));
        let attribute = try_reply!(reply, name.to_str().ok_or(EINVAL));
        let ctx = Self::context(req);
        match self
            .fs
            .setxattr(&path, attribute, value, flags as u32, Some(&ctx))
        {
            Ok(()) => reply.ok(),
            Err(err) => reply.error(to_errno(err)),
        }
    }

    fn getxattr(&mut self, req: &Request, ino: u64, name: &OsStr, size: u32, reply: ReplyXattr) {
        let path = try_reply!(reply, self.resolve(ino));
        let attribute = try_reply!(reply, name.to_str().ok_or(EINVAL));
        let ctx = Self::context(req);
        match self.fs.getxattr(&path, attribute, Some(&ctx)) {
            Ok(value) => reply_xattr(&value, size, reply),
            Err(err) => reply.error(to_errno(err)),
        }
    }

    fn listxattr(&mut self, req: &Request, ino: u64, size: u32, reply: ReplyXattr) {
        let path = try_reply!(reply, self.resolve(ino));
        let ctx = Self::context(req);
        match self.fs.listxattr(&path, Some(&ctx)) {
            Ok(names) => {
                let mut buffer = Vec::new();
                for name in &names {
                    buffer.extend_from_slice(name.as_bytes());
                    buffer.push(0);
                }
                reply_xattr(&buffer, size, reply);
            }
            Err(err) => reply.error(to_errno(err)),
        }
    }

    fn removexattr(&mut self, req: &Request, ino: u64, name: &OsStr, reply: ReplyEmpty) {
        let path = try_reply!(reply, self.resolve(ino));
        let attribute = try_reply!(reply, name.to_str().ok_or(EINVAL));
        let ctx = Self::context(req);
        match self.fs.removexattr(&path, attribute, Some(&ctx)) {
            Ok(()) => reply.ok(),
            Err(err) => reply.error(to_errno(err)),
        }
    }

    fn access(&mut self, req: &Request, ino: u64, mask: i32, reply: ReplyEmpty) {
        let path = try_reply!(reply, self.resolve(ino));
        let ctx = Self::context(req);
        match self.fs.access(&path, mask as u32, Some(&ctx)) {
            Ok(()) => reply.ok(),
            Err(err) => reply.error(to_errno(err)),
        }
    }

    fn create(
        &mut self,
        req: &Request,
        parent: u64,
        name: &OsStr,
        mode: u32,
        umask: u32,
        flags: i32,
        reply: ReplyCreate,
    ) {
        let path = try_reply!(reply, self.child(parent, name));
        debug!("create: {} mode={:o} flags={:#x}", path, mode, flags);
        let ctx = Self::context(req);
        let file = match self
            .fs
            .create(&path, flags as u32, mode & !(umask & 0o7777), Some(&ctx))
        {
            Ok(file) => file,
            Err(err) => {
                reply.error(to_errno(err));
                return;
            }
        };
        let attr = match self.fs.getattr(&path, Some(&ctx)).or_else(|_| file.getattr()) {
            Ok(attr) => attr,
            Err(err) => {
                reply.error(to_errno(err));
                return;
            }
        };
        let ino = self.inodes.get_or_alloc(&path);
        let fh = self.store_handle(file);
        reply.created(&TTL, &attr_to_fuse(&attr, ino), 0, fh, 0);
    }
}
