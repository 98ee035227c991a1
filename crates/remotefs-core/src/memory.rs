// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! In-memory [`PathFs`] backend
//!
//! Serves directories, regular files, symlinks and special nodes from a
//! single locked tree. Hard links are not supported.

use crate::error::{FsError, FsResult};
use crate::file::{DataFile, File};
use crate::filesystem::{Capabilities, Op, PathFs, join_path, split_path};
use crate::types::{
    Attr, Context, DirEntry, Owner, S_IFDIR, S_IFLNK, S_IFMT, S_IFREG, STATFS_SPARE_SLOTS, StatFs,
};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;
use tracing::debug;

/// Fail if the attribute already exists
pub const XATTR_CREATE: u32 = 1;
/// Fail if the attribute does not exist
pub const XATTR_REPLACE: u32 = 2;

const NAME_MAX: usize = 255;
const BLOCK_SIZE: u32 = 4096;
const ROOT_INO: u64 = 1;

/// Largest size a file may be truncated to; content lives in memory
pub const MAX_FILE_SIZE: u64 = 256 * 1024 * 1024;

#[derive(Clone, Debug)]
enum Content {
    Dir,
    File(Vec<u8>),
    Symlink(String),
    Special,
}

#[derive(Clone, Debug)]
struct Node {
    attr: Attr,
    content: Content,
    xattrs: BTreeMap<String, Vec<u8>>,
}

impl Node {
    fn is_dir(&self) -> bool {
        matches!(self.content, Content::Dir)
    }
}

struct Tree {
    nodes: BTreeMap<String, Node>,
    next_ino: u64,
}

impl Tree {
    fn get(&self, path: &str) -> FsResult<&Node> {
        self.nodes.get(path).ok_or(FsError::NotFound)
    }

    fn get_mut(&mut self, path: &str) -> FsResult<&mut Node> {
        self.nodes.get_mut(path).ok_or(FsError::NotFound)
    }

    fn children<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = (&'a str, &'a Node)> + 'a {
        self.nodes.iter().filter_map(move |(path, node)| {
            let (parent, name) = split_path(path)?;
            (parent == dir).then_some((name, node))
        })
    }

    fn has_children(&self, dir: &str) -> bool {
        self.children(dir).next().is_some()
    }

    /// Check that `path` may be created: parent is a directory, name is valid and free
    fn check_new(&self, path: &str) -> FsResult<()> {
        let (parent, name) = split_path(path).ok_or(FsError::AlreadyExists)?;
        if name.is_empty() || name == "." || name == ".." {
            return Err(FsError::InvalidArgument);
        }
        if name.len() > NAME_MAX {
            return Err(FsError::NameTooLong);
        }
        if !self.get(parent)?.is_dir() {
            return Err(FsError::NotADirectory);
        }
        if self.nodes.contains_key(path) {
            return Err(FsError::AlreadyExists);
        }
        Ok(())
    }

    fn insert(&mut self, path: &str, mut attr: Attr, content: Content) {
        attr.ino = self.next_ino;
        self.next_ino += 1;
        self.attach(
            path,
            Node {
                attr,
                content,
                xattrs: BTreeMap::new(),
            },
        );
    }

    fn attach(&mut self, path: &str, node: Node) {
        if let Some((parent, _)) = split_path(path) {
            if let Some(p) = self.nodes.get_mut(parent) {
                touch_modified(&mut p.attr);
                if node.is_dir() {
                    p.attr.nlink += 1;
                }
            }
        }
        self.nodes.insert(path.to_string(), node);
    }

    fn remove(&mut self, path: &str) -> Option<Node> {
        let node = self.nodes.remove(path)?;
        if let Some((parent, _)) = split_path(path) {
            if let Some(p) = self.nodes.get_mut(parent) {
                touch_modified(&mut p.attr);
                if node.is_dir() {
                    p.attr.nlink = p.attr.nlink.saturating_sub(1);
                }
            }
        }
        Some(node)
    }
}

fn touch_modified(attr: &mut Attr) {
    let now = SystemTime::now();
    attr.set_mtime(now);
    attr.set_ctime(now);
}

fn touch_changed(attr: &mut Attr) {
    attr.set_ctime(SystemTime::now());
}

fn set_size(attr: &mut Attr, size: u64) {
    attr.size = size;
    attr.blocks = size.div_ceil(512);
}

/// Tree-backed filesystem held entirely in memory
pub struct MemoryFs {
    tree: Mutex<Tree>,
    capabilities: Capabilities,
    identity: String,
    default_owner: Owner,
    debug: AtomicBool,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    /// Empty filesystem owned by the current process user
    pub fn new() -> Self {
        // SAFETY: getuid/getgid have no preconditions and cannot fail
        let owner = unsafe {
            Owner {
                uid: libc::getuid(),
                gid: libc::getgid(),
            }
        };
        Self::with_owner(owner)
    }

    pub fn with_owner(owner: Owner) -> Self {
        let mut root = Attr {
            ino: ROOT_INO,
            mode: S_IFDIR | 0o755,
            nlink: 2,
            owner,
            blksize: BLOCK_SIZE,
            ..Default::default()
        };
        let now = SystemTime::now();
        root.set_atime(now);
        root.set_mtime(now);
        root.set_ctime(now);

        let mut nodes = BTreeMap::new();
        nodes.insert(
            String::new(),
            Node {
                attr: root,
                content: Content::Dir,
                xattrs: BTreeMap::new(),
            },
        );

        Self {
            tree: Mutex::new(Tree {
                nodes,
                next_ino: ROOT_INO + 1,
            }),
            capabilities: Capabilities::all().without(Op::Link),
            identity: "memoryfs".to_string(),
            default_owner: owner,
            debug: AtomicBool::new(false),
        }
    }

    /// Restrict the declared operation set
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn new_attr(&self, mode: u32, ctx: Option<&Context>) -> Attr {
        let mut attr = Attr {
            mode,
            nlink: 1,
            owner: ctx.and_then(|c| c.owner).unwrap_or(self.default_owner),
            blksize: BLOCK_SIZE,
            ..Default::default()
        };
        let now = SystemTime::now();
        attr.set_atime(now);
        attr.set_mtime(now);
        attr.set_ctime(now);
        attr
    }

    /// Create or replace a regular file with `data`. The parent must exist.
    pub fn write_file(&self, path: &str, data: &[u8]) -> FsResult<()> {
        let mut tree = self.lock();
        match tree.nodes.get_mut(path) {
            Some(node) => match &mut node.content {
                Content::File(existing) => {
                    *existing = data.to_vec();
                    set_size(&mut node.attr, data.len() as u64);
                    touch_modified(&mut node.attr);
                    Ok(())
                }
                Content::Dir => Err(FsError::IsADirectory),
                _ => Err(FsError::InvalidArgument),
            },
            None => {
                tree.check_new(path)?;
                let mut attr = self.new_attr(S_IFREG | 0o644, None);
                set_size(&mut attr, data.len() as u64);
                tree.insert(path, attr, Content::File(data.to_vec()));
                Ok(())
            }
        }
    }

    /// Copy a local directory tree into the filesystem root
    pub fn import_dir(&self, dir: &Path) -> io::Result<()> {
        self.import_into(dir, "")
    }

    fn import_into(&self, dir: &Path, prefix: &str) -> io::Result<()> {
        let mut entries = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = join_path(prefix, &name);
            let file_type = entry.file_type()?;
            let mode = entry.metadata()?.permissions();
            let perm = permissions_of(&mode);

            if file_type.is_dir() {
                self.mkdir(&path, perm, None).map_err(fs_to_io)?;
                self.import_into(&entry.path(), &path)?;
            } else if file_type.is_symlink() {
                let target = fs::read_link(entry.path())?;
                self.symlink(&target.to_string_lossy(), &path, None)
                    .map_err(fs_to_io)?;
            } else if file_type.is_file() {
                let data = fs::read(entry.path())?;
                self.write_file(&path, &data).map_err(fs_to_io)?;
                self.chmod(&path, perm, None).map_err(fs_to_io)?;
            } else {
                debug!(path = %path, "skipping special file during import");
            }
        }
        Ok(())
    }

    fn check_access(attr: &Attr, mask: u32, ctx: Option<&Context>) -> FsResult<()> {
        let Some(owner) = ctx.and_then(|c| c.owner) else {
            return Ok(());
        };
        if owner.uid == 0 {
            return Ok(());
        }
        let perm = attr.permissions();
        let granted = if owner.uid == attr.owner.uid {
            (perm >> 6) & 0o7
        } else if owner.gid == attr.owner.gid {
            (perm >> 3) & 0o7
        } else {
            perm & 0o7
        };
        if mask & 0o7 & !granted != 0 {
            return Err(FsError::AccessDenied);
        }
        Ok(())
    }
}

#[cfg(unix)]
fn permissions_of(perm: &fs::Permissions) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    perm.mode() & 0o7777
}

#[cfg(not(unix))]
fn permissions_of(perm: &fs::Permissions) -> u32 {
    if perm.readonly() { 0o444 } else { 0o644 }
}

fn fs_to_io(err: FsError) -> io::Error {
    io::Error::other(err)
}

impl PathFs for MemoryFs {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn getattr(&self, name: &str, _ctx: Option<&Context>) -> FsResult<Attr> {
        Ok(self.lock().get(name)?.attr)
    }

    fn opendir(&self, name: &str, _ctx: Option<&Context>) -> FsResult<Vec<DirEntry>> {
        let tree = self.lock();
        if !tree.get(name)?.is_dir() {
            return Err(FsError::NotADirectory);
        }
        Ok(tree
            .children(name)
            .map(|(child, node)| DirEntry::new(child, node.attr.mode))
            .collect())
    }

    fn open(&self, name: &str, flags: u32, _ctx: Option<&Context>) -> FsResult<Box<dyn File>> {
        let mut tree = self.lock();
        let node = tree.get_mut(name)?;
        let is_dir = node.is_dir();
        let Content::File(data) = &mut node.content else {
            return Err(if is_dir {
                FsError::IsADirectory
            } else {
                FsError::InvalidArgument
            });
        };
        if flags & libc::O_TRUNC as u32 != 0 && flags & libc::O_ACCMODE as u32 != 0 {
            data.clear();
            set_size(&mut node.attr, 0);
            touch_modified(&mut node.attr);
        }
        Ok(Box::new(DataFile::with_attr(data.clone(), node.attr)))
    }

    fn create(
        &self,
        name: &str,
        flags: u32,
        mode: u32,
        ctx: Option<&Context>,
    ) -> FsResult<Box<dyn File>> {
        {
            let mut tree = self.lock();
            if tree.nodes.contains_key(name) {
                if flags & libc::O_EXCL as u32 != 0 {
                    return Err(FsError::AlreadyExists);
                }
            } else {
                tree.check_new(name)?;
                let attr = self.new_attr(S_IFREG | (mode & 0o7777), ctx);
                tree.insert(name, attr, Content::File(Vec::new()));
            }
        }
        self.open(name, flags, ctx)
    }

    fn chmod(&self, name: &str, mode: u32, _ctx: Option<&Context>) -> FsResult<()> {
        let mut tree = self.lock();
        let node = tree.get_mut(name)?;
        node.attr.mode = (node.attr.mode & S_IFMT) | (mode & 0o7777);
        touch_changed(&mut node.attr);
        Ok(())
    }

    fn chown(&self, name: &str, uid: u32, gid: u32, _ctx: Option<&Context>) -> FsResult<()> {
        let mut tree = self.lock();
        let node = tree.get_mut(name)?;
        node.attr.owner = Owner { uid, gid };
        touch_changed(&mut node.attr);
        Ok(())
    }

    fn utimens(
        &self,
        name: &str,
        atime: Option<SystemTime>,
        mtime: Option<SystemTime>,
        _ctx: Option<&Context>,
    ) -> FsResult<()> {
        let mut tree = self.lock();
        let node = tree.get_mut(name)?;
        if let Some(atime) = atime {
            node.attr.set_atime(atime);
        }
        if let Some(mtime) = mtime {
            node.attr.set_mtime(mtime);
        }
        touch_changed(&mut node.attr);
        Ok(())
    }

    fn truncate(&self, name: &str, size: u64, _ctx: Option<&Context>) -> FsResult<()> {
        let mut tree = self.lock();
        let node = tree.get_mut(name)?;
        match &mut node.content {
            Content::File(data) => {
                if size > MAX_FILE_SIZE {
                    return Err(FsError::NoSpace);
                }
                let len = usize::try_from(size).map_err(|_| FsError::NoSpace)?;
                data.resize(len, 0);
                set_size(&mut node.attr, size);
                touch_modified(&mut node.attr);
                Ok(())
            }
            Content::Dir => Err(FsError::IsADirectory),
            _ => Err(FsError::InvalidArgument),
        }
    }

    fn access(&self, name: &str, mask: u32, ctx: Option<&Context>) -> FsResult<()> {
        let tree = self.lock();
        let node = tree.get(name)?;
        Self::check_access(&node.attr, mask, ctx)
    }

    fn mkdir(&self, name: &str, mode: u32, ctx: Option<&Context>) -> FsResult<()> {
        let mut tree = self.lock();
        tree.check_new(name)?;
        let mut attr = self.new_attr(S_IFDIR | (mode & 0o7777), ctx);
        attr.nlink = 2;
        tree.insert(name, attr, Content::Dir);
        Ok(())
    }

    fn mknod(&self, name: &str, mode: u32, dev: u32, ctx: Option<&Context>) -> FsResult<()> {
        let mut tree = self.lock();
        tree.check_new(name)?;
        let file_type = match mode & S_IFMT {
            0 => S_IFREG,
            S_IFDIR | S_IFLNK => return Err(FsError::InvalidArgument),
            other => other,
        };
        let mut attr = self.new_attr(file_type | (mode & 0o7777), ctx);
        let content = if file_type == S_IFREG {
            Content::File(Vec::new())
        } else {
            attr.rdev = dev;
            Content::Special
        };
        tree.insert(name, attr, content);
        Ok(())
    }

    fn rename(&self, old_name: &str, new_name: &str, _ctx: Option<&Context>) -> FsResult<()> {
        if old_name.is_empty() || new_name.is_empty() {
            return Err(FsError::Busy);
        }
        if old_name == new_name {
            return Ok(());
        }
        let old_prefix = format!("{}/", old_name);
        if new_name.starts_with(&old_prefix) {
            return Err(FsError::InvalidArgument);
        }

        let mut tree = self.lock();
        let moving_dir = tree.get(old_name)?.is_dir();
        if let Some(target) = tree.nodes.get(new_name) {
            match (moving_dir, target.is_dir()) {
                (true, false) => return Err(FsError::NotADirectory),
                (false, true) => return Err(FsError::IsADirectory),
                (true, true) if tree.has_children(new_name) => return Err(FsError::NotEmpty),
                _ => {}
            }
            tree.remove(new_name);
        } else {
            tree.check_new(new_name)?;
        }

        let descendants: Vec<String> = tree
            .nodes
            .keys()
            .filter(|k| k.starts_with(&old_prefix))
            .cloned()
            .collect();

        if let Some(mut node) = tree.remove(old_name) {
            touch_changed(&mut node.attr);
            tree.attach(new_name, node);
        }
        for old_path in descendants {
            if let Some(node) = tree.nodes.remove(&old_path) {
                let new_path = format!("{}{}", new_name, &old_path[old_name.len()..]);
                tree.nodes.insert(new_path, node);
            }
        }
        Ok(())
    }

    fn rmdir(&self, name: &str, _ctx: Option<&Context>) -> FsResult<()> {
        if name.is_empty() {
            return Err(FsError::Busy);
        }
        let mut tree = self.lock();
        if !tree.get(name)?.is_dir() {
            return Err(FsError::NotADirectory);
        }
        if tree.has_children(name) {
            return Err(FsError::NotEmpty);
        }
        tree.remove(name);
        Ok(())
    }

    fn unlink(&self, name: &str, _ctx: Option<&Context>) -> FsResult<()> {
        let mut tree = self.lock();
        if tree.get(name)?.is_dir() {
            return Err(FsError::IsADirectory);
        }
        tree.remove(name);
        Ok(())
    }

    fn getxattr(&self, name: &str, attribute: &str, _ctx: Option<&Context>) -> FsResult<Vec<u8>> {
        let tree = self.lock();
        tree.get(name)?
            .xattrs
            .get(attribute)
            .cloned()
            .ok_or(FsError::NoData)
    }

    fn listxattr(&self, name: &str, _ctx: Option<&Context>) -> FsResult<Vec<String>> {
        let tree = self.lock();
        Ok(tree.get(name)?.xattrs.keys().cloned().collect())
    }

    fn removexattr(&self, name: &str, attribute: &str, _ctx: Option<&Context>) -> FsResult<()> {
        let mut tree = self.lock();
        let node = tree.get_mut(name)?;
        node.xattrs.remove(attribute).ok_or(FsError::NoData)?;
        touch_changed(&mut node.attr);
        Ok(())
    }

    fn setxattr(
        &self,
        name: &str,
        attribute: &str,
        data: &[u8],
        flags: u32,
        _ctx: Option<&Context>,
    ) -> FsResult<()> {
        if attribute.is_empty() {
            return Err(FsError::InvalidArgument);
        }
        if attribute.len() > NAME_MAX {
            return Err(FsError::Range);
        }
        let mut tree = self.lock();
        let node = tree.get_mut(name)?;
        let exists = node.xattrs.contains_key(attribute);
        if flags & XATTR_CREATE != 0 && exists {
            return Err(FsError::AlreadyExists);
        }
        if flags & XATTR_REPLACE != 0 && !exists {
            return Err(FsError::NoData);
        }
        node.xattrs.insert(attribute.to_string(), data.to_vec());
        touch_changed(&mut node.attr);
        Ok(())
    }

    fn symlink(&self, value: &str, link_name: &str, ctx: Option<&Context>) -> FsResult<()> {
        let mut tree = self.lock();
        tree.check_new(link_name)?;
        let mut attr = self.new_attr(S_IFLNK | 0o777, ctx);
        set_size(&mut attr, value.len() as u64);
        tree.insert(link_name, attr, Content::Symlink(value.to_string()));
        Ok(())
    }

    fn readlink(&self, name: &str, _ctx: Option<&Context>) -> FsResult<String> {
        let tree = self.lock();
        match &tree.get(name)?.content {
            Content::Symlink(target) => Ok(target.clone()),
            _ => Err(FsError::InvalidArgument),
        }
    }

    fn statfs(&self, _name: &str) -> FsResult<Option<StatFs>> {
        let tree = self.lock();
        let used_bytes: u64 = tree.nodes.values().map(|n| n.attr.size).sum();
        let used_blocks = used_bytes.div_ceil(BLOCK_SIZE as u64);
        let total_blocks = used_blocks.max(1) * 4;
        let free_blocks = total_blocks - used_blocks;
        let files = tree.nodes.len() as u64;
        Ok(Some(StatFs {
            blocks: total_blocks,
            bfree: free_blocks,
            bavail: free_blocks,
            files,
            ffree: u32::MAX as u64 - files,
            bsize: BLOCK_SIZE,
            name_len: NAME_MAX as u32,
            frsize: BLOCK_SIZE,
            padding: 0,
            spare: [0; STATFS_SPARE_SLOTS],
        }))
    }

    fn identity(&self) -> FsResult<String> {
        Ok(self.identity.clone())
    }

    fn set_debug(&self, debug: bool) -> FsResult<()> {
        let flag = debug;
        debug!(debug = flag, "memoryfs debug flag changed");
        self.debug.store(debug, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::snapshot;
    use crate::types::{S_IFCHR, S_IFIFO};

    const ALICE: Owner = Owner {
        uid: 1000,
        gid: 1000,
    };

    fn fs() -> MemoryFs {
        MemoryFs::with_owner(ALICE)
    }

    fn read_all(fs: &MemoryFs, path: &str) -> Vec<u8> {
        let file = fs.open(path, 0, None).unwrap();
        snapshot(file.as_ref()).unwrap()
    }

    fn names(fs: &MemoryFs, dir: &str) -> Vec<String> {
        fs.opendir(dir, None)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect()
    }

    #[test]
    fn root_is_a_directory() {
        let fs = fs();
        let attr = fs.getattr("", None).unwrap();
        assert!(attr.is_dir());
        assert_eq!(attr.ino, ROOT_INO);
        assert!(fs.opendir("", None).unwrap().is_empty());
    }

    #[test]
    fn write_and_read_file() {
        let fs = fs();
        fs.write_file("file.txt", b"file.txt").unwrap();
        let attr = fs.getattr("file.txt", None).unwrap();
        assert_eq!(attr.mode, S_IFREG | 0o644);
        assert_eq!(attr.size, 8);
        assert_eq!(read_all(&fs, "file.txt"), b"file.txt");
        assert_eq!(fs.getattr("missing", None), Err(FsError::NotFound));
    }

    #[test]
    fn directories_nest_and_list_children_only() {
        let fs = fs();
        fs.mkdir("a", 0o755, None).unwrap();
        fs.mkdir("a/b", 0o700, None).unwrap();
        fs.write_file("a/b/c.txt", b"c").unwrap();
        fs.write_file("a/x.txt", b"x").unwrap();

        assert_eq!(names(&fs, ""), vec!["a"]);
        assert_eq!(names(&fs, "a"), vec!["b", "x.txt"]);
        assert_eq!(names(&fs, "a/b"), vec!["c.txt"]);
        assert_eq!(fs.getattr("a", None).unwrap().nlink, 3);
        assert_eq!(fs.opendir("a/x.txt", None), Err(FsError::NotADirectory));
        assert_eq!(fs.mkdir("a", 0o755, None), Err(FsError::AlreadyExists));
        assert_eq!(fs.mkdir("nope/d", 0o755, None), Err(FsError::NotFound));
        assert_eq!(fs.mkdir("a/x.txt/d", 0o755, None), Err(FsError::NotADirectory));
    }

    #[test]
    fn create_respects_exclusive_flag() {
        let fs = fs();
        let ctx = Context {
            pid: 1,
            owner: Some(Owner { uid: 7, gid: 8 }),
        };
        let file = fs.create("new.txt", 0, 0o600, Some(&ctx)).unwrap();
        assert_eq!(file.getattr().unwrap().size, 0);

        let attr = fs.getattr("new.txt", None).unwrap();
        assert_eq!(attr.mode, S_IFREG | 0o600);
        assert_eq!(attr.owner, Owner { uid: 7, gid: 8 });

        assert!(matches!(
            fs.create("new.txt", libc::O_EXCL as u32, 0o600, None),
            Err(FsError::AlreadyExists)
        ));
        assert!(fs.create("new.txt", 0, 0o600, None).is_ok());
    }

    #[test]
    fn open_with_truncate_clears_content() {
        let fs = fs();
        fs.write_file("f", b"data").unwrap();
        let flags = (libc::O_WRONLY | libc::O_TRUNC) as u32;
        fs.open("f", flags, None).unwrap();
        assert_eq!(fs.getattr("f", None).unwrap().size, 0);
    }

    #[test]
    fn open_rejects_directories() {
        let fs = fs();
        fs.mkdir("d", 0o755, None).unwrap();
        assert!(matches!(fs.open("d", 0, None), Err(FsError::IsADirectory)));
    }

    #[test]
    fn snapshot_is_independent_of_later_writes() {
        let fs = fs();
        fs.write_file("f", b"first").unwrap();
        let before = fs.open("f", 0, None).unwrap();
        fs.write_file("f", b"second").unwrap();
        assert_eq!(snapshot(before.as_ref()).unwrap(), b"first");
        assert_eq!(read_all(&fs, "f"), b"second");
    }

    #[test]
    fn chmod_keeps_file_type() {
        let fs = fs();
        fs.write_file("f", b"").unwrap();
        fs.chmod("f", 0o100600 | 0o4000, None).unwrap();
        assert_eq!(fs.getattr("f", None).unwrap().mode, S_IFREG | 0o4600);
    }

    #[test]
    fn chown_and_utimens_update_attributes() {
        let fs = fs();
        fs.write_file("f", b"").unwrap();
        fs.chown("f", 5, 6, None).unwrap();
        let t = SystemTime::UNIX_EPOCH + std::time::Duration::new(1000, 42);
        fs.utimens("f", None, Some(t), None).unwrap();
        let attr = fs.getattr("f", None).unwrap();
        assert_eq!(attr.owner, Owner { uid: 5, gid: 6 });
        assert_eq!(attr.mtime, 1000);
        assert_eq!(attr.mtimensec, 42);
        assert_ne!(attr.atime, 1000);
    }

    #[test]
    fn truncate_grows_and_shrinks() {
        let fs = fs();
        fs.write_file("f", b"hello").unwrap();
        fs.truncate("f", 2, None).unwrap();
        assert_eq!(read_all(&fs, "f"), b"he");
        fs.truncate("f", 4, None).unwrap();
        assert_eq!(read_all(&fs, "f"), b"he\0\0");
        assert_eq!(fs.truncate("", 0, None), Err(FsError::IsADirectory));
    }

    #[test]
    fn truncate_beyond_capacity_is_refused() {
        let fs = fs();
        fs.write_file("f", b"hello").unwrap();
        assert_eq!(fs.truncate("f", 1 << 46, None), Err(FsError::NoSpace));
        assert_eq!(fs.truncate("f", MAX_FILE_SIZE + 1, None), Err(FsError::NoSpace));
        assert_eq!(read_all(&fs, "f"), b"hello");
        assert_eq!(fs.getattr("f", None).unwrap().size, 5);
    }

    #[test]
    fn access_checks_permission_bits() {
        let fs = fs();
        fs.write_file("f", b"").unwrap();
        fs.chmod("f", 0o640, None).unwrap();

        let owner = Context {
            pid: 1,
            owner: Some(ALICE),
        };
        let group = Context {
            pid: 1,
            owner: Some(Owner {
                uid: 2000,
                gid: ALICE.gid,
            }),
        };
        let other = Context {
            pid: 1,
            owner: Some(Owner {
                uid: 3000,
                gid: 3000,
            }),
        };
        let root = Context {
            pid: 1,
            owner: Some(Owner { uid: 0, gid: 0 }),
        };
        let unknown = Context {
            pid: 1,
            owner: None,
        };

        assert_eq!(fs.access("f", 6, Some(&owner)), Ok(()));
        assert_eq!(fs.access("f", 4, Some(&group)), Ok(()));
        assert_eq!(fs.access("f", 2, Some(&group)), Err(FsError::AccessDenied));
        assert_eq!(fs.access("f", 4, Some(&other)), Err(FsError::AccessDenied));
        assert_eq!(fs.access("f", 0, Some(&other)), Ok(()));
        assert_eq!(fs.access("f", 6, Some(&root)), Ok(()));
        assert_eq!(fs.access("f", 6, Some(&unknown)), Ok(()));
        assert_eq!(fs.access("f", 6, None), Ok(()));
        assert_eq!(fs.access("missing", 0, None), Err(FsError::NotFound));
    }

    #[test]
    fn mknod_creates_special_nodes() {
        let fs = fs();
        fs.mknod("fifo", S_IFIFO | 0o644, 0, None).unwrap();
        fs.mknod("tty", S_IFCHR | 0o620, 0x0501, None).unwrap();
        fs.mknod("plain", 0o644, 0, None).unwrap();

        assert_eq!(fs.getattr("fifo", None).unwrap().file_type(), S_IFIFO);
        assert_eq!(fs.getattr("tty", None).unwrap().rdev, 0x0501);
        assert!(fs.getattr("plain", None).unwrap().is_regular());
        assert_eq!(
            fs.mknod("d", S_IFDIR | 0o755, 0, None),
            Err(FsError::InvalidArgument)
        );
    }

    #[test]
    fn rename_moves_subtrees() {
        let fs = fs();
        fs.mkdir("src", 0o755, None).unwrap();
        fs.mkdir("src/inner", 0o755, None).unwrap();
        fs.write_file("src/inner/f", b"payload").unwrap();
        let ino = fs.getattr("src", None).unwrap().ino;

        fs.rename("src", "dst", None).unwrap();

        assert_eq!(fs.getattr("src", None), Err(FsError::NotFound));
        assert_eq!(fs.getattr("dst", None).unwrap().ino, ino);
        assert_eq!(read_all(&fs, "dst/inner/f"), b"payload");
        assert_eq!(names(&fs, ""), vec!["dst"]);
    }

    #[test]
    fn rename_replaces_files_and_rejects_bad_targets() {
        let fs = fs();
        fs.write_file("a", b"a").unwrap();
        fs.write_file("b", b"b").unwrap();
        fs.mkdir("d", 0o755, None).unwrap();
        fs.mkdir("full", 0o755, None).unwrap();
        fs.write_file("full/x", b"").unwrap();

        fs.rename("a", "b", None).unwrap();
        assert_eq!(read_all(&fs, "b"), b"a");
        assert_eq!(fs.rename("b", "d", None), Err(FsError::IsADirectory));
        assert_eq!(fs.rename("d", "b", None), Err(FsError::NotADirectory));
        assert_eq!(fs.rename("d", "full", None), Err(FsError::NotEmpty));
        assert_eq!(fs.rename("d", "d/sub", None), Err(FsError::InvalidArgument));
        assert_eq!(fs.rename("", "x", None), Err(FsError::Busy));
    }

    #[test]
    fn rmdir_and_unlink() {
        let fs = fs();
        fs.mkdir("d", 0o755, None).unwrap();
        fs.write_file("d/f", b"").unwrap();

        assert_eq!(fs.rmdir("d", None), Err(FsError::NotEmpty));
        assert_eq!(fs.unlink("d", None), Err(FsError::IsADirectory));
        assert_eq!(fs.rmdir("d/f", None), Err(FsError::NotADirectory));
        fs.unlink("d/f", None).unwrap();
        fs.rmdir("d", None).unwrap();
        assert_eq!(fs.rmdir("", None), Err(FsError::Busy));
        assert_eq!(fs.getattr("", None).unwrap().nlink, 2);
    }

    #[test]
    fn xattr_lifecycle() {
        let fs = fs();
        fs.write_file("f", b"").unwrap();

        assert_eq!(fs.getxattr("f", "user.a", None), Err(FsError::NoData));
        fs.setxattr("f", "user.a", b"1", 0, None).unwrap();
        fs.setxattr("f", "user.b", b"2", XATTR_CREATE, None).unwrap();
        assert_eq!(
            fs.setxattr("f", "user.a", b"x", XATTR_CREATE, None),
            Err(FsError::AlreadyExists)
        );
        assert_eq!(
            fs.setxattr("f", "user.c", b"x", XATTR_REPLACE, None),
            Err(FsError::NoData)
        );
        fs.setxattr("f", "user.a", b"3", XATTR_REPLACE, None).unwrap();

        assert_eq!(fs.getxattr("f", "user.a", None).unwrap(), b"3");
        assert_eq!(fs.listxattr("f", None).unwrap(), vec!["user.a", "user.b"]);
        fs.removexattr("f", "user.a", None).unwrap();
        assert_eq!(fs.removexattr("f", "user.a", None), Err(FsError::NoData));
        assert_eq!(fs.listxattr("f", None).unwrap(), vec!["user.b"]);
    }

    #[test]
    fn symlinks_store_targets() {
        let fs = fs();
        fs.symlink("../target", "link", None).unwrap();
        let attr = fs.getattr("link", None).unwrap();
        assert!(attr.is_symlink());
        assert_eq!(attr.size, 9);
        assert_eq!(fs.readlink("link", None).unwrap(), "../target");
        assert_eq!(fs.readlink("", None), Err(FsError::InvalidArgument));
    }

    #[test]
    fn long_names_are_rejected() {
        let fs = fs();
        let name = "n".repeat(NAME_MAX + 1);
        assert_eq!(fs.mkdir(&name, 0o755, None), Err(FsError::NameTooLong));
    }

    #[test]
    fn statfs_identity_and_debug() {
        let fs = fs().with_identity("test-backend");
        fs.write_file("f", &[0u8; 5000]).unwrap();
        let stats = fs.statfs("").unwrap().unwrap();
        assert_eq!(stats.bsize, BLOCK_SIZE);
        assert_eq!(stats.files, 2);
        assert!(stats.bfree < stats.blocks);

        assert_eq!(fs.identity().unwrap(), "test-backend");
        assert!(!fs.debug_enabled());
        fs.set_debug(true).unwrap();
        assert!(fs.debug_enabled());
    }

    #[test]
    fn capabilities_exclude_hard_links_by_default() {
        let fs = fs();
        assert!(!fs.capabilities().supports(Op::Link));
        assert!(fs.capabilities().supports(Op::Create));
        let narrowed = MemoryFs::new().with_capabilities(Capabilities::none().with(Op::GetAttr));
        assert!(!narrowed.capabilities().supports(Op::Create));
    }

    #[cfg(unix)]
    #[test]
    fn import_dir_copies_local_tree() {
        use std::os::unix::fs::{PermissionsExt, symlink};

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("file.txt"), b"file.txt").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("inner"), b"inner").unwrap();
        fs::set_permissions(
            dir.path().join("sub").join("inner"),
            fs::Permissions::from_mode(0o600),
        )
        .unwrap();
        symlink("file.txt", dir.path().join("link")).unwrap();

        let memfs = fs();
        memfs.import_dir(dir.path()).unwrap();

        assert_eq!(names(&memfs, ""), vec!["file.txt", "link", "sub"]);
        assert_eq!(read_all(&memfs, "file.txt"), b"file.txt");
        assert_eq!(read_all(&memfs, "sub/inner"), b"inner");
        assert_eq!(
            memfs.getattr("sub/inner", None).unwrap().mode,
            S_IFREG | 0o600
        );
        assert_eq!(memfs.readlink("link", None).unwrap(), "file.txt");
    }
}
