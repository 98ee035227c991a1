// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Inode number bookkeeping for the path-based mount
//!
//! The kernel addresses nodes by inode number while the backend only knows
//! relative paths. Numbers are handed out on first sight of a path and stay
//! stable until the path is removed.

use remotefs_core::join_path;
use std::collections::HashMap;

/// Inode number of the mount root (the empty path)
pub const ROOT_INO: u64 = 1;

#[derive(Debug)]
pub struct InodeTable {
    paths: HashMap<u64, String>,
    inodes: HashMap<String, u64>,
    next_ino: u64,
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InodeTable {
    pub fn new() -> Self {
        let mut table = Self {
            paths: HashMap::new(),
            inodes: HashMap::new(),
            next_ino: ROOT_INO + 1,
        };
        table.paths.insert(ROOT_INO, String::new());
        table.inodes.insert(String::new(), ROOT_INO);
        table
    }

    pub fn path(&self, ino: u64) -> Option<&str> {
        self.paths.get(&ino).map(String::as_str)
    }

    /// Path of `name` inside the directory known as `parent`
    pub fn child_path(&self, parent: u64, name: &str) -> Option<String> {
        self.path(parent).map(|dir| join_path(dir, name))
    }

    pub fn get_or_alloc(&mut self, path: &str) -> u64 {
        if let Some(&ino) = self.inodes.get(path) {
            return ino;
        }
        let ino = self.next_ino;
        self.next_ino += 1;
        self.paths.insert(ino, path.to_string());
        self.inodes.insert(path.to_string(), ino);
        ino
    }

    /// Drop `path` and everything below it
    pub fn forget(&mut self, path: &str) {
        if path.is_empty() {
            return;
        }
        let doomed: Vec<String> = self
            .inodes
            .keys()
            .filter(|p| is_within(p, path))
            .cloned()
            .collect();
        for p in doomed {
            if let Some(ino) = self.inodes.remove(&p) {
                self.paths.remove(&ino);
            }
        }
    }

    /// Move `old` and its descendants to `new`, keeping their numbers.
    /// Whatever was known at `new` before is forgotten.
    pub fn rename(&mut self, old: &str, new: &str) {
        if old == new || old.is_empty() {
            return;
        }
        self.forget(new);
        let moved: Vec<(String, u64)> = self
            .inodes
            .iter()
            .filter(|(p, _)| is_within(p, old))
            .map(|(p, ino)| (p.clone(), *ino))
            .collect();
        for (path, ino) in moved {
            self.inodes.remove(&path);
            let renamed = format!("{new}{}", &path[old.len()..]);
            self.paths.insert(ino, renamed.clone());
            self.inodes.insert(renamed, ino);
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn is_within(path: &str, root: &str) -> bool {
    path == root
        || (path.len() > root.len() && path.starts_with(root) && path.as_bytes()[root.len()] == b'/')
}
