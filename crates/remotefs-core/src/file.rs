// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Open file handles and whole-file snapshots
//!
//! Opening a remote file transfers its complete content once. The receiving
//! side serves every later read from that copy; writes are not forwarded.

use crate::error::{FsError, FsResult};
use crate::types::{Attr, S_IFREG};

/// An open file as returned by `PathFs::open` and `PathFs::create`
pub trait File: Send + Sync {
    fn getattr(&self) -> FsResult<Attr>;

    /// Read into `buf` starting at `offset`, returning the number of bytes read
    fn read(&self, buf: &mut [u8], offset: u64) -> FsResult<usize>;

    fn write(&self, _data: &[u8], _offset: u64) -> FsResult<usize> {
        Err(FsError::NotImplemented)
    }
}

/// Read-only file backed by an in-memory byte buffer
#[derive(Clone, Debug)]
pub struct DataFile {
    data: Vec<u8>,
    attr: Attr,
}

impl DataFile {
    pub fn new(data: Vec<u8>) -> Self {
        let attr = Attr {
            size: data.len() as u64,
            mode: S_IFREG | 0o644,
            nlink: 1,
            ..Default::default()
        };
        Self { data, attr }
    }

    /// Use `attr` for metadata; the size always reflects the buffer
    pub fn with_attr(data: Vec<u8>, attr: Attr) -> Self {
        let attr = Attr {
            size: data.len() as u64,
            ..attr
        };
        Self { data, attr }
    }
}

impl File for DataFile {
    fn getattr(&self) -> FsResult<Attr> {
        Ok(self.attr)
    }

    fn read(&self, buf: &mut [u8], offset: u64) -> FsResult<usize> {
        let start = match usize::try_from(offset) {
            Ok(start) if start < self.data.len() => start,
            _ => return Ok(0),
        };
        let end = self.data.len().min(start.saturating_add(buf.len()));
        let n = end - start;
        buf[..n].copy_from_slice(&self.data[start..end]);
        Ok(n)
    }
}

/// Capture the full content of `file`.
///
/// Looks up the declared size, then issues one read at offset zero for
/// that many bytes. A short read truncates the result.
pub fn snapshot(file: &dyn File) -> FsResult<Vec<u8>> {
    let attr = file.getattr()?;
    let size = usize::try_from(attr.size).map_err(|_| FsError::Range)?;
    let mut buf = vec![0u8; size];
    let n = file.read(&mut buf, 0)?;
    buf.truncate(n);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFile {
        attr: FsResult<Attr>,
        content: Vec<u8>,
        reads: AtomicUsize,
    }

    impl File for CountingFile {
        fn getattr(&self) -> FsResult<Attr> {
            self.attr
        }

        fn read(&self, buf: &mut [u8], offset: u64) -> FsResult<usize> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            assert_eq!(offset, 0);
            let n = buf.len().min(self.content.len());
            buf[..n].copy_from_slice(&self.content[..n]);
            Ok(n)
        }
    }

    #[test]
    fn data_file_reads_slices() {
        let file = DataFile::new(b"hello world".to_vec());
        let mut buf = [0u8; 5];
        assert_eq!(file.read(&mut buf, 6).unwrap(), 5);
        assert_eq!(&buf, b"world");
        assert_eq!(file.read(&mut buf, 9).unwrap(), 2);
        assert_eq!(&buf[..2], b"ld");
        assert_eq!(file.read(&mut buf, 11).unwrap(), 0);
        assert_eq!(file.read(&mut buf, u64::MAX).unwrap(), 0);
    }

    #[test]
    fn data_file_is_read_only() {
        let file = DataFile::new(Vec::new());
        assert_eq!(file.write(b"x", 0), Err(FsError::NotImplemented));
        let attr = file.getattr().unwrap();
        assert!(attr.is_regular());
        assert_eq!(attr.size, 0);
    }

    #[test]
    fn snapshot_reads_once_for_declared_size() {
        let file = CountingFile {
            attr: Ok(Attr {
                size: 4,
                ..Default::default()
            }),
            content: b"abcdefgh".to_vec(),
            reads: AtomicUsize::new(0),
        };
        assert_eq!(snapshot(&file).unwrap(), b"abcd");
        assert_eq!(file.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn snapshot_truncates_short_reads() {
        let file = CountingFile {
            attr: Ok(Attr {
                size: 10,
                ..Default::default()
            }),
            content: b"abc".to_vec(),
            reads: AtomicUsize::new(0),
        };
        assert_eq!(snapshot(&file).unwrap(), b"abc");
    }

    #[test]
    fn snapshot_of_empty_file_is_empty() {
        let file = DataFile::new(Vec::new());
        assert!(snapshot(&file).unwrap().is_empty());
    }

    #[test]
    fn snapshot_propagates_getattr_failure() {
        let file = CountingFile {
            attr: Err(FsError::AccessDenied),
            content: Vec::new(),
            reads: AtomicUsize::new(0),
        };
        assert_eq!(snapshot(&file), Err(FsError::AccessDenied));
        assert_eq!(file.reads.load(Ordering::SeqCst), 0);
    }
}
