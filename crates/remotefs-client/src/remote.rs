// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Client adapter: a [`PathFs`] whose calls are served by a remote backend

use crate::transport::{TcpTransport, Transport};
use remotefs_core::convert::{
    attr_from_wire, context_to_wire, entries_from_wire, statfs_from_wire, status_from_wire,
    system_time_to_nanos,
};
use remotefs_core::{
    Attr, Capabilities, Context, DataFile, DirEntry, File, FsError, FsResult, PathFs, StatFs,
};
use remotefs_proto::messages::{Request, Response, Timestamp};
use remotefs_proto::validate_response;
use std::time::SystemTime;
use tracing::{debug, warn};

/// Forwards every [`PathFs`] call as one request over `T`.
///
/// Keeps no state between calls. Transport faults and malformed responses
/// become [`FsError::Io`]; backend failures keep their own code.
pub struct RemoteFs<T: Transport = TcpTransport> {
    transport: T,
}

impl<T: Transport> RemoteFs<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn call(&self, request: Request) -> FsResult<Response> {
        let op = request.op_name();
        debug!(op, "forwarding request");
        match self.transport.call(&request) {
            Ok(Response::Error(err)) => {
                warn!(
                    op,
                    message = %String::from_utf8_lossy(&err.message),
                    "server rejected request"
                );
                status_from_wire(&err.status)?;
                Err(FsError::Io)
            }
            Ok(response) => match validate_response(&response) {
                Ok(()) => Ok(response),
                Err(e) => {
                    warn!(op, error = %e, "malformed response");
                    Err(FsError::Io)
                }
            },
            Err(e) => {
                warn!(op, error = %e, "transport failure");
                Err(FsError::Io)
            }
        }
    }

    /// Send a request whose response carries only a status
    fn call_status(&self, request: Request, expected: fn(&Response) -> bool) -> FsResult<()> {
        let op = request.op_name();
        let response = self.call(request)?;
        if !expected(&response) {
            return Err(mismatch(op, &response));
        }
        status_from_wire(&response.status())
    }
}

fn mismatch(op: &str, response: &Response) -> FsError {
    warn!(op, response = ?response, "mismatched response");
    FsError::Io
}

fn timestamp(time: Option<SystemTime>) -> Option<Timestamp> {
    time.map(|t| Timestamp::from_nanos(system_time_to_nanos(t)))
}

impl<T: Transport> PathFs for RemoteFs<T> {
    /// Every operation is forwarded; the remote side decides what it serves
    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    fn getattr(&self, name: &str, ctx: Option<&Context>) -> FsResult<Attr> {
        match self.call(Request::getattr(name, context_to_wire(ctx)))? {
            Response::GetAttr(r) => {
                status_from_wire(&r.status)?;
                r.attr.as_ref().map(attr_from_wire).ok_or(FsError::Io)
            }
            other => Err(mismatch("getattr", &other)),
        }
    }

    fn opendir(&self, name: &str, ctx: Option<&Context>) -> FsResult<Vec<DirEntry>> {
        match self.call(Request::opendir(name, context_to_wire(ctx)))? {
            Response::OpenDir(r) => {
                status_from_wire(&r.status)?;
                Ok(entries_from_wire(&r.entries))
            }
            other => Err(mismatch("opendir", &other)),
        }
    }

    fn open(&self, name: &str, flags: u32, ctx: Option<&Context>) -> FsResult<Box<dyn File>> {
        match self.call(Request::open(name, flags, context_to_wire(ctx)))? {
            Response::Open(r) => {
                status_from_wire(&r.status)?;
                let file = r.file.ok_or(FsError::Io)?;
                Ok(Box::new(DataFile::new(file.data)))
            }
            other => Err(mismatch("open", &other)),
        }
    }

    fn create(
        &self,
        name: &str,
        flags: u32,
        mode: u32,
        ctx: Option<&Context>,
    ) -> FsResult<Box<dyn File>> {
        match self.call(Request::create(name, flags, mode, context_to_wire(ctx)))? {
            Response::Create(r) => {
                status_from_wire(&r.status)?;
                let file = r.file.ok_or(FsError::Io)?;
                Ok(Box::new(DataFile::new(file.data)))
            }
            other => Err(mismatch("create", &other)),
        }
    }

    fn chmod(&self, name: &str, mode: u32, ctx: Option<&Context>) -> FsResult<()> {
        self.call_status(Request::chmod(name, mode, context_to_wire(ctx)), |r| {
            matches!(r, Response::Chmod(_))
        })
    }

    fn chown(&self, name: &str, uid: u32, gid: u32, ctx: Option<&Context>) -> FsResult<()> {
        self.call_status(Request::chown(name, uid, gid, context_to_wire(ctx)), |r| {
            matches!(r, Response::Chown(_))
        })
    }

    fn utimens(
        &self,
        name: &str,
        atime: Option<SystemTime>,
        mtime: Option<SystemTime>,
        ctx: Option<&Context>,
    ) -> FsResult<()> {
        let request = Request::utimens(
            name,
            timestamp(atime),
            timestamp(mtime),
            context_to_wire(ctx),
        );
        self.call_status(request, |r| matches!(r, Response::Utimens(_)))
    }

    fn truncate(&self, name: &str, size: u64, ctx: Option<&Context>) -> FsResult<()> {
        self.call_status(Request::truncate(name, size, context_to_wire(ctx)), |r| {
            matches!(r, Response::Truncate(_))
        })
    }

    fn access(&self, name: &str, mask: u32, ctx: Option<&Context>) -> FsResult<()> {
        self.call_status(Request::access(name, mask, context_to_wire(ctx)), |r| {
            matches!(r, Response::Access(_))
        })
    }

    fn link(&self, old_name: &str, new_name: &str, ctx: Option<&Context>) -> FsResult<()> {
        self.call_status(
            Request::link(old_name, new_name, context_to_wire(ctx)),
            |r| matches!(r, Response::Link(_)),
        )
    }

    fn mkdir(&self, name: &str, mode: u32, ctx: Option<&Context>) -> FsResult<()> {
        self.call_status(Request::mkdir(name, mode, context_to_wire(ctx)), |r| {
            matches!(r, Response::Mkdir(_))
        })
    }

    fn mknod(&self, name: &str, mode: u32, dev: u32, ctx: Option<&Context>) -> FsResult<()> {
        self.call_status(Request::mknod(name, mode, dev, context_to_wire(ctx)), |r| {
            matches!(r, Response::Mknod(_))
        })
    }

    fn rename(&self, old_name: &str, new_name: &str, ctx: Option<&Context>) -> FsResult<()> {
        self.call_status(
            Request::rename(old_name, new_name, context_to_wire(ctx)),
            |r| matches!(r, Response::Rename(_)),
        )
    }

    fn rmdir(&self, name: &str, ctx: Option<&Context>) -> FsResult<()> {
        self.call_status(Request::rmdir(name, context_to_wire(ctx)), |r| {
            matches!(r, Response::Rmdir(_))
        })
    }

    fn unlink(&self, name: &str, ctx: Option<&Context>) -> FsResult<()> {
        self.call_status(Request::unlink(name, context_to_wire(ctx)), |r| {
            matches!(r, Response::Unlink(_))
        })
    }

    fn getxattr(&self, name: &str, attribute: &str, ctx: Option<&Context>) -> FsResult<Vec<u8>> {
        match self.call(Request::getxattr(name, attribute, context_to_wire(ctx)))? {
            Response::GetXAttr(r) => {
                status_from_wire(&r.status)?;
                Ok(r.data)
            }
            other => Err(mismatch("getxattr", &other)),
        }
    }

    fn listxattr(&self, name: &str, ctx: Option<&Context>) -> FsResult<Vec<String>> {
        match self.call(Request::listxattr(name, context_to_wire(ctx)))? {
            Response::ListXAttr(r) => {
                status_from_wire(&r.status)?;
                Ok(r.attributes
                    .iter()
                    .map(|a| String::from_utf8_lossy(a).into_owned())
                    .collect())
            }
            other => Err(mismatch("listxattr", &other)),
        }
    }

    fn removexattr(&self, name: &str, attribute: &str, ctx: Option<&Context>) -> FsResult<()> {
        self.call_status(
            Request::removexattr(name, attribute, context_to_wire(ctx)),
            |r| matches!(r, Response::RemoveXAttr(_)),
        )
    }

    fn setxattr(
        &self,
        name: &str,
        attribute: &str,
        data: &[u8],
        flags: u32,
        ctx: Option<&Context>,
    ) -> FsResult<()> {
        self.call_status(
            Request::setxattr(name, attribute, data.to_vec(), flags, context_to_wire(ctx)),
            |r| matches!(r, Response::SetXAttr(_)),
        )
    }

    fn symlink(&self, value: &str, link_name: &str, ctx: Option<&Context>) -> FsResult<()> {
        self.call_status(
            Request::symlink(value, link_name, context_to_wire(ctx)),
            |r| matches!(r, Response::Symlink(_)),
        )
    }

    fn readlink(&self, name: &str, ctx: Option<&Context>) -> FsResult<String> {
        match self.call(Request::readlink(name, context_to_wire(ctx)))? {
            Response::Readlink(r) => {
                status_from_wire(&r.status)?;
                Ok(String::from_utf8_lossy(&r.target).into_owned())
            }
            other => Err(mismatch("readlink", &other)),
        }
    }

    fn statfs(&self, name: &str) -> FsResult<Option<StatFs>> {
        match self.call(Request::statfs(name))? {
            Response::StatFs(r) => {
                status_from_wire(&r.status)?;
                Ok(r.stats.as_ref().map(statfs_from_wire))
            }
            other => Err(mismatch("statfs", &other)),
        }
    }

    fn identity(&self) -> FsResult<String> {
        match self.call(Request::identity())? {
            Response::Identity(r) => {
                status_from_wire(&r.status)?;
                Ok(String::from_utf8_lossy(&r.identity).into_owned())
            }
            other => Err(mismatch("identity", &other)),
        }
    }

    fn set_debug(&self, debug: bool) -> FsResult<()> {
        self.call_status(Request::set_debug(debug), |r| {
            matches!(r, Response::SetDebug(_))
        })
    }
}
