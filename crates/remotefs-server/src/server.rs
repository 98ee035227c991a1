// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Server adapter: answers wire requests from a [`PathFs`] backend

use remotefs_core::convert::{
    attr_to_wire, context_from_wire, entries_to_wire, error_to_wire, nanos_to_system_time,
    statfs_to_wire,
};
use remotefs_core::{File as BackendFile, FsError, FsResult, Op, PathFs, snapshot};
use remotefs_proto::messages::*;
use remotefs_proto::{MAX_SNAPSHOT_LEN, validate_request};
use std::sync::Arc;
use tracing::{debug, warn};

/// Operation addressed by a request
pub fn request_op(request: &Request) -> Op {
    match request {
        Request::GetAttr(_) => Op::GetAttr,
        Request::OpenDir(_) => Op::OpenDir,
        Request::Open(_) => Op::Open,
        Request::Create(_) => Op::Create,
        Request::Chmod(_) => Op::Chmod,
        Request::Chown(_) => Op::Chown,
        Request::Utimens(_) => Op::Utimens,
        Request::Truncate(_) => Op::Truncate,
        Request::Access(_) => Op::Access,
        Request::Link(_) => Op::Link,
        Request::Mkdir(_) => Op::Mkdir,
        Request::Mknod(_) => Op::Mknod,
        Request::Rename(_) => Op::Rename,
        Request::Rmdir(_) => Op::Rmdir,
        Request::Unlink(_) => Op::Unlink,
        Request::GetXAttr(_) => Op::GetXAttr,
        Request::ListXAttr(_) => Op::ListXAttr,
        Request::RemoveXAttr(_) => Op::RemoveXAttr,
        Request::SetXAttr(_) => Op::SetXAttr,
        Request::Symlink(_) => Op::Symlink,
        Request::Readlink(_) => Op::Readlink,
        Request::StatFs(_) => Op::StatFs,
        Request::Identity(_) => Op::Identity,
        Request::SetDebug(_) => Op::SetDebug,
    }
}

/// Response for `op` carrying `status` and no payload
pub fn empty_response(op: Op, status: Status) -> Response {
    let bare = StatusResponse { status };
    match op {
        Op::GetAttr => Response::GetAttr(GetAttrResponse { status, attr: None }),
        Op::OpenDir => Response::OpenDir(OpenDirResponse {
            status,
            entries: Vec::new(),
        }),
        Op::Open => Response::Open(OpenResponse { status, file: None }),
        Op::Create => Response::Create(OpenResponse { status, file: None }),
        Op::Chmod => Response::Chmod(bare),
        Op::Chown => Response::Chown(bare),
        Op::Utimens => Response::Utimens(bare),
        Op::Truncate => Response::Truncate(bare),
        Op::Access => Response::Access(bare),
        Op::Link => Response::Link(bare),
        Op::Mkdir => Response::Mkdir(bare),
        Op::Mknod => Response::Mknod(bare),
        Op::Rename => Response::Rename(bare),
        Op::Rmdir => Response::Rmdir(bare),
        Op::Unlink => Response::Unlink(bare),
        Op::GetXAttr => Response::GetXAttr(GetXAttrResponse {
            status,
            data: Vec::new(),
        }),
        Op::ListXAttr => Response::ListXAttr(ListXAttrResponse {
            status,
            attributes: Vec::new(),
        }),
        Op::RemoveXAttr => Response::RemoveXAttr(bare),
        Op::SetXAttr => Response::SetXAttr(bare),
        Op::Symlink => Response::Symlink(bare),
        Op::Readlink => Response::Readlink(ReadlinkResponse {
            status,
            target: Vec::new(),
        }),
        Op::StatFs => Response::StatFs(StatFsResponse {
            status,
            stats: None,
        }),
        Op::Identity => Response::Identity(IdentityResponse {
            status,
            identity: Vec::new(),
        }),
        Op::SetDebug => Response::SetDebug(bare),
    }
}

/// Snapshot `file` unless its content cannot fit in one response frame
fn bounded_snapshot(file: &dyn BackendFile) -> FsResult<Vec<u8>> {
    let declared = file.getattr()?.size;
    if declared > MAX_SNAPSHOT_LEN as u64 {
        warn!(size = declared, limit = MAX_SNAPSHOT_LEN, "file too large to transfer");
        return Err(FsError::Range);
    }
    let data = snapshot(file)?;
    if data.len() > MAX_SNAPSHOT_LEN {
        return Err(FsError::Range);
    }
    Ok(data)
}

fn path(bytes: &[u8]) -> FsResult<&str> {
    std::str::from_utf8(bytes).map_err(|_| FsError::InvalidArgument)
}

/// Dispatches decoded requests to a backend.
///
/// Holds no locks; concurrent calls reach the backend concurrently.
pub struct PathFsServer {
    fs: Arc<dyn PathFs>,
}

impl PathFsServer {
    pub fn new(fs: Arc<dyn PathFs>) -> Self {
        Self { fs }
    }

    pub fn handle(&self, request: Request) -> Response {
        if let Err(err) = validate_request(&request) {
            warn!(op = request.op_name(), error = %err, "rejecting request");
            return Response::error(error_to_wire(&FsError::InvalidArgument), err.to_string());
        }

        let op = request_op(&request);
        if !self.fs.capabilities().supports(op) {
            debug!(op = %op, "operation not declared by backend");
            return Self::unsupported(op);
        }

        debug!(op = %op, "dispatching request");
        match request {
            Request::GetAttr((_, r)) => {
                let ctx = context_from_wire(r.context);
                match path(&r.name).and_then(|p| self.fs.getattr(p, ctx.as_ref())) {
                    Ok(attr) => Response::GetAttr(GetAttrResponse {
                        status: Status::ok(),
                        attr: Some(attr_to_wire(&attr)),
                    }),
                    Err(e) => Self::failure(op, e),
                }
            }
            Request::OpenDir((_, r)) => {
                let ctx = context_from_wire(r.context);
                match path(&r.name).and_then(|p| self.fs.opendir(p, ctx.as_ref())) {
                    Ok(entries) => Response::OpenDir(OpenDirResponse {
                        status: Status::ok(),
                        entries: entries_to_wire(&entries),
                    }),
                    Err(e) => Self::failure(op, e),
                }
            }
            Request::Open((_, r)) => {
                let ctx = context_from_wire(r.context);
                let data = path(&r.name)
                    .and_then(|p| self.fs.open(p, r.flags, ctx.as_ref()))
                    .and_then(|file| bounded_snapshot(file.as_ref()));
                match data {
                    Ok(data) => Response::Open(OpenResponse {
                        status: Status::ok(),
                        file: Some(File { data }),
                    }),
                    Err(e) => Self::failure(op, e),
                }
            }
            Request::Create((_, r)) => {
                let ctx = context_from_wire(r.context);
                let data = path(&r.name)
                    .and_then(|p| self.fs.create(p, r.flags, r.mode, ctx.as_ref()))
                    .and_then(|file| bounded_snapshot(file.as_ref()));
                match data {
                    Ok(data) => Response::Create(OpenResponse {
                        status: Status::ok(),
                        file: Some(File { data }),
                    }),
                    Err(e) => Self::failure(op, e),
                }
            }
            Request::Chmod((_, r)) => {
                let ctx = context_from_wire(r.context);
                Self::status_only(
                    op,
                    path(&r.name).and_then(|p| self.fs.chmod(p, r.mode, ctx.as_ref())),
                )
            }
            Request::Chown((_, r)) => {
                let ctx = context_from_wire(r.context);
                Self::status_only(
                    op,
                    path(&r.name).and_then(|p| self.fs.chown(p, r.uid, r.gid, ctx.as_ref())),
                )
            }
            Request::Utimens((_, r)) => {
                let ctx = context_from_wire(r.context);
                let atime = r.atime.map(|t| nanos_to_system_time(t.as_nanos()));
                let mtime = r.mtime.map(|t| nanos_to_system_time(t.as_nanos()));
                Self::status_only(
                    op,
                    path(&r.name).and_then(|p| self.fs.utimens(p, atime, mtime, ctx.as_ref())),
                )
            }
            Request::Truncate((_, r)) => {
                let ctx = context_from_wire(r.context);
                Self::status_only(
                    op,
                    path(&r.name).and_then(|p| self.fs.truncate(p, r.size, ctx.as_ref())),
                )
            }
            Request::Access((_, r)) => {
                let ctx = context_from_wire(r.context);
                Self::status_only(
                    op,
                    path(&r.name).and_then(|p| self.fs.access(p, r.mode, ctx.as_ref())),
                )
            }
            Request::Link((_, r)) => {
                let ctx = context_from_wire(r.context);
                let result = path(&r.old_name).and_then(|old| {
                    path(&r.new_name).and_then(|new| self.fs.link(old, new, ctx.as_ref()))
                });
                Self::status_only(op, result)
            }
            Request::Mkdir((_, r)) => {
                let ctx = context_from_wire(r.context);
                Self::status_only(
                    op,
                    path(&r.name).and_then(|p| self.fs.mkdir(p, r.mode, ctx.as_ref())),
                )
            }
            Request::Mknod((_, r)) => {
                let ctx = context_from_wire(r.context);
                Self::status_only(
                    op,
                    path(&r.name).and_then(|p| self.fs.mknod(p, r.mode, r.dev, ctx.as_ref())),
                )
            }
            Request::Rename((_, r)) => {
                let ctx = context_from_wire(r.context);
                let result = path(&r.old_name).and_then(|old| {
                    path(&r.new_name).and_then(|new| self.fs.rename(old, new, ctx.as_ref()))
                });
                Self::status_only(op, result)
            }
            Request::Rmdir((_, r)) => {
                let ctx = context_from_wire(r.context);
                Self::status_only(
                    op,
                    path(&r.name).and_then(|p| self.fs.rmdir(p, ctx.as_ref())),
                )
            }
            Request::Unlink((_, r)) => {
                let ctx = context_from_wire(r.context);
                Self::status_only(
                    op,
                    path(&r.name).and_then(|p| self.fs.unlink(p, ctx.as_ref())),
                )
            }
            Request::GetXAttr((_, r)) => {
                let ctx = context_from_wire(r.context);
                let result = path(&r.name).and_then(|p| {
                    path(&r.attribute).and_then(|attr| self.fs.getxattr(p, attr, ctx.as_ref()))
                });
                match result {
                    Ok(data) => Response::GetXAttr(GetXAttrResponse {
                        status: Status::ok(),
                        data,
                    }),
                    Err(e) => Self::failure(op, e),
                }
            }
            Request::ListXAttr((_, r)) => {
                let ctx = context_from_wire(r.context);
                match path(&r.name).and_then(|p| self.fs.listxattr(p, ctx.as_ref())) {
                    Ok(names) => Response::ListXAttr(ListXAttrResponse {
                        status: Status::ok(),
                        attributes: names.into_iter().map(String::into_bytes).collect(),
                    }),
                    Err(e) => Self::failure(op, e),
                }
            }
            Request::RemoveXAttr((_, r)) => {
                let ctx = context_from_wire(r.context);
                let result = path(&r.name).and_then(|p| {
                    path(&r.attribute).and_then(|attr| self.fs.removexattr(p, attr, ctx.as_ref()))
                });
                Self::status_only(op, result)
            }
            Request::SetXAttr((_, r)) => {
                let ctx = context_from_wire(r.context);
                let result = path(&r.name).and_then(|p| {
                    path(&r.attribute).and_then(|attr| {
                        self.fs
                            .setxattr(p, attr, &r.data, r.flags, ctx.as_ref())
                    })
                });
                Self::status_only(op, result)
            }
            Request::Symlink((_, r)) => {
                let ctx = context_from_wire(r.context);
                let result = path(&r.value).and_then(|value| {
                    path(&r.link_name).and_then(|link| self.fs.symlink(value, link, ctx.as_ref()))
                });
                Self::status_only(op, result)
            }
            Request::Readlink((_, r)) => {
                let ctx = context_from_wire(r.context);
                match path(&r.name).and_then(|p| self.fs.readlink(p, ctx.as_ref())) {
                    Ok(target) => Response::Readlink(ReadlinkResponse {
                        status: Status::ok(),
                        target: target.into_bytes(),
                    }),
                    Err(e) => Self::failure(op, e),
                }
            }
            Request::StatFs((_, r)) => match path(&r.name).and_then(|p| self.fs.statfs(p)) {
                Ok(stats) => Response::StatFs(StatFsResponse {
                    status: Status::ok(),
                    stats: stats.as_ref().map(statfs_to_wire),
                }),
                Err(e) => Self::failure(op, e),
            },
            Request::Identity(_) => match self.fs.identity() {
                Ok(identity) => Response::Identity(IdentityResponse {
                    status: Status::ok(),
                    identity: identity.into_bytes(),
                }),
                Err(FsError::NotImplemented) => Self::unsupported(op),
                Err(e) => Self::failure(op, e),
            },
            Request::SetDebug((_, r)) => match self.fs.set_debug(r.debug) {
                Ok(()) | Err(FsError::NotImplemented) => Self::unsupported(op),
                Err(e) => Self::failure(op, e),
            },
        }
    }

    /// Answer for an operation the backend does not serve.
    ///
    /// The diagnostic operations succeed with an empty payload.
    fn unsupported(op: Op) -> Response {
        match op {
            Op::Identity | Op::SetDebug => empty_response(op, Status::ok()),
            _ => empty_response(op, error_to_wire(&FsError::NotImplemented)),
        }
    }

    fn failure(op: Op, err: FsError) -> Response {
        debug!(op = %op, error = %err, "backend reported failure");
        empty_response(op, error_to_wire(&err))
    }

    fn status_only(op: Op, result: FsResult<()>) -> Response {
        match result {
            Ok(()) => empty_response(op, Status::ok()),
            Err(e) => Self::failure(op, e),
        }
    }
}
