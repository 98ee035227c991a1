// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Wire message types for the RemoteFS protocol
//!
//! Every filesystem operation has one request variant and one response
//! variant. Strings travel as `Vec<u8>` since SSZ only knows byte vectors.

use ssz_derive::{Decode, Encode};

/// Protocol version carried by every request
pub const PROTOCOL_VERSION: &[u8] = b"1";

/// Result codes carried in [`Status::code`]
pub mod status_code {
    pub const OK: u32 = 0;
    pub const NOT_FOUND: u32 = 1;
    pub const ALREADY_EXISTS: u32 = 2;
    pub const PERMISSION_DENIED: u32 = 3;
    pub const ACCESS_DENIED: u32 = 4;
    pub const NOT_IMPLEMENTED: u32 = 5;
    pub const INVALID_ARGUMENT: u32 = 6;
    pub const NOT_A_DIRECTORY: u32 = 7;
    pub const IS_A_DIRECTORY: u32 = 8;
    pub const NOT_EMPTY: u32 = 9;
    pub const NO_DATA: u32 = 10;
    pub const RANGE: u32 = 11;
    pub const NAME_TOO_LONG: u32 = 12;
    pub const NO_SPACE: u32 = 13;
    pub const READ_ONLY: u32 = 14;
    pub const CROSS_DEVICE: u32 = 15;
    pub const BUSY: u32 = 16;
    /// Generic I/O failure, also used for transport faults
    pub const IO: u32 = 17;
}

/// Result status, present on every response
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct Status {
    pub code: u32,
}

impl Status {
    pub fn ok() -> Self {
        Self {
            code: status_code::OK,
        }
    }

    pub fn new(code: u32) -> Self {
        Self { code }
    }

    pub fn is_ok(&self) -> bool {
        self.code == status_code::OK
    }
}

/// Owning user and group of a caller or a file
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct Owner {
    pub uid: u32,
    pub gid: u32,
}

/// Caller identity. The owner is optional within a present context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct Context {
    pub pid: u32,
    pub owner: Option<Owner>,
}

/// File metadata
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
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

/// Signed nanoseconds since the Unix epoch, stored as the two's-complement
/// bit pattern of an `i64`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct Timestamp {
    pub nanos: u64,
}

impl Timestamp {
    pub fn from_nanos(nanos: i64) -> Self {
        Self {
            nanos: nanos as u64,
        }
    }

    pub fn as_nanos(&self) -> i64 {
        self.nanos as i64
    }
}

/// Directory entry
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct DirEntry {
    pub name: Vec<u8>,
    pub mode: u32,
}

/// Whole-file content captured when the file was opened
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct File {
    pub data: Vec<u8>,
}

/// Filesystem statistics
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
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
    pub spare: Vec<u32>,
}

/// Request union - each variant carries the protocol version and the operation payload
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
#[ssz(enum_behaviour = "union")]
pub enum Request {
    GetAttr((Vec<u8>, GetAttrRequest)),
    OpenDir((Vec<u8>, OpenDirRequest)),
    Open((Vec<u8>, OpenRequest)),
    Create((Vec<u8>, CreateRequest)),
    Chmod((Vec<u8>, ChmodRequest)),
    Chown((Vec<u8>, ChownRequest)),
    Utimens((Vec<u8>, UtimensRequest)),
    Truncate((Vec<u8>, TruncateRequest)),
    Access((Vec<u8>, AccessRequest)),
    Link((Vec<u8>, LinkRequest)),
    Mkdir((Vec<u8>, MkdirRequest)),
    Mknod((Vec<u8>, MknodRequest)),
    Rename((Vec<u8>, RenameRequest)),
    Rmdir((Vec<u8>, RmdirRequest)),
    Unlink((Vec<u8>, UnlinkRequest)),
    GetXAttr((Vec<u8>, GetXAttrRequest)),
    ListXAttr((Vec<u8>, ListXAttrRequest)),
    RemoveXAttr((Vec<u8>, RemoveXAttrRequest)),
    SetXAttr((Vec<u8>, SetXAttrRequest)),
    Symlink((Vec<u8>, SymlinkRequest)),
    Readlink((Vec<u8>, ReadlinkRequest)),
    StatFs((Vec<u8>, StatFsRequest)),
    Identity((Vec<u8>, IdentityRequest)),
    SetDebug((Vec<u8>, SetDebugRequest)),
}

/// Response union - one variant per operation, plus protocol-level errors
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
#[ssz(enum_behaviour = "union")]
pub enum Response {
    GetAttr(GetAttrResponse),
    OpenDir(OpenDirResponse),
    Open(OpenResponse),
    Create(OpenResponse),
    Chmod(StatusResponse),
    Chown(StatusResponse),
    Utimens(StatusResponse),
    Truncate(StatusResponse),
    Access(StatusResponse),
    Link(StatusResponse),
    Mkdir(StatusResponse),
    Mknod(StatusResponse),
    Rename(StatusResponse),
    Rmdir(StatusResponse),
    Unlink(StatusResponse),
    GetXAttr(GetXAttrResponse),
    ListXAttr(ListXAttrResponse),
    RemoveXAttr(StatusResponse),
    SetXAttr(StatusResponse),
    Symlink(StatusResponse),
    Readlink(ReadlinkResponse),
    StatFs(StatFsResponse),
    Identity(IdentityResponse),
    SetDebug(StatusResponse),
    Error(ErrorResponse),
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct GetAttrRequest {
    pub name: Vec<u8>,
    pub context: Option<Context>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct OpenDirRequest {
    pub name: Vec<u8>,
    pub context: Option<Context>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct OpenRequest {
    pub name: Vec<u8>,
    pub flags: u32,
    pub context: Option<Context>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct CreateRequest {
    pub name: Vec<u8>,
    pub flags: u32,
    pub mode: u32,
    pub context: Option<Context>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct ChmodRequest {
    pub name: Vec<u8>,
    pub mode: u32,
    pub context: Option<Context>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct ChownRequest {
    pub name: Vec<u8>,
    pub uid: u32,
    pub gid: u32,
    pub context: Option<Context>,
}

/// Update timestamps; an absent timestamp leaves that time untouched
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct UtimensRequest {
    pub name: Vec<u8>,
    pub atime: Option<Timestamp>,
    pub mtime: Option<Timestamp>,
    pub context: Option<Context>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct TruncateRequest {
    pub name: Vec<u8>,
    pub size: u64,
    pub context: Option<Context>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct AccessRequest {
    pub name: Vec<u8>,
    pub mode: u32,
    pub context: Option<Context>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct LinkRequest {
    pub old_name: Vec<u8>,
    pub new_name: Vec<u8>,
    pub context: Option<Context>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct MkdirRequest {
    pub name: Vec<u8>,
    pub mode: u32,
    pub context: Option<Context>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct MknodRequest {
    pub name: Vec<u8>,
    pub mode: u32,
    pub dev: u32,
    pub context: Option<Context>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct RenameRequest {
    pub old_name: Vec<u8>,
    pub new_name: Vec<u8>,
    pub context: Option<Context>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct RmdirRequest {
    pub name: Vec<u8>,
    pub context: Option<Context>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct UnlinkRequest {
    pub name: Vec<u8>,
    pub context: Option<Context>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct GetXAttrRequest {
    pub name: Vec<u8>,
    pub attribute: Vec<u8>,
    pub context: Option<Context>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct ListXAttrRequest {
    pub name: Vec<u8>,
    pub context: Option<Context>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct RemoveXAttrRequest {
    pub name: Vec<u8>,
    pub attribute: Vec<u8>,
    pub context: Option<Context>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct SetXAttrRequest {
    pub name: Vec<u8>,
    pub attribute: Vec<u8>,
    pub data: Vec<u8>,
    pub flags: u32,
    pub context: Option<Context>,
}

/// Create `link_name` pointing at `value`
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct SymlinkRequest {
    pub value: Vec<u8>,
    pub link_name: Vec<u8>,
    pub context: Option<Context>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct ReadlinkRequest {
    pub name: Vec<u8>,
    pub context: Option<Context>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct StatFsRequest {
    pub name: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct IdentityRequest {}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct SetDebugRequest {
    pub debug: bool,
}

/// Response for operations that return nothing beyond a status
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct StatusResponse {
    pub status: Status,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct GetAttrResponse {
    pub status: Status,
    pub attr: Option<Attr>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct OpenDirResponse {
    pub status: Status,
    pub entries: Vec<DirEntry>,
}

/// Shared by open and create
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct OpenResponse {
    pub status: Status,
    pub file: Option<File>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct GetXAttrResponse {
    pub status: Status,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct ListXAttrResponse {
    pub status: Status,
    pub attributes: Vec<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct ReadlinkResponse {
    pub status: Status,
    pub target: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct StatFsResponse {
    pub status: Status,
    pub stats: Option<StatFs>,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct IdentityResponse {
    pub status: Status,
    pub identity: Vec<u8>,
}

/// Protocol-level failure (bad version, undecodable request)
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct ErrorResponse {
    pub status: Status,
    pub message: Vec<u8>,
}

fn versioned<T>(body: T) -> (Vec<u8>, T) {
    (PROTOCOL_VERSION.to_vec(), body)
}

// Constructors for SSZ union variants (convert &str to Vec<u8>)
impl Request {
    pub fn getattr(name: &str, context: Option<Context>) -> Self {
        Self::GetAttr(versioned(GetAttrRequest {
            name: name.as_bytes().to_vec(),
            context,
        }))
    }

    pub fn opendir(name: &str, context: Option<Context>) -> Self {
        Self::OpenDir(versioned(OpenDirRequest {
            name: name.as_bytes().to_vec(),
            context,
        }))
    }

    pub fn open(name: &str, flags: u32, context: Option<Context>) -> Self {
        Self::Open(versioned(OpenRequest {
            name: name.as_bytes().to_vec(),
            flags,
            context,
        }))
    }

    pub fn create(name: &str, flags: u32, mode: u32, context: Option<Context>) -> Self {
        Self::Create(versioned(CreateRequest {
            name: name.as_bytes().to_vec(),
            flags,
            mode,
            context,
        }))
    }

    pub fn chmod(name: &str, mode: u32, context: Option<Context>) -> Self {
        Self::Chmod(versioned(ChmodRequest {
            name: name.as_bytes().to_vec(),
            mode,
            context,
        }))
    }

    pub fn chown(name: &str, uid: u32, gid: u32, context: Option<Context>) -> Self {
        Self::Chown(versioned(ChownRequest {
            name: name.as_bytes().to_vec(),
            uid,
            gid,
            context,
        }))
    }

    pub fn utimens(
        name: &str,
        atime: Option<Timestamp>,
        mtime: Option<Timestamp>,
        context: Option<Context>,
    ) -> Self {
        Self::Utimens(versioned(UtimensRequest {
            name: name.as_bytes().to_vec(),
            atime,
            mtime,
            context,
        }))
    }

    pub fn truncate(name: &str, size: u64, context: Option<Context>) -> Self {
        Self::Truncate(versioned(TruncateRequest {
            name: name.as_bytes().to_vec(),
            size,
            context,
        }))
    }

    pub fn access(name: &str, mode: u32, context: Option<Context>) -> Self {
        Self::Access(versioned(AccessRequest {
            name: name.as_bytes().to_vec(),
            mode,
            context,
        }))
    }

    pub fn link(old_name: &str, new_name: &str, context: Option<Context>) -> Self {
        Self::Link(versioned(LinkRequest {
            old_name: old_name.as_bytes().to_vec(),
            new_name: new_name.as_bytes().to_vec(),
            context,
        }))
    }

    pub fn mkdir(name: &str, mode: u32, context: Option<Context>) -> Self {
        Self::Mkdir(versioned(MkdirRequest {
            name: name.as_bytes().to_vec(),
            mode,
            context,
        }))
    }

    pub fn mknod(name: &str, mode: u32, dev: u32, context: Option<Context>) -> Self {
        Self::Mknod(versioned(MknodRequest {
            name: name.as_bytes().to_vec(),
            mode,
            dev,
            context,
        }))
    }

    pub fn rename(old_name: &str, new_name: &str, context: Option<Context>) -> Self {
        Self::Rename(versioned(RenameRequest {
            old_name: old_name.as_bytes().to_vec(),
            new_name: new_name.as_bytes().to_vec(),
            context,
        }))
    }

    pub fn rmdir(name: &str, context: Option<Context>) -> Self {
        Self::Rmdir(versioned(RmdirRequest {
            name: name.as_bytes().to_vec(),
            context,
        }))
    }

    pub fn unlink(name: &str, context: Option<Context>) -> Self {
        Self::Unlink(versioned(UnlinkRequest {
            name: name.as_bytes().to_vec(),
            context,
        }))
    }

    pub fn getxattr(name: &str, attribute: &str, context: Option<Context>) -> Self {
        Self::GetXAttr(versioned(GetXAttrRequest {
            name: name.as_bytes().to_vec(),
            attribute: attribute.as_bytes().to_vec(),
            context,
        }))
    }

    pub fn listxattr(name: &str, context: Option<Context>) -> Self {
        Self::ListXAttr(versioned(ListXAttrRequest {
            name: name.as_bytes().to_vec(),
            context,
        }))
    }

    pub fn removexattr(name: &str, attribute: &str, context: Option<Context>) -> Self {
        Self::RemoveXAttr(versioned(RemoveXAttrRequest {
            name: name.as_bytes().to_vec(),
            attribute: attribute.as_bytes().to_vec(),
            context,
        }))
    }

    pub fn setxattr(
        name: &str,
        attribute: &str,
        data: Vec<u8>,
        flags: u32,
        context: Option<Context>,
    ) -> Self {
        Self::SetXAttr(versioned(SetXAttrRequest {
            name: name.as_bytes().to_vec(),
            attribute: attribute.as_bytes().to_vec(),
            data,
            flags,
            context,
        }))
    }

    pub fn symlink(value: &str, link_name: &str, context: Option<Context>) -> Self {
        Self::Symlink(versioned(SymlinkRequest {
            value: value.as_bytes().to_vec(),
            link_name: link_name.as_bytes().to_vec(),
            context,
        }))
    }

    pub fn readlink(name: &str, context: Option<Context>) -> Self {
        Self::Readlink(versioned(ReadlinkRequest {
            name: name.as_bytes().to_vec(),
            context,
        }))
    }

    pub fn statfs(name: &str) -> Self {
        Self::StatFs(versioned(StatFsRequest {
            name: name.as_bytes().to_vec(),
        }))
    }

    pub fn identity() -> Self {
        Self::Identity(versioned(IdentityRequest {}))
    }

    pub fn set_debug(debug: bool) -> Self {
        Self::SetDebug(versioned(SetDebugRequest { debug }))
    }

    /// Short operation name used in logs
    pub fn op_name(&self) -> &'static str {
        match self {
            Request::GetAttr(_) => "getattr",
            Request::OpenDir(_) => "opendir",
            Request::Open(_) => "open",
            Request::Create(_) => "create",
            Request::Chmod(_) => "chmod",
            Request::Chown(_) => "chown",
            Request::Utimens(_) => "utimens",
            Request::Truncate(_) => "truncate",
            Request::Access(_) => "access",
            Request::Link(_) => "link",
            Request::Mkdir(_) => "mkdir",
            Request::Mknod(_) => "mknod",
            Request::Rename(_) => "rename",
            Request::Rmdir(_) => "rmdir",
            Request::Unlink(_) => "unlink",
            Request::GetXAttr(_) => "getxattr",
            Request::ListXAttr(_) => "listxattr",
            Request::RemoveXAttr(_) => "removexattr",
            Request::SetXAttr(_) => "setxattr",
            Request::Symlink(_) => "symlink",
            Request::Readlink(_) => "readlink",
            Request::StatFs(_) => "statfs",
            Request::Identity(_) => "identity",
            Request::SetDebug(_) => "set_debug",
        }
    }
}

impl Response {
    pub fn error(status: Status, message: String) -> Self {
        Self::Error(ErrorResponse {
            status,
            message: message.into_bytes(),
        })
    }

    /// The status every response carries
    pub fn status(&self) -> Status {
        match self {
            Response::GetAttr(r) => r.status,
            Response::OpenDir(r) => r.status,
            Response::Open(r) | Response::Create(r) => r.status,
            Response::Chmod(r)
            | Response::Chown(r)
            | Response::Utimens(r)
            | Response::Truncate(r)
            | Response::Access(r)
            | Response::Link(r)
            | Response::Mkdir(r)
            | Response::Mknod(r)
            | Response::Rename(r)
            | Response::Rmdir(r)
            | Response::Unlink(r)
            | Response::RemoveXAttr(r)
            | Response::SetXAttr(r)
            | Response::Symlink(r)
            | Response::SetDebug(r) => r.status,
            Response::GetXAttr(r) => r.status,
            Response::ListXAttr(r) => r.status,
            Response::Readlink(r) => r.status,
            Response::StatFs(r) => r.status,
            Response::Identity(r) => r.status,
            Response::Error(r) => r.status,
        }
    }
}

impl StatusResponse {
    pub fn new(status: Status) -> Self {
        Self { status }
    }
}
