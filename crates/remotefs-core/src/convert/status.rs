// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use crate::error::{FsError, FsResult};
use remotefs_proto::messages::{Status, status_code};

const CODES: [(FsError, u32); 17] = [
    (FsError::NotFound, status_code::NOT_FOUND),
    (FsError::AlreadyExists, status_code::ALREADY_EXISTS),
    (FsError::PermissionDenied, status_code::PERMISSION_DENIED),
    (FsError::AccessDenied, status_code::ACCESS_DENIED),
    (FsError::NotImplemented, status_code::NOT_IMPLEMENTED),
    (FsError::InvalidArgument, status_code::INVALID_ARGUMENT),
    (FsError::NotADirectory, status_code::NOT_A_DIRECTORY),
    (FsError::IsADirectory, status_code::IS_A_DIRECTORY),
    (FsError::NotEmpty, status_code::NOT_EMPTY),
    (FsError::NoData, status_code::NO_DATA),
    (FsError::Range, status_code::RANGE),
    (FsError::NameTooLong, status_code::NAME_TOO_LONG),
    (FsError::NoSpace, status_code::NO_SPACE),
    (FsError::ReadOnly, status_code::READ_ONLY),
    (FsError::CrossDevice, status_code::CROSS_DEVICE),
    (FsError::Busy, status_code::BUSY),
    (FsError::Io, status_code::IO),
];

pub fn error_to_wire(err: &FsError) -> Status {
    let code = CODES
        .iter()
        .find(|(e, _)| e == err)
        .map(|(_, code)| *code)
        .unwrap_or(status_code::IO);
    Status::new(code)
}

pub fn status_to_wire<T>(result: &FsResult<T>) -> Status {
    match result {
        Ok(_) => Status::ok(),
        Err(err) => error_to_wire(err),
    }
}

/// Unknown codes come from a malformed response and surface as [`FsError::Io`]
pub fn status_from_wire(status: &Status) -> FsResult<()> {
    if status.code == status_code::OK {
        return Ok(());
    }
    let err = CODES
        .iter()
        .find(|(_, code)| *code == status.code)
        .map(|(e, _)| *e)
        .unwrap_or(FsError::Io);
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_error_round_trips() {
        for (err, _) in CODES {
            assert_eq!(status_from_wire(&error_to_wire(&err)), Err(err));
        }
    }

    #[test]
    fn codes_are_distinct_and_never_ok() {
        let codes: HashSet<u32> = CODES.iter().map(|(_, c)| *c).collect();
        assert_eq!(codes.len(), CODES.len());
        assert!(!codes.contains(&status_code::OK));
    }

    #[test]
    fn ok_maps_to_ok() {
        let result: FsResult<u32> = Ok(3);
        assert!(status_to_wire(&result).is_ok());
        assert_eq!(status_from_wire(&Status::ok()), Ok(()));
    }

    #[test]
    fn unknown_code_is_io() {
        assert_eq!(status_from_wire(&Status::new(9999)), Err(FsError::Io));
    }
}
