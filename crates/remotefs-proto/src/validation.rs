// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Schema validation for RemoteFS messages

use crate::messages::*;
use thiserror::Error;

/// Validation error
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("schema validation failed: {0}")]
    Schema(String),
}

/// Validate a decoded request against its logical schema
pub fn validate_request(request: &Request) -> Result<(), ValidationError> {
    let version = match request {
        Request::GetAttr((version, _))
        | Request::OpenDir((version, _))
        | Request::Open((version, _))
        | Request::Create((version, _))
        | Request::Chmod((version, _))
        | Request::Chown((version, _))
        | Request::Utimens((version, _))
        | Request::Truncate((version, _))
        | Request::Access((version, _))
        | Request::Link((version, _))
        | Request::Mkdir((version, _))
        | Request::Mknod((version, _))
        | Request::Rename((version, _))
        | Request::Rmdir((version, _))
        | Request::Unlink((version, _))
        | Request::GetXAttr((version, _))
        | Request::ListXAttr((version, _))
        | Request::RemoveXAttr((version, _))
        | Request::SetXAttr((version, _))
        | Request::Symlink((version, _))
        | Request::Readlink((version, _))
        | Request::StatFs((version, _))
        | Request::Identity((version, _))
        | Request::SetDebug((version, _)) => version,
    };
    if version != PROTOCOL_VERSION {
        return Err(ValidationError::Schema(format!(
            "version must be '{}', got '{}'",
            String::from_utf8_lossy(PROTOCOL_VERSION),
            String::from_utf8_lossy(version)
        )));
    }
    Ok(())
}

/// Validate a decoded response against its logical schema.
///
/// A successful open or create must carry file content; other payload
/// shapes are enforced by the union itself.
pub fn validate_response(response: &Response) -> Result<(), ValidationError> {
    match response {
        Response::Open(r) | Response::Create(r) if r.status.is_ok() && r.file.is_none() => Err(
            ValidationError::Schema("successful open carries no file".to_string()),
        ),
        Response::GetAttr(r) if r.status.is_ok() && r.attr.is_none() => Err(
            ValidationError::Schema("successful getattr carries no attributes".to_string()),
        ),
        _ => Ok(()),
    }
}
