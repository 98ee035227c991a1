// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Length-prefixed SSZ framing shared by the server listener and the client transport
//!
//! A frame is a little-endian `u32` payload length followed by the SSZ bytes.

use ssz::{Decode, Encode};
use std::io::{self, Read, Write};
use thiserror::Error;

/// Largest frame either side accepts
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Largest file content an open or create response may carry
pub const MAX_SNAPSHOT_LEN: usize = MAX_FRAME_LEN - 4096;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("peer closed the connection")]
    Closed,
    #[error("frame of {0} bytes exceeds the {MAX_FRAME_LEN} byte limit")]
    TooLarge(usize),
    #[error("SSZ decoding failed: {0}")]
    Decode(String),
}

/// Encode a message to SSZ bytes
pub fn encode_ssz_message(data: &impl Encode) -> Vec<u8> {
    data.as_ssz_bytes()
}

/// Decode a message from SSZ bytes
pub fn decode_ssz_message<T: Decode>(data: &[u8]) -> Result<T, FrameError> {
    T::from_ssz_bytes(data).map_err(|e| FrameError::Decode(format!("{:?}", e)))
}

/// Write one framed message and flush
pub fn write_frame<W: Write>(writer: &mut W, message: &impl Encode) -> Result<(), FrameError> {
    let encoded = encode_ssz_message(message);
    if encoded.len() > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(encoded.len()));
    }
    let len_bytes = (encoded.len() as u32).to_le_bytes();
    writer.write_all(&len_bytes)?;
    writer.write_all(&encoded)?;
    writer.flush()?;
    Ok(())
}

/// Read one framed message.
///
/// A clean end of stream before the length header yields [`FrameError::Closed`].
pub fn read_frame<R: Read, T: Decode>(reader: &mut R) -> Result<T, FrameError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Err(FrameError::Closed),
        Err(err) => return Err(err.into()),
    }

    let msg_len = u32::from_le_bytes(len_buf) as usize;
    if msg_len > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(msg_len));
    }

    let mut msg_buf = vec![0u8; msg_len];
    reader.read_exact(&mut msg_buf)?;
    decode_ssz_message(&msg_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Request, Response, Status, StatusResponse};
    use std::io::Cursor;

    #[test]
    fn frame_carries_little_endian_length() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &Request::identity()).unwrap();

        let payload_len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
        assert_eq!(payload_len, buf.len() - 4);
    }

    #[test]
    fn frames_are_read_back_in_order() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &Request::getattr("file.txt", None)).unwrap();
        write_frame(&mut buf, &Request::set_debug(true)).unwrap();

        let mut cursor = Cursor::new(buf);
        let first: Request = read_frame(&mut cursor).unwrap();
        let second: Request = read_frame(&mut cursor).unwrap();
        assert_eq!(first, Request::getattr("file.txt", None));
        assert_eq!(second, Request::set_debug(true));
        assert!(matches!(
            read_frame::<_, Request>(&mut cursor),
            Err(FrameError::Closed)
        ));
    }

    #[test]
    fn oversized_header_is_rejected() {
        let header = ((MAX_FRAME_LEN + 1) as u32).to_le_bytes();
        let mut cursor = Cursor::new(header.to_vec());
        assert!(matches!(
            read_frame::<_, Response>(&mut cursor),
            Err(FrameError::TooLarge(_))
        ));
    }

    #[test]
    fn garbage_payload_fails_to_decode() {
        let mut buf = 3u32.to_le_bytes().to_vec();
        buf.extend_from_slice(&[0xff, 0xff, 0xff]);
        let mut cursor = Cursor::new(buf);
        assert!(matches!(
            read_frame::<_, Response>(&mut cursor),
            Err(FrameError::Decode(_))
        ));
    }

    #[test]
    fn truncated_payload_is_an_io_error() {
        let mut buf = Vec::new();
        write_frame(
            &mut buf,
            &Response::Chmod(StatusResponse::new(Status::ok())),
        )
        .unwrap();
        buf.truncate(buf.len() - 1);
        let mut cursor = Cursor::new(buf);
        assert!(matches!(
            read_frame::<_, Response>(&mut cursor),
            Err(FrameError::Io(_))
        ));
    }
}
