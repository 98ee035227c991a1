// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! TCP listener serving framed requests, one thread per connection

use crate::server::PathFsServer;
use remotefs_core::FsError;
use remotefs_core::convert::error_to_wire;
use remotefs_proto::{FrameError, Request, Response, read_frame, write_frame};
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pause after an accept failure caused by resource exhaustion
const RESOURCE_BACKOFF: Duration = Duration::from_millis(100);

/// How long to wait before accepting again after `err`.
///
/// Failures tied to a single peer retry at once; anything else (for example
/// running out of file descriptors) waits for resources to free up.
pub fn accept_backoff(err: &io::Error) -> Duration {
    match err.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::Interrupted
        | io::ErrorKind::WouldBlock => Duration::ZERO,
        _ => RESOURCE_BACKOFF,
    }
}

pub struct Listener {
    inner: TcpListener,
    server: Arc<PathFsServer>,
}

impl Listener {
    pub fn bind(addr: impl ToSocketAddrs, server: PathFsServer) -> io::Result<Self> {
        let inner = TcpListener::bind(addr)?;
        Ok(Self {
            inner,
            server: Arc::new(server),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Accept connections until the process exits.
    ///
    /// A failed accept or thread spawn only loses that connection.
    pub fn serve(self) -> io::Result<()> {
        info!(addr = ?self.inner.local_addr().ok(), "remotefs server listening");
        for stream in self.inner.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    let pause = accept_backoff(&e);
                    warn!(error = %e, backoff_ms = pause.as_millis() as u64, "accept failed");
                    if !pause.is_zero() {
                        thread::sleep(pause);
                    }
                    continue;
                }
            };
            let server = self.server.clone();
            let peer = stream.peer_addr().ok();
            debug!(peer = ?peer, "accepted connection");
            let spawned = thread::Builder::new()
                .name("remotefs-conn".to_string())
                .spawn(move || handle_connection(stream, server));
            if let Err(e) = spawned {
                warn!(peer = ?peer, error = %e, "failed to start connection thread");
                thread::sleep(RESOURCE_BACKOFF);
            }
        }
        Ok(())
    }

    /// Run [`Listener::serve`] on a background thread
    pub fn spawn(self) -> JoinHandle<io::Result<()>> {
        thread::spawn(move || self.serve())
    }
}

/// Serve requests on one connection in arrival order until the peer hangs up
pub fn handle_connection(mut stream: TcpStream, server: Arc<PathFsServer>) {
    let _ = stream.set_nodelay(true);
    loop {
        let request: Request = match read_frame(&mut stream) {
            Ok(request) => request,
            Err(FrameError::Closed) => {
                debug!("peer closed connection");
                return;
            }
            Err(FrameError::Decode(msg)) => {
                warn!(error = %msg, "undecodable request, closing connection");
                let response = Response::error(
                    error_to_wire(&FsError::InvalidArgument),
                    format!("failed to decode request: {}", msg),
                );
                let _ = write_frame(&mut stream, &response);
                return;
            }
            Err(e) => {
                warn!(error = %e, "failed to read request, closing connection");
                return;
            }
        };

        let response = server.handle(request);
        if let Err(e) = write_frame(&mut stream, &response) {
            warn!(error = %e, "failed to send response, closing connection");
            return;
        }
    }
}
