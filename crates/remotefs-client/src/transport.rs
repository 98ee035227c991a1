// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Request/response transport to a RemoteFS server

use crate::config::ClientConfig;
use remotefs_proto::{FrameError, Request, Response, read_frame, write_frame};
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to resolve {addr}: {source}")]
    Resolve { addr: String, source: io::Error },
    #[error("failed to connect to {addr}: {source}")]
    Connect { addr: SocketAddr, source: io::Error },
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}

/// Carries one request and returns the matching response.
///
/// Implementations must allow concurrent calls from many threads.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
    fn call(&self, request: &Request) -> Result<Response, TransportError>;
}

/// TCP transport with a pool of idle connections.
///
/// Each call checks out a connection or dials a new one, so concurrent
/// calls never wait on each other. A connection that fails mid-call is
/// dropped; calls are never retried.
pub struct TcpTransport {
    addr: SocketAddr,
    config: ClientConfig,
    idle: Mutex<Vec<TcpStream>>,
}

impl TcpTransport {
    /// Resolve the configured remote and dial the first connection
    pub fn connect(config: ClientConfig) -> Result<Self, TransportError> {
        let addr = config
            .remote
            .to_socket_addrs()
            .and_then(|mut addrs| {
                addrs
                    .next()
                    .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no addresses"))
            })
            .map_err(|source| TransportError::Resolve {
                addr: config.remote.clone(),
                source,
            })?;

        let transport = Self {
            addr,
            config,
            idle: Mutex::new(Vec::new()),
        };
        let first = transport.dial()?;
        transport.checkin(first);
        info!(remote = %addr, "connected to remotefs server");
        Ok(transport)
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn idle_connections(&self) -> usize {
        self.pool().len()
    }

    fn pool(&self) -> MutexGuard<'_, Vec<TcpStream>> {
        self.idle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn dial(&self) -> Result<TcpStream, TransportError> {
        let connect_err = |source: io::Error| TransportError::Connect {
            addr: self.addr,
            source,
        };
        let stream = TcpStream::connect(self.addr).map_err(connect_err)?;
        stream.set_nodelay(true).map_err(connect_err)?;
        stream
            .set_read_timeout(self.config.read_timeout())
            .map_err(connect_err)?;
        stream
            .set_write_timeout(self.config.write_timeout())
            .map_err(connect_err)?;
        debug!(remote = %self.addr, "dialed connection");
        Ok(stream)
    }

    fn checkout(&self) -> Result<TcpStream, TransportError> {
        let pooled = self.pool().pop();
        match pooled {
            Some(stream) => Ok(stream),
            None => self.dial(),
        }
    }

    fn checkin(&self, stream: TcpStream) {
        let mut idle = self.pool();
        if idle.len() < self.config.max_idle_connections {
            idle.push(stream);
        }
    }
}

impl Transport for TcpTransport {
    fn call(&self, request: &Request) -> Result<Response, TransportError> {
        let mut stream = self.checkout()?;
        write_frame(&mut stream, request)?;
        let response = read_frame(&mut stream)?;
        self.checkin(stream);
        Ok(response)
    }
}
