// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unix-socket client for talking to `spindled` (spec.md §6.4).

use std::path::{Path, PathBuf};

use spindle_daemon::protocol_wire::{self, ProtocolError, DEFAULT_TIMEOUT};
use spindle_daemon::{Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running (no socket at {0})")]
    DaemonNotRunning(PathBuf),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("daemon returned an error: {0}")]
    Rejected(String),
    #[error("unexpected response from daemon")]
    UnexpectedResponse,
}

pub struct DaemonClient {
    stream: UnixStream,
}

impl DaemonClient {
    /// Connects to the daemon's socket. A missing or stale socket is
    /// reported as `DaemonNotRunning` rather than the raw io error — every
    /// caller treats the two identically.
    pub async fn connect(socket_path: &Path) -> Result<Self, ClientError> {
        let stream = UnixStream::connect(socket_path)
            .await
            .map_err(|_| ClientError::DaemonNotRunning(socket_path.to_path_buf()))?;
        Ok(Self { stream })
    }

    pub async fn send(&mut self, request: Request) -> Result<Response, ClientError> {
        protocol_wire::write_request(&mut self.stream, &request, DEFAULT_TIMEOUT).await?;
        let response = protocol_wire::read_response(&mut self.stream, DEFAULT_TIMEOUT).await?;
        if let Response::Error { message } = response {
            return Err(ClientError::Rejected(message));
        }
        Ok(response)
    }
}

/// Probes whether a Unix socket is currently accepting connections, without
/// going through the full protocol handshake. Used by `spindle start` to
/// decide whether a daemon is already running.
pub fn probe_socket(socket_path: &Path) -> bool {
    std::os::unix::net::UnixStream::connect(socket_path).is_ok()
}
