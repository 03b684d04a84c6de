// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spindle daemon library.
//!
//! This module exposes the IPC protocol types and the config/layout
//! resolution logic for use by CLI clients; the daemon binary itself
//! (lifecycle, listener) lives in `main.rs` and is not part of this
//! crate's public surface.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod protocol;
pub mod protocol_wire;

pub use config::{ConfigError, Layout};
pub use protocol::{Request, Response, StatusPayload, WorkerEntry};
pub use protocol_wire::{
    decode, encode, read_request, read_response, write_request, write_response, ProtocolError,
    DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE,
};
