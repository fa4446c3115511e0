//! ADB host-protocol transport.
//!
//! This module provides the request/response channel used to address
//! services on the device (frame buffer, screencap, shell). Connections
//! are never pooled: one TCP connection per request.

mod channel;
mod config;

pub use channel::{
    read_status, read_to_eof, send_message, TransportChannel, STATUS_FAIL, STATUS_OKAY,
};
pub use config::{TransportConfig, MIN_RESPONSE_BYTES};

#[cfg(test)]
pub(crate) use channel::tests::{fake_server, Reply};

use thiserror::Error;

/// Errors raised while talking to the ADB server or decoding its payloads.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not resolve ADB server address {0}")]
    Unresolvable(String),
    #[error("host message too long ({0} bytes)")]
    MessageTooLong(usize),
    #[error("server rejected request: {0}")]
    Failed(String),
    #[error("unexpected status token {0:?}")]
    UnexpectedStatus(String),
    #[error("connection closed before status was received")]
    ConnectionClosed,
    #[error("response exceeded {limit} bytes")]
    ResponseTooLarge { limit: usize },
    #[error("frame buffer header truncated ({0} bytes)")]
    TruncatedHeader(usize),
    #[error("frame buffer payload truncated: expected {expected} bytes, got {actual}")]
    TruncatedPayload { expected: usize, actual: usize },
    #[error("unsupported frame buffer format: {0}")]
    UnsupportedFormat(String),
    #[error("invalid PNG screenshot: {0}")]
    InvalidPng(String),
}
