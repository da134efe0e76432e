//! Error types for the snapshot source.

use std::time::Duration;

use thiserror::Error;

/// The daemon could not produce a snapshot.
///
/// All variants mean the source is unavailable for this call. Callers decide
/// whether that is fatal (initial connect) or skippable (a single tick).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid rpc endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("daemon rejected the credentials")]
    Unauthorized,

    #[error("session id handshake failed")]
    SessionHandshake,

    #[error("daemon returned HTTP {0}")]
    Status(u16),

    #[error("rpc `{method}` failed: {result}")]
    Rpc { method: &'static str, result: String },

    #[error("malformed rpc response: {0}")]
    Decode(String),
}
