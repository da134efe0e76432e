//! exporter-rpc — snapshot source backed by the Transmission RPC API.
//!
//! Talks JSON over HTTP to a Transmission daemon and turns the `session-get`
//! and `session-stats` replies into [`SessionConfig`] and [`SessionStats`]
//! snapshots.
//!
//! # Architecture
//!
//! ```text
//! TransmissionClient
//!   ├── connect()      ← one session-get round trip, negotiates the session id
//!   ├── fetch_config() → SessionConfig
//!   └── fetch_stats()  → SessionStats
//! ```
//!
//! Every failure is a [`SourceError`]. The client never retries on its own;
//! the only repeated request is the `409 Conflict` session-id handshake that
//! the Transmission protocol requires.
//!
//! [`SessionConfig`]: exporter_core::SessionConfig
//! [`SessionStats`]: exporter_core::SessionStats

pub mod client;
pub mod error;
pub mod source;
mod wire;

pub use client::TransmissionClient;
pub use error::SourceError;
pub use source::SnapshotSource;
