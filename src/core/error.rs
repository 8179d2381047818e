//! Error types for the drivelink session layer.

use thiserror::Error;

/// Errors surfaced by the link session manager and its callers.
///
/// A graceful end-of-stream is deliberately not represented here: the
/// session reports it through a neutral status event, identical to an
/// explicit disconnect.
#[derive(Debug, Error)]
pub enum LinkError {
    /// A connection attempt (or live session) is already in flight.
    #[error("connection attempt already in progress")]
    AlreadyConnecting,

    /// Operation requires an active session.
    #[error("not connected")]
    NotConnected,

    /// Opening the transport failed.
    #[error("transport open failed: {0}")]
    TransportOpen(String),

    /// The device rejected our authentication (fatal NAK).
    #[error("authentication rejected by device: {code}")]
    Authentication {
        /// Reason code carried by the NAK (`bad_nonce` or `bad_hmac`).
        code: String,
    },

    /// Writing a command line failed; the session has been torn down.
    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),

    /// Other I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
