//! Core traits for the drivelink transport seam.
//!
//! The session manager is the sole reader and writer of the underlying
//! byte stream; everything below that stream is abstracted behind
//! [`Transport`] so the same state machine runs over an RFCOMM socket,
//! a TCP stand-in, or an in-memory pipe in tests.

use std::future::Future;
use std::io;

use tokio::io::{AsyncBufRead, AsyncWrite};

/// A point-to-point, line-capable byte transport.
///
/// `open` yields the two halves of a connected stream. The read half is
/// buffered so the session can pull one `\n`-terminated line at a time;
/// the write half receives complete command lines. Closing either half
/// (by dropping it) must cause a blocked read on the peer to observe
/// end-of-stream.
///
/// Timeouts are the implementor's concern; the session layer blocks
/// indefinitely on reads by design.
pub trait Transport: Send + Sync + 'static {
    /// Buffered read half of an open stream.
    type Reader: AsyncBufRead + Unpin + Send + 'static;

    /// Write half of an open stream.
    type Writer: AsyncWrite + Unpin + Send + 'static;

    /// Open a connection to `target`.
    ///
    /// `target` is transport-specific (a Bluetooth address, a
    /// `host:port` pair, ...). Errors are surfaced to the caller as
    /// [`LinkError::TransportOpen`](crate::core::LinkError::TransportOpen);
    /// no retry is attempted by the session layer.
    fn open(
        &self,
        target: &str,
    ) -> impl Future<Output = io::Result<(Self::Reader, Self::Writer)>> + Send;

    /// Cancel any ambient device discovery.
    ///
    /// Called once after a successful `open`, before the greeting read.
    /// Discovery radio traffic degrades link throughput on shared
    /// adapters; transports without a discovery process keep the
    /// default no-op.
    fn cancel_discovery(&self) {}
}
