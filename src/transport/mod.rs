//! Drivelink - Transports
//!
//! Concrete [`Transport`](crate::core::Transport) implementations. The
//! session layer is transport-agnostic; anything that can hand over a
//! buffered line-capable stream plugs in here. [`TcpTransport`] is the
//! bundled implementation, suitable both for development against a
//! device simulator and for serial-over-TCP bridges.

mod tcp;

pub use tcp::TcpTransport;
