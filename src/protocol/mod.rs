//! Drivelink Protocol - Command Codec
//!
//! Pure encode/decode logic for the line-oriented wire protocol; no I/O
//! and no state beyond the caller-supplied shared secret.
//!
//! - **Greeting**: [`parse_server_hello`] / [`ServerHello`]
//! - **Drive commands**: [`encode_v1`], [`encode_v2`], [`parse_v2`]
//! - **Keepalive**: [`encode_ping`]
//! - **Acknowledgements**: [`parse_ack_or_nak`] / [`AckReply`]
//! - **Authentication tags**: [`line_tag`], [`verify_line_tag`]
//!
//! # Architecture
//!
//! The codec sits between the session manager and the raw line stream;
//! it is deliberately unaware of connection state:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          Session Manager                │
//! ├─────────────────────────────────────────┤
//! │          Command Codec                  │  ← This module
//! │   greeting, CMD2/PING2, ACK2/NAK2       │
//! ├─────────────────────────────────────────┤
//! │          Transport (line stream)        │
//! └─────────────────────────────────────────┘
//! ```

mod ack;
mod auth;
mod command;
mod hello;

pub use ack::{AckReply, NakCode, parse_ack_or_nak};
pub use auth::{line_tag, verify_line_tag};
pub use command::{
    CommandError, CommandFrame, encode_ping, encode_v1, encode_v2, float_to_int, int_to_float,
    parse_v2,
};
pub use hello::{ServerHello, parse_server_hello};
