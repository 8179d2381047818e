//! # Drivelink
//!
//! Controller-side link for driving a differential-drive robot over a
//! line-oriented serial transport. It provides:
//!
//! - **Negotiation**: One greeting line selects plaintext (V1) or
//!   authenticated (V2) operation; unknown devices degrade to V1
//! - **Authentication**: Per-session nonce plus HMAC-SHA256 tags on
//!   every V2 line, with fatal/advisory rejection handling
//! - **Input shaping**: Dead zone, cubic expo blend, and differential
//!   mixing from a pointer-driven joystick surface
//! - **Robustness**: Latest-wins command coalescing, idle keepalives,
//!   and single-shot teardown on any session-ending condition
//!
//! ## Modules
//!
//! - [`core`](crate::core): Constants, error types, and the [`Transport`] seam
//! - [`protocol`]: Pure wire codec (greeting, commands, acknowledgements)
//! - [`mapper`]: Pure joystick math (clamping, shaping, mixing)
//! - [`session`]: The link session state machine and its tasks
//! - [`controller`]: Pointer-gesture glue on top of a session
//! - [`transport`]: Bundled [`Transport`] implementations
//!
//! ## Example Usage
//!
//! ```rust
//! use drivelink::prelude::*;
//!
//! // A 280px-wide drag surface centered at (160, 160).
//! let surface = JoystickConfig::new(Point::new(160.0, 160.0), 140.0);
//!
//! // A pointer far to the right of the disk: clamped to the boundary,
//! // mixed into a clockwise spin.
//! let knob = clamp_to_disk(Point::new(420.0, 160.0), surface.center, surface.max_radius);
//! assert!(knob.at_boundary);
//! let drive = compute_drive(knob.point, &surface);
//! assert!(drive.left > 0.0 && drive.right < 0.0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

// Core constants, errors, and the transport seam
pub mod core;

// Pure wire codec
pub mod protocol;

// Pure joystick math
pub mod mapper;

// Link session state machine
pub mod session;

// Pointer-gesture controller
pub mod controller;

// Bundled transports
pub mod transport;

/// Prelude module for convenient imports.
pub mod prelude {
    // Constants, errors, and the transport seam
    pub use crate::core::*;

    // Wire codec
    pub use crate::protocol::{
        AckReply, CommandError, CommandFrame, NakCode, ServerHello, encode_ping, encode_v1,
        encode_v2, float_to_int, int_to_float, line_tag, parse_ack_or_nak, parse_server_hello,
        parse_v2, verify_line_tag,
    };

    // Joystick math
    pub use crate::mapper::{
        DrivePair, JoystickConfig, KnobPosition, Point, clamp_to_disk, compute_drive, expo_shape,
    };

    // Session and controller
    pub use crate::controller::{DriveController, PointerOutcome};
    pub use crate::session::{
        LinkConfig, LinkEvent, LinkSession, LinkState, ProtocolVersion,
    };

    // Transports
    pub use crate::transport::TcpTransport;
}

// Re-export commonly used items at crate root
pub use controller::DriveController;
pub use crate::core::{LinkError, Transport};
pub use mapper::{DrivePair, JoystickConfig, Point};
pub use session::{LinkConfig, LinkEvent, LinkSession, LinkState, ProtocolVersion};
pub use transport::TcpTransport;
