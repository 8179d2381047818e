//! Protocol constants for the drivelink wire format.
//!
//! These values are fixed by the device firmware and MUST NOT be changed.

use std::time::Duration;

// =============================================================================
// LINE PREFIXES
// =============================================================================

/// Server greeting prefix (V2 devices emit this as their first line).
pub const HELLO_PREFIX: &str = "SRV:HELLO";

/// Unauthenticated drive command prefix.
pub const V1_PREFIX: &str = "V1:";

/// Authenticated drive command prefix.
pub const CMD2_PREFIX: &str = "CMD2:";

/// Authenticated keepalive prefix.
pub const PING2_PREFIX: &str = "PING2:";

/// Positive acknowledgement prefix.
pub const ACK2_PREFIX: &str = "ACK2:";

/// Negative acknowledgement prefix.
pub const NAK2_PREFIX: &str = "NAK2:";

// =============================================================================
// NUMERIC ENCODING
// =============================================================================

/// Fixed-point scale: power fractions in [-1.0, 1.0] map to
/// integers in [-POWER_SCALE, POWER_SCALE].
pub const POWER_SCALE: i32 = 1000;

/// V1 sequence numbers are masked to a non-negative 31-bit value.
pub const V1_SEQ_MASK: u64 = 0x7fff_ffff;

/// HMAC-SHA256 tag length as lowercase hex characters.
pub const TAG_HEX_LEN: usize = 64;

// =============================================================================
// PROTOCOL VERSIONS
// =============================================================================

/// Plaintext protocol version.
pub const VERSION_V1: u8 = 1;

/// Authenticated protocol version.
pub const VERSION_V2: u8 = 2;

// =============================================================================
// TIMING
// =============================================================================

/// Send a PING2 keepalive if no line was written for this long (V2 only).
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(5);

// =============================================================================
// INPUT SHAPING DEFAULTS
// =============================================================================

/// Default dead-zone radius in surface units.
pub const DEFAULT_DEAD_ZONE_RADIUS: f32 = 20.0;

/// Default expo blend factor (0 = linear, 1 = pure cubic).
pub const DEFAULT_EXPO_FACTOR: f32 = 0.4;
