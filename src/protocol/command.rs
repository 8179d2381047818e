//! Outbound drive command encoding (V1 plaintext, V2 authenticated).
//!
//! Wire formats (one line per command, `\n`-terminated by the session):
//!
//! ```text
//! V1:<left:%.3f>;<right:%.3f>;<seq:uint31>
//! CMD2:<left_i>;<right_i>;<seq>;<ts_ms>;<sn_hex>;<hmac_hex>
//! PING2:<seq>;<ts_ms>;<sn_hex>;<hmac_hex>
//! ```
//!
//! HMAC base strings:
//!
//! ```text
//! CMD2|<left_i>|<right_i>|<seq>|<ts_ms>|<sn_hex>
//! PING2|<seq>|<ts_ms>|<sn_hex>
//! ```
//!
//! `left_i`/`right_i` are fixed-point integers in [-1000, 1000]. The
//! mapper guarantees fractions are already within [-1, 1]; the
//! fixed-point conversion clamps anyway so a corrupt caller can never
//! push an out-of-range value onto the wire.

use thiserror::Error;

use super::auth::{line_tag, verify_line_tag};
use crate::core::{CMD2_PREFIX, PING2_PREFIX, POWER_SCALE, V1_PREFIX, V1_SEQ_MASK};

/// Map a power fraction in [-1.0, 1.0] to an integer in
/// [-[`POWER_SCALE`], [`POWER_SCALE`]].
///
/// The mapping is linear, monotonic, and odd-symmetric:
/// `float_to_int(-x) == -float_to_int(x)` for every representable `x`
/// (rounding is half-away-from-zero). [`int_to_float`] is its inverse on
/// the fixed-point grid.
pub fn float_to_int(x: f32) -> i32 {
    let clamped = x.clamp(-1.0, 1.0);
    (clamped * POWER_SCALE as f32).round() as i32
}

/// Inverse of [`float_to_int`] on the fixed-point grid.
pub fn int_to_float(i: i32) -> f32 {
    i.clamp(-POWER_SCALE, POWER_SCALE) as f32 / POWER_SCALE as f32
}

/// Encode an unauthenticated V1 drive line.
///
/// `seq` is masked to a non-negative 31-bit value; it wraps rather than
/// ever going negative on the wire.
pub fn encode_v1(left: f32, right: f32, seq: u64) -> String {
    format!("{V1_PREFIX}{left:.3};{right:.3};{}", seq & V1_SEQ_MASK)
}

/// Encode an authenticated V2 drive line.
///
/// `nonce_hex` is the session nonce from the greeting; `ts_ms` is the
/// sender's wall-clock time in milliseconds. The tag covers the full
/// payload.
pub fn encode_v2(
    left: f32,
    right: f32,
    seq: u64,
    ts_ms: u64,
    nonce_hex: &str,
    secret: &str,
) -> String {
    let li = float_to_int(left);
    let ri = float_to_int(right);
    let base = format!("CMD2|{li}|{ri}|{seq}|{ts_ms}|{nonce_hex}");
    let tag = line_tag(secret, &base);
    format!("{CMD2_PREFIX}{li};{ri};{seq};{ts_ms};{nonce_hex};{tag}")
}

/// Encode an authenticated PING2 keepalive line.
///
/// Sent during idle periods so the device keeps observing fresh,
/// authenticated traffic for the session.
pub fn encode_ping(seq: u64, ts_ms: u64, nonce_hex: &str, secret: &str) -> String {
    let base = format!("PING2|{seq}|{ts_ms}|{nonce_hex}");
    let tag = line_tag(secret, &base);
    format!("{PING2_PREFIX}{seq};{ts_ms};{nonce_hex};{tag}")
}

/// A decoded, tag-verified V2 command payload.
///
/// Receiver-side counterpart of [`encode_v2`], used by the loop-back
/// tests and available to device-side implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    /// Left track power, fixed-point.
    pub left_int: i32,
    /// Right track power, fixed-point.
    pub right_int: i32,
    /// Sender sequence number.
    pub seq: u64,
    /// Sender wall-clock timestamp in milliseconds.
    pub ts_ms: u64,
    /// Session nonce echoed by the sender.
    pub nonce_hex: String,
}

impl CommandFrame {
    /// Left track power as a fraction.
    pub fn left(&self) -> f32 {
        int_to_float(self.left_int)
    }

    /// Right track power as a fraction.
    pub fn right(&self) -> f32 {
        int_to_float(self.right_int)
    }
}

/// V2 command decoding errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The line does not start with the CMD2 prefix.
    #[error("not a CMD2 line")]
    NotACommand,

    /// A payload field is missing or unparsable.
    #[error("malformed CMD2 field: {0}")]
    Malformed(String),

    /// The authentication tag does not match the payload.
    #[error("authentication tag mismatch")]
    TagMismatch,
}

/// Decode and verify a V2 command line.
pub fn parse_v2(line: &str, secret: &str) -> Result<CommandFrame, CommandError> {
    let body = line
        .trim()
        .strip_prefix(CMD2_PREFIX)
        .ok_or(CommandError::NotACommand)?;

    let fields: Vec<&str> = body.split(';').collect();
    if fields.len() != 6 {
        return Err(CommandError::Malformed(format!(
            "expected 6 fields, got {}",
            fields.len()
        )));
    }

    let left_int: i32 = fields[0]
        .parse()
        .map_err(|_| CommandError::Malformed("left".into()))?;
    let right_int: i32 = fields[1]
        .parse()
        .map_err(|_| CommandError::Malformed("right".into()))?;
    let seq: u64 = fields[2]
        .parse()
        .map_err(|_| CommandError::Malformed("seq".into()))?;
    let ts_ms: u64 = fields[3]
        .parse()
        .map_err(|_| CommandError::Malformed("ts_ms".into()))?;
    let nonce_hex = fields[4].to_string();
    let tag = fields[5];

    let base = format!("CMD2|{left_int}|{right_int}|{seq}|{ts_ms}|{nonce_hex}");
    if !verify_line_tag(secret, &base, tag) {
        return Err(CommandError::TagMismatch);
    }

    Ok(CommandFrame {
        left_int,
        right_int,
        seq,
        ts_ms,
        nonce_hex,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret";
    const NONCE: &str = "a1b2c3d4e5f60718";

    #[test]
    fn test_float_to_int_clamps_and_scales() {
        assert_eq!(float_to_int(0.0), 0);
        assert_eq!(float_to_int(1.0), 1000);
        assert_eq!(float_to_int(-1.0), -1000);
        assert_eq!(float_to_int(2.5), 1000);
        assert_eq!(float_to_int(-2.5), -1000);
        assert_eq!(float_to_int(0.5), 500);
        assert_eq!(float_to_int(-0.25), -250);
    }

    #[test]
    fn test_float_to_int_odd_symmetry() {
        for i in 0..=1000 {
            let x = i as f32 / 1000.0;
            assert_eq!(float_to_int(-x), -float_to_int(x), "x = {x}");
        }
    }

    #[test]
    fn test_fixed_point_round_trip_on_grid() {
        for i in -1000..=1000 {
            assert_eq!(float_to_int(int_to_float(i)), i, "i = {i}");
        }
    }

    #[test]
    fn test_encode_v1_format() {
        assert_eq!(encode_v1(0.5, -0.25, 7), "V1:0.500;-0.250;7");
        assert_eq!(encode_v1(0.0, 0.0, 1), "V1:0.000;0.000;1");
    }

    #[test]
    fn test_encode_v1_seq_mask() {
        // 2^31 wraps to 0, 2^31 + 5 to 5.
        assert_eq!(encode_v1(0.0, 0.0, 1 << 31), "V1:0.000;0.000;0");
        assert_eq!(encode_v1(0.0, 0.0, (1 << 31) + 5), "V1:0.000;0.000;5");
    }

    #[test]
    fn test_encode_parse_v2_round_trip() {
        let line = encode_v2(0.5, -0.25, 3, 1_700_000_000_123, NONCE, SECRET);
        let frame = parse_v2(&line, SECRET).unwrap();
        assert_eq!(frame.left_int, 500);
        assert_eq!(frame.right_int, -250);
        assert_eq!(frame.seq, 3);
        assert_eq!(frame.ts_ms, 1_700_000_000_123);
        assert_eq!(frame.nonce_hex, NONCE);
        assert_eq!(frame.left(), 0.5);
        assert_eq!(frame.right(), -0.25);
    }

    #[test]
    fn test_parse_v2_rejects_tampered_seq() {
        let line = encode_v2(0.5, -0.25, 3, 42, NONCE, SECRET);
        // Bump the sequence field without recomputing the tag.
        let tampered = line.replacen(";3;", ";4;", 1);
        assert_ne!(line, tampered);
        assert_eq!(parse_v2(&tampered, SECRET), Err(CommandError::TagMismatch));
    }

    #[test]
    fn test_parse_v2_rejects_wrong_secret() {
        let line = encode_v2(1.0, 1.0, 1, 42, NONCE, SECRET);
        assert_eq!(parse_v2(&line, "other"), Err(CommandError::TagMismatch));
    }

    #[test]
    fn test_parse_v2_rejects_garbage() {
        assert_eq!(parse_v2("hello", SECRET), Err(CommandError::NotACommand));
        assert!(matches!(
            parse_v2("CMD2:1;2;3", SECRET),
            Err(CommandError::Malformed(_))
        ));
        assert!(matches!(
            parse_v2("CMD2:x;2;3;4;ff;00", SECRET),
            Err(CommandError::Malformed(_))
        ));
    }

    #[test]
    fn test_ping_tag_verifies() {
        let line = encode_ping(9, 1234, NONCE, SECRET);
        let body = line.strip_prefix("PING2:").unwrap();
        let fields: Vec<&str> = body.split(';').collect();
        assert_eq!(fields.len(), 4);
        let base = format!("PING2|{}|{}|{}", fields[0], fields[1], fields[2]);
        assert!(super::verify_line_tag(SECRET, &base, fields[3]));
    }
}
