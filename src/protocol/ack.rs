//! Acknowledgement parsing (ACK2 / NAK2).
//!
//! ```text
//! ACK2:<seq>;ok
//! NAK2:<seq>;code=<reason>
//! ```
//!
//! The device acknowledges every authenticated line. Only two reason
//! codes are fatal for the session (`bad_nonce`, `bad_hmac`); everything
//! else — including `old_seq` from a reordered command — is logged and
//! ignored so transient noise never tears the link down.

use std::fmt;

use crate::core::{ACK2_PREFIX, NAK2_PREFIX};

/// Reason code carried by a NAK2 line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NakCode {
    /// The echoed session nonce did not match the device's session.
    BadNonce,
    /// The authentication tag failed verification.
    BadHmac,
    /// The sequence number was not newer than the last accepted one.
    OldSeq,
    /// Any other reason code (forward compatibility).
    Other(String),
}

impl NakCode {
    /// Whether this code terminates the session.
    ///
    /// The mapping is fixed by the protocol: authentication failures are
    /// fatal, everything else is advisory.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::BadNonce | Self::BadHmac)
    }

    fn from_wire(code: &str) -> Self {
        match code {
            "bad_nonce" => Self::BadNonce,
            "bad_hmac" => Self::BadHmac,
            "old_seq" => Self::OldSeq,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for NakCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadNonce => f.write_str("bad_nonce"),
            Self::BadHmac => f.write_str("bad_hmac"),
            Self::OldSeq => f.write_str("old_seq"),
            Self::Other(code) => f.write_str(code),
        }
    }
}

/// A parsed acknowledgement line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckReply {
    /// Positive acknowledgement for `seq`.
    Ack {
        /// Acknowledged sequence number.
        seq: u64,
    },
    /// Negative acknowledgement for `seq` with a reason code.
    Nak {
        /// Rejected sequence number.
        seq: u64,
        /// Reason the line was rejected.
        code: NakCode,
    },
}

/// Parse an ACK2/NAK2 line.
///
/// Returns `None` for anything else; the read loop treats unrecognized
/// lines as ignorable noise rather than an error.
pub fn parse_ack_or_nak(line: &str) -> Option<AckReply> {
    let trimmed = line.trim();

    if let Some(body) = trimmed.strip_prefix(ACK2_PREFIX) {
        let seq_str = body.split(';').next().unwrap_or(body);
        let seq = seq_str.parse().ok()?;
        return Some(AckReply::Ack { seq });
    }

    if let Some(body) = trimmed.strip_prefix(NAK2_PREFIX) {
        let seq_str = body.split(';').next().unwrap_or(body);
        let seq = seq_str.parse().ok()?;
        let code = body
            .split_once("code=")
            .map(|(_, c)| c)
            .filter(|c| !c.is_empty())
            .unwrap_or("unknown");
        return Some(AckReply::Nak {
            seq,
            code: NakCode::from_wire(code),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ack() {
        assert_eq!(parse_ack_or_nak("ACK2:42;ok"), Some(AckReply::Ack { seq: 42 }));
    }

    #[test]
    fn test_parse_nak_fatal_codes() {
        let nak = parse_ack_or_nak("NAK2:7;code=bad_hmac").unwrap();
        assert_eq!(
            nak,
            AckReply::Nak {
                seq: 7,
                code: NakCode::BadHmac
            }
        );
        let AckReply::Nak { code, .. } = parse_ack_or_nak("NAK2:8;code=bad_nonce").unwrap()
        else {
            panic!("expected NAK");
        };
        assert!(code.is_fatal());
    }

    #[test]
    fn test_parse_nak_non_fatal_codes() {
        let AckReply::Nak { code, .. } = parse_ack_or_nak("NAK2:9;code=old_seq").unwrap()
        else {
            panic!("expected NAK");
        };
        assert_eq!(code, NakCode::OldSeq);
        assert!(!code.is_fatal());

        let AckReply::Nak { code, .. } =
            parse_ack_or_nak("NAK2:10;code=throttled").unwrap()
        else {
            panic!("expected NAK");
        };
        assert_eq!(code, NakCode::Other("throttled".to_string()));
        assert!(!code.is_fatal());
    }

    #[test]
    fn test_parse_nak_missing_code() {
        let AckReply::Nak { code, .. } = parse_ack_or_nak("NAK2:11;").unwrap() else {
            panic!("expected NAK");
        };
        assert_eq!(code, NakCode::Other("unknown".to_string()));
    }

    #[test]
    fn test_noise_is_ignored() {
        assert_eq!(parse_ack_or_nak(""), None);
        assert_eq!(parse_ack_or_nak("SRV:HELLO ver=2 sn=00"), None);
        assert_eq!(parse_ack_or_nak("ACK2:notanumber;ok"), None);
        assert_eq!(parse_ack_or_nak("garbage line"), None);
    }
}
