//! Server greeting parsing.
//!
//! V2 devices announce themselves with a single line before anything
//! else:
//!
//! ```text
//! SRV:HELLO ver=2 sn=<nonce_hex>
//! ```
//!
//! V1 devices emit no greeting at all, so the first received line may be
//! arbitrary application data. Parsing therefore fails soft: any line
//! that does not match the grammar yields a V1 greeting with no nonce.

use crate::core::{HELLO_PREFIX, VERSION_V1};

/// The parsed greeting, decoded once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    /// Protocol version advertised by the device.
    pub version: u8,
    /// Session nonce (present only for version 2).
    pub nonce_hex: Option<String>,
}

impl ServerHello {
    /// The greeting assumed when the line does not match the grammar.
    pub fn fallback_v1() -> Self {
        Self {
            version: VERSION_V1,
            nonce_hex: None,
        }
    }

    /// Whether this greeting selects the authenticated path.
    pub fn is_authenticated(&self) -> bool {
        self.version == crate::core::VERSION_V2 && self.nonce_hex.is_some()
    }
}

/// Parse a greeting line, falling back to V1 on any mismatch.
///
/// Accepted grammar: `SRV:HELLO ver=<n> sn=<hex>` where `<hex>` is a
/// non-empty ASCII hex token. A syntactically valid greeting with a
/// version other than 2 is returned as-is; the session only takes the
/// authenticated path for version 2 with a nonce.
pub fn parse_server_hello(line: &str) -> ServerHello {
    let trimmed = line.trim();
    if !trimmed.starts_with(HELLO_PREFIX) {
        return ServerHello::fallback_v1();
    }

    let mut parts = trimmed.split_whitespace();
    parts.next(); // HELLO_PREFIX token

    let Some(version) = parts
        .next()
        .and_then(|p| p.strip_prefix("ver="))
        .and_then(|v| v.parse::<u8>().ok())
    else {
        return ServerHello::fallback_v1();
    };

    let Some(nonce) = parts.next().and_then(|p| p.strip_prefix("sn=")) else {
        return ServerHello::fallback_v1();
    };
    if nonce.is_empty() || !nonce.chars().all(|c| c.is_ascii_hexdigit()) {
        return ServerHello::fallback_v1();
    }

    ServerHello {
        version,
        nonce_hex: Some(nonce.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_v2_hello() {
        let hello = parse_server_hello("SRV:HELLO ver=2 sn=a1b2c3d4");
        assert_eq!(hello.version, 2);
        assert_eq!(hello.nonce_hex.as_deref(), Some("a1b2c3d4"));
        assert!(hello.is_authenticated());
    }

    #[test]
    fn test_parse_tolerates_surrounding_whitespace() {
        let hello = parse_server_hello("  SRV:HELLO ver=2 sn=00ff  \r");
        assert_eq!(hello.nonce_hex.as_deref(), Some("00ff"));
    }

    #[test]
    fn test_garbage_falls_back_to_v1() {
        for line in ["", "hello world", "ACK2:1;ok", "SRV:HELLO", "SRV:HELLO ver=2"] {
            let hello = parse_server_hello(line);
            assert_eq!(hello, ServerHello::fallback_v1(), "line = {line:?}");
            assert!(!hello.is_authenticated());
        }
    }

    #[test]
    fn test_bad_version_falls_back_to_v1() {
        let hello = parse_server_hello("SRV:HELLO ver=banana sn=00ff");
        assert_eq!(hello, ServerHello::fallback_v1());
    }

    #[test]
    fn test_non_hex_nonce_falls_back_to_v1() {
        let hello = parse_server_hello("SRV:HELLO ver=2 sn=not-hex!");
        assert_eq!(hello, ServerHello::fallback_v1());
    }

    #[test]
    fn test_empty_nonce_falls_back_to_v1() {
        let hello = parse_server_hello("SRV:HELLO ver=2 sn=");
        assert_eq!(hello, ServerHello::fallback_v1());
    }

    #[test]
    fn test_other_version_is_not_authenticated() {
        // Grammar-valid but version 3: parsed as-is, V1 path chosen.
        let hello = parse_server_hello("SRV:HELLO ver=3 sn=00ff");
        assert_eq!(hello.version, 3);
        assert!(!hello.is_authenticated());
    }
}
