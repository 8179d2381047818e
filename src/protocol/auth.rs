//! HMAC-SHA256 authentication tags for V2 command lines.
//!
//! The tag is computed over a canonical `|`-separated base string that
//! covers every payload field, so tampering with any of them (including
//! sequence and timestamp) invalidates the line server-side. Tags travel
//! as lowercase hex. The shared secret is configured out of band on both
//! ends and never transmitted.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the lowercase-hex HMAC-SHA256 tag of `base` keyed by `secret`.
pub fn line_tag(secret: &str, base: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key size");
    mac.update(base.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a lowercase-hex tag against `base` in constant time.
///
/// Returns `false` for tags that are not valid hex.
pub fn verify_line_tag(secret: &str, base: &str, tag_hex: &str) -> bool {
    let Ok(tag) = hex::decode(tag_hex) else {
        return false;
    };
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key size");
    mac.update(base.as_bytes());
    mac.verify_slice(&tag).is_ok()
}
