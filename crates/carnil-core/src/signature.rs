//! Webhook Signatures
//!
//! HMAC-SHA256 helpers used by the bundled clients. Two header formats are
//! accepted:
//!
//! - timestamped: `t=<unix>,v1=<hex>[,v1=<hex>...]`, signing `"<t>.<body>"`
//! - bare: `<hex>` signing the body alone
//!
//! Comparison goes through `Mac::verify_slice`, which is constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac(secret: &str) -> HmacSha256 {
    // HMAC accepts keys of any length
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size")
}

/// Bare hex signature of `payload`.
pub fn sign(payload: &str, secret: &str) -> String {
    let mut mac = mac(secret);
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Timestamped signature header for `payload`.
pub fn sign_with_timestamp(payload: &str, secret: &str, timestamp: i64) -> String {
    let signed = format!("{timestamp}.{payload}");
    format!("t={timestamp},v1={}", sign(&signed, secret))
}

/// Check `signature` against `payload`. Malformed headers are simply invalid.
pub fn verify(payload: &str, signature: &str, secret: &str) -> bool {
    let signature = signature.trim();
    if signature.is_empty() {
        return false;
    }

    if !signature.contains('=') {
        return matches_hex(payload.as_bytes(), signature, secret);
    }

    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in signature.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let Some(timestamp) = timestamp else {
        return false;
    };
    let signed = format!("{timestamp}.{payload}");
    candidates
        .into_iter()
        .any(|candidate| matches_hex(signed.as_bytes(), candidate, secret))
}

fn matches_hex(payload: &[u8], candidate: &str, secret: &str) -> bool {
    let Ok(expected) = hex::decode(candidate) else {
        return false;
    };
    let mut mac = mac(secret);
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}
