//! Session-cookie verification. Adapted from the teacher's app-id HMAC
//! scheme in `auth/middleware.rs` down to the one thing this crate needs:
//! proving a WebSocket connection belongs to `username`, the way the
//! original Django app relies on `self.scope["user"]` from its own signed
//! session cookie.

use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

pub const SESSION_COOKIE_NAME: &str = "session_user";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing session cookie")]
    Missing,
    #[error("malformed session cookie")]
    Malformed,
    #[error("session signature does not match")]
    BadSignature,
    #[error("session has expired")]
    Expired,
}

type HmacSha256 = Hmac<Sha256>;

/// Mint a `username|expires_at_rfc3339|signature` cookie value. Exposed for
/// tests and for whatever external login flow issues these cookies.
pub fn sign_session_cookie(secret: &[u8], username: &str, expires_at: DateTime<Utc>) -> String {
    let payload = format!("{}|{}", username, expires_at.to_rfc3339());
    let signature = sign(secret, &payload);
    format!("{}|{}", payload, signature)
}

/// Verify a cookie value and, on success, return the authenticated
/// username. Uses constant-time comparison on the signature to avoid
/// leaking timing information about how much of it matched.
pub fn verify_session_cookie(
    secret: &[u8],
    cookie_value: &str,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let mut parts = cookie_value.splitn(3, '|');
    let (Some(username), Some(expires_raw), Some(signature)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::Malformed);
    };

    let expires_at = DateTime::parse_from_rfc3339(expires_raw)
        .map_err(|_| AuthError::Malformed)?
        .with_timezone(&Utc);

    let payload = format!("{}|{}", username, expires_raw);
    let expected = sign(secret, &payload);
    if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
        return Err(AuthError::BadSignature);
    }

    if now > expires_at {
        return Err(AuthError::Expired);
    }

    Ok(username.to_string())
}

fn sign(secret: &[u8], payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(payload.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
