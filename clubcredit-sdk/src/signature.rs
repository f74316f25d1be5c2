//! Session signing for the player API.
//!
//! Player dashboards identify themselves with two headers:
//!
//! ```text
//! Clubcredit-Player:    {player_id}
//! Clubcredit-Signature: {unix_timestamp}.{base64_signature}
//! ```
//!
//! where the signature is `HMAC-SHA256("{player_id}.{timestamp}", session_secret)`.
//! Staff dashboards send the plaintext staff secret in
//! `Clubcredit-Staff-Authorization`, verified server-side against an
//! argon2 hash.

/// Header name for the HMAC session signature.
pub const SIGNATURE_HEADER: &str = "Clubcredit-Signature";

/// Header name carrying the signed player id.
pub const PLAYER_HEADER: &str = "Clubcredit-Player";

/// Header name for staff API authentication (plaintext secret).
pub const STAFF_AUTH_HEADER: &str = "Clubcredit-Staff-Authorization";

/// Header name carrying the acting staff member's name, recorded as
/// `decidedBy` on decisions.
pub const STAFF_NAME_HEADER: &str = "Clubcredit-Staff-Name";

/// Maximum allowed age of a signature (in seconds).
pub const MAX_SIGNATURE_AGE: i64 = 5 * 60;

/// Errors produced by signature operations.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid header format")]
    InvalidFormat,
    #[error("invalid base64 encoding")]
    InvalidBase64,
    #[error("invalid signature")]
    SignatureMismatch,
    #[error("signature expired")]
    Expired,
}

impl From<ring::error::Unspecified> for SignatureError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

// ---------------------------------------------------------------------------
// Header parsing / formatting
// ---------------------------------------------------------------------------

/// Parse a `Clubcredit-Signature` header value (`{timestamp}.{base64}`) into
/// `(timestamp, raw_signature_bytes)`.
pub fn parse_signature_header(value: &str) -> Result<(i64, Box<[u8]>), SignatureError> {
    let (timestamp, signature) = value.split_once('.').ok_or(SignatureError::InvalidFormat)?;
    let timestamp: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::InvalidFormat)?;
    let signature_bytes = fast32::base64::RFC4648_NOPAD
        .decode_str(signature)
        .map_err(|_| SignatureError::InvalidBase64)?
        .into_boxed_slice();
    Ok((timestamp, signature_bytes))
}

/// Format a `{timestamp}.{base64}` header value from its parts.
pub fn format_signature_header(timestamp: i64, signature: &[u8]) -> String {
    format!(
        "{}.{}",
        timestamp,
        fast32::base64::RFC4648_NOPAD.encode(signature)
    )
}

/// Check that a signature timestamp is within [`MAX_SIGNATURE_AGE`].
pub fn check_timestamp(timestamp: i64) -> Result<(), SignatureError> {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    if now - timestamp > MAX_SIGNATURE_AGE {
        return Err(SignatureError::Expired);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Player session signing
// ---------------------------------------------------------------------------

/// Sign a player id at the current time.
///
/// Returns the formatted `Clubcredit-Signature` header value.
pub fn sign_player(player_id: &str, key: &[u8]) -> String {
    let timestamp = time::OffsetDateTime::now_utc().unix_timestamp();
    sign_player_at(player_id, timestamp, key)
}

/// Sign a player id with an explicit timestamp.
pub fn sign_player_at(player_id: &str, timestamp: i64, key: &[u8]) -> String {
    let data = format!("{player_id}.{timestamp}");
    let sig = ring::hmac::sign(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
        data.as_bytes(),
    );
    format_signature_header(timestamp, sig.as_ref())
}

/// Verify a signed player id.
///
/// Checks `HMAC-SHA256("{player_id}.{timestamp}", key)` and timestamp freshness.
pub fn verify_player(
    player_id: &str,
    timestamp: i64,
    signature: &[u8],
    key: &[u8],
) -> Result<(), SignatureError> {
    let data = format!("{player_id}.{timestamp}");
    ring::hmac::verify(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
        data.as_bytes(),
        signature,
    )?;
    check_timestamp(timestamp)?;
    Ok(())
}
