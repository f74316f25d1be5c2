//! Custom Axum extractors for request authentication.
//!
//! Provides:
//! - `StaffAuth` verifies the `Clubcredit-Staff-Authorization` header against
//!   the argon2-hashed staff secret (used by the staff API).
//! - `PlayerSession` verifies the `Clubcredit-Signature` header over the
//!   `Clubcredit-Player` id and resolves the player's profile (used by the
//!   player API).
//!
//! All cryptographic operations are delegated to [`clubcredit_sdk::signature`].

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use clubcredit_core::directory::{PlayerDirectory, PlayerProfile};
use clubcredit_sdk::objects::PlayerId;
use clubcredit_sdk::signature::{
    self, PLAYER_HEADER, SIGNATURE_HEADER, STAFF_AUTH_HEADER, STAFF_NAME_HEADER, SignatureError,
};

use crate::state::AppState;

fn header<'a>(parts: &'a Parts, name: &str) -> Option<Result<&'a str, ()>> {
    parts
        .headers
        .get(name)
        .map(|value| value.to_str().map_err(|_| ()))
}

// ---------------------------------------------------------------------------
// StaffAuth: staff API authentication via shared secret
// ---------------------------------------------------------------------------

/// Name recorded as `decided_by` when the staff name header is absent.
const DEFAULT_STAFF_NAME: &str = "staff";

/// An authenticated staff member.
///
/// The secret is shared by the cashier and admin dashboards; the
/// `Clubcredit-Staff-Name` header only labels who made a decision.
pub struct StaffAuth {
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StaffAuthError {
    #[error("missing Clubcredit-Staff-Authorization header")]
    MissingHeader,
    #[error("invalid header encoding")]
    InvalidHeader,
    #[error("invalid staff secret")]
    InvalidSecret,
}

impl IntoResponse for StaffAuthError {
    fn into_response(self) -> Response {
        let status = match self {
            StaffAuthError::InvalidHeader => StatusCode::BAD_REQUEST,
            StaffAuthError::MissingHeader | StaffAuthError::InvalidSecret => {
                StatusCode::UNAUTHORIZED
            }
        };
        (status, self.to_string()).into_response()
    }
}

impl FromRequestParts<AppState> for StaffAuth {
    type Rejection = StaffAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let secret = header(parts, STAFF_AUTH_HEADER)
            .ok_or(StaffAuthError::MissingHeader)?
            .map_err(|_| StaffAuthError::InvalidHeader)?;

        let staff = state.config.staff().await;
        let verified = staff.verify_secret(secret);
        drop(staff);
        if !verified {
            tracing::warn!("Rejected staff request with invalid secret");
            return Err(StaffAuthError::InvalidSecret);
        }

        let name = match header(parts, STAFF_NAME_HEADER) {
            Some(Ok(name)) if !name.trim().is_empty() => name.trim().to_string(),
            Some(Err(())) => return Err(StaffAuthError::InvalidHeader),
            _ => DEFAULT_STAFF_NAME.to_string(),
        };
        Ok(StaffAuth { name })
    }
}

// ---------------------------------------------------------------------------
// PlayerSession: player API authentication via signed player id
// ---------------------------------------------------------------------------

/// An authenticated player.
///
/// # Header format
///
/// ```text
/// Clubcredit-Player:    p-1
/// Clubcredit-Signature: {unix_timestamp}.{base64_signature}
/// ```
///
/// The signature is computed as
/// `HMAC-SHA256("{player_id}.{timestamp}", session_secret)`.
pub struct PlayerSession {
    pub profile: PlayerProfile,
}

#[derive(Debug)]
pub enum PlayerSessionError {
    MissingPlayer,
    MissingSignature,
    InvalidHeader,
    InvalidBase64,
    SignatureMismatch,
    TimestampTooOld,
    UnknownPlayer,
}

impl From<SignatureError> for PlayerSessionError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::InvalidFormat => Self::InvalidHeader,
            SignatureError::InvalidBase64 => Self::InvalidBase64,
            SignatureError::SignatureMismatch => Self::SignatureMismatch,
            SignatureError::Expired => Self::TimestampTooOld,
        }
    }
}

impl IntoResponse for PlayerSessionError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            PlayerSessionError::MissingPlayer => {
                (StatusCode::UNAUTHORIZED, "missing Clubcredit-Player header")
            }
            PlayerSessionError::MissingSignature => {
                (StatusCode::UNAUTHORIZED, "missing Clubcredit-Signature header")
            }
            PlayerSessionError::InvalidHeader => (StatusCode::BAD_REQUEST, "invalid header format"),
            PlayerSessionError::InvalidBase64 => {
                (StatusCode::BAD_REQUEST, "invalid signature encoding")
            }
            PlayerSessionError::SignatureMismatch => {
                (StatusCode::UNAUTHORIZED, "signature verification failed")
            }
            PlayerSessionError::TimestampTooOld => (StatusCode::UNAUTHORIZED, "signature expired"),
            PlayerSessionError::UnknownPlayer => (StatusCode::FORBIDDEN, "unknown player"),
        };
        (status, message).into_response()
    }
}

impl FromRequestParts<AppState> for PlayerSession {
    type Rejection = PlayerSessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let player_id = header(parts, PLAYER_HEADER)
            .ok_or(PlayerSessionError::MissingPlayer)?
            .map_err(|_| PlayerSessionError::InvalidHeader)?;
        let sig_value = header(parts, SIGNATURE_HEADER)
            .ok_or(PlayerSessionError::MissingSignature)?
            .map_err(|_| PlayerSessionError::InvalidHeader)?;

        let (timestamp, signature_bytes) = signature::parse_signature_header(sig_value)?;

        let session = state.config.session().await;
        signature::verify_player(
            player_id,
            timestamp,
            &signature_bytes,
            session.secret_bytes(),
        )?;
        drop(session);

        let profile = state
            .directory
            .profile(&PlayerId::new(player_id))
            .await
            .ok_or(PlayerSessionError::UnknownPlayer)?;
        Ok(PlayerSession { profile })
    }
}
