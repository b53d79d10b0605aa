//! Session Token
//!
//! Cookie value format: `{session_uuid}.{base64url(HMAC-SHA256(session_uuid))}`.
//! The signature lets forged or mangled cookies be rejected without a
//! database round trip.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use kernel::id::SessionId;
use sha2::Sha256;
use uuid::Uuid;

use crate::error::{AccountsError, AccountsResult};

type HmacSha256 = Hmac<Sha256>;

fn mac(secret: &[u8; 32]) -> AccountsResult<HmacSha256> {
    HmacSha256::new_from_slice(secret).map_err(|e| AccountsError::Internal(e.to_string()))
}

/// Generate signed session token
///
/// ## Arguments
/// * `secret` - 32-byte HMAC-SHA256 key
/// * `session_id` - Id of the stored session
///
/// ## Returns
/// `"{session_id}.{base64url(hmac)}"`, the value of the session cookie
pub fn sign(secret: &[u8; 32], session_id: &SessionId) -> AccountsResult<String> {
    let session_id = session_id.to_string();

    let mut mac = mac(secret)?;
    mac.update(session_id.as_bytes());
    let signature = mac.finalize().into_bytes();

    Ok(format!("{}.{}", session_id, URL_SAFE_NO_PAD.encode(signature)))
}

/// Verify a token and return the session id it carries
///
/// Any malformed or forged token yields `None`.
pub fn verify(secret: &[u8; 32], token: &str) -> Option<SessionId> {
    let (session_id_str, signature_b64) = token.split_once('.')?;

    let signature = URL_SAFE_NO_PAD.decode(signature_b64).ok()?;

    let mut mac = mac(secret).ok()?;
    mac.update(session_id_str.as_bytes());
    mac.verify_slice(&signature).ok()?;

    session_id_str.parse::<Uuid>().ok().map(SessionId::from_uuid)
}
