//! Session token inspection
//!
//! Collector tokens are JWTs obtained over an authenticated channel, so the
//! signature is not re-verified here; only the embedded expiry claim is
//! inspected to decide whether a stored token can still be used.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;
use watchpost_domain::{Result, WatchpostError};

/// Claims carried by a collector session token.
#[derive(Debug, Deserialize)]
pub struct TokenClaims {
    /// Expiry as a unix timestamp
    pub exp: i64,
}

/// Decode the claims segment of a JWT without verifying its signature.
pub fn decode_claims(token: &str) -> Result<TokenClaims> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| WatchpostError::Auth("token is not a JWT".into()))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|err| WatchpostError::Auth(format!("token payload is not base64url: {err}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|err| WatchpostError::Auth(format!("token claims are malformed: {err}")))
}

/// Whether the token's expiry is strictly in the future.
///
/// A token that cannot be decoded counts as expired: the stored password
/// still stands, so a fresh login repairs the identity.
pub fn is_current(token: &str) -> bool {
    match decode_claims(token) {
        Ok(claims) => claims.exp > Utc::now().timestamp(),
        Err(err) => {
            warn!(error = %err, "stored token could not be decoded, treating as expired");
            false
        }
    }
}
