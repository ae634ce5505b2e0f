//! Completion tokens: HMAC-SHA256 signed, time-bounded, self-contained.
//!
//! Validation never touches disk or network — the token carries its own
//! envelope, and a shared secret is enough to check it. The trade-off is
//! no revocation: an issued token stays valid for its whole TTL.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use std::collections::BTreeMap;

use crate::error::TokenError;

type HmacSha256 = Hmac<Sha256>;

pub const SECRET_LEN: usize = 32;
const MAC_LEN: usize = 32;
const SEPARATOR: u8 = b'.';

/// What gets signed. Fields are declared in sorted-key order and the
/// payload is a BTreeMap, so the compact JSON form of a given envelope is
/// byte-stable — required for reproducible signing.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    expires_at: DateTime<Utc>,
    issued_at: DateTime<Utc>,
    payload: BTreeMap<String, Value>,
}

/// Issues and validates signed tokens.
///
/// Holds only a TTL and a symmetric secret; no persisted state. An
/// auto-generated secret lives for the process lifetime only — callers
/// that need cross-restart verification must inject a stable one via
/// [`TokenAuthority::with_secret`].
pub struct TokenAuthority {
    ttl_seconds: i64,
    secret: [u8; SECRET_LEN],
}

impl TokenAuthority {
    pub fn new(ttl_seconds: i64) -> Self {
        let mut secret = [0u8; SECRET_LEN];
        OsRng.fill_bytes(&mut secret);
        Self::with_secret(ttl_seconds, secret)
    }

    pub fn with_secret(ttl_seconds: i64, secret: [u8; SECRET_LEN]) -> Self {
        Self {
            ttl_seconds,
            secret,
        }
    }

    /// Signs `payload` into an opaque ASCII token:
    /// `base64url(compact_json_envelope ++ b'.' ++ 32-byte MAC)`.
    pub fn issue(&self, payload: &BTreeMap<String, Value>) -> Result<String, TokenError> {
        let issued_at = Utc::now();
        let envelope = Envelope {
            expires_at: issued_at + Duration::seconds(self.ttl_seconds),
            issued_at,
            payload: payload.clone(),
        };
        let serialized = serde_json::to_vec(&envelope).map_err(TokenError::Envelope)?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| TokenError::InvalidSignature)?;
        mac.update(&serialized);
        let signature = mac.finalize().into_bytes();

        let mut blob = serialized;
        blob.push(SEPARATOR);
        blob.extend_from_slice(&signature);
        tracing::debug!(ttl_seconds = self.ttl_seconds, "issued token");
        Ok(URL_SAFE_NO_PAD.encode(blob))
    }

    /// Checks signature (constant-time) and expiry, returning the payload
    /// exactly as issued.
    pub fn validate(&self, token: &str) -> Result<BTreeMap<String, Value>, TokenError> {
        let decoded = URL_SAFE_NO_PAD.decode(token).map_err(|_| TokenError::Decode)?;

        // The MAC is raw bytes and may itself contain the separator, so
        // split at a fixed offset from the end rather than scanning.
        if decoded.len() <= MAC_LEN + 1 {
            return Err(TokenError::Decode);
        }
        let split = decoded.len() - MAC_LEN - 1;
        if decoded[split] != SEPARATOR {
            return Err(TokenError::Decode);
        }
        let (serialized, rest) = decoded.split_at(split);
        let signature = &rest[1..];

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| TokenError::InvalidSignature)?;
        mac.update(serialized);
        mac.verify_slice(signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let envelope: Envelope =
            serde_json::from_slice(serialized).map_err(|_| TokenError::Decode)?;
        if envelope.expires_at <= Utc::now() {
            return Err(TokenError::Expired(envelope.expires_at));
        }
        Ok(envelope.payload)
    }
}
