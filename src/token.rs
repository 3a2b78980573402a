//! Signed, time-stamped admin tokens.
//!
//! A token is the URL-safe base64 encoding of `username:issued_at:signature`,
//! where `signature` is the hex HMAC-SHA256 of `username:issued_at` under the
//! server secret. Verification recomputes the MAC and compares it in constant
//! time; an optional max age rejects stale tokens.

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Why a token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is not valid base64 or UTF-8")]
    Encoding,
    #[error("token does not have the form username:timestamp:signature")]
    Malformed,
    #[error("token signature does not match")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

/// Identity carried by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub username: String,
    /// Unix seconds.
    pub issued_at: i64,
}

/// Issues and verifies admin tokens.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    max_age: Option<Duration>,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>, max_age: Option<Duration>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            max_age,
        }
    }

    pub fn issue(&self, username: &str) -> String {
        self.issue_at(username, Utc::now().timestamp())
    }

    pub fn issue_at(&self, username: &str, issued_at: i64) -> String {
        let payload = format!("{username}:{issued_at}");
        let signature = hex::encode(self.mac(&payload).finalize().into_bytes());
        URL_SAFE.encode(format!("{payload}:{signature}"))
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Result<TokenClaims, TokenError> {
        let decoded = URL_SAFE
            .decode(token.trim())
            .map_err(|_| TokenError::Encoding)?;
        let decoded = String::from_utf8(decoded).map_err(|_| TokenError::Encoding)?;

        // The signature is hex and the timestamp numeric, so split from the
        // right; usernames themselves may not contain ':'.
        let mut parts = decoded.rsplitn(3, ':');
        let (signature, issued_at, username) = match (parts.next(), parts.next(), parts.next()) {
            (Some(s), Some(t), Some(u)) if !u.contains(':') => (s, t, u),
            _ => return Err(TokenError::Malformed),
        };
        let issued_at: i64 = issued_at.parse().map_err(|_| TokenError::Malformed)?;
        let signature = hex::decode(signature).map_err(|_| TokenError::Malformed)?;

        self.mac(&format!("{username}:{issued_at}"))
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        if let Some(max_age) = self.max_age {
            let age = now.saturating_sub(issued_at);
            if age < 0 || age as u64 > max_age.as_secs() {
                return Err(TokenError::Expired);
            }
        }

        Ok(TokenClaims {
            username: username.to_string(),
            issued_at,
        })
    }

    fn mac(&self, payload: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length");
        mac.update(payload.as_bytes());
        mac
    }
}
