//! Signed bearer tokens and password hashing.
//!
//! A token is `base64url(claims json) "." hex(hmac-sha256(secret, payload))`.
//! Tokens are stateless: verification needs only the shared secret and the
//! clock.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use vt_core::{Error, Result, UserId};

type HmacSha256 = Hmac<Sha256>;

/// Identity carried by a verified token. Inserted into request extensions
/// by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub email: String,
    pub role: String,
    /// Expiry as a unix timestamp in seconds.
    pub exp: i64,
}

/// Issues and verifies tokens with one shared secret and a fixed lifetime.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Arc<[u8]>,
    ttl_secs: i64,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"[redacted]")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            secret: Arc::from(secret.as_bytes()),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| Error::Internal(format!("invalid signing key: {e}")))
    }

    /// Issue a token for a user, expiring `ttl_secs` from now.
    pub fn issue(&self, sub: UserId, email: &str, role: &str) -> Result<String> {
        let claims = Claims {
            sub,
            email: email.to_string(),
            role: role.to_string(),
            exp: Utc::now().timestamp().saturating_add(self.ttl_secs),
        };
        self.sign(&claims)
    }

    /// Sign arbitrary claims.
    pub fn sign(&self, claims: &Claims) -> Result<String> {
        let json = serde_json::to_vec(claims)
            .map_err(|e| Error::Internal(format!("failed to encode claims: {e}")))?;
        let payload = URL_SAFE_NO_PAD.encode(json);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    /// Verify a token's signature and expiry.
    ///
    /// Every failure is [`Error::Forbidden`]: the caller presented a
    /// credential, it just is not acceptable.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or_else(|| Error::Forbidden("Invalid or expired token".into()))?;

        let signature =
            hex::decode(signature).map_err(|_| Error::Forbidden("Invalid or expired token".into()))?;
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| Error::Forbidden("Invalid or expired token".into()))?;

        let claims: Claims = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|json| serde_json::from_slice(&json).ok())
            .ok_or_else(|| Error::Forbidden("Invalid or expired token".into()))?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(Error::Forbidden("Invalid or expired token".into()));
        }

        Ok(claims)
    }
}

/// Generate a random 32-byte hex secret.
pub fn generate_secret() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

/// Hash a password with bcrypt at the given cost.
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost).map_err(|e| Error::Internal(format!("bcrypt error: {e}")))
}

/// Check a password against a stored bcrypt hash. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}
