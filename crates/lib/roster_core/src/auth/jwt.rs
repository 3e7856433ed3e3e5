//! JWT token generation and verification.
//!
//! Tokens are HS256 JWTs carrying the subject id and the role at issuance.
//! They are not stored server-side: a token stays valid until `exp` even if
//! the user's role changes in the meantime.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::{debug, info, warn};

use super::AuthError;
use crate::models::auth::{Role, TokenClaims};

/// Default token lifetime: 7 days.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Outcome of verifying a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Signature intact and not expired.
    Valid(TokenClaims),
    /// Unparsable, wrong algorithm, or signature mismatch.
    Malformed,
    /// Signature intact, but `now` is past `exp`.
    Expired,
}

/// Issues and verifies signed access tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec; `ttl_secs` must be positive.
    pub fn new(secret: &[u8], ttl_secs: i64) -> Result<Self, AuthError> {
        if ttl_secs <= 0 {
            return Err(AuthError::InvalidInput(format!(
                "token ttl must be positive, got {ttl_secs}"
            )));
        }
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller's clock in `verify`.
        validation.validate_exp = false;
        validation.required_spec_claims =
            HashSet::from(["exp".to_string(), "sub".to_string()]);
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl_secs,
        })
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Generate a signed JWT access token (HS256) expiring `ttl_secs` after `now`.
    pub fn issue(&self, subject_id: &str, role: Role, now: i64) -> Result<String, AuthError> {
        let exp = now.checked_add(self.ttl_secs).ok_or_else(|| {
            AuthError::TokenError(format!("expiry overflows: {now} + {}", self.ttl_secs))
        })?;
        let claims = TokenClaims {
            sub: subject_id.to_string(),
            role,
            iat: now,
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
    }

    /// Verify a token's signature, then its expiry against `now`.
    pub fn verify(&self, token: &str, now: i64) -> Verification {
        match decode::<TokenClaims>(token, &self.decoding, &self.validation) {
            Ok(data) if now <= data.claims.exp => Verification::Valid(data.claims),
            Ok(data) => {
                debug!(sub = %data.claims.sub, exp = data.claims.exp, now, "token expired");
                Verification::Expired
            }
            Err(e) => {
                debug!(error = %e, "token rejected");
                Verification::Malformed
            }
        }
    }
}

/// Read the claims of a token WITHOUT checking its signature or expiry.
///
/// Anyone can forge input that this function happily decodes. It exists for
/// cosmetic decisions only, such as which navigation links to render. Never
/// feed its result into [`super::policy::authorize`]; use
/// [`TokenCodec::verify`] for anything that grants access.
pub fn decode_unverified(token: &str) -> Option<TokenClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();
    decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .map(|data| data.claims)
}

/// Resolve the JWT secret: env var `JWT_SECRET` → `AUTH_SECRET` → persisted file.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    if let Ok(secret) = std::env::var("AUTH_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    load_or_create_secret(&jwt_secret_path())
}

/// Read the secret stored at `path`, generating and persisting a new one if
/// the file is missing or empty.
pub fn load_or_create_secret(path: &Path) -> String {
    if let Ok(existing) = std::fs::read_to_string(path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = path.parent()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        warn!(path = %parent.display(), error = %e, "could not create secret directory");
    }
    match std::fs::write(path, &secret) {
        Ok(()) => info!(path = %path.display(), "generated new JWT secret"),
        // Tokens still work for this process; they just won't survive a restart.
        Err(e) => warn!(path = %path.display(), error = %e, "could not persist JWT secret"),
    }
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("roster")
        .join("jwt-secret")
}
