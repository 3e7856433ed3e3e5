//! Request guard: `Authorization` header → verified claims.
//!
//! Every privileged operation passes through [`authenticate`] before the
//! access policy is consulted.

use thiserror::Error;

use super::jwt::{TokenCodec, Verification};
use crate::models::auth::TokenClaims;

/// Recognized authorization scheme prefix.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Why a request carried no usable identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("Missing authorization header")]
    MissingHeader,

    #[error("Invalid authorization scheme")]
    InvalidScheme,

    #[error("Invalid token")]
    Malformed,

    #[error("Token expired")]
    Expired,
}

/// Strip the bearer prefix from a raw header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix(BEARER_PREFIX).map(str::trim)
}

/// Verify the bearer token in `header` against `now` (unix seconds).
pub fn authenticate(
    header: Option<&str>,
    codec: &TokenCodec,
    now: i64,
) -> Result<TokenClaims, Rejected> {
    let header = header.ok_or(Rejected::MissingHeader)?;
    let token = bearer_token(header).ok_or(Rejected::InvalidScheme)?;
    match codec.verify(token, now) {
        Verification::Valid(claims) => Ok(claims),
        Verification::Malformed => Err(Rejected::Malformed),
        Verification::Expired => Err(Rejected::Expired),
    }
}
