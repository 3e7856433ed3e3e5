//! Authentication and authorization logic.
//!
//! Password hashing, bearer token issuance/verification, the access policy and
//! the request guard that ties token verification to incoming headers.

pub mod guard;
pub mod jwt;
pub mod password;
pub mod policy;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    CredentialError,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
