//! Password hashing via bcrypt.
//!
//! Hashes use the self-describing `$2b$<cost>$<salt+digest>` encoding, so the
//! cost used at verification time is always the one stored with the hash.
//! bcrypt's verify compares digests in constant time.

use super::AuthError;

/// Default bcrypt cost factor.
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Lowest and highest cost bcrypt accepts.
const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

/// bcrypt hasher with a tunable work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: DEFAULT_BCRYPT_COST,
        }
    }
}

impl PasswordHasher {
    /// Create a hasher with the given bcrypt cost (4..=31).
    pub fn new(cost: u32) -> Result<Self, AuthError> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(AuthError::InvalidInput(format!(
                "bcrypt cost must be between {MIN_COST} and {MAX_COST}, got {cost}"
            )));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        if password.is_empty() {
            return Err(AuthError::InvalidInput("password must not be empty".into()));
        }
        bcrypt::hash(password, self.cost)
            .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
    }

    /// Verify a password against a stored hash.
    ///
    /// A mismatch is `Ok(false)`. `Err` means the stored hash itself is
    /// unreadable.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        bcrypt::verify(password, hash)
            .map_err(|e| AuthError::Internal(format!("bcrypt verify: {e}")))
    }
}

/// Read the cost factor embedded in a bcrypt hash.
pub fn cost_of(hash: &str) -> Option<u32> {
    let mut parts = hash.split('$');
    // Leading empty segment, then the version tag.
    if !parts.next()?.is_empty() || parts.next()?.is_empty() {
        return None;
    }
    parts.next()?.parse().ok()
}
