//! Authentication service — login/register flows delegating to `roster_core::auth`.

use chrono::Utc;
use roster_core::auth::AuthError;
use roster_core::auth::policy::{self, Action, Decision, DenyReason};
use roster_core::models::auth::{NewUser, Role, TokenClaims, User, UserRecord};
use roster_core::store::StoreError;
use roster_core::validation;
use tracing::{info, warn};
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{TokenResponse, UserResponse};

// ---------------------------------------------------------------------------
// Password hashing (off the async executor, under a deadline)
// ---------------------------------------------------------------------------

/// Run a bcrypt operation on the blocking pool, bounded by the configured
/// timeout. A timeout is transient: the caller should retry.
async fn run_hasher<T, F>(state: &AppState, op: F) -> AppResult<T>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    let task = tokio::task::spawn_blocking(op);
    match tokio::time::timeout(state.config.hash_timeout, task).await {
        Ok(Ok(result)) => result.map_err(AppError::from),
        Ok(Err(e)) => Err(AppError::Internal(format!("hash task failed: {e}"))),
        Err(_) => {
            warn!(timeout = ?state.config.hash_timeout, "password hashing timed out");
            Err(AppError::Unavailable(
                "Request timed out, please try again".into(),
            ))
        }
    }
}

/// Hash a password with the configured bcrypt cost.
pub async fn hash_password(state: &AppState, password: &str) -> AppResult<String> {
    let hasher = state.hasher;
    let password = password.to_owned();
    run_hasher(state, move || hasher.hash(&password)).await
}

/// Verify a password against a bcrypt hash.
pub async fn verify_password(state: &AppState, password: &str, hash: &str) -> AppResult<bool> {
    let hasher = state.hasher;
    let password = password.to_owned();
    let hash = hash.to_owned();
    run_hasher(state, move || hasher.verify(&password, &hash)).await
}

// ---------------------------------------------------------------------------
// Tokens and access checks
// ---------------------------------------------------------------------------

/// Issue a token for `record` and bundle it with the public user view.
fn build_token_response(state: &AppState, record: UserRecord) -> AppResult<TokenResponse> {
    let token = state
        .tokens
        .issue(&record.id.to_string(), record.role, Utc::now().timestamp())?;
    Ok(TokenResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.ttl_secs(),
        user: UserResponse::from(User::from(record)),
    })
}

/// Consult the access policy, mapping a denial to 401/403.
pub fn require(claims: &TokenClaims, action: Action, target_id: Option<&str>) -> AppResult<()> {
    match policy::authorize(Some(claims), action, target_id) {
        Decision::Allow => Ok(()),
        Decision::Deny(DenyReason::Unauthenticated) => {
            Err(AppError::Unauthorized("Authentication required".into()))
        }
        Decision::Deny(reason) => {
            warn!(sub = %claims.sub, action = action.as_str(), ?reason, "access denied");
            Err(AppError::Forbidden("Insufficient permissions".into()))
        }
    }
}

/// The caller's own record id, taken from verified claims.
pub fn subject_id(claims: &TokenClaims) -> AppResult<Uuid> {
    claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized("Invalid token".into()))
}

// ---------------------------------------------------------------------------
// Public auth operations
// ---------------------------------------------------------------------------

/// Authenticate with email + password.
///
/// Unknown email and wrong password produce the same error, and both paths
/// run one bcrypt verification.
pub async fn login(state: &AppState, email: &str, password: &str) -> AppResult<TokenResponse> {
    let email = validation::validate_email(email)?;
    if password.is_empty() {
        return Err(validation::ValidationError::new("password", "Password is required").into());
    }

    let record = match state.store.find_by_email(&email).await {
        Ok(record) => Some(record),
        Err(StoreError::NotFound) => None,
        Err(e) => return Err(e.into()),
    };

    let Some(record) = record else {
        verify_password(state, password, &state.dummy_hash).await?;
        info!(email = %email, "login failed");
        return Err(AuthError::CredentialError.into());
    };

    if !verify_password(state, password, &record.password_hash).await? {
        info!(email = %email, "login failed");
        return Err(AuthError::CredentialError.into());
    }

    info!(email = %email, user_id = %record.id, "login succeeded");
    build_token_response(state, record)
}

/// Register a new user account with the `user` role.
pub async fn register(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
) -> AppResult<TokenResponse> {
    let name = validation::validate_name(name)?;
    let email = validation::validate_email(email)?;
    validation::validate_password(password)?;

    let password_hash = hash_password(state, password).await?;

    let record = state
        .store
        .create(NewUser {
            email,
            name,
            password_hash,
            role: Role::User,
        })
        .await?;

    info!(email = %record.email, user_id = %record.id, "user registered");
    build_token_response(state, record)
}
