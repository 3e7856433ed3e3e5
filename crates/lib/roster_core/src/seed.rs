//! Bootstrap admin account.

use thiserror::Error;
use tracing::info;

use crate::auth::AuthError;
use crate::auth::password::PasswordHasher;
use crate::models::auth::{NewUser, Role, UserPatch, UserRecord};
use crate::store::{StoreError, UserStore};
use crate::validation::{self, ValidationError};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Make sure an admin account exists for `email`.
///
/// An existing account is promoted to admin; its name and password are left
/// alone. Otherwise a new admin account is created.
pub async fn ensure_admin(
    store: &dyn UserStore,
    hasher: &PasswordHasher,
    email: &str,
    name: &str,
    password: &str,
) -> Result<UserRecord, SeedError> {
    let email = validation::validate_email(email)?;

    match store.find_by_email(&email).await {
        Ok(existing) if existing.role.is_admin() => Ok(existing),
        Ok(existing) => {
            let patch = UserPatch {
                role: Some(Role::Admin),
                ..Default::default()
            };
            let promoted = store.update(existing.id, patch).await?;
            info!(email = %promoted.email, "promoted seed account to admin");
            Ok(promoted)
        }
        Err(StoreError::NotFound) => {
            let name = validation::validate_name(name)?;
            validation::validate_password(password)?;
            let created = store
                .create(NewUser {
                    email,
                    name,
                    password_hash: hasher.hash(password)?,
                    role: Role::Admin,
                })
                .await?;
            info!(email = %created.email, "created seed admin account");
            Ok(created)
        }
        Err(e) => Err(e.into()),
    }
}
