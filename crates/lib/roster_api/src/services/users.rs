//! Profile and user-management flows.
//!
//! Every function takes verified claims and checks the access policy before
//! touching the store.

use roster_core::auth::policy::Action;
use roster_core::models::auth::{NewUser, Role, TokenClaims, User, UserPatch};
use roster_core::validation;
use tracing::info;
use uuid::Uuid;

use super::auth::{hash_password, require, subject_id};
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{
    AdminUserUpdateRequest, CreateUserRequest, ProfileUpdateRequest, UserResponse,
};

fn to_response(user: impl Into<User>) -> UserResponse {
    UserResponse::from(user.into())
}

/// Parse a path id; an id that cannot exist is reported as a missing user.
fn parse_target(id: &str) -> AppResult<Uuid> {
    id.parse()
        .map_err(|_| AppError::NotFound("User not found".into()))
}

// ---------------------------------------------------------------------------
// Self-service
// ---------------------------------------------------------------------------

/// The caller's own record.
pub async fn get_profile(state: &AppState, claims: &TokenClaims) -> AppResult<UserResponse> {
    require(claims, Action::ReadOwnProfile, Some(&claims.sub))?;
    let id = subject_id(claims)?;
    let record = state.store.find_by_id(id).await?;
    Ok(to_response(record))
}

/// Change the caller's own name, email or password.
pub async fn update_profile(
    state: &AppState,
    claims: &TokenClaims,
    body: ProfileUpdateRequest,
) -> AppResult<UserResponse> {
    require(claims, Action::UpdateOwnProfile, Some(&claims.sub))?;
    let id = subject_id(claims)?;

    let mut patch = UserPatch {
        name: body.name.as_deref().map(validation::validate_name).transpose()?,
        email: body.email.as_deref().map(validation::validate_email).transpose()?,
        ..Default::default()
    };
    if let Some(password) = body.password.as_deref() {
        validation::validate_password(password)?;
        patch.password_hash = Some(hash_password(state, password).await?);
    }
    if patch.is_empty() {
        return Err(AppError::Validation(
            "At least one of name, email or password is required".into(),
        ));
    }

    let record = state.store.update(id, patch).await?;
    info!(user_id = %record.id, "profile updated");
    Ok(to_response(record))
}

// ---------------------------------------------------------------------------
// Administration
// ---------------------------------------------------------------------------

/// All users, newest first.
pub async fn list_users(state: &AppState, claims: &TokenClaims) -> AppResult<Vec<UserResponse>> {
    require(claims, Action::ListUsers, None)?;
    let records = state.store.list_all().await?;
    Ok(records.into_iter().map(to_response).collect())
}

/// Create an account on someone else's behalf.
pub async fn create_user(
    state: &AppState,
    claims: &TokenClaims,
    body: CreateUserRequest,
) -> AppResult<UserResponse> {
    require(claims, Action::CreateUser, None)?;

    let name = validation::validate_name(&body.name)?;
    let email = validation::validate_email(&body.email)?;
    validation::validate_password(&body.password)?;
    let password_hash = hash_password(state, &body.password).await?;

    let record = state
        .store
        .create(NewUser {
            email,
            name,
            password_hash,
            role: body.role.unwrap_or(Role::User),
        })
        .await?;
    info!(
        admin = %claims.sub,
        user_id = %record.id,
        role = %record.role,
        "user created by admin"
    );
    Ok(to_response(record))
}

/// Edit another user's name, email or role.
///
/// Role changes take effect in the store immediately, but tokens already
/// issued to that user keep their old role until they expire.
pub async fn update_user(
    state: &AppState,
    claims: &TokenClaims,
    id: &str,
    body: AdminUserUpdateRequest,
) -> AppResult<UserResponse> {
    if body.name.is_some() || body.email.is_some() {
        require(claims, Action::EditUser, Some(id))?;
    }
    if body.role.is_some() {
        require(claims, Action::ChangeRole, Some(id))?;
    }

    let patch = UserPatch {
        name: body.name.as_deref().map(validation::validate_name).transpose()?,
        email: body.email.as_deref().map(validation::validate_email).transpose()?,
        role: body.role,
        password_hash: None,
    };
    if patch.is_empty() {
        // Still admin-only, so an empty body never tells a non-admin anything.
        require(claims, Action::EditUser, Some(id))?;
        return Err(AppError::Validation(
            "At least one of name, email or role is required".into(),
        ));
    }

    let target = parse_target(id)?;
    let record = state.store.update(target, patch).await?;
    info!(admin = %claims.sub, user_id = %record.id, role = %record.role, "user updated by admin");
    Ok(to_response(record))
}

/// Remove a user.
pub async fn delete_user(state: &AppState, claims: &TokenClaims, id: &str) -> AppResult<()> {
    require(claims, Action::DeleteUser, Some(id))?;
    let target = parse_target(id)?;
    state.store.delete(target).await?;
    info!(admin = %claims.sub, user_id = %target, "user deleted");
    Ok(())
}
