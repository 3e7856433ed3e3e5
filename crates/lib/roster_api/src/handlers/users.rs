//! User administration handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{AdminUserUpdateRequest, CreateUserRequest, UserResponse};
use crate::services::users;

/// `GET /api/users` — list all users, newest first.
pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<Vec<UserResponse>>> {
    let list = users::list_users(&state, &user.0).await?;
    Ok(Json(list))
}

/// `POST /api/users` — admin creates an account.
pub async fn create_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let Json(body) = body?;
    let created = users::create_user(&state, &user.0, body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PATCH /api/users/{id}` — admin edits name, email or role.
pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    body: Result<Json<AdminUserUpdateRequest>, JsonRejection>,
) -> AppResult<Json<UserResponse>> {
    let Json(body) = body?;
    let updated = users::update_user(&state, &user.0, &id, body).await?;
    Ok(Json(updated))
}

/// `DELETE /api/users/{id}` — admin removes an account.
pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    users::delete_user(&state, &user.0, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
