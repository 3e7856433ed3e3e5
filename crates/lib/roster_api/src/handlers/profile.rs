//! Profile request handlers.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{ProfileResponse, ProfileUpdateRequest};
use crate::services::users;

/// `GET /api/profile` — the caller's own record.
pub async fn get_profile_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<ProfileResponse>> {
    let user = users::get_profile(&state, &user.0).await?;
    Ok(Json(ProfileResponse { user }))
}

/// `PUT /api/profile` — change the caller's name, email or password.
pub async fn update_profile_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Result<Json<ProfileUpdateRequest>, JsonRejection>,
) -> AppResult<Json<ProfileResponse>> {
    let Json(body) = body?;
    let user = users::update_profile(&state, &user.0, body).await?;
    Ok(Json(ProfileResponse { user }))
}
