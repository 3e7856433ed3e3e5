//! Navigation hints for clients.

use axum::Json;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use chrono::Utc;
use roster_core::auth::guard::bearer_token;
use roster_core::auth::jwt::decode_unverified;

use crate::models::NavResponse;

/// `GET /api/nav` — which links a client should show.
///
/// Reads the token with [`decode_unverified`]: the answer is cosmetic and
/// grants nothing. Every route behind it still verifies the token itself.
pub async fn nav_handler(headers: HeaderMap) -> Json<NavResponse> {
    let claims = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .and_then(decode_unverified)
        .filter(|c| c.exp >= Utc::now().timestamp());

    Json(NavResponse {
        authenticated: claims.is_some(),
        show_admin: claims.is_some_and(|c| c.is_admin()),
    })
}
