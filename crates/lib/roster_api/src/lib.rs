//! # roster_api
//!
//! HTTP API library for Roster.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use roster_core::auth::AuthError;
use roster_core::auth::jwt::TokenCodec;
use roster_core::auth::password::PasswordHasher;
use roster_core::store::UserStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{auth, health, nav, profile, users};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Credential store.
    pub store: Arc<dyn UserStore>,
    /// API configuration.
    pub config: ApiConfig,
    /// Token issuer/verifier built from `config.jwt_secret`.
    pub tokens: TokenCodec,
    /// Password hasher built from `config.bcrypt_cost`.
    pub hasher: PasswordHasher,
    /// Hash verified against when a login names an unknown email, so both
    /// failure paths cost one bcrypt round.
    pub dummy_hash: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn UserStore>, config: ApiConfig) -> Result<Self, AuthError> {
        let hasher = PasswordHasher::new(config.bcrypt_cost)?;
        let tokens = TokenCodec::new(config.jwt_secret.as_bytes(), config.token_ttl_secs)?;
        let dummy_hash = hasher.hash("roster-dummy-password")?.into();
        Ok(Self {
            store,
            config,
            tokens,
            hasher,
            dummy_hash,
        })
    }
}

/// Run embedded database migrations.
///
/// Delegates to `roster_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    roster_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/api/health", get(health::health_handler))
        .route("/api/login", post(auth::login_handler))
        .route("/api/register", post(auth::register_handler))
        .route("/api/nav", get(nav::nav_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(
            "/api/profile",
            get(profile::get_profile_handler).put(profile::update_profile_handler),
        )
        .route(
            "/api/users",
            get(users::list_users_handler).post(users::create_user_handler),
        )
        .route(
            "/api/users/{id}",
            patch(users::update_user_handler).delete(users::delete_user_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
