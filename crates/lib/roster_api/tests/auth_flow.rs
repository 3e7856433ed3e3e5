//! Integration tests — build the router over an in-memory store and drive it
//! end to end with `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use roster_api::{AppState, config::ApiConfig};
use roster_core::auth::jwt::TokenCodec;
use roster_core::auth::password::PasswordHasher;
use roster_core::models::auth::{NewUser, Role};
use roster_core::seed::ensure_admin;
use roster_core::store::{MemoryUserStore, UserStore};
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "test-secret";
const ADMIN_EMAIL: &str = "test@example.com";
const ADMIN_PASSWORD: &str = "password123";

struct TestApp {
    router: Router,
    store: Arc<MemoryUserStore>,
}

fn test_config() -> ApiConfig {
    ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        pg_connection_url: "postgres://unused".into(),
        jwt_secret: SECRET.into(),
        token_ttl_secs: 3600,
        bcrypt_cost: 4,
        hash_timeout: Duration::from_secs(30),
    }
}

async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

async fn spawn_app_with(config: ApiConfig) -> TestApp {
    let store = Arc::new(MemoryUserStore::new());
    ensure_admin(
        store.as_ref(),
        &PasswordHasher::new(4).unwrap(),
        ADMIN_EMAIL,
        "Test Admin",
        ADMIN_PASSWORD,
    )
    .await
    .expect("seed admin");
    let state = AppState::new(store.clone(), config).expect("app state");
    TestApp {
        router: roster_api::router(state),
        store,
    }
}

impl TestApp {
    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(req).await.expect("request");
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("parse JSON")
        };
        (status, json)
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> (StatusCode, Value) {
        self.call(
            "POST",
            "/api/register",
            None,
            Some(json!({"name": name, "email": email, "password": password})),
        )
        .await
    }

    async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.call(
            "POST",
            "/api/login",
            None,
            Some(json!({"email": email, "password": password})),
        )
        .await
    }

    async fn token_for(&self, email: &str, password: &str) -> String {
        let (status, body) = self.login(email, password).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().expect("token").to_string()
    }

    async fn admin_token(&self) -> String {
        self.token_for(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }
}

#[tokio::test]
async fn register_then_read_profile() {
    let app = spawn_app().await;

    let (status, body) = app.register("Ada", "ada@x.com", "Secret123").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["user"]["role"], "user");
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app.call("GET", "/api/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let user = &body["user"];
    assert_eq!(user["name"], "Ada");
    assert_eq!(user["email"], "ada@x.com");
    assert_eq!(user["role"], "user");
    assert!(user.get("password").is_none());
    assert!(user.get("passwordHash").is_none());
    assert!(!body.to_string().contains("$2"));
}

#[tokio::test]
async fn duplicate_registration_conflicts_and_keeps_original() {
    let app = spawn_app().await;
    app.register("Ada", "ada@x.com", "Secret123").await;
    let before = app.store.len().await;

    let (status, body) = app.register("Imposter", "ada@x.com", "Other456").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "email_conflict");
    assert_eq!(app.store.len().await, before);

    let original = app.store.find_by_email("ada@x.com").await.unwrap();
    assert_eq!(original.name, "Ada");
    let (status, _) = app.login("ada@x.com", "Secret123").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = spawn_app().await;
    app.register("Ada", "ada@x.com", "Secret123").await;

    let (wrong_pw_status, wrong_pw_body) = app.login("ada@x.com", "WrongPass1").await;
    let (no_user_status, no_user_body) = app.login("nobody@x.com", "Secret123").await;

    assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
    assert_eq!(no_user_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw_body, no_user_body);
    assert_eq!(wrong_pw_body["message"], "Invalid credentials");
}

#[tokio::test]
async fn login_returns_token_and_user_without_hash() {
    let app = spawn_app().await;
    app.register("Ada", "ada@x.com", "Secret123").await;

    let (status, body) = app.login("ada@x.com", "Secret123").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
    assert_eq!(body["expiresIn"], 3600);
    assert_eq!(body["user"]["email"], "ada@x.com");
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn role_change_requires_admin_and_is_visible_afterwards() {
    let app = spawn_app().await;
    let (_, ada) = app.register("Ada", "ada@x.com", "Secret123").await;
    let ada_token = ada["token"].as_str().unwrap().to_string();
    let ada_id = ada["user"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/users/{ada_id}");

    let (status, _) = app
        .call("PATCH", &uri, Some(&ada_token), Some(json!({"role": "admin"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.admin_token().await;
    let (status, body) = app
        .call("PATCH", &uri, Some(&admin), Some(json!({"role": "admin"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");

    let (status, list) = app.call("GET", "/api/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let entry = list
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["id"] == ada_id.as_str())
        .unwrap();
    assert_eq!(entry["role"], "admin");
}

#[tokio::test]
async fn promoted_user_keeps_old_role_until_reissued() {
    let app = spawn_app().await;
    let (_, ada) = app.register("Ada", "ada@x.com", "Secret123").await;
    let stale_token = ada["token"].as_str().unwrap().to_string();
    let ada_id = ada["user"]["id"].as_str().unwrap().to_string();

    let admin = app.admin_token().await;
    app.call(
        "PATCH",
        &format!("/api/users/{ada_id}"),
        Some(&admin),
        Some(json!({"role": "admin"})),
    )
    .await;

    let victim = format!("/api/users/{}", app.store.find_by_email(ADMIN_EMAIL).await.unwrap().id);
    let (status, _) = app.call("DELETE", &victim, Some(&stale_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let fresh = app.token_for("ada@x.com", "Secret123").await;
    let (status, _) = app
        .call("PATCH", &victim, Some(&fresh), Some(json!({"name": "Renamed Admin"})))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_need_a_valid_bearer_token() {
    let app = spawn_app().await;

    let (status, _) = app.call("GET", "/api/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/api/profile")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwdw==")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.call("GET", "/api/users", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let other_secret = TokenCodec::new(b"another-secret", 3600)
        .unwrap()
        .issue("someone", Role::Admin, Utc::now().timestamp())
        .unwrap();
    let (status, _) = app.call("GET", "/api/users", Some(&other_secret), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = spawn_app().await;
    let (_, ada) = app.register("Ada", "ada@x.com", "Secret123").await;
    let ada_id = ada["user"]["id"].as_str().unwrap();

    let expired = TokenCodec::new(SECRET.as_bytes(), 60)
        .unwrap()
        .issue(ada_id, Role::User, Utc::now().timestamp() - 3600)
        .unwrap();
    let (status, body) = app.call("GET", "/api/profile", Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn any_authenticated_user_can_list_users() {
    let app = spawn_app().await;
    let (_, ada) = app.register("Ada", "ada@x.com", "Secret123").await;
    app.register("Grace", "grace@x.com", "Secret123").await;
    let token = ada["token"].as_str().unwrap();

    let (status, list) = app.call("GET", "/api/users", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list[0]["email"], "grace@x.com");
    assert!(list.iter().all(|u| u.get("passwordHash").is_none()));
}

#[tokio::test]
async fn profile_update_changes_own_fields() {
    let app = spawn_app().await;
    let (_, ada) = app.register("Ada", "ada@x.com", "Secret123").await;
    let token = ada["token"].as_str().unwrap();

    let (status, body) = app
        .call(
            "PUT",
            "/api/profile",
            Some(token),
            Some(json!({"name": "Ada Lovelace", "password": "NewSecret9"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Ada Lovelace");
    assert_eq!(body["user"]["role"], "user");

    let (status, _) = app.login("ada@x.com", "Secret123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.login("ada@x.com", "NewSecret9").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn profile_update_email_conflict_is_bad_request() {
    let app = spawn_app().await;
    let (_, ada) = app.register("Ada", "ada@x.com", "Secret123").await;
    let token = ada["token"].as_str().unwrap();

    let (status, body) = app
        .call("PUT", "/api/profile", Some(token), Some(json!({"email": ADMIN_EMAIL})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "email_conflict");
    assert_eq!(
        app.store.find_by_email("ada@x.com").await.unwrap().name,
        "Ada"
    );
}

#[tokio::test]
async fn profile_update_cannot_change_role() {
    let app = spawn_app().await;
    let (_, ada) = app.register("Ada", "ada@x.com", "Secret123").await;
    let token = ada["token"].as_str().unwrap();

    let (status, _) = app
        .call("PUT", "/api/profile", Some(token), Some(json!({"role": "admin"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let record = app.store.find_by_email("ada@x.com").await.unwrap();
    assert_eq!(record.role, Role::User);
}

#[tokio::test]
async fn registration_validates_fields() {
    let app = spawn_app().await;

    let (status, body) = app.register("Ada", "not-an-email", "Secret123").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "email");

    let (status, body) = app.register("Ada", "ada@x.com", "123").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "password");

    let (status, body) = app.register("A", "ada@x.com", "Secret123").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "name");

    let (status, body) = app
        .call("POST", "/api/register", None, Some(json!({"email": "ada@x.com"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn admin_can_create_and_delete_users() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let (status, created) = app
        .call(
            "POST",
            "/api/users",
            Some(&admin),
            Some(json!({
                "name": "Grace",
                "email": "grace@x.com",
                "password": "Secret123",
                "role": "admin"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["role"], "admin");
    let uri = format!("/api/users/{}", created["id"].as_str().unwrap());

    let (status, _) = app.call("DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.call("DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn non_admin_cannot_create_edit_or_delete() {
    let app = spawn_app().await;
    let (_, ada) = app.register("Ada", "ada@x.com", "Secret123").await;
    let token = ada["token"].as_str().unwrap();
    let admin_id = app.store.find_by_email(ADMIN_EMAIL).await.unwrap().id;
    let uri = format!("/api/users/{admin_id}");

    let (status, _) = app
        .call(
            "POST",
            "/api/users",
            Some(token),
            Some(json!({"name": "Eve", "email": "eve@x.com", "password": "Secret123"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call("PATCH", &uri, Some(token), Some(json!({"name": "Pwned"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call("PATCH", &uri, Some(token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call("DELETE", &uri, Some(token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert_eq!(app.store.len().await, 2);
}

#[tokio::test]
async fn admin_patch_needs_at_least_one_field() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (_, ada) = app.register("Ada", "ada@x.com", "Secret123").await;
    let uri = format!("/api/users/{}", ada["user"]["id"].as_str().unwrap());

    let (status, body) = app.call("PATCH", &uri, Some(&admin), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn admin_patch_of_unknown_user_is_not_found() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let (status, _) = app
        .call(
            "PATCH",
            "/api/users/0190a4c8-0000-7000-8000-000000000000",
            Some(&admin),
            Some(json!({"name": "Nobody"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call("DELETE", "/api/users/not-a-uuid", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn nav_hints_follow_the_presented_token() {
    let app = spawn_app().await;

    let (status, body) = app.call("GET", "/api/nav", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"authenticated": false, "showAdmin": false}));

    let (_, ada) = app.register("Ada", "ada@x.com", "Secret123").await;
    let (_, body) = app
        .call("GET", "/api/nav", ada["token"].as_str(), None)
        .await;
    assert_eq!(body, json!({"authenticated": true, "showAdmin": false}));

    let admin = app.admin_token().await;
    let (_, body) = app.call("GET", "/api/nav", Some(&admin), None).await;
    assert_eq!(body, json!({"authenticated": true, "showAdmin": true}));
}

#[tokio::test]
async fn forged_admin_token_shows_links_but_grants_nothing() {
    let app = spawn_app().await;
    let forged = TokenCodec::new(b"attacker-secret", 3600)
        .unwrap()
        .issue("someone", Role::Admin, Utc::now().timestamp())
        .unwrap();

    let (_, body) = app.call("GET", "/api/nav", Some(&forged), None).await;
    assert_eq!(body["showAdmin"], true);

    let (status, _) = app.call("GET", "/api/users", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_reports_store_and_version() {
    let app = spawn_app().await;
    let (status, body) = app.call("GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storeConnected"], true);
    assert_eq!(body["version"], roster_core::version());
}

#[tokio::test]
async fn slow_hashing_is_reported_as_unavailable() {
    let app = spawn_app_with(ApiConfig {
        bcrypt_cost: 10,
        hash_timeout: Duration::from_millis(1),
        ..test_config()
    })
    .await;

    let (status, body) = app
        .register("Slow Sam", "sam@example.com", "password123")
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{body}");
    assert_eq!(body["error"], "unavailable");
}

#[tokio::test]
async fn corrupt_stored_hash_fails_login_with_generic_error() {
    let app = spawn_app().await;
    app.store
        .create(NewUser {
            email: "broken@example.com".into(),
            name: "Broken Hash".into(),
            password_hash: "not-a-bcrypt-hash".into(),
            role: Role::User,
        })
        .await
        .unwrap();

    let (status, body) = app.login("broken@example.com", "password123").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
    assert_eq!(body["message"], "Internal server error");
    assert!(!body.to_string().contains("bcrypt"));
}

#[tokio::test]
async fn non_positive_token_ttl_is_rejected_at_startup() {
    let store = Arc::new(MemoryUserStore::new());
    let config = ApiConfig {
        token_ttl_secs: 0,
        ..test_config()
    };
    assert!(AppState::new(store, config).is_err());
}
