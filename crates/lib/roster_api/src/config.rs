//! API server configuration.

use std::fmt;
use std::time::Duration;

use roster_core::auth::jwt::{DEFAULT_TOKEN_TTL_SECS, resolve_jwt_secret};
use roster_core::auth::password::DEFAULT_BCRYPT_COST;
use tracing::warn;

/// Default wall-clock budget for a single bcrypt hash or verify.
const DEFAULT_HASH_TIMEOUT_SECS: u64 = 10;

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    pub token_ttl_secs: i64,
    /// bcrypt work factor for new hashes.
    pub bcrypt_cost: u32,
    /// Upper bound on one password hash or verify.
    pub hash_timeout: Duration,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("pg_connection_url", &self.pg_connection_url)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("hash_timeout", &self.hash_timeout)
            .finish()
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

/// Parse `raw`, logging and falling back to `default` when it doesn't parse.
fn parse_or<T: std::str::FromStr>(key: &str, raw: &str, default: T) -> T {
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(key, value = raw, "unparsable value, using default");
            default
        }
    }
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable             | Default                              |
    /// |----------------------|--------------------------------------|
    /// | `BIND_ADDR`          | `127.0.0.1:3100`                     |
    /// | `DATABASE_URL`       | `postgres://localhost:5432/roster`   |
    /// | `JWT_SECRET` / `AUTH_SECRET` | generated & persisted to file |
    /// | `TOKEN_TTL_SECS`     | `604800` (7 days)                    |
    /// | `BCRYPT_COST`        | `10`                                 |
    /// | `HASH_TIMEOUT_SECS`  | `10`                                 |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3100".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/roster".into()),
            jwt_secret: resolve_jwt_secret(),
            token_ttl_secs: env_or("TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS),
            bcrypt_cost: env_or("BCRYPT_COST", DEFAULT_BCRYPT_COST),
            hash_timeout: Duration::from_secs(env_or(
                "HASH_TIMEOUT_SECS",
                DEFAULT_HASH_TIMEOUT_SECS,
            )),
        }
    }
}
