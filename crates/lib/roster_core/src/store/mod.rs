//! Credential store.
//!
//! [`UserStore`] is the only shared mutable state in the system. Backends
//! must make the email-uniqueness check and the write a single atomic step.

mod memory;
mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::auth::{NewUser, UserPatch, UserRecord};

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("User not found")]
    NotFound,

    #[error("Email already registered")]
    EmailConflict,

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Lookup and mutation of credential records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact-match lookup by email.
    async fn find_by_email(&self, email: &str) -> Result<UserRecord, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<UserRecord, StoreError>;

    /// Insert a record, assigning its id and timestamps.
    async fn create(&self, new_user: NewUser) -> Result<UserRecord, StoreError>;

    /// Apply a partial update and refresh `updated_at`.
    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<UserRecord, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// All records, newest first.
    async fn list_all(&self) -> Result<Vec<UserRecord>, StoreError>;

    /// Whether the backend is reachable.
    async fn ping(&self) -> bool {
        true
    }
}
