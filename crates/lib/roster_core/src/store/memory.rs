//! In-memory [`UserStore`] for development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, UserStore};
use crate::models::auth::{NewUser, UserPatch, UserRecord};
use crate::uuid::uuidv7;

/// [`UserStore`] holding records in a map behind a single lock.
///
/// Writers hold the write lock across the email check and the write, so two
/// concurrent creates with the same email cannot both succeed.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

fn email_taken(users: &HashMap<Uuid, UserRecord>, email: &str, except: Option<Uuid>) -> bool {
    users
        .values()
        .any(|u| u.email == email && Some(u.id) != except)
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<UserRecord, StoreError> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<UserRecord, StoreError> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, new_user: NewUser) -> Result<UserRecord, StoreError> {
        let mut users = self.users.write().await;
        if email_taken(&users, &new_user.email, None) {
            return Err(StoreError::EmailConflict);
        }
        let now = Utc::now();
        let record = UserRecord {
            id: uuidv7(),
            email: new_user.email,
            name: new_user.name,
            password_hash: new_user.password_hash,
            role: new_user.role,
            created_at: now,
            updated_at: now,
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<UserRecord, StoreError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        if let Some(email) = &patch.email
            && email_taken(&users, email, Some(id))
        {
            return Err(StoreError::EmailConflict);
        }
        let record = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        patch.apply(record, Utc::now());
        Ok(record.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn list_all(&self) -> Result<Vec<UserRecord>, StoreError> {
        let mut all: Vec<UserRecord> = self.users.read().await.values().cloned().collect();
        // UUIDv7 ids break ties between records created in the same instant.
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(all)
    }
}
