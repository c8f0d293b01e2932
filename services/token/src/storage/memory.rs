//! In-memory storage backend.
//!
//! Transactions are serialized: `begin` takes an exclusive lock on the
//! tables for the lifetime of the transaction. Writes go straight to the
//! locked tables and record the value they replaced in an undo log.
//! `commit` discards the log; dropping an uncommitted transaction replays
//! it in reverse. Nothing is copied up front, so a read-only transaction
//! costs only the lock.

use crate::error::StoreError;
use crate::storage::models::{Identity, RefreshTokenRecord};
use crate::storage::{CredentialStore, RefreshTokenStore, Storage, StoreTransaction};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    identities: HashMap<Uuid, Identity>,
    // Unique index: username -> identity id
    usernames: HashMap<String, Uuid>,
    refresh_tokens: HashMap<String, RefreshTokenRecord>,
    // Index: identity id -> tokens it owns
    tokens_by_owner: HashMap<Uuid, HashSet<String>>,
}

impl Tables {
    /// Replace the identity stored under `id`, keeping the username index
    /// in step. Returns the previous value.
    fn set_identity(&mut self, id: Uuid, value: Option<Identity>) -> Option<Identity> {
        let previous = self.identities.remove(&id);
        if let Some(previous) = &previous {
            self.usernames.remove(&previous.username);
        }
        if let Some(identity) = value {
            self.usernames.insert(identity.username.clone(), id);
            self.identities.insert(id, identity);
        }
        previous
    }

    /// Replace the record stored under `token`, keeping the owner index in
    /// step. Returns the previous value.
    fn set_refresh_token(
        &mut self,
        token: &str,
        value: Option<RefreshTokenRecord>,
    ) -> Option<RefreshTokenRecord> {
        let previous = self.refresh_tokens.remove(token);
        if let Some(previous) = &previous {
            if let Some(owned) = self.tokens_by_owner.get_mut(&previous.owner) {
                owned.remove(token);
                if owned.is_empty() {
                    self.tokens_by_owner.remove(&previous.owner);
                }
            }
        }
        if let Some(record) = value {
            self.tokens_by_owner
                .entry(record.owner)
                .or_default()
                .insert(token.to_owned());
            self.refresh_tokens.insert(token.to_owned(), record);
        }
        previous
    }

    fn owned_records(&self, owner: Uuid) -> impl Iterator<Item = &RefreshTokenRecord> {
        self.tokens_by_owner
            .get(&owner)
            .into_iter()
            .flatten()
            .filter_map(move |token| self.refresh_tokens.get(token))
    }
}

/// Storage backed by process memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed identities.
    pub async fn identity_count(&self) -> usize {
        self.tables.lock().await.identities.len()
    }

    /// Number of committed refresh records, revoked ones included.
    pub async fn refresh_token_count(&self) -> usize {
        self.tables.lock().await.refresh_tokens.len()
    }

    /// Committed refresh records owned by `identity_id`.
    pub async fn refresh_tokens_for(&self, identity_id: Uuid) -> Vec<RefreshTokenRecord> {
        self.tables
            .lock()
            .await
            .owned_records(identity_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        Ok(Box::new(MemoryTransaction {
            guard,
            undo: Vec::new(),
        }))
    }
}

// Value a write replaced, keyed by what it was stored under.
enum Undo {
    Identity(Uuid, Option<Identity>),
    RefreshToken(String, Option<RefreshTokenRecord>),
}

/// Open transaction on a [`MemoryStorage`].
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    undo: Vec<Undo>,
}

impl MemoryTransaction {
    fn set_identity(&mut self, id: Uuid, value: Option<Identity>) {
        let previous = self.guard.set_identity(id, value);
        self.undo.push(Undo::Identity(id, previous));
    }

    fn set_refresh_token(&mut self, token: &str, value: Option<RefreshTokenRecord>) {
        let previous = self.guard.set_refresh_token(token, value);
        self.undo.push(Undo::RefreshToken(token.to_owned(), previous));
    }

    fn delete_tokens(&mut self, tokens: Vec<String>) -> usize {
        for token in &tokens {
            self.set_refresh_token(token, None);
        }
        tokens.len()
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if self.undo.is_empty() {
            return;
        }
        debug!(writes = self.undo.len(), "Memory transaction rolled back");
        while let Some(entry) = self.undo.pop() {
            match entry {
                Undo::Identity(id, previous) => {
                    self.guard.set_identity(id, previous);
                }
                Undo::RefreshToken(token, previous) => {
                    self.guard.set_refresh_token(&token, previous);
                }
            }
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryTransaction {
    async fn exists_by_username(&mut self, username: &str) -> Result<bool, StoreError> {
        Ok(self.guard.usernames.contains_key(username))
    }

    async fn find_by_username(&mut self, username: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self
            .guard
            .usernames
            .get(username)
            .and_then(|id| self.guard.identities.get(id))
            .cloned())
    }

    async fn find_by_id(&mut self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        Ok(self.guard.identities.get(&id).cloned())
    }

    async fn save(&mut self, identity: &Identity) -> Result<(), StoreError> {
        if let Some(holder) = self.guard.usernames.get(&identity.username) {
            if *holder != identity.id {
                return Err(StoreError::DuplicateUsername(identity.username.clone()));
            }
        }

        self.set_identity(identity.id, Some(identity.clone()));
        Ok(())
    }

    async fn delete_identity(&mut self, id: Uuid) -> Result<bool, StoreError> {
        if !self.guard.identities.contains_key(&id) {
            return Ok(false);
        }

        self.set_identity(id, None);
        let owned = self
            .guard
            .owned_records(id)
            .map(|record| record.token.clone())
            .collect();
        self.delete_tokens(owned);
        Ok(true)
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryTransaction {
    async fn put(&mut self, record: RefreshTokenRecord) -> Result<(), StoreError> {
        if self.guard.refresh_tokens.contains_key(&record.token) {
            return Err(StoreError::DuplicateToken);
        }
        let token = record.token.clone();
        self.set_refresh_token(&token, Some(record));
        Ok(())
    }

    async fn find_by_token(&mut self, token: &str) -> Result<Option<RefreshTokenRecord>, StoreError> {
        Ok(self.guard.refresh_tokens.get(token).cloned())
    }

    async fn revoke(&mut self, token: &str) -> Result<(), StoreError> {
        let revoked = match self.guard.refresh_tokens.get(token) {
            Some(record) if !record.revoked => {
                let mut record = record.clone();
                record.revoke();
                record
            }
            _ => return Ok(()),
        };
        self.set_refresh_token(token, Some(revoked));
        Ok(())
    }

    async fn delete_all_for_identity(&mut self, identity_id: Uuid) -> Result<usize, StoreError> {
        let owned = self
            .guard
            .owned_records(identity_id)
            .map(|record| record.token.clone())
            .collect();
        Ok(self.delete_tokens(owned))
    }

    async fn delete_expired_for_identity(
        &mut self,
        identity_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let expired = self
            .guard
            .owned_records(identity_id)
            .filter(|record| record.is_expired_at(now))
            .map(|record| record.token.clone())
            .collect();
        Ok(self.delete_tokens(expired))
    }

    async fn delete_expired(&mut self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let expired = self
            .guard
            .refresh_tokens
            .values()
            .filter(|record| record.is_expired_at(now))
            .map(|record| record.token.clone())
            .collect();
        Ok(self.delete_tokens(expired))
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut tx = self;
        let writes = tx.undo.len();
        tx.undo.clear();
        debug!(writes, "Memory transaction committed");
        Ok(())
    }
}
