//! Storage traits for identities and refresh tokens.
//!
//! Every engine operation runs inside a [`StoreTransaction`] obtained from
//! [`Storage::begin`]. Writes become visible only on
//! [`StoreTransaction::commit`]; dropping a transaction rolls it back.

pub mod memory;
pub mod models;

pub use memory::MemoryStorage;
pub use models::{Identity, RefreshTokenRecord, Role};

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identity persistence.
#[async_trait]
pub trait CredentialStore: Send {
    /// True if an identity holds `username`.
    async fn exists_by_username(&mut self, username: &str) -> Result<bool, StoreError>;

    /// Look up an identity by username.
    async fn find_by_username(&mut self, username: &str) -> Result<Option<Identity>, StoreError>;

    /// Look up an identity by id.
    async fn find_by_id(&mut self, id: Uuid) -> Result<Option<Identity>, StoreError>;

    /// Insert or update by id.
    ///
    /// Fails with [`StoreError::DuplicateUsername`] if a different identity
    /// already holds the username.
    async fn save(&mut self, identity: &Identity) -> Result<(), StoreError>;

    /// Remove an identity and every refresh token it owns.
    async fn delete_identity(&mut self, id: Uuid) -> Result<bool, StoreError>;
}

/// Refresh token persistence.
#[async_trait]
pub trait RefreshTokenStore: Send {
    /// Insert; fails with [`StoreError::DuplicateToken`] if the token exists.
    async fn put(&mut self, record: RefreshTokenRecord) -> Result<(), StoreError>;

    /// Look up by token string.
    async fn find_by_token(&mut self, token: &str) -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// Mark revoked. No-op if absent or already revoked.
    async fn revoke(&mut self, token: &str) -> Result<(), StoreError>;

    /// Remove every record owned by `identity_id`, returning how many.
    async fn delete_all_for_identity(&mut self, identity_id: Uuid) -> Result<usize, StoreError>;

    /// Remove records owned by `identity_id` that expired at or before `now`,
    /// revoked or not. Returns how many.
    async fn delete_expired_for_identity(
        &mut self,
        identity_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError>;

    /// Remove every record that expired at or before `now`. Returns how many.
    async fn delete_expired(&mut self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}

/// A scoped unit of work over both stores.
#[async_trait]
pub trait StoreTransaction: CredentialStore + RefreshTokenStore {
    /// Publish all writes atomically.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Transactional storage backend.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Open a transaction.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;
}
