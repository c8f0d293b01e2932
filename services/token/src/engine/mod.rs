//! Authentication engine: signup, login, refresh rotation, logout and
//! request authentication.
//!
//! The engine keeps no mutable state between calls. Each operation opens
//! its own storage transaction and either commits it or lets it roll back
//! on drop, so every exit path leaves storage consistent.

pub mod pair;

pub use pair::{BEARER, Principal, TokenPair};

use crate::config::Config;
use crate::error::AuthError;
use crate::jwt::{TokenCodec, TokenKind};
use crate::password::{Argon2Hasher, PasswordHasher};
use crate::storage::{
    CredentialStore, Identity, RefreshTokenRecord, RefreshTokenStore, Storage, StoreTransaction,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

// Verified against when the username is unknown, so both login failure
// paths cost one hash verification.
const DUMMY_PASSWORD: &str = "dummy-password-for-unknown-users";

/// Orchestrates the token lifecycle over injected collaborators.
pub struct AuthEngine {
    storage: Arc<dyn Storage>,
    hasher: Arc<dyn PasswordHasher>,
    codec: TokenCodec,
    access_token_validity: Duration,
    refresh_token_validity: Duration,
    refresh_record_validity: chrono::Duration,
    dummy_hash: String,
}

impl AuthEngine {
    /// Create an engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh validity does not fit a timestamp
    /// offset or the hasher fails.
    pub fn new(
        config: &Config,
        storage: Arc<dyn Storage>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Result<Self, AuthError> {
        let refresh_record_validity = chrono::Duration::from_std(config.refresh_token_validity)
            .map_err(|e| AuthError::config(format!("Refresh token validity out of range: {}", e)))?;
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;

        info!(
            access_validity_secs = config.access_token_validity.as_secs(),
            refresh_validity_secs = config.refresh_token_validity.as_secs(),
            "Auth engine initialized"
        );

        Ok(Self {
            storage,
            hasher,
            codec: TokenCodec::new(&config.signing_key),
            access_token_validity: config.access_token_validity,
            refresh_token_validity: config.refresh_token_validity,
            refresh_record_validity,
            dummy_hash,
        })
    }

    /// Create an engine that hashes passwords with Argon2id.
    ///
    /// # Errors
    ///
    /// Same as [`AuthEngine::new`], plus invalid Argon2 parameters.
    pub fn with_argon2(config: &Config, storage: Arc<dyn Storage>) -> Result<Self, AuthError> {
        let hasher = Arc::new(Argon2Hasher::new(&config.password)?);
        Self::new(config, storage, hasher)
    }

    /// The codec tokens are issued and verified with.
    #[must_use]
    pub const fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Register a new identity with the default role. Issues no tokens.
    pub async fn signup(&self, username: &str, password: &str) -> Result<(), AuthError> {
        require_not_blank("username", username)?;
        require_not_blank("password", password)?;

        {
            let mut tx = self.storage.begin().await?;
            if tx.exists_by_username(username).await? {
                warn!(username = %username, "Signup rejected: username taken");
                return Err(AuthError::UsernameTaken);
            }
        }

        let password_hash = self.hash_password(password).await?;
        let identity = Identity::new(username, password_hash);

        // The pre-check above can race with a concurrent signup; the
        // storage-level uniqueness check is authoritative.
        let mut tx = self.storage.begin().await?;
        if let Err(err) = tx.save(&identity).await {
            warn!(username = %username, error = %err, "Signup rejected at storage");
            return Err(err.into());
        }
        tx.commit().await?;

        info!(username = %username, identity_id = %identity.id, "Identity registered");
        Ok(())
    }

    /// Authenticate credentials and issue a token pair.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        let identity = {
            let mut tx = self.storage.begin().await?;
            tx.find_by_username(username).await?
        };

        let digest = identity
            .as_ref()
            .map_or_else(|| self.dummy_hash.clone(), |i| i.password_hash.clone());
        let password_matches = self.verify_password(password, digest).await?;

        let identity = match identity {
            Some(identity) if password_matches => identity,
            _ => {
                warn!(username = %username, "Login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let now = Utc::now();
        let mut tx = self.storage.begin().await?;
        // Re-read inside the write transaction; the identity may be gone.
        let identity = tx
            .find_by_id(identity.id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let purged = tx.delete_expired_for_identity(identity.id, now).await?;
        if purged > 0 {
            debug!(identity_id = %identity.id, purged, "Purged expired refresh tokens");
        }
        let pair = self.issue_token_pair(&mut *tx, &identity, now).await?;
        tx.commit().await?;

        info!(username = %identity.username, identity_id = %identity.id, "Login succeeded");
        Ok(pair)
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// Rotation deletes every refresh token the owner holds, not only the
    /// presented one. Lookup, validation, deletion and the new insert run
    /// in one transaction, so a token can be exchanged at most once.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let mut tx = self.storage.begin().await?;

        let Some(record) = tx.find_by_token(refresh_token).await? else {
            warn!("Refresh rejected: unknown token");
            return Err(AuthError::InvalidRefreshToken);
        };

        if !record.is_active_at(now) {
            warn!(
                identity_id = %record.owner,
                revoked = record.revoked,
                expires_at = %record.expires_at,
                "Refresh rejected: expired or revoked"
            );
            return Err(AuthError::ExpiredOrRevoked);
        }

        let Some(identity) = tx.find_by_id(record.owner).await? else {
            warn!(identity_id = %record.owner, "Refresh rejected: owner no longer exists");
            return Err(AuthError::InvalidRefreshToken);
        };

        let invalidated = tx.delete_all_for_identity(identity.id).await?;
        let pair = self.issue_token_pair(&mut *tx, &identity, now).await?;
        tx.commit().await?;

        info!(
            username = %identity.username,
            identity_id = %identity.id,
            invalidated,
            "Rotated refresh token"
        );
        Ok(pair)
    }

    /// Revoke a refresh token.
    ///
    /// Unknown tokens are ignored and still succeed: logout is idempotent
    /// and never reveals whether a token existed.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let mut tx = self.storage.begin().await?;

        match tx.find_by_token(refresh_token).await? {
            Some(record) => {
                tx.revoke(refresh_token).await?;
                tx.commit().await?;
                info!(identity_id = %record.owner, "Refresh token revoked");
            }
            None => debug!("Logout with unknown refresh token ignored"),
        }
        Ok(())
    }

    /// Resolve an access token to the identity it was issued for.
    ///
    /// Only access tokens are accepted; a refresh token fails with
    /// [`VerificationError::WrongTokenType`](crate::error::VerificationError::WrongTokenType).
    /// Any verification failure leaves the request unauthenticated; there is
    /// no refresh on the fly.
    pub async fn authenticate_request(&self, access_token: &str) -> Result<Principal, AuthError> {
        let verified = self
            .codec
            .verify_as(access_token, TokenKind::Access)
            .map_err(|err| {
                debug!(error = %err, "Access token rejected");
                AuthError::Token(err)
            })?;

        let mut tx = self.storage.begin().await?;
        let Some(identity) = tx.find_by_username(&verified.subject).await? else {
            debug!(username = %verified.subject, "Access token subject has no identity");
            return Err(AuthError::InvalidCredentials);
        };

        Ok(Principal::from(identity))
    }

    /// Delete every expired refresh record, whoever owns it.
    ///
    /// Login already purges the caller's own expired records; this sweep
    /// covers identities that stop logging in. Returns how many were removed.
    pub async fn purge_expired_refresh_tokens(&self) -> Result<usize, AuthError> {
        let mut tx = self.storage.begin().await?;
        let purged = tx.delete_expired(Utc::now()).await?;
        tx.commit().await?;

        info!(purged, "Expired refresh token sweep finished");
        Ok(purged)
    }

    async fn issue_token_pair(
        &self,
        tx: &mut dyn StoreTransaction,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, AuthError> {
        let access_token = self.codec.issue(
            TokenKind::Access,
            &identity.username,
            now,
            self.access_token_validity,
            &Uuid::new_v4().to_string(),
        )?;
        let refresh_token = self.codec.issue(
            TokenKind::Refresh,
            &identity.username,
            now,
            self.refresh_token_validity,
            &Uuid::new_v4().to_string(),
        )?;

        let expires_at = now
            .checked_add_signed(self.refresh_record_validity)
            .ok_or_else(|| AuthError::internal("Refresh token expiry overflows"))?;
        tx.put(RefreshTokenRecord::new(refresh_token.clone(), identity.id, expires_at))
            .await?;

        Ok(TokenPair::bearer(
            access_token,
            refresh_token,
            self.access_token_validity.as_secs(),
        ))
    }

    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let password = Zeroizing::new(password.to_owned());

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::internal(format!("Hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: &str, digest: String) -> Result<bool, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let password = Zeroizing::new(password.to_owned());

        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| AuthError::internal(format!("Hashing task failed: {}", e)))?
    }
}

fn require_not_blank(field: &str, value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::InvalidInput(format!("{} must not be blank", field)));
    }
    Ok(())
}
