use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authorization role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Regular account, assigned at signup
    #[default]
    User,
    /// Administrative account
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

impl Identity {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Identity {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash: password_hash.into(),
            role: Role::default(),
        }
    }
}

/// Persisted refresh token, owned by one identity through `owner`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub owner: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl RefreshTokenRecord {
    pub fn new(token: impl Into<String>, owner: Uuid, expires_at: DateTime<Utc>) -> Self {
        RefreshTokenRecord {
            token: token.into(),
            owner,
            expires_at,
            revoked: false,
        }
    }

    pub fn revoke(&mut self) {
        self.revoked = true;
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Usable for rotation: neither expired nor revoked.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && !self.is_expired_at(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_identity_defaults_to_user_role() {
        let identity = Identity::new("alice", "hash");

        assert_eq!(identity.role, Role::User);
        assert_eq!(identity.role.as_str(), "USER");
        assert_ne!(identity.id, Identity::new("alice", "hash").id);
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(serde_json::from_str::<Role>("\"USER\"").unwrap(), Role::User);
    }

    #[test]
    fn test_record_lifecycle() {
        let now = Utc::now();
        let mut record = RefreshTokenRecord::new("token-1", Uuid::new_v4(), now + Duration::seconds(60));

        assert!(record.is_active_at(now));
        assert!(record.is_expired_at(now + Duration::seconds(60)));
        assert!(!record.is_active_at(now + Duration::seconds(60)));

        record.revoke();
        assert!(!record.is_active_at(now));
    }
}
