use crate::storage::{Identity, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token type advertised in every [`TokenPair`].
pub const BEARER: &str = "Bearer";

/// Access/refresh pair returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token validity in seconds.
    pub expires_in: u64,
}

impl TokenPair {
    pub fn bearer(access_token: String, refresh_token: String, expires_in: u64) -> Self {
        TokenPair {
            access_token,
            refresh_token,
            token_type: BEARER.to_string(),
            expires_in,
        }
    }
}

/// Authorization context for an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub identity_id: Uuid,
    pub username: String,
    pub role: Role,
}

impl From<Identity> for Principal {
    fn from(identity: Identity) -> Self {
        Principal {
            identity_id: identity.id,
            username: identity.username,
            role: identity.role,
        }
    }
}
