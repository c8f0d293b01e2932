//! Error types for the token lifecycle.
//!
//! Three layers, each a `thiserror` enum:
//! - [`VerificationError`] from the token codec
//! - [`StoreError`] from the storage traits
//! - [`AuthError`] at the engine boundary, with stable error codes

use thiserror::Error;

/// Failure verifying a signed token.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationError {
    /// Token is not a structurally valid JWT with the expected claims.
    #[error("Token malformed")]
    MalformedToken,

    /// Signature does not match the signing key.
    #[error("Token signature invalid")]
    BadSignature,

    /// Token expiry is at or before the verification instant.
    #[error("Token expired")]
    Expired,

    /// Validly signed token of another kind, such as a refresh token
    /// presented as an access token.
    #[error("Token type not accepted")]
    WrongTokenType,
}

/// Failure inside a storage backend.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Another identity already holds this username.
    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    /// A refresh record with this token string already exists.
    #[error("Refresh token already stored")]
    DuplicateToken,

    /// Backend is temporarily unavailable.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Check if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Error returned by [`AuthEngine`](crate::engine::AuthEngine) operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown username or wrong password. The two are never distinguished.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Username is already registered.
    #[error("Username already taken")]
    UsernameTaken,

    /// Refresh token has no stored record.
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// Refresh record exists but is expired or revoked.
    #[error("Refresh token expired or revoked")]
    ExpiredOrRevoked,

    /// Request input rejected before reaching storage.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Access token failed verification.
    #[error(transparent)]
    Token(#[from] VerificationError),

    /// Storage failure not mapped to a domain error.
    #[error("Storage error: {0}")]
    Storage(StoreError),

    /// Password hashing primitive failed.
    #[error("Password hashing error: {0}")]
    Hashing(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername(_) => Self::UsernameTaken,
            other => Self::Storage(other),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for VerificationError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => Self::BadSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::MalformedToken,
        }
    }
}

impl AuthError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a hashing error.
    #[must_use]
    pub fn hashing(msg: impl Into<String>) -> Self {
        Self::Hashing(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable error code for the request-routing layer.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => AUTH_INVALID_CREDENTIALS,
            Self::UsernameTaken => AUTH_USERNAME_TAKEN,
            Self::InvalidRefreshToken => AUTH_REFRESH_INVALID,
            Self::ExpiredOrRevoked => AUTH_REFRESH_EXPIRED_OR_REVOKED,
            Self::InvalidInput(_) => AUTH_INVALID_INPUT,
            Self::Token(VerificationError::MalformedToken) => AUTH_TOKEN_MALFORMED,
            Self::Token(VerificationError::BadSignature) => AUTH_TOKEN_BAD_SIGNATURE,
            Self::Token(VerificationError::Expired) => AUTH_TOKEN_EXPIRED,
            Self::Token(VerificationError::WrongTokenType) => AUTH_TOKEN_WRONG_TYPE,
            Self::Storage(_) => AUTH_STORAGE_ERROR,
            Self::Hashing(_) | Self::Config(_) | Self::Internal(_) => AUTH_INTERNAL_ERROR,
        }
    }

    /// True when the caller should be treated as not authenticated.
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::InvalidRefreshToken
                | Self::ExpiredOrRevoked
                | Self::Token(_)
        )
    }

    /// Check if this error is retryable. Nothing is retried automatically;
    /// this only informs the client.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Storage(err) => err.is_retryable(),
            _ => false,
        }
    }
}

// Error codes for API responses
/// Credentials rejected.
pub const AUTH_INVALID_CREDENTIALS: &str = "AUTH_INVALID_CREDENTIALS";
/// Username already registered.
pub const AUTH_USERNAME_TAKEN: &str = "AUTH_USERNAME_TAKEN";
/// Refresh token unknown.
pub const AUTH_REFRESH_INVALID: &str = "AUTH_REFRESH_INVALID";
/// Refresh token expired or revoked.
pub const AUTH_REFRESH_EXPIRED_OR_REVOKED: &str = "AUTH_REFRESH_EXPIRED_OR_REVOKED";
/// Input validation failed.
pub const AUTH_INVALID_INPUT: &str = "AUTH_INVALID_INPUT";
/// Access token malformed.
pub const AUTH_TOKEN_MALFORMED: &str = "AUTH_TOKEN_MALFORMED";
/// Access token signature mismatch.
pub const AUTH_TOKEN_BAD_SIGNATURE: &str = "AUTH_TOKEN_BAD_SIGNATURE";
/// Access token expired.
pub const AUTH_TOKEN_EXPIRED: &str = "AUTH_TOKEN_EXPIRED";
/// Token of another kind presented.
pub const AUTH_TOKEN_WRONG_TYPE: &str = "AUTH_TOKEN_WRONG_TYPE";
/// Storage fault.
pub const AUTH_STORAGE_ERROR: &str = "AUTH_STORAGE_ERROR";
/// Any other internal fault.
pub const AUTH_INTERNAL_ERROR: &str = "AUTH_INTERNAL_ERROR";
