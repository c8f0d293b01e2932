//! Test fixtures with sample data.

/// Raw (non-base64) signing secret accepted by the token service.
pub const TEST_SECRET: &str = "test-secret-key-for-testing-only-32bytes!";

/// A second, unrelated signing secret.
pub const OTHER_SECRET: &str = "another-secret-key-that-is-long-enough!!";

/// Username and password pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleCredentials {
    /// Username
    pub username: String,
    /// Plaintext password
    pub password: String,
}

impl SampleCredentials {
    /// Create credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The canonical `alice` / `pw1` account.
    #[must_use]
    pub fn alice() -> Self {
        Self::new("alice", "pw1")
    }

    /// A second account.
    #[must_use]
    pub fn bob() -> Self {
        Self::new("bob", "hunter2")
    }

    /// Same username with a different password.
    #[must_use]
    pub fn with_wrong_password(&self) -> Self {
        Self::new(self.username.clone(), format!("{}-wrong", self.password))
    }
}
