//! Centralized configuration for the token service.
//!
//! Loaded from environment variables (plus an optional `.env` file) and
//! validated at startup. The signing key is derived here exactly once.

use crate::error::AuthError;
use crate::jwt::SigningKey;
use crate::telemetry::TracingConfig;
use std::env;
use std::time::Duration;

/// Default access token validity (15 minutes).
pub const DEFAULT_ACCESS_TOKEN_VALIDITY: Duration = Duration::from_secs(900);
/// Default refresh token validity (14 days).
pub const DEFAULT_REFRESH_TOKEN_VALIDITY: Duration = Duration::from_secs(1_209_600);

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl PasswordConfig {
    /// Smallest parameters Argon2 accepts. Never use outside tests.
    #[must_use]
    pub const fn fast_for_tests() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// Token service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HS256 signing key
    pub signing_key: SigningKey,
    /// Access token validity
    pub access_token_validity: Duration,
    /// Refresh token validity
    pub refresh_token_validity: Duration,
    /// Password hashing cost
    pub password: PasswordConfig,
    /// Log output settings
    pub tracing: TracingConfig,
}

impl Config {
    /// Configuration with defaults for everything except the signing secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret yields a key that is too short.
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        Ok(Self {
            signing_key: SigningKey::from_config(secret)?,
            access_token_validity: DEFAULT_ACCESS_TOKEN_VALIDITY,
            refresh_token_validity: DEFAULT_REFRESH_TOKEN_VALIDITY,
            password: PasswordConfig::default(),
            tracing: TracingConfig::default().with_service_name("token-service"),
        })
    }

    /// Set the access token validity.
    #[must_use]
    pub fn with_access_token_validity(mut self, validity: Duration) -> Self {
        self.access_token_validity = validity;
        self
    }

    /// Set the refresh token validity.
    #[must_use]
    pub fn with_refresh_token_validity(mut self, validity: Duration) -> Self {
        self.refresh_token_validity = validity;
        self
    }

    /// Set the password hashing cost.
    #[must_use]
    pub fn with_password_config(mut self, password: PasswordConfig) -> Self {
        self.password = password;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `JWT_SECRET` is missing, a value fails to parse,
    /// or the signing key is too short.
    pub fn from_env() -> Result<Self, AuthError> {
        dotenvy::dotenv().ok();
        Self::from_source(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_source<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::config("JWT_SECRET is required"))?;

        let access_token_validity = Duration::from_secs(parse_var(
            &lookup,
            "ACCESS_TOKEN_VALIDITY_SECONDS",
            DEFAULT_ACCESS_TOKEN_VALIDITY.as_secs(),
        )?);
        let refresh_token_validity = Duration::from_secs(parse_var(
            &lookup,
            "REFRESH_TOKEN_VALIDITY_SECONDS",
            DEFAULT_REFRESH_TOKEN_VALIDITY.as_secs(),
        )?);

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            memory_kib: parse_var(&lookup, "ARGON2_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_var(&lookup, "ARGON2_ITERATIONS", defaults.iterations)?,
            parallelism: parse_var(&lookup, "ARGON2_PARALLELISM", defaults.parallelism)?,
        };

        let mut tracing = TracingConfig::default()
            .with_service_name("token-service")
            .with_log_level(lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()));
        if parse_var(&lookup, "LOG_JSON", false)? {
            tracing = tracing.with_json_output();
        }

        Ok(Self {
            signing_key: SigningKey::from_config(&secret)?,
            access_token_validity,
            refresh_token_validity,
            password,
            tracing,
        })
    }
}

/// Parse a variable with a default value.
fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, AuthError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(val) => val
            .parse()
            .map_err(|e| AuthError::config(format!("Invalid {}: {}", name, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "config-test-secret-that-is-long-enough!";

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_source(source(&[("JWT_SECRET", SECRET)])).unwrap();

        assert_eq!(config.access_token_validity, Duration::from_secs(900));
        assert_eq!(config.refresh_token_validity, Duration::from_secs(1_209_600));
        assert_eq!(config.password, PasswordConfig::default());
        assert_eq!(config.tracing.log_level, "info");
        assert!(!config.tracing.json_output);
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_source(source(&[
            ("JWT_SECRET", SECRET),
            ("ACCESS_TOKEN_VALIDITY_SECONDS", "60"),
            ("REFRESH_TOKEN_VALIDITY_SECONDS", "3600"),
            ("ARGON2_ITERATIONS", "3"),
            ("LOG_LEVEL", "debug"),
            ("LOG_JSON", "true"),
        ]))
        .unwrap();

        assert_eq!(config.access_token_validity, Duration::from_secs(60));
        assert_eq!(config.refresh_token_validity, Duration::from_secs(3600));
        assert_eq!(config.password.iterations, 3);
        assert_eq!(config.tracing.log_level, "debug");
        assert!(config.tracing.json_output);
    }

    #[test]
    fn test_missing_secret() {
        let result = Config::from_source(source(&[]));
        assert!(matches!(result, Err(AuthError::Config(_))));

        let result = Config::from_source(source(&[("JWT_SECRET", "")]));
        assert!(matches!(result, Err(AuthError::Config(_))));
    }

    #[test]
    fn test_invalid_number() {
        let result = Config::from_source(source(&[
            ("JWT_SECRET", SECRET),
            ("ACCESS_TOKEN_VALIDITY_SECONDS", "-5"),
        ]));
        assert!(matches!(result, Err(AuthError::Config(msg)) if msg.contains("ACCESS_TOKEN_VALIDITY_SECONDS")));
    }

    #[test]
    fn test_builder() {
        let config = Config::new(SECRET)
            .unwrap()
            .with_access_token_validity(Duration::from_secs(30))
            .with_refresh_token_validity(Duration::from_secs(90))
            .with_password_config(PasswordConfig::fast_for_tests());

        assert_eq!(config.access_token_validity, Duration::from_secs(30));
        assert_eq!(config.refresh_token_validity, Duration::from_secs(90));
        assert_eq!(config.password.memory_kib, 8);
    }
}
