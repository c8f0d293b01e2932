//! One-way password hashing.
//!
//! The engine depends only on [`PasswordHasher`]; [`Argon2Hasher`] is the
//! production implementation (Argon2id, PHC string format, random salt).

use crate::config::PasswordConfig;
use crate::error::AuthError;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

/// Salted one-way password hashing primitive.
pub trait PasswordHasher: Send + Sync {
    /// Hash `plaintext` into a self-describing digest.
    fn hash(&self, plaintext: &str) -> Result<String, AuthError>;

    /// Check `plaintext` against `digest`. A mismatch is `Ok(false)`.
    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AuthError>;
}

/// Argon2id hasher.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Build a hasher from cost parameters.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if Argon2 rejects the parameters.
    pub fn new(config: &PasswordConfig) -> Result<Self, AuthError> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| AuthError::config(format!("Invalid Argon2 parameters: {}", e)))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        use argon2::PasswordHasher as _;

        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::hashing(e.to_string()))
    }

    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AuthError> {
        use argon2::PasswordVerifier as _;

        let parsed = PasswordHash::new(digest).map_err(|e| AuthError::hashing(e.to_string()))?;

        // Cost parameters are read from the digest, so hashes made under
        // older settings keep verifying.
        match self.argon2().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::hashing(e.to_string())),
        }
    }
}
