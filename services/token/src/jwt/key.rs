//! Symmetric signing key material.

use crate::error::AuthError;
use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::fmt;
use zeroize::Zeroizing;

/// Minimum key length for HS256 (256 bits).
pub const MIN_KEY_BYTES: usize = 32;

// Standard alphabet; padding optional, stray trailing bits ignored.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

fn is_base64_symbol(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=')
}

/// Process-wide HMAC key, derived once from configuration.
#[derive(Clone)]
pub struct SigningKey {
    bytes: Zeroizing<Vec<u8>>,
}

impl SigningKey {
    /// Derive key material from a configuration string.
    ///
    /// The value is decoded as standard base64 first: characters outside the
    /// alphabet are trimmed from both ends and padding is optional. If that
    /// fails, or yields nothing, the raw bytes of the string are used as-is.
    /// Tokens signed under either interpretation keep verifying as long as
    /// the configured string does not change.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the resulting material is shorter
    /// than [`MIN_KEY_BYTES`].
    pub fn from_config(secret: &str) -> Result<Self, AuthError> {
        let encoded = secret.trim_matches(|c: char| !is_base64_symbol(c));
        let bytes = match LENIENT_BASE64.decode(encoded) {
            Ok(decoded) if !decoded.is_empty() => decoded,
            _ => secret.as_bytes().to_vec(),
        };
        Self::from_bytes(bytes)
    }

    /// Use raw bytes as key material.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `bytes` is shorter than
    /// [`MIN_KEY_BYTES`].
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, AuthError> {
        let bytes = Zeroizing::new(bytes);
        if bytes.len() < MIN_KEY_BYTES {
            return Err(AuthError::config(format!(
                "signing key must be at least {} bytes, got {}",
                MIN_KEY_BYTES,
                bytes.len()
            )));
        }
        Ok(Self { bytes })
    }

    /// Key length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; empty keys are rejected at construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.bytes)
    }

    pub(crate) fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.bytes)
    }

    #[cfg(test)]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};

    #[test]
    fn test_base64_secret_is_decoded() {
        let raw = [7u8; 48];
        let encoded = STANDARD.encode(raw);

        let key = SigningKey::from_config(&encoded).unwrap();
        assert_eq!(key.as_bytes(), &raw[..]);
    }

    #[test]
    fn test_unpadded_base64_secret_is_decoded() {
        let raw = [9u8; 40];
        let unpadded = STANDARD_NO_PAD.encode(raw);
        assert!(!unpadded.ends_with('='));

        let key = SigningKey::from_config(&unpadded).unwrap();
        assert_eq!(key.as_bytes(), &raw[..]);
    }

    #[test]
    fn test_base64_secret_ignores_surrounding_noise() {
        let raw = [3u8; 33];
        let noisy = format!("  {}\n", STANDARD.encode(raw));

        let key = SigningKey::from_config(&noisy).unwrap();
        assert_eq!(key.as_bytes(), &raw[..]);
    }

    #[test]
    fn test_non_base64_secret_falls_back_to_raw_bytes() {
        let secret = "not-base64-but-long-enough-for-hmac-sha256!";

        let key = SigningKey::from_config(secret).unwrap();
        assert_eq!(key.as_bytes(), secret.as_bytes());
    }

    #[test]
    fn test_short_key_rejected() {
        let result = SigningKey::from_config("short-secret");
        assert!(matches!(result, Err(AuthError::Config(_))));

        // Valid base64 that decodes to too few bytes is not retried as raw.
        let result = SigningKey::from_config(&STANDARD.encode([1u8; 16]));
        assert!(matches!(result, Err(AuthError::Config(_))));
    }

    #[test]
    fn test_debug_does_not_leak_material() {
        let key = SigningKey::from_bytes(vec![0xAB; 32]).unwrap();
        let printed = format!("{key:?}");
        assert!(printed.contains("len: 32"));
        assert!(!printed.contains("171"));
    }
}
