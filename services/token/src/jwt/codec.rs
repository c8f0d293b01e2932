//! HS256 token issuing and verification.

use crate::error::{AuthError, VerificationError};
use crate::jwt::claims::{Claims, TokenKind};
use crate::jwt::key::SigningKey;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::time::Duration;

/// Verified contents of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    /// Access or refresh.
    pub kind: TokenKind,
    /// Subject (username).
    pub subject: String,
    /// Issued-at instant, second precision.
    pub issued_at: DateTime<Utc>,
    /// Expiry instant, second precision.
    pub expires_at: DateTime<Utc>,
    /// Token id, if the token carries one.
    pub token_id: Option<String>,
}

/// Encodes and verifies signed tokens under a single symmetric key.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(key: &SigningKey) -> Self {
        // Expiry is checked by hand against an explicit instant, without leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        TokenCodec {
            encoding_key: key.encoding_key(),
            decoding_key: key.decoding_key(),
            header: Header::new(Algorithm::HS256),
            validation,
        }
    }

    /// Issue a `kind` token for `subject`, valid from `now` for `validity`.
    ///
    /// `iat` is `now` truncated to the second and `exp` is `now + validity`
    /// rounded up, so a check at any instant before `now + validity` passes.
    /// Output is deterministic for identical arguments.
    pub fn issue(
        &self,
        kind: TokenKind,
        subject: &str,
        now: DateTime<Utc>,
        validity: Duration,
        token_id: &str,
    ) -> Result<String, AuthError> {
        let validity = chrono::Duration::from_std(validity)
            .map_err(|e| AuthError::internal(format!("Token validity out of range: {}", e)))?;
        let expires_at = now
            .checked_add_signed(validity)
            .ok_or_else(|| AuthError::internal("Token expiry overflows"))?;

        let claims = Claims::new(kind, subject, now.timestamp(), ceil_seconds(expires_at))
            .with_token_id(token_id);

        encode(&self.header, &claims, &self.encoding_key)
            .map_err(|e| AuthError::internal(format!("JWT encoding failed: {}", e)))
    }

    /// Verify `token` against the current time, whatever its kind.
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, VerificationError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify `token` as of `now`, whatever its kind.
    ///
    /// Checks structure, then signature, then expiry.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<VerifiedToken, VerificationError> {
        let claims = self.decode_claims(token)?;
        Self::unexpired(claims, now)
    }

    /// Verify `token` against the current time and require it to be `kind`.
    pub fn verify_as(&self, token: &str, kind: TokenKind) -> Result<VerifiedToken, VerificationError> {
        self.verify_as_at(token, kind, Utc::now())
    }

    /// Verify `token` as of `now` and require it to be `kind`.
    ///
    /// The kind is checked before expiry, so a token of the wrong kind is
    /// always [`VerificationError::WrongTokenType`].
    pub fn verify_as_at(
        &self,
        token: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<VerifiedToken, VerificationError> {
        let claims = self.decode_claims(token)?;
        if claims.typ != kind {
            return Err(VerificationError::WrongTokenType);
        }
        Self::unexpired(claims, now)
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, VerificationError> {
        Ok(decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims)
    }

    fn unexpired(claims: Claims, now: DateTime<Utc>) -> Result<VerifiedToken, VerificationError> {
        if claims.is_expired_at(now.timestamp()) {
            return Err(VerificationError::Expired);
        }

        let issued_at =
            DateTime::from_timestamp(claims.iat, 0).ok_or(VerificationError::MalformedToken)?;
        let expires_at =
            DateTime::from_timestamp(claims.exp, 0).ok_or(VerificationError::MalformedToken)?;

        Ok(VerifiedToken {
            kind: claims.typ,
            subject: claims.sub,
            issued_at,
            expires_at,
            token_id: claims.jti,
        })
    }
}

fn ceil_seconds(instant: DateTime<Utc>) -> i64 {
    instant.timestamp() + i64::from(instant.timestamp_subsec_nanos() > 0)
}
