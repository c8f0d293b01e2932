use serde::{Deserialize, Serialize};
use std::fmt;

/// Which half of a token pair a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived bearer credential for requests
    Access,
    /// Long-lived token exchanged for a new pair
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

/// Claims carried by both access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub typ: TokenKind,
    // Absent on tokens issued before token ids were introduced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    pub fn new(kind: TokenKind, subject: impl Into<String>, issued_at: i64, expires_at: i64) -> Self {
        Claims {
            sub: subject.into(),
            iat: issued_at,
            exp: expires_at,
            typ: kind,
            jti: None,
        }
    }

    pub fn with_token_id(mut self, token_id: impl Into<String>) -> Self {
        self.jti = Some(token_id.into());
        self
    }

    /// Expired means `exp` is at or before `timestamp`.
    pub fn is_expired_at(&self, timestamp: i64) -> bool {
        self.exp <= timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new(TokenKind::Access, "alice", 1_000, 1_900).with_token_id("jti-1");

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.typ, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 900);
        assert_eq!(claims.jti.as_deref(), Some("jti-1"));
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let claims = Claims::new(TokenKind::Refresh, "alice", 1_000, 1_900);

        assert!(!claims.is_expired_at(1_899));
        assert!(claims.is_expired_at(1_900));
        assert!(claims.is_expired_at(2_000));
    }

    #[test]
    fn test_missing_jti_deserializes() {
        let claims: Claims =
            serde_json::from_str(r#"{"sub":"alice","iat":1000,"exp":1900,"typ":"access"}"#)
                .unwrap();
        assert_eq!(claims.jti, None);
        assert!(!serde_json::to_string(&claims).unwrap().contains("jti"));
    }

    #[test]
    fn test_token_kind_wire_form() {
        let claims = Claims::new(TokenKind::Refresh, "alice", 1_000, 1_900);
        let json = serde_json::to_string(&claims).unwrap();

        assert!(json.contains(r#""typ":"refresh""#));
        assert_eq!(TokenKind::Access.to_string(), "access");
    }

    #[test]
    fn test_missing_typ_rejected() {
        let result = serde_json::from_str::<Claims>(r#"{"sub":"alice","iat":1000,"exp":1900}"#);
        assert!(result.is_err());
    }
}
