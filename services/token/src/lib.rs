//! Token Service library.
//!
//! Issues, validates, rotates and revokes signed access/refresh token pairs
//! for username/password identities. A single symmetric HS256 key signs
//! every token; refresh tokens are persisted so they can be rotated and
//! revoked.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod jwt;
pub mod password;
pub mod storage;
pub mod telemetry;

// Re-exports for convenience
pub use config::Config;
pub use engine::{AuthEngine, Principal, TokenPair};
pub use error::{AuthError, StoreError, VerificationError};
