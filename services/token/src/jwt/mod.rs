pub mod claims;
pub mod codec;
pub mod key;

pub use claims::{Claims, TokenKind};
pub use codec::{TokenCodec, VerifiedToken};
pub use key::SigningKey;
