//! Shared proptest generators.
//!
//! Reusable strategies for the credential and token inputs exercised by
//! the token service property tests.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use proptest::prelude::*;
use std::time::Duration;

/// Generate valid usernames.
pub fn username_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_.-]{2,31}"
}

/// Generate non-blank passwords, including non-ASCII ones.
pub fn password_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9!@#$%^&*é한]{1,40}"
}

/// Generate arbitrary token subjects, including whitespace and unicode.
pub fn subject_strategy() -> impl Strategy<Value = String> {
    any::<String>()
}

/// Generate raw signing secrets that are not valid base64 and at least
/// 32 bytes long. The `-` sits inside the string, so trimming stray
/// characters from the ends never turns one into base64.
pub fn raw_secret_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{16,31}-[a-zA-Z0-9]{16,32}".prop_map(|s| s)
}

/// Generate base64-encoded signing secrets of 32 to 64 key bytes.
pub fn base64_secret_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(any::<u8>(), 32..=64).prop_map(|bytes| STANDARD.encode(bytes))
}

/// Generate signing secrets in either accepted form.
pub fn secret_strategy() -> impl Strategy<Value = String> {
    prop_oneof![raw_secret_strategy(), base64_secret_strategy()]
}

/// Generate token validity durations (0 seconds to 30 days).
pub fn validity_strategy() -> impl Strategy<Value = Duration> {
    (0u64..=2_592_000).prop_map(Duration::from_secs)
}

/// Generate Unix timestamps in seconds between 2001 and 2100.
pub fn timestamp_strategy() -> impl Strategy<Value = i64> {
    1_000_000_000i64..4_102_444_800
}
