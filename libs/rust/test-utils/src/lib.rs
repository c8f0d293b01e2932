//! Shared test utilities for auth-platform Rust crates.
//!
//! This crate provides:
//! - Proptest generators for credentials, subjects and signing secrets
//! - Test fixtures with sample data

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

pub use generators::*;
