//! Minimal syntactic email address check.
//!
//! This is deliberately loose: one or more non-whitespace characters, an `@`,
//! more non-whitespace, a `.`, and more non-whitespace. It is the only input
//! validation performed before a send.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

static ADDRESS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("address pattern is valid"));

/// Returns `true` when `address` looks like `local@domain.tld`.
pub fn is_valid_address(address: &str) -> bool {
    ADDRESS_PATTERN.is_match(address)
}

/// Like [`is_valid_address`] but yields [`CoreError::InvalidAddress`] on failure.
pub fn validate_address(address: &str) -> Result<(), CoreError> {
    if is_valid_address(address) {
        Ok(())
    } else {
        Err(CoreError::InvalidAddress(address.to_string()))
    }
}
