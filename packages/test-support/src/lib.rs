//! Shared test utilities for the startup workspace
//!
//! Provides idempotent tracing initialization for test binaries and helpers
//! for generating unique names so tests never collide on shared paths.

pub mod logging;

use ulid::Ulid;

/// Generate a unique string with the given prefix
///
/// # Examples
/// ```
/// use test_support::unique_str;
///
/// let id1 = unique_str("probe");
/// let id2 = unique_str("probe");
/// assert_ne!(id1, id2);
/// assert!(id1.starts_with("probe-"));
/// ```
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Ulid::new())
}
