//! Shared utilities.
//!
//! Hashing helpers and test-only fixtures.

pub mod hash;

#[cfg(test)]
pub mod testutil;
