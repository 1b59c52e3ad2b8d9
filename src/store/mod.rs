//! Account store protocol: the minimal key-value operations the auth core
//! needs from a shared store, behind a trait so the state machine is
//! testable against an in-memory fake.

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Remaining time-to-live of a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ttl {
    /// Key does not exist.
    Absent,
    /// Key exists but carries no expiry.
    NoExpiry,
    /// Key exists and expires in this many seconds.
    Seconds(u64),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value operations consumed by the auth service.
///
/// Every operation is a single-key round trip; `create_if_absent` and
/// `increment` are the only concurrency-control primitives and must be
/// atomic in any implementation. Operations are never retried silently
/// here; a failed call fails the whole request.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Idempotent connectivity check, called before any other operation.
    async fn ensure_connected(&self) -> Result<(), StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Atomic create-if-absent: stores `value` only when `key` is absent
    /// and reports whether the write happened.
    async fn create_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    async fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Idempotent delete.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Atomic increment, creating the key at 0 first when absent.
    async fn increment(&self, key: &str) -> Result<i64, StoreError>;

    async fn set_expiry(&self, key: &str, seconds: u64) -> Result<(), StoreError>;

    async fn remaining_ttl(&self, key: &str) -> Result<Ttl, StoreError>;

    /// Set `value` with an expiry in one call. Used only for the lock marker.
    async fn set_with_expiry(&self, key: &str, value: &str, seconds: u64)
        -> Result<(), StoreError>;
}

/// Key for the serialized user record of a normalized username.
#[must_use]
pub fn user_key(username: &str) -> String {
    format!("user:{username}")
}

/// Key for the lock marker of a normalized username.
#[must_use]
pub fn lock_key(username: &str) -> String {
    format!("lock:{username}")
}

/// Key for the failed-attempt counter of a normalized username.
#[must_use]
pub fn fail_key(username: &str) -> String {
    format!("fails:{username}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_prefixed_by_purpose() {
        assert_eq!(user_key("alice"), "user:alice");
        assert_eq!(lock_key("alice"), "lock:alice");
        assert_eq!(fail_key("alice"), "fails:alice");
    }

    #[test]
    fn store_error_displays_reason() {
        let err = StoreError::Unavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "store unavailable: connection refused");
    }
}
