//! Failure-count and lockout state machine.
//!
//! Two independently expiring keys back the state: `fails:<u>` counts
//! failed attempts inside the failure window, `lock:<u>` marks an active
//! lock via its remaining TTL. The state is derived on read, never
//! stored directly. Using the store's atomic increment avoids a
//! read-modify-write race between concurrent failures for one account,
//! and keeping the keys separate means further failures never extend a
//! lock already in place.

use std::sync::Arc;
use tracing::warn;

use crate::store::{fail_key, lock_key, AccountStore, StoreError, Ttl};

/// Lockout state for one username, derived from the two store keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockState {
    Clear,
    /// Failures recorded inside the window, below the lock threshold.
    Warned(i64),
    /// Locked for `remaining_seconds` more seconds.
    Locked { remaining_seconds: u64 },
}

impl LockState {
    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }
}

pub struct LockoutTracker {
    store: Arc<dyn AccountStore>,
    max_fails: i64,
    window_seconds: u64,
    lock_seconds: u64,
}

impl LockoutTracker {
    #[must_use]
    pub fn new(
        store: Arc<dyn AccountStore>,
        max_fails: i64,
        window_seconds: u64,
        lock_seconds: u64,
    ) -> Self {
        Self {
            store,
            max_fails,
            window_seconds,
            lock_seconds,
        }
    }

    /// Current state for `username`. Never blocks or queues; a locked
    /// account simply fails every attempt until the marker expires.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn state(&self, username: &str) -> Result<LockState, StoreError> {
        match self.store.remaining_ttl(&lock_key(username)).await? {
            Ttl::Seconds(remaining) if remaining > 0 => {
                return Ok(LockState::Locked {
                    remaining_seconds: remaining,
                });
            }
            // A marker without expiry would never clear; treat it as
            // expired rather than locking the account forever.
            Ttl::NoExpiry => {
                warn!(username, "lock marker without expiry, ignoring");
            }
            Ttl::Absent | Ttl::Seconds(_) => {}
        }

        match self.store.read(&fail_key(username)).await? {
            Some(raw) => match raw.parse::<i64>() {
                Ok(count) if count > 0 => Ok(LockState::Warned(count)),
                _ => Ok(LockState::Clear),
            },
            None => Ok(LockState::Clear),
        }
    }

    /// Record one failed attempt and return the resulting state.
    ///
    /// The first failure in a window arms the counter's expiry; reaching
    /// the threshold writes the lock marker. The counter is left to
    /// expire on its own schedule.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn record_failure(&self, username: &str) -> Result<LockState, StoreError> {
        let fails = self.store.increment(&fail_key(username)).await?;

        if fails == 1 {
            self.store
                .set_expiry(&fail_key(username), self.window_seconds)
                .await?;
        }

        if fails >= self.max_fails {
            self.store
                .set_with_expiry(&lock_key(username), "1", self.lock_seconds)
                .await?;
            return Ok(LockState::Locked {
                remaining_seconds: self.lock_seconds,
            });
        }

        Ok(LockState::Warned(fails))
    }

    /// Forget recorded failures. Idempotent whether or not any exist.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn clear(&self, username: &str) -> Result<(), StoreError> {
        self.store.delete(&fail_key(username)).await
    }
}
