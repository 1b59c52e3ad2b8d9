//! In-memory account store with expiring keys.
//!
//! Serves unit and integration tests as a stand-in for the shared store;
//! TTLs are driven by `tokio::time`, so tests running under a paused
//! runtime can advance the clock to exercise expiry.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use super::{AccountStore, StoreError, Ttl};

#[derive(Clone, Debug)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sweep every expired entry, returning the map guard.
    async fn live(&self) -> tokio::sync::MutexGuard<'_, HashMap<String, Entry>> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| !entry.expired(now));
        entries
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn ensure_connected(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.live().await.contains_key(key))
    }

    async fn create_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut entries = self.live().await;
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: None,
            },
        );
        Ok(true)
    }

    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.live().await.get(key).map(|entry| entry.value.clone()))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.live().await.remove(key);
        Ok(())
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let mut entries = self.live().await;
        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: "0".to_string(),
            expires_at: None,
        });
        let count = entry.value.parse::<i64>().unwrap_or(0) + 1;
        entry.value = count.to_string();
        Ok(count)
    }

    async fn set_expiry(&self, key: &str, seconds: u64) -> Result<(), StoreError> {
        let mut entries = self.live().await;
        if let Some(entry) = entries.get_mut(key) {
            entry.expires_at = Some(Instant::now() + Duration::from_secs(seconds));
        }
        Ok(())
    }

    async fn remaining_ttl(&self, key: &str) -> Result<Ttl, StoreError> {
        let now = Instant::now();
        let entries = self.live().await;
        Ok(match entries.get(key) {
            None => Ttl::Absent,
            Some(Entry {
                expires_at: None, ..
            }) => Ttl::NoExpiry,
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => Ttl::Seconds(at.duration_since(now).as_secs()),
        })
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        seconds: u64,
    ) -> Result<(), StoreError> {
        let mut entries = self.live().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + Duration::from_secs(seconds)),
            },
        );
        Ok(())
    }
}
