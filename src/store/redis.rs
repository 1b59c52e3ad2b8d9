//! Redis-backed account store.

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client, RedisError};
use tracing::debug;

use super::{AccountStore, StoreError, Ttl};

// Bounded retry budget so a stalled command cannot hang a request.
const MAX_COMMAND_RETRIES: usize = 2;

pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connect to the store and return a handle with an internal
    /// auto-reconnecting connection.
    ///
    /// # Errors
    /// Returns `StoreError::Unavailable` if the initial connection fails.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(unavailable)?;

        let config = ConnectionManagerConfig::new().set_number_of_retries(MAX_COMMAND_RETRIES);

        let manager = ConnectionManager::new_with_config(client, config)
            .await
            .map_err(unavailable)?;

        debug!("connected to account store");

        Ok(Self { manager })
    }
}

fn unavailable(err: RedisError) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

#[async_trait]
impl AccountStore for RedisStore {
    async fn ensure_connected(&self) -> Result<(), StoreError> {
        let mut con = self.manager.clone();
        let () = redis::cmd("PING")
            .query_async(&mut con)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut con = self.manager.clone();
        con.exists(key).await.map_err(unavailable)
    }

    async fn create_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut con = self.manager.clone();
        con.set_nx(key, value).await.map_err(unavailable)
    }

    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut con = self.manager.clone();
        con.get(key).await.map_err(unavailable)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut con = self.manager.clone();
        con.del::<_, ()>(key).await.map_err(unavailable)
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let mut con = self.manager.clone();
        con.incr(key, 1).await.map_err(unavailable)
    }

    async fn set_expiry(&self, key: &str, seconds: u64) -> Result<(), StoreError> {
        let mut con = self.manager.clone();
        con.expire::<_, ()>(key, i64::try_from(seconds).unwrap_or(i64::MAX))
            .await
            .map_err(unavailable)
    }

    async fn remaining_ttl(&self, key: &str) -> Result<Ttl, StoreError> {
        let mut con = self.manager.clone();
        let ttl: i64 = con.ttl(key).await.map_err(unavailable)?;

        // Redis TTL: -2 when the key is absent, -1 when it has no expiry.
        Ok(match ttl {
            -2 => Ttl::Absent,
            -1 => Ttl::NoExpiry,
            seconds => Ttl::Seconds(u64::try_from(seconds).unwrap_or(0)),
        })
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        seconds: u64,
    ) -> Result<(), StoreError> {
        let mut con = self.manager.clone();
        con.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(unavailable)
    }
}
