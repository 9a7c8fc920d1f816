//! # Cache Client
//!
//! Typed operations over the five store data structures. Each family is a
//! separate trait so callers can depend on (and fake) only what they use:
//!
//! - [`KeyCommands`] - expiry, existence, deletion
//! - [`StringCommands`] - plain values and counters
//! - [`HashCommands`] - field maps
//! - [`ListCommands`] - ordered lists
//! - [`SetCommands`] - unordered unique members
//! - [`SortedSetCommands`] - members ordered by score
//!
//! Arguments are validated before any round trip; a rejected call never
//! touches the store.

pub mod hash;
pub mod key;
pub mod list;
pub mod set;
pub mod sorted_set;
pub mod string;

use redis::FromRedisValue;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

use cachemq_domain::{ClientError, Key, Result};

use crate::store::{Command, RedisStore, StoreConfig, StoreExecutor};

pub use hash::HashCommands;
pub use key::KeyCommands;
pub use list::ListCommands;
pub use set::SetCommands;
pub use sorted_set::SortedSetCommands;
pub use string::StringCommands;

/// Cache client over a store executor
pub struct CacheClient<S = RedisStore> {
    store: Arc<S>,
    namespace: Option<String>,
}

impl<S> Clone for CacheClient<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            namespace: self.namespace.clone(),
        }
    }
}

impl CacheClient<RedisStore> {
    /// Connect to the store described by `config`.
    pub async fn new(config: StoreConfig) -> Result<Self> {
        let namespace = config.namespace.clone();
        let store = RedisStore::connect(config).await?;
        Ok(Self::with_store(Arc::new(store), namespace))
    }

    /// Close the underlying store connection.
    pub async fn close(&self) {
        self.store.close().await;
    }
}

impl<S: StoreExecutor> CacheClient<S> {
    /// Build a client over an existing (possibly shared) store.
    pub fn with_store(store: Arc<S>, namespace: Option<String>) -> Self {
        Self { store, namespace }
    }

    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Validate a caller key and apply the namespace.
    pub(crate) fn key(&self, key: &str) -> Result<String> {
        Ok(Key::new(key)?.scoped(self.namespace()).into_inner())
    }

    pub(crate) async fn run<T: FromRedisValue>(&self, command: Command) -> Result<T> {
        let reply = self.store.execute(command).await?;
        decode(&reply)
    }

    // =========================================================================
    // TYPED VALUES
    // =========================================================================

    /// Get a JSON value
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let value: Option<String> = self.get(key).await?;

        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Set a JSON value without expiry
    pub async fn set_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.set(key, &json).await
    }

    /// Set a JSON value with TTL
    pub async fn set_json_with_ttl<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: i64,
    ) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.set_with_ttl(key, &json, ttl_seconds).await
    }
}

/// Decode a raw reply into the expected type.
///
/// # Errors
///
/// Returns `Protocol` if the reply shape does not match.
pub fn decode<T: FromRedisValue>(reply: &redis::Value) -> Result<T> {
    redis::from_redis_value(reply).map_err(|e| ClientError::Protocol {
        message: format!("unexpected reply {reply:?}"),
        source: Some(Box::new(e)),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::CacheClient;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    pub fn client() -> CacheClient<MemoryStore> {
        CacheClient::with_store(Arc::new(MemoryStore::new()), None)
    }
}
