//! String values and counters

use async_trait::async_trait;

use cachemq_domain::{positive_delta, Result, Ttl};

use super::CacheClient;
use crate::store::{Command, StoreExecutor};

#[async_trait]
pub trait StringCommands: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a value with no expiry, clearing any previous TTL.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Set a value and its expiry in one atomic command.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: i64) -> Result<()>;

    /// Add `delta` (> 0) to an integer value; absent keys start at 0.
    async fn increment(&self, key: &str, delta: i64) -> Result<i64>;

    /// Subtract `delta` (> 0) from an integer value. The result may go
    /// negative.
    async fn decrement(&self, key: &str, delta: i64) -> Result<i64>;
}

#[async_trait]
impl<S: StoreExecutor> StringCommands for CacheClient<S> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = self.key(key)?;
        self.run(Command::new("GET", key)).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let key = self.key(key)?;
        self.run(Command::new("SET", key).arg(value)).await
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: i64) -> Result<()> {
        let ttl = Ttl::from_secs(ttl_seconds)?;
        let key = self.key(key)?;
        self.run(
            Command::new("SET", key)
                .arg(value)
                .arg("EX")
                .arg(ttl.as_secs()),
        )
        .await
    }

    async fn increment(&self, key: &str, delta: i64) -> Result<i64> {
        let delta = positive_delta(delta)?;
        let key = self.key(key)?;
        self.run(Command::new("INCRBY", key).arg(delta)).await
    }

    async fn decrement(&self, key: &str, delta: i64) -> Result<i64> {
        let delta = positive_delta(delta)?;
        let key = self.key(key)?;
        self.run(Command::new("DECRBY", key).arg(delta)).await
    }
}
