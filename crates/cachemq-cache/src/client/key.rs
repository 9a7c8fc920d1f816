//! Key-level operations

use async_trait::async_trait;

use cachemq_domain::{KeyTtl, Result, Ttl};

use super::CacheClient;
use crate::store::{Command, StoreExecutor};

#[async_trait]
pub trait KeyCommands: Send + Sync {
    /// Set the key's expiry. Returns `false` if the key does not exist.
    ///
    /// A non-positive TTL is rejected without touching the key.
    async fn expire(&self, key: &str, ttl_seconds: i64) -> Result<bool>;

    /// Remaining lifetime of the key
    async fn ttl_remaining(&self, key: &str) -> Result<KeyTtl>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Delete keys, returning how many existed. An empty list is a no-op.
    async fn delete(&self, keys: &[&str]) -> Result<u64>;
}

#[async_trait]
impl<S: StoreExecutor> KeyCommands for CacheClient<S> {
    async fn expire(&self, key: &str, ttl_seconds: i64) -> Result<bool> {
        let ttl = Ttl::from_secs(ttl_seconds)?;
        let key = self.key(key)?;
        self.run(Command::new("EXPIRE", key).arg(ttl.as_secs()))
            .await
    }

    async fn ttl_remaining(&self, key: &str) -> Result<KeyTtl> {
        let key = self.key(key)?;
        let reply: i64 = self.run(Command::new("TTL", key)).await?;
        Ok(KeyTtl::from_reply(reply))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let key = self.key(key)?;
        let found: u64 = self.run(Command::new("EXISTS", key)).await?;
        Ok(found > 0)
    }

    async fn delete(&self, keys: &[&str]) -> Result<u64> {
        let Some((first, rest)) = keys.split_first() else {
            return Ok(0);
        };

        let mut command = Command::new("DEL", self.key(first)?);
        for key in rest {
            command = command.arg(self.key(key)?);
        }
        self.run(command).await
    }
}
