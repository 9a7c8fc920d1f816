//! Ordered list operations

use async_trait::async_trait;

use cachemq_domain::Result;

use super::CacheClient;
use crate::store::{Command, StoreExecutor};

#[async_trait]
pub trait ListCommands: Send + Sync {
    /// Elements in the inclusive index range. Negative indexes count from
    /// the tail, so `(0, -1)` is the whole list.
    async fn l_range(&self, key: &str, start: i64, end: i64) -> Result<Vec<String>>;

    async fn l_len(&self, key: &str) -> Result<u64>;

    /// Append to the tail, returning the new length.
    async fn l_right_push(&self, key: &str, value: &str) -> Result<u64>;

    /// Remove and return the tail element.
    async fn l_right_pop(&self, key: &str) -> Result<Option<String>>;
}

#[async_trait]
impl<S: StoreExecutor> ListCommands for CacheClient<S> {
    async fn l_range(&self, key: &str, start: i64, end: i64) -> Result<Vec<String>> {
        let key = self.key(key)?;
        self.run(Command::new("LRANGE", key).arg(start).arg(end))
            .await
    }

    async fn l_len(&self, key: &str) -> Result<u64> {
        let key = self.key(key)?;
        self.run(Command::new("LLEN", key)).await
    }

    async fn l_right_push(&self, key: &str, value: &str) -> Result<u64> {
        let key = self.key(key)?;
        self.run(Command::new("RPUSH", key).arg(value)).await
    }

    async fn l_right_pop(&self, key: &str) -> Result<Option<String>> {
        let key = self.key(key)?;
        self.run(Command::new("RPOP", key)).await
    }
}
