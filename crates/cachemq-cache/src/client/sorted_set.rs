//! Sorted set (leaderboard) operations

use async_trait::async_trait;

use cachemq_domain::{finite_score, Result};

use super::CacheClient;
use crate::store::{Command, StoreExecutor};

#[async_trait]
pub trait SortedSetCommands: Send + Sync {
    /// Add a member or update its score. Returns `true` only when the member
    /// is new.
    async fn z_add(&self, key: &str, member: &str, score: f64) -> Result<bool>;

    /// Members by ascending score (ties by member), inclusive index range.
    async fn z_range(&self, key: &str, start: i64, end: i64) -> Result<Vec<String>>;

    /// Remove members, returning how many were present.
    async fn z_remove(&self, key: &str, members: &[&str]) -> Result<u64>;

    async fn z_score(&self, key: &str, member: &str) -> Result<Option<f64>>;
}

#[async_trait]
impl<S: StoreExecutor> SortedSetCommands for CacheClient<S> {
    async fn z_add(&self, key: &str, member: &str, score: f64) -> Result<bool> {
        let score = finite_score(score)?;
        let key = self.key(key)?;
        let added: u64 = self
            .run(Command::new("ZADD", key).arg(score).arg(member))
            .await?;
        Ok(added > 0)
    }

    async fn z_range(&self, key: &str, start: i64, end: i64) -> Result<Vec<String>> {
        let key = self.key(key)?;
        self.run(Command::new("ZRANGE", key).arg(start).arg(end))
            .await
    }

    async fn z_remove(&self, key: &str, members: &[&str]) -> Result<u64> {
        let key = self.key(key)?;
        if members.is_empty() {
            return Ok(0);
        }
        let command = members
            .iter()
            .fold(Command::new("ZREM", key), |command, member| command.arg(*member));
        self.run(command).await
    }

    async fn z_score(&self, key: &str, member: &str) -> Result<Option<f64>> {
        let key = self.key(key)?;
        self.run(Command::new("ZSCORE", key).arg(member)).await
    }
}
