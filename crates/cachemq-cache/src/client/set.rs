//! Unordered set operations

use async_trait::async_trait;
use std::collections::HashSet;

use cachemq_domain::Result;

use super::CacheClient;
use crate::store::{Command, StoreExecutor};

#[async_trait]
pub trait SetCommands: Send + Sync {
    async fn s_members(&self, key: &str) -> Result<HashSet<String>>;

    /// Add members. Returns `true` if at least one was new; an empty list is
    /// a no-op returning `false`.
    async fn s_add(&self, key: &str, members: &[&str]) -> Result<bool>;

    async fn s_is_member(&self, key: &str, member: &str) -> Result<bool>;

    /// Remove members, returning how many were present.
    async fn s_remove(&self, key: &str, members: &[&str]) -> Result<u64>;
}

#[async_trait]
impl<S: StoreExecutor> SetCommands for CacheClient<S> {
    async fn s_members(&self, key: &str) -> Result<HashSet<String>> {
        let key = self.key(key)?;
        self.run(Command::new("SMEMBERS", key)).await
    }

    async fn s_add(&self, key: &str, members: &[&str]) -> Result<bool> {
        let key = self.key(key)?;
        if members.is_empty() {
            return Ok(false);
        }
        let added: u64 = self.run(with_members("SADD", key, members)).await?;
        Ok(added > 0)
    }

    async fn s_is_member(&self, key: &str, member: &str) -> Result<bool> {
        let key = self.key(key)?;
        self.run(Command::new("SISMEMBER", key).arg(member)).await
    }

    async fn s_remove(&self, key: &str, members: &[&str]) -> Result<u64> {
        let key = self.key(key)?;
        if members.is_empty() {
            return Ok(0);
        }
        self.run(with_members("SREM", key, members)).await
    }
}

fn with_members(name: &'static str, key: String, members: &[&str]) -> Command {
    members
        .iter()
        .fold(Command::new(name, key), |command, member| command.arg(*member))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::client;
    use cachemq_domain::ErrorKind;
    use fake::faker::internet::en::Username;
    use fake::Fake;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let cache = client();

        assert!(cache.s_add("tags", &["rust", "redis"]).await.unwrap());
        assert!(!cache.s_add("tags", &["rust"]).await.unwrap());
        assert!(!cache.s_add("tags", &[]).await.unwrap());

        let members = cache.s_members("tags").await.unwrap();
        assert_eq!(members, HashSet::from(["rust".to_string(), "redis".to_string()]));
    }

    #[tokio::test]
    async fn test_membership_and_remove() {
        let cache = client();
        cache.s_add("online", &["alice", "bob"]).await.unwrap();

        assert!(cache.s_is_member("online", "alice").await.unwrap());
        assert_eq!(cache.s_remove("online", &["alice", "carol"]).await.unwrap(), 1);
        assert!(!cache.s_is_member("online", "alice").await.unwrap());
        assert_eq!(cache.s_remove("online", &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_key_rejected_even_without_members() {
        let cache = client();

        let err = assert_err!(cache.s_add("", &[]).await);
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = assert_err!(cache.s_remove("", &[]).await);
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(!assert_ok!(cache.s_add("tags", &[]).await));
    }

    #[tokio::test]
    async fn test_members_of_missing_key_is_empty() {
        let cache = client();
        assert!(cache.s_members("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_adds_store_each_member_once() {
        let cache = client();
        let users: Vec<String> = (0..8).map(|_| Username().fake()).collect();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let cache = cache.clone();
            let users = users.clone();
            handles.push(tokio::spawn(async move {
                for user in &users {
                    cache.s_add("visitors", &[user.as_str()]).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let expected: HashSet<String> = users.into_iter().collect();
        assert_eq!(cache.s_members("visitors").await.unwrap(), expected);
    }
}
