//! Hash (field map) operations

use async_trait::async_trait;
use std::collections::HashMap;

use cachemq_domain::{non_empty_field, Result};

use super::CacheClient;
use crate::store::{Command, StoreExecutor};

#[async_trait]
pub trait HashCommands: Send + Sync {
    async fn h_get(&self, key: &str, field: &str) -> Result<Option<String>>;

    /// All fields and values; empty when the key is absent.
    async fn h_get_all(&self, key: &str) -> Result<HashMap<String, String>>;

    /// Set one field. Returns `true` if the field was newly created.
    async fn h_set(&self, key: &str, field: &str, value: &str) -> Result<bool>;

    /// Set every field in one command, so no partial write is observable.
    async fn h_set_all(&self, key: &str, fields: &HashMap<String, String>) -> Result<()>;

    /// Remove fields, returning how many existed.
    async fn h_delete(&self, key: &str, fields: &[&str]) -> Result<u64>;

    async fn h_has_key(&self, key: &str, field: &str) -> Result<bool>;

    /// Add a signed `delta` to an integer field; absent fields start at 0.
    async fn h_increment(&self, key: &str, field: &str, delta: i64) -> Result<i64>;
}

#[async_trait]
impl<S: StoreExecutor> HashCommands for CacheClient<S> {
    async fn h_get(&self, key: &str, field: &str) -> Result<Option<String>> {
        let field = non_empty_field(field)?;
        let key = self.key(key)?;
        self.run(Command::new("HGET", key).arg(field)).await
    }

    async fn h_get_all(&self, key: &str) -> Result<HashMap<String, String>> {
        let key = self.key(key)?;
        self.run(Command::new("HGETALL", key)).await
    }

    async fn h_set(&self, key: &str, field: &str, value: &str) -> Result<bool> {
        let field = non_empty_field(field)?;
        let key = self.key(key)?;
        let created: u64 = self
            .run(Command::new("HSET", key).arg(field).arg(value))
            .await?;
        Ok(created > 0)
    }

    async fn h_set_all(&self, key: &str, fields: &HashMap<String, String>) -> Result<()> {
        let key = self.key(key)?;
        if fields.is_empty() {
            return Ok(());
        }

        let mut command = Command::new("HSET", key);
        for (field, value) in fields {
            non_empty_field(field)?;
            command = command.arg(field).arg(value);
        }

        let _created: u64 = self.run(command).await?;
        Ok(())
    }

    async fn h_delete(&self, key: &str, fields: &[&str]) -> Result<u64> {
        let key = self.key(key)?;
        if fields.is_empty() {
            return Ok(0);
        }
        let command = fields
            .iter()
            .fold(Command::new("HDEL", key), |command, field| command.arg(*field));
        self.run(command).await
    }

    async fn h_has_key(&self, key: &str, field: &str) -> Result<bool> {
        let field = non_empty_field(field)?;
        let key = self.key(key)?;
        self.run(Command::new("HEXISTS", key).arg(field)).await
    }

    async fn h_increment(&self, key: &str, field: &str, delta: i64) -> Result<i64> {
        let field = non_empty_field(field)?;
        let key = self.key(key)?;
        self.run(Command::new("HINCRBY", key).arg(field).arg(delta))
            .await
    }
}
