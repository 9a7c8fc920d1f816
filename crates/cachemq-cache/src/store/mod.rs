//! # Store Module
//!
//! Raw command execution against the remote key-value store. Every typed
//! cache operation is lowered to a [`Command`] and run through a
//! [`StoreExecutor`].

pub mod command;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod redis_store;

use async_trait::async_trait;
use redis::Value;
use std::sync::Arc;

use cachemq_domain::Result;

pub use command::Command;
#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryStore;
pub use redis_store::{RedisStore, StoreConfig};

/// Single serialized-command execution contract.
///
/// Implementations return the raw reply or a `Connection`, `Timeout` or
/// `Protocol` error. A broken connection must surface as an error, never as
/// an empty reply.
#[async_trait]
pub trait StoreExecutor: Send + Sync {
    async fn execute(&self, command: Command) -> Result<Value>;
}

#[async_trait]
impl<T: StoreExecutor + ?Sized> StoreExecutor for Arc<T> {
    async fn execute(&self, command: Command) -> Result<Value> {
        (**self).execute(command).await
    }
}
