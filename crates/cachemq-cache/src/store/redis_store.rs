//! # Redis Store Connection
//!
//! Pooled, auto-reconnecting connection to the remote store.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use cachemq_domain::{with_deadline, with_retry, ClientError, Result, RetryConfig};

use super::{Command, StoreExecutor};

/// Redis store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub pool_size: usize,
    /// Deadline for a single attempt of one command
    pub operation_timeout: Duration,
    pub retry: RetryConfig,
    /// Optional logical namespace prefixed to every key
    pub namespace: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            pool_size: 4,
            operation_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
            namespace: None,
        }
    }
}

type Pool = Arc<Vec<ConnectionManager>>;

/// Redis store connection with a fixed-size pool of connection managers.
///
/// The pool is opened on first use; each manager re-establishes its own
/// socket after a drop. Commands are spread round-robin across the pool.
pub struct RedisStore {
    client: Client,
    config: StoreConfig,
    pool: RwLock<Option<Pool>>,
    next: AtomicUsize,
    closed: AtomicBool,
}

impl RedisStore {
    /// Create a store handle without connecting.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the URL cannot be parsed.
    pub fn new(config: StoreConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| ClientError::InvalidArgument(format!("invalid store url: {e}")))?;

        Ok(Self {
            client,
            config,
            pool: RwLock::new(None),
            next: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        })
    }

    /// Create a store handle and open the pool eagerly.
    pub async fn connect(config: StoreConfig) -> Result<Self> {
        let store = Self::new(config)?;
        with_retry(&store.config.retry, "CONNECT", || store.connection()).await?;
        Ok(store)
    }

    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Round-trip health check.
    pub async fn ping(&self) -> Result<()> {
        let reply = self.execute(Command::bare("PING")).await?;
        match reply {
            Value::SimpleString(ref s) if s == "PONG" => Ok(()),
            other => Err(ClientError::protocol(format!("unexpected PING reply: {other:?}"))),
        }
    }

    /// Drop the pool. Later commands fail with `Closed`.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        if self.pool.write().await.take().is_some() {
            info!(url = %self.config.url, "Store connection closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        self.ensure_open()?;

        if let Some(pool) = self.pool.read().await.as_ref() {
            return Ok(self.pick(pool));
        }

        let mut guard = self.pool.write().await;
        self.ensure_open()?;

        let pool = match guard.as_ref() {
            Some(pool) => pool.clone(),
            None => {
                let pool = Arc::new(self.open_pool().await?);
                *guard = Some(pool.clone());
                pool
            }
        };

        Ok(self.pick(&pool))
    }

    /// One connect attempt per manager; callers own the retry loop.
    async fn open_pool(&self) -> Result<Vec<ConnectionManager>> {
        let size = self.config.pool_size.max(1);
        let mut managers = Vec::with_capacity(size);

        for _ in 0..size {
            let manager = with_deadline(self.config.operation_timeout, "CONNECT", async {
                Ok(ConnectionManager::new(self.client.clone()).await?)
            })
            .await?;
            managers.push(manager);
        }

        info!(url = %self.config.url, pool_size = size, "Store connection pool opened");
        Ok(managers)
    }

    fn pick(&self, pool: &[ConnectionManager]) -> ConnectionManager {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % pool.len();
        pool[index].clone()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(ClientError::Closed(format!("store {}", self.config.url)));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreExecutor for RedisStore {
    async fn execute(&self, command: Command) -> Result<Value> {
        let operation = command.name();
        debug!(command = operation, key = ?command.key(), "Executing store command");

        with_retry(&self.config.retry, operation, || {
            let command = &command;
            async move {
                let mut conn = self.connection().await?;
                with_deadline(self.config.operation_timeout, operation, async move {
                    let reply: Value = command.to_cmd().query_async(&mut conn).await?;
                    Ok(reply)
                })
                .await
            }
        })
        .await
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("url", &self.config.url)
            .field("pool_size", &self.config.pool_size)
            .field("closed", &self.is_closed())
            .finish()
    }
}
