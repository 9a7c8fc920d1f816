//! # cachemq
//!
//! Binary entry point: one-shot cache commands, a publisher, a long-running
//! queue listener and an end-to-end demo.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use cachemq_broker::{BrokerConnection, ConsumerConfig, Message, MessageConsumer, MessageProducer};
use cachemq_cache::{CacheClient, StringCommands};
use cachemq_cli::{init_tracing, Config, VERSION};

#[derive(Debug, Parser)]
#[command(name = "cachemq", version, about = "Typed Redis cache and durable queue client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Store a string value
    Set {
        key: String,
        value: String,
        /// Expiry in seconds
        #[arg(long)]
        ttl: Option<i64>,
    },
    /// Print a string value
    Get { key: String },
    /// Increment a counter
    Incr {
        key: String,
        #[arg(default_value_t = 1)]
        delta: i64,
    },
    /// Decrement a counter
    Decr {
        key: String,
        #[arg(default_value_t = 1)]
        delta: i64,
    },
    /// Publish a text message
    Publish {
        message: String,
        /// Target queue (defaults to DEFAULT_QUEUE)
        #[arg(long)]
        queue: Option<String>,
    },
    /// Log every message on a queue until interrupted
    Consume {
        #[arg(long)]
        queue: Option<String>,
    },
    /// Write a key, publish a message and consume it back
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env();
    init_tracing(&config);

    tracing::debug!(version = VERSION, command = ?cli.command, "Starting cachemq");

    match cli.command {
        Command::Set { key, value, ttl } => {
            let cache = cache(&config).await?;
            match ttl {
                Some(ttl) => cache.set_with_ttl(&key, &value, ttl).await?,
                None => cache.set(&key, &value).await?,
            }
            println!("OK");
            cache.close().await;
        }
        Command::Get { key } => {
            let cache = cache(&config).await?;
            match cache.get(&key).await? {
                Some(value) => println!("{value}"),
                None => println!("(nil)"),
            }
            cache.close().await;
        }
        Command::Incr { key, delta } => {
            let cache = cache(&config).await?;
            println!("{}", cache.increment(&key, delta).await?);
            cache.close().await;
        }
        Command::Decr { key, delta } => {
            let cache = cache(&config).await?;
            println!("{}", cache.decrement(&key, delta).await?);
            cache.close().await;
        }
        Command::Publish { message, queue } => {
            let broker = broker(&config).await?;
            let queue = queue.unwrap_or_else(|| config.broker.default_queue.clone());
            tracing::info!(queue = %queue, message = %message, "Sending message");

            let producer = MessageProducer::new(broker.clone());
            let message_id = producer.send_bytes(&queue, message.as_bytes()).await?;
            println!("{message_id}");
            broker.close().await?;
        }
        Command::Consume { queue } => {
            let broker = broker(&config).await?;
            let queue = queue.unwrap_or_else(|| config.broker.default_queue.clone());
            consume(&broker, &queue).await?;
            broker.close().await?;
        }
        Command::Demo => demo(&config).await?,
    }

    Ok(())
}

async fn cache(config: &Config) -> anyhow::Result<CacheClient> {
    tracing::info!(url = %config.store.url, "Connecting to Redis");
    CacheClient::new(config.store.clone())
        .await
        .context("failed to connect to Redis")
}

async fn broker(config: &Config) -> anyhow::Result<Arc<BrokerConnection>> {
    let broker = BrokerConnection::open(config.broker.clone())
        .await
        .context("failed to connect to broker")?;
    Ok(Arc::new(broker))
}

async fn consume(broker: &Arc<BrokerConnection>, queue: &str) -> anyhow::Result<()> {
    let consumer = MessageConsumer::new(broker.clone(), ConsumerConfig::default());
    let subscription = consumer
        .subscribe(queue, |msg: Message| async move {
            tracing::info!(
                queue = %msg.queue,
                message_id = msg.message_id.as_deref().unwrap_or_default(),
                redelivered = msg.redelivered,
                text = %String::from_utf8_lossy(&msg.payload),
                "Received message"
            );
            anyhow::Ok(())
        })
        .await?;

    tokio::select! {
        () = shutdown_signal() => {}
        () = wait_finished(&subscription) => {
            tracing::warn!(queue, "Subscription ended unexpectedly");
        }
    }

    subscription.stop().await?;
    Ok(())
}

async fn wait_finished(subscription: &cachemq_broker::Subscription) {
    while !subscription.is_finished() {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}

/// Cache round trip, then a publish consumed back off the default queue.
async fn demo(config: &Config) -> anyhow::Result<()> {
    let cache = cache(config).await?;
    cache.set("test", "test").await?;
    let value = cache.get("test").await?;
    tracing::info!(key = "test", value = ?value, "Cache round trip");
    cache.close().await;

    let broker = broker(config).await?;
    let queue = config.broker.default_queue.clone();
    let payload = "hello, consumer~";

    let producer = MessageProducer::new(broker.clone());
    tracing::info!(queue = %queue, message = payload, "Sending message");
    producer.send(&queue, &payload).await?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let consumer = MessageConsumer::new(broker.clone(), ConsumerConfig::default());
    let subscription = consumer
        .subscribe(&queue, move |msg: Message| {
            let tx = tx.clone();
            async move {
                // Older messages on the queue may be plain text
                let text = msg
                    .json::<String>()
                    .or_else(|_| msg.text().map(str::to_string))?;
                tracing::info!(queue = %msg.queue, text = %text, "Received message");
                tx.send(text)?;
                anyhow::Ok(())
            }
        })
        .await?;

    let received = tokio::time::timeout(config.broker.operation_timeout, async {
        while let Some(text) = rx.recv().await {
            if text == payload {
                return Some(text);
            }
        }
        None
    })
    .await
    .context("demo message was not received in time")?;
    println!("{}", received.unwrap_or_default());

    subscription.stop().await?;
    broker.close().await?;
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
