//! # cachemq Broker Client
//!
//! Durable-queue messaging over an AMQP 0-9-1 broker (RabbitMQ).
//!
//! ```text
//!  MessageProducer ──send──▶ ┌──────────────────┐ ──deliver──▶ MessageConsumer
//!   (confirm channels)       │  durable queue   │              (Subscription task)
//!                            └──────────────────┘                      │
//!                                     ▲                                ▼
//!                                     └──── nack(requeue) ◀──── handler error
//! ```
//!
//! Both sides share one [`BrokerConnection`], which reconnects lazily and
//! declares queues on first use. Delivery is at-least-once.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cachemq_broker::{BrokerConfig, BrokerConnection, ConsumerConfig, Message, MessageConsumer, MessageProducer};
//!
//! let broker = Arc::new(BrokerConnection::open(BrokerConfig::default()).await?);
//! let producer = MessageProducer::new(broker.clone());
//! producer.send("orders", &order).await?;
//!
//! let consumer = MessageConsumer::new(broker, ConsumerConfig::default());
//! let subscription = consumer
//!     .subscribe("orders", |msg: Message| async move { handle(msg.json()?).await })
//!     .await?;
//! subscription.stop().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod connection;
pub mod consumer;
pub mod producer;

// Re-export commonly used types
pub use cachemq_domain::{ClientError, ErrorKind, Result, RetryConfig};
pub use connection::{BrokerConfig, BrokerConnection, QueueRegistry, QueueSpec};
pub use consumer::{
    ConsumerConfig, Disposition, FailurePolicy, Message, MessageConsumer, MessageHandler,
    Subscription,
};
pub use producer::MessageProducer;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
