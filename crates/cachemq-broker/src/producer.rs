//! # Message Producer
//!
//! Publishes persistent messages to durable queues and waits for the broker's
//! publisher confirm before reporting success.

use chrono::Utc;
use lapin::options::{BasicPublishOptions, ConfirmSelectOptions};
use lapin::publisher_confirm::Confirmation;
use lapin::types::ShortString;
use lapin::{BasicProperties, Channel};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use cachemq_domain::{with_deadline, ClientError, Result};

use crate::connection::BrokerConnection;

/// Persistent delivery mode
const PERSISTENT: u8 = 2;

const JSON: &str = "application/json";
const BINARY: &str = "application/octet-stream";

/// Publisher over a shared broker connection.
///
/// Cheap to share behind an `Arc`; concurrent sends draw separate channels
/// from a small pool.
pub struct MessageProducer {
    broker: Arc<BrokerConnection>,
    channels: Mutex<Vec<Channel>>,
}

impl MessageProducer {
    pub fn new(broker: Arc<BrokerConnection>) -> Self {
        Self {
            broker,
            channels: Mutex::new(Vec::new()),
        }
    }

    pub const fn broker(&self) -> &Arc<BrokerConnection> {
        &self.broker
    }

    /// Publish `payload` as JSON. Returns the message id.
    ///
    /// # Errors
    ///
    /// `Serialization` if the payload cannot be encoded, `Publish` if the
    /// broker rejects the message or the connection drops before confirming.
    pub async fn send<T: Serialize + Sync>(&self, queue: &str, payload: &T) -> Result<Uuid> {
        let body = serde_json::to_vec(payload)?;
        self.publish(queue, &body, JSON).await
    }

    /// Publish raw bytes.
    pub async fn send_bytes(&self, queue: &str, payload: &[u8]) -> Result<Uuid> {
        self.publish(queue, payload, BINARY).await
    }

    /// Publish to the configured default queue.
    pub async fn send_default<T: Serialize + Sync>(&self, payload: &T) -> Result<Uuid> {
        let queue = self.broker.config().default_queue.clone();
        self.send(&queue, payload).await
    }

    async fn publish(&self, queue: &str, payload: &[u8], content_type: &str) -> Result<Uuid> {
        if queue.is_empty() {
            return Err(ClientError::InvalidArgument("queue name must not be empty".into()));
        }
        self.broker.ensure_queue(queue).await?;

        let message_id = Uuid::new_v4();
        let properties = BasicProperties::default()
            .with_delivery_mode(PERSISTENT)
            .with_content_type(ShortString::from(content_type))
            .with_message_id(ShortString::from(message_id.to_string()))
            .with_timestamp(u64::try_from(Utc::now().timestamp()).unwrap_or_default());

        let channel = self.checkout().await?;
        let timeout = self.broker.config().operation_timeout;

        let outcome = with_deadline(timeout, "publish", async {
            let confirm = channel
                .basic_publish(
                    "",
                    queue,
                    BasicPublishOptions {
                        mandatory: true,
                        ..BasicPublishOptions::default()
                    },
                    payload,
                    properties,
                )
                .await
                .map_err(|e| publish_error(queue, "publish failed", e))?;

            let confirmation = confirm
                .await
                .map_err(|e| publish_error(queue, "connection lost before confirm", e))?;

            confirmed(queue, &confirmation)
        })
        .await;

        match &outcome {
            Ok(()) => {
                debug!(queue, %message_id, bytes = payload.len(), "Message published");
                self.checkin(channel).await;
            }
            Err(err) => {
                warn!(queue, %message_id, error = %err, "Publish failed");
                // A timed-out publish may still confirm later; don't reuse
                // a channel with an outstanding confirm.
                if !matches!(err, ClientError::Timeout { .. }) {
                    self.checkin(channel).await;
                }
            }
        }

        outcome.map(|()| message_id)
    }

    async fn checkout(&self) -> Result<Channel> {
        while let Some(channel) = self.channels.lock().await.pop() {
            if channel.status().connected() {
                return Ok(channel);
            }
        }

        let channel = self.broker.create_channel().await?;
        with_deadline(self.broker.config().operation_timeout, "confirm select", async {
            channel
                .confirm_select(ConfirmSelectOptions::default())
                .await
                .map_err(ClientError::from)
        })
        .await?;
        info!(channel_id = channel.id(), "Opened confirm channel");
        Ok(channel)
    }

    async fn checkin(&self, channel: Channel) {
        if !channel.status().connected() {
            return;
        }
        let mut pool = self.channels.lock().await;
        if pool.len() < self.broker.config().channel_pool_size {
            pool.push(channel);
        }
    }
}

impl std::fmt::Debug for MessageProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageProducer")
            .field("broker", &self.broker)
            .finish_non_exhaustive()
    }
}

/// Map a publisher confirm onto success or `Publish`.
fn confirmed(queue: &str, confirmation: &Confirmation) -> Result<()> {
    match confirmation {
        Confirmation::Ack(None) => Ok(()),
        Confirmation::Ack(Some(_)) => Err(ClientError::publish(format!(
            "message to '{queue}' was returned as unroutable"
        ))),
        Confirmation::Nack(_) => Err(ClientError::publish(format!(
            "broker nacked message to '{queue}'"
        ))),
        Confirmation::NotRequested => Err(ClientError::publish(format!(
            "no confirm for message to '{queue}': channel is not in confirm mode"
        ))),
    }
}

fn publish_error(queue: &str, what: &str, err: lapin::Error) -> ClientError {
    ClientError::Publish {
        message: format!("{what} on '{queue}': {err}"),
        source: Some(Box::new(err)),
    }
}
