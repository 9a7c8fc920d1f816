//! Client error taxonomy shared by the cache and broker layers

use thiserror::Error;

/// Boxed transport error kept as the `source` of a translated failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by the cache and messaging clients
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Operation timed out: {message}")]
    Timeout { message: String },

    #[error("Protocol error: {message}")]
    Protocol {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Publish failed: {message}")]
    Publish {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Queue conflict on '{queue}': {message}")]
    QueueConflict { queue: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Connection closed: {0}")]
    Closed(String),
}

/// Coarse error category, for callers deciding whether to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    Connection,
    Timeout,
    Protocol,
    TypeMismatch,
    Publish,
    QueueConflict,
    Serialization,
}

impl ClientError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
            source: None,
        }
    }

    pub fn publish(message: impl Into<String>) -> Self {
        Self::Publish {
            message: message.into(),
            source: None,
        }
    }

    /// Category of this error. `Closed` reports as a connection failure.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Connection { .. } | Self::Closed(_) => ErrorKind::Connection,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Protocol { .. } => ErrorKind::Protocol,
            Self::TypeMismatch(_) => ErrorKind::TypeMismatch,
            Self::Publish { .. } => ErrorKind::Publish,
            Self::QueueConflict { .. } => ErrorKind::QueueConflict,
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Transient infrastructure faults are worth retrying; a handle the
    /// caller closed is not.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for ClientError {
    fn from(err: redis::RedisError) -> Self {
        use redis::ErrorKind as Kind;

        let message = err.to_string();

        if err.is_timeout() {
            return Self::Timeout { message };
        }

        if err.code() == Some("WRONGTYPE")
            || message.contains("WRONGTYPE")
            || (err.kind() == Kind::ResponseError
                && (message.contains("not an integer") || message.contains("not a valid float")))
        {
            return Self::TypeMismatch(message);
        }

        if err.is_connection_dropped()
            || err.is_connection_refusal()
            || err.is_io_error()
            || matches!(
                err.kind(),
                Kind::AuthenticationFailed | Kind::BusyLoadingError | Kind::TryAgain | Kind::ClusterDown
            )
        {
            return Self::Connection {
                message,
                source: Some(Box::new(err)),
            };
        }

        Self::Protocol {
            message,
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(feature = "amqp")]
impl From<lapin::Error> for ClientError {
    fn from(err: lapin::Error) -> Self {
        let message = err.to_string();
        if matches!(err, lapin::Error::ProtocolError(_)) {
            Self::Protocol {
                message,
                source: Some(Box::new(err)),
            }
        } else {
            Self::Connection {
                message,
                source: Some(Box::new(err)),
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
