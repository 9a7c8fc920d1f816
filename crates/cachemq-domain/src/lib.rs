//! # cachemq Domain Model
//!
//! Value types and policies shared by the cache client (`cachemq-cache`) and
//! the messaging client (`cachemq-broker`). These types carry the caller-side
//! validation rules, so both layers reject bad input the same way before any
//! network round trip happens.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod deadline;
pub mod error;
pub mod retry;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use deadline::with_deadline;
pub use error::{BoxError, ClientError, ErrorKind, Result};
pub use retry::{with_retry, RetryConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// KEYS
// =============================================================================

/// Non-empty store key, optionally scoped to a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key(String);

impl Key {
    /// Validate a caller-supplied key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(ClientError::InvalidArgument("key must not be empty".into()));
        }
        Ok(Self(key))
    }

    /// Prefix the key with `namespace:` when a namespace is configured.
    #[must_use]
    pub fn scoped(self, namespace: Option<&str>) -> Self {
        match namespace {
            Some(ns) if !ns.is_empty() => Self(format!("{ns}:{}", self.0)),
            _ => self,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// TTL
// =============================================================================

/// Strictly positive expiry, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ttl(u64);

impl Ttl {
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `seconds <= 0`.
    pub fn from_secs(seconds: i64) -> Result<Self> {
        u64::try_from(seconds)
            .ok()
            .filter(|s| *s > 0)
            .map(Self)
            .ok_or_else(|| {
                ClientError::InvalidArgument(format!(
                    "ttl must be greater than zero, got {seconds}"
                ))
            })
    }

    pub const fn as_secs(self) -> u64 {
        self.0
    }

    pub const fn as_duration(self) -> Duration {
        Duration::from_secs(self.0)
    }
}

/// Remaining lifetime of a key as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// Key expires after this many seconds
    Expires(u64),
    /// Key exists without an expiry
    Persistent,
    /// Key does not exist
    Missing,
}

impl KeyTtl {
    /// Decode the store's `TTL` reply (`n`, `-1`, `-2`).
    pub fn from_reply(reply: i64) -> Self {
        match reply {
            -2 => Self::Missing,
            n if n < 0 => Self::Persistent,
            n => Self::Expires(n.unsigned_abs()),
        }
    }

    /// Seconds remaining, `-1` for no expiry, `-2` for an absent key.
    pub fn as_code(self) -> i64 {
        match self {
            Self::Expires(secs) => i64::try_from(secs).unwrap_or(i64::MAX),
            Self::Persistent => -1,
            Self::Missing => -2,
        }
    }
}

// =============================================================================
// NUMERIC ARGUMENTS
// =============================================================================

/// Validate an increment/decrement amount. Direction is carried by the
/// operation name, so the amount itself must be positive.
///
/// # Errors
///
/// Returns `InvalidArgument` if `delta <= 0`.
pub fn positive_delta(delta: i64) -> Result<i64> {
    if delta <= 0 {
        return Err(ClientError::InvalidArgument(format!(
            "delta must be greater than zero, got {delta}"
        )));
    }
    Ok(delta)
}

/// # Errors
///
/// Returns `InvalidArgument` if the score is NaN or infinite.
pub fn finite_score(score: f64) -> Result<f64> {
    if !score.is_finite() {
        return Err(ClientError::InvalidArgument(format!(
            "score must be a finite number, got {score}"
        )));
    }
    Ok(score)
}

/// # Errors
///
/// Returns `InvalidArgument` if the field name is empty.
pub fn non_empty_field(field: &str) -> Result<&str> {
    if field.is_empty() {
        return Err(ClientError::InvalidArgument(
            "hash field must not be empty".into(),
        ));
    }
    Ok(field)
}
