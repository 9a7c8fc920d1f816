//! # cachemq Cache Client
//!
//! Typed operations over a Redis-compatible key-value store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Application Layer                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Command Family Traits                     │
//! │   (Key, String, Hash, List, Set, SortedSet ... Commands)     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       CacheClient<S>                         │
//! │        (validation, namespacing, reply decoding)             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │      RedisStore         │   │        MemoryStore           │
//! │ (pool, retry, deadline) │   │     (feature test-util)      │
//! └─────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - `test-util`: Enable the in-process [`store::MemoryStore`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cachemq_cache::{CacheClient, StoreConfig, StringCommands, SortedSetCommands};
//!
//! let cache = CacheClient::new(StoreConfig::default()).await?;
//!
//! cache.set_with_ttl("session:42", "token", 300).await?;
//! cache.z_add("leaderboard", "alice", 10.0).await?;
//! let top = cache.z_range("leaderboard", 0, 9).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod store;

// Re-export commonly used types
pub use cachemq_domain::{ClientError, ErrorKind, KeyTtl, Result, RetryConfig};
pub use client::{
    CacheClient, HashCommands, KeyCommands, ListCommands, SetCommands, SortedSetCommands,
    StringCommands,
};
pub use store::{Command, RedisStore, StoreConfig, StoreExecutor};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
