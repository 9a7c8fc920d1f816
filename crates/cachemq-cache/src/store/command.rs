//! Store command descriptor

use redis::{Cmd, ToRedisArgs};

/// One store command: operation name, target key and encoded arguments.
///
/// Arguments are encoded eagerly with the store client's `ToRedisArgs`, so a
/// command can be cloned and replayed by the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: &'static str,
    key: Option<String>,
    args: Vec<Vec<u8>>,
}

impl Command {
    pub fn new(name: &'static str, key: impl Into<String>) -> Self {
        Self {
            name,
            key: Some(key.into()),
            args: Vec::new(),
        }
    }

    /// Command without a key (`PING`).
    pub const fn bare(name: &'static str) -> Self {
        Self {
            name,
            key: None,
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg<T: ToRedisArgs>(mut self, arg: T) -> Self {
        self.args.extend(arg.to_redis_args());
        self
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn args(&self) -> &[Vec<u8>] {
        &self.args
    }

    /// Wire form of this command.
    pub fn to_cmd(&self) -> Cmd {
        let mut cmd = redis::cmd(self.name);
        if let Some(key) = &self.key {
            cmd.arg(key);
        }
        for arg in &self.args {
            cmd.arg(arg);
        }
        cmd
    }
}
