//! Error types for sentinel-sync

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    Config(String),

    // === Coordination Store Errors ===
    #[error("Coordination store error: {0}")]
    Coordination(String),

    #[error("Session is read-only, refusing to write {0}")]
    ReadOnly(String),

    // === Failover Service Errors ===
    #[error("Failover service error: {0}")]
    Failover(String),

    #[error("Malformed event on {channel}: {reason}")]
    MalformedEvent { channel: String, reason: String },

    // === Audit Errors ===
    #[error("<{group}> mismatch: store has {stored}, config has {expected}")]
    ConsistencyMismatch {
        group: String,
        stored: String,
        expected: String,
    },

    // === Serialization ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Is this a retryable error?
    ///
    /// Only coordination failures are recovered by the reconnect-and-retry
    /// loop of the write protocol.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Coordination(_))
    }

    pub fn malformed(channel: &str, reason: impl Into<String>) -> Self {
        Error::MalformedEvent {
            channel: channel.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<zookeeper_client::Error> for Error {
    fn from(e: zookeeper_client::Error) -> Self {
        Error::Coordination(e.to_string())
    }
}

impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::Failover(e.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Config(e.to_string())
    }
}
