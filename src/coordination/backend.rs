//! Seams between the coordination client and a concrete store

use crate::common::Result;
use async_trait::async_trait;

/// Opens sessions against a coordination store.
#[async_trait]
pub trait CoordinationBackend: Send + Sync {
    /// Establish a fresh session. `readonly` sessions are only ever read from.
    async fn connect(&self, readonly: bool) -> Result<Box<dyn CoordinationSession>>;

    /// Human-readable target, for logs.
    fn describe(&self) -> String;
}

/// One live session. Absent paths are reported through the result, never as errors.
#[async_trait]
pub trait CoordinationSession: Send + Sync {
    async fn exists(&self, path: &str) -> Result<bool>;

    /// `None` when the node does not exist.
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Create a node whose parent exists. Returns `false` if it already existed.
    async fn create(&self, path: &str, data: &[u8]) -> Result<bool>;

    /// Overwrite an existing node.
    async fn set(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Tear the session down.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
