//! Coordination client holding exactly one session

use crate::common::{Error, Result};
use crate::coordination::backend::{CoordinationBackend, CoordinationSession};
use crate::coordination::record::ReadOutcome;
use std::sync::Arc;

pub struct CoordinationClient {
    backend: Arc<dyn CoordinationBackend>,
    session: Option<Box<dyn CoordinationSession>>,
    readonly: bool,
}

impl CoordinationClient {
    /// Open the first session. Fails if the store cannot be reached.
    pub async fn connect(backend: Arc<dyn CoordinationBackend>, readonly: bool) -> Result<Self> {
        let session = backend.connect(readonly).await?;
        tracing::info!(
            "Connected to coordination store {} ({})",
            backend.describe(),
            if readonly { "read-only" } else { "read-write" }
        );
        Ok(Self {
            backend,
            session: Some(session),
            readonly,
        })
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    fn session(&self) -> Result<&dyn CoordinationSession> {
        self.session
            .as_deref()
            .ok_or_else(|| Error::Coordination("no active session".into()))
    }

    pub async fn exists(&self, path: &str) -> Result<bool> {
        self.session()?.exists(path).await
    }

    /// Raw node contents, `None` if the node does not exist.
    pub async fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        self.session()?.get(path).await
    }

    /// Read and decode a master record.
    pub async fn read_record(&self, path: &str) -> Result<ReadOutcome> {
        Ok(ReadOutcome::from_bytes(self.read(path).await?))
    }

    /// Write `value` at `path`, creating missing ancestors first.
    pub async fn write(&self, path: &str, value: &[u8]) -> Result<()> {
        if self.readonly {
            return Err(Error::ReadOnly(path.to_string()));
        }
        let session = self.session()?;

        for ancestor in ancestors(path) {
            if session.create(ancestor, b"").await? {
                tracing::debug!("Created {}", ancestor);
            }
        }

        if !session.create(path, value).await? {
            session.set(path, value).await?;
        }
        Ok(())
    }

    /// Drop the current session and open a new one.
    pub async fn reconnect(&mut self) -> Result<()> {
        if let Some(old) = self.session.take() {
            if let Err(e) = old.close().await {
                tracing::debug!("Ignoring error closing stale session: {}", e);
            }
        }
        let session = self.backend.connect(self.readonly).await?;
        self.session = Some(session);
        tracing::info!("Reconnected to coordination store {}", self.backend.describe());
        Ok(())
    }
}

/// Proper ancestors of an absolute path, shortest first, excluding `/`.
fn ancestors(path: &str) -> Vec<&str> {
    path.match_indices('/')
        .map(|(idx, _)| &path[..idx])
        .filter(|prefix| !prefix.is_empty())
        .collect()
}
