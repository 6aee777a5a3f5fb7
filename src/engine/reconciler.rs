//! Idempotent master write protocol
//!
//! Every write reads the current record first and only touches the store
//! when the record is missing or differs from `{addr, online}`. Failures
//! reconnect the shared client and retry, up to a fixed number of attempts.

use crate::common::Result;
use crate::coordination::{master_path, Address, CoordinationClient, MasterRecord, ReadOutcome};
use std::time::Duration;
use tokio::sync::Mutex;

/// What one invocation of the write protocol ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Node did not exist and was created.
    Created,
    /// Node held another address or state and was overwritten.
    Updated,
    /// Node already held this address as online.
    Unchanged,
    /// Every attempt failed.
    GaveUp,
}

impl WriteOutcome {
    pub fn wrote(&self) -> bool {
        matches!(self, WriteOutcome::Created | WriteOutcome::Updated)
    }
}

pub struct Reconciler {
    client: Mutex<CoordinationClient>,
    root: String,
    retry_budget: u32,
    backoff: Duration,
}

impl Reconciler {
    pub fn new(
        client: CoordinationClient,
        root: impl Into<String>,
        retry_budget: u32,
        backoff: Duration,
    ) -> Self {
        Self {
            client: Mutex::new(client),
            root: root.into(),
            retry_budget: retry_budget.max(1),
            backoff,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn path_for(&self, group: &str) -> String {
        master_path(&self.root, group)
    }

    /// Make the store say `new` is the online master of `group`.
    ///
    /// `old` only appears in logs. Runs to completion once started; the
    /// backoff sleep happens with the client unlocked.
    pub async fn set_master(&self, group: &str, new: &Address, old: Option<&Address>) -> WriteOutcome {
        let path = self.path_for(group);
        let mut remaining = self.retry_budget;

        loop {
            let attempt = {
                let client = self.client.lock().await;
                write_once(&client, &path, group, new, old).await
            };

            match attempt {
                Ok(outcome) => return outcome,
                Err(e) => {
                    tracing::debug!(group = %group, "set master failed, will retry: {}", e);
                    remaining -= 1;
                    if remaining == 0 {
                        tracing::error!(
                            group = %group,
                            "set master failed {} times, giving up",
                            self.retry_budget
                        );
                        return WriteOutcome::GaveUp;
                    }

                    if let Err(e) = self.client.lock().await.reconnect().await {
                        tracing::debug!(group = %group, "reconnect to coordination store failed: {}", e);
                    }
                    tokio::time::sleep(self.backoff).await;
                }
            }
        }
    }
}

async fn write_once(
    client: &CoordinationClient,
    path: &str,
    group: &str,
    new: &Address,
    old: Option<&Address>,
) -> Result<WriteOutcome> {
    let record = MasterRecord::online(new);

    match client.read_record(path).await? {
        ReadOutcome::Missing => {
            tracing::warn!(group = %group, "node '{}' does not exist, creating it", path);
            client.write(path, &record.encode()?).await?;
            Ok(WriteOutcome::Created)
        }
        ReadOutcome::Present(current) if current.is_online_at(new) => {
            tracing::debug!(
                group = %group,
                "current '{}' equals new '{}', skipped",
                current.addr,
                new
            );
            Ok(WriteOutcome::Unchanged)
        }
        ReadOutcome::Present(current) => {
            client.write(path, &record.encode()?).await?;
            tracing::info!(
                group = %group,
                "set master to '{}', former value was '{}' ({}), reported old master '{}'",
                new,
                current.addr,
                current.state,
                old.map(ToString::to_string).unwrap_or_default()
            );
            Ok(WriteOutcome::Updated)
        }
        ReadOutcome::Corrupt(bytes) => {
            client.write(path, &record.encode()?).await?;
            tracing::warn!(
                group = %group,
                "set master to '{}', replacing undecodable value '{}'",
                new,
                String::from_utf8_lossy(&bytes)
            );
            Ok(WriteOutcome::Updated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordination::MemoryBackend;
    use std::sync::Arc;

    async fn reconciler(backend: &MemoryBackend, budget: u32) -> Reconciler {
        let client = CoordinationClient::connect(Arc::new(backend.clone()), false)
            .await
            .unwrap();
        Reconciler::new(client, "/zk/redis_sentinel", budget, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_create_then_unchanged() {
        let backend = MemoryBackend::new();
        let reconciler = reconciler(&backend, 3).await;
        let addr = Address::new("10.0.0.1", "6379");

        assert_eq!(reconciler.set_master("g1", &addr, None).await, WriteOutcome::Created);
        assert_eq!(backend.write_count(), 1);

        assert_eq!(reconciler.set_master("g1", &addr, None).await, WriteOutcome::Unchanged);
        assert_eq!(backend.write_count(), 1);
    }

    #[tokio::test]
    async fn test_non_online_state_is_rewritten() {
        let backend = MemoryBackend::new();
        backend.insert(
            "/zk/redis_sentinel/g1/master/master",
            br#"{"addr":"10.0.0.1:6379","state":"offline"}"#,
        );
        let reconciler = reconciler(&backend, 3).await;

        let outcome = reconciler
            .set_master("g1", &Address::new("10.0.0.1", "6379"), None)
            .await;
        assert_eq!(outcome, WriteOutcome::Updated);
        assert_eq!(
            backend.value("/zk/redis_sentinel/g1/master/master").unwrap(),
            br#"{"addr": "10.0.0.1:6379", "state": "online"}"#.to_vec()
        );
    }

    #[tokio::test]
    async fn test_corrupt_value_is_rewritten() {
        let backend = MemoryBackend::new();
        backend.insert("/zk/redis_sentinel/g1/master/master", b"garbage");
        let reconciler = reconciler(&backend, 3).await;

        let outcome = reconciler
            .set_master("g1", &Address::new("10.0.0.1", "6379"), None)
            .await;
        assert_eq!(outcome, WriteOutcome::Updated);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let backend = MemoryBackend::new();
        let reconciler = reconciler(&backend, 3).await;
        backend.fail_next(1);

        let outcome = reconciler
            .set_master("g1", &Address::new("10.0.0.1", "6379"), None)
            .await;
        assert_eq!(outcome, WriteOutcome::Created);
        assert_eq!(backend.connect_count(), 2);
    }

    #[tokio::test]
    async fn test_expired_session_is_replaced() {
        let backend = MemoryBackend::new();
        let reconciler = reconciler(&backend, 2).await;
        backend.expire_sessions();

        let outcome = reconciler
            .set_master("g1", &Address::new("10.0.0.1", "6379"), None)
            .await;
        assert_eq!(outcome, WriteOutcome::Created);
    }

    #[tokio::test]
    async fn test_gives_up_after_budget() {
        let backend = MemoryBackend::new();
        let reconciler = reconciler(&backend, 3).await;
        backend.fail_next(10);

        let outcome = reconciler
            .set_master("g1", &Address::new("10.0.0.1", "6379"), None)
            .await;
        assert_eq!(outcome, WriteOutcome::GaveUp);
        // One read per attempt, a reconnect between attempts, nothing more.
        assert_eq!(backend.op_count(), 3);
        assert_eq!(backend.connect_count(), 3);
        assert_eq!(backend.write_count(), 0);
    }

    #[tokio::test]
    async fn test_gives_up_when_unreachable() {
        let backend = MemoryBackend::new();
        let reconciler = reconciler(&backend, 2).await;
        backend.set_unreachable(true);

        let outcome = reconciler
            .set_master("g1", &Address::new("10.0.0.1", "6379"), None)
            .await;
        assert_eq!(outcome, WriteOutcome::GaveUp);

        // The next invocation reconnects and converges.
        backend.set_unreachable(false);
        let outcome = reconciler
            .set_master("g1", &Address::new("10.0.0.1", "6379"), None)
            .await;
        assert_eq!(outcome, WriteOutcome::Created);
    }
}
