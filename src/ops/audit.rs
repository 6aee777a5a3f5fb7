//! Consistency audit between the local snapshot and the coordination store
//!
//! Checks groups in snapshot order and stops at the first address mismatch.
//! Missing nodes are fine. A read error fails only that group's check; the
//! audit moves on and reports itself incomplete at the end.

use crate::common::{ConfigSnapshot, Error};
use crate::coordination::{master_path, CoordinationClient, ReadOutcome};

/// Process exit code of a consistent audit.
pub const EXIT_OK: i32 = 0;
/// Process exit code for configuration, connection, or incomplete-audit failures.
pub const EXIT_FAILURE: i32 = 1;
/// Process exit code when a group disagrees with the store.
pub const EXIT_MISMATCH: i32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditOutcome {
    /// Every group matched or had no node yet.
    Consistent,
    /// First group whose stored address disagrees with the snapshot.
    Mismatch {
        group: String,
        stored: String,
        expected: String,
    },
    /// No mismatch, but some groups could not be read.
    Incomplete { unreadable: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub checked: usize,
    pub matched: usize,
    pub absent: usize,
    pub outcome: AuditOutcome,
}

impl AuditReport {
    pub fn is_consistent(&self) -> bool {
        self.outcome == AuditOutcome::Consistent
    }

    pub fn exit_code(&self) -> i32 {
        match self.outcome {
            AuditOutcome::Consistent => EXIT_OK,
            AuditOutcome::Mismatch { .. } => EXIT_MISMATCH,
            AuditOutcome::Incomplete { .. } => EXIT_FAILURE,
        }
    }

    /// The mismatch as an error, if there was one.
    pub fn mismatch(&self) -> Option<Error> {
        match &self.outcome {
            AuditOutcome::Mismatch {
                group,
                stored,
                expected,
            } => Some(Error::ConsistencyMismatch {
                group: group.clone(),
                stored: stored.clone(),
                expected: expected.clone(),
            }),
            _ => None,
        }
    }
}

pub async fn audit(snapshot: &ConfigSnapshot, client: &CoordinationClient, root: &str) -> AuditReport {
    tracing::info!("Auditing {} group(s) under {}", snapshot.len(), root);

    let mut checked = 0;
    let mut matched = 0;
    let mut absent = 0;
    let mut unreadable = Vec::new();

    for group in snapshot.groups() {
        checked += 1;
        let path = master_path(root, &group.name);
        let expected = group.expected_addr();

        let stored = match client.read_record(&path).await {
            Ok(ReadOutcome::Missing) => {
                tracing::info!(group = %group.name, "{} does not exist, skipping", path);
                absent += 1;
                continue;
            }
            Ok(ReadOutcome::Present(record)) => record.addr,
            Ok(ReadOutcome::Corrupt(bytes)) => {
                format!("<undecodable: {}>", String::from_utf8_lossy(&bytes))
            }
            Err(e) => {
                tracing::error!(group = %group.name, "cannot read {}: {}", path, e);
                unreadable.push(group.name.clone());
                continue;
            }
        };

        if stored != expected {
            tracing::error!(
                group = %group.name,
                "mismatch: coordination store has {}, config has {}",
                stored,
                expected
            );
            return AuditReport {
                checked,
                matched,
                absent,
                outcome: AuditOutcome::Mismatch {
                    group: group.name.clone(),
                    stored,
                    expected,
                },
            };
        }
        tracing::debug!(group = %group.name, "consistent at {}", expected);
        matched += 1;
    }

    let outcome = if unreadable.is_empty() {
        tracing::info!("Audit passed: {} matched, {} absent", matched, absent);
        AuditOutcome::Consistent
    } else {
        tracing::error!("Audit incomplete: {} group(s) unreadable", unreadable.len());
        AuditOutcome::Incomplete { unreadable }
    };

    AuditReport {
        checked,
        matched,
        absent,
        outcome,
    }
}
