//! Periodic re-assertion of every master
//!
//! Backstop for failover events that were missed, deferred, or failed to
//! commit: each pass writes whatever the failover service currently
//! reports, with no election check.

use crate::common::Result;
use crate::engine::{Engine, WriteOutcome};
use crate::sentinel::FailoverService;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub groups: usize,
    pub written: usize,
    pub unchanged: usize,
    pub failed: usize,
    /// Groups the service reported without a master.
    pub unresolved: usize,
}

/// One pass over every group the failover service knows.
pub async fn refresh_once(service: &dyn FailoverService, engine: &Engine) -> Result<RefreshSummary> {
    let masters = service.current_masters().await?;
    let mut summary = RefreshSummary {
        groups: masters.len(),
        ..Default::default()
    };

    for master in masters {
        let Some(addr) = master.addr else {
            tracing::warn!(group = %master.name, "failover service reports no master, skipping");
            summary.unresolved += 1;
            continue;
        };
        tracing::debug!(group = %master.name, "refreshing master {}", addr);
        match engine.reconciler().set_master(&master.name, &addr, None).await {
            WriteOutcome::Created | WriteOutcome::Updated => summary.written += 1,
            WriteOutcome::Unchanged => summary.unchanged += 1,
            WriteOutcome::GaveUp => summary.failed += 1,
        }
    }

    Ok(summary)
}

/// Sleep `interval`, refresh, repeat, until `shutdown` flips to true.
pub async fn run_refresher(
    service: &dyn FailoverService,
    engine: &Engine,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    tracing::info!("refresher shutting down");
                    return;
                }
                continue;
            }
            _ = tokio::time::sleep(interval) => {}
        }

        match refresh_once(service, engine).await {
            Ok(summary) => tracing::debug!(
                "refresh pass: {} groups, {} written, {} unchanged, {} failed, {} unresolved",
                summary.groups,
                summary.written,
                summary.unchanged,
                summary.failed,
                summary.unresolved
            ),
            Err(e) => tracing::warn!("refresh pass skipped, failover service unavailable: {}", e),
        }
    }
}
