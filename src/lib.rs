//! # sentinel-sync
//!
//! Keeps the master address of Redis groups in ZooKeeper in step with what
//! Redis Sentinel decides:
//! - Propagates `+switch-master` events when this sentinel ran the failover
//! - Re-asserts every master on a timer, in case an event was missed
//! - Audits a local Sentinel config against ZooKeeper for health checks
//!
//! ## Architecture
//!
//! ```text
//!   Sentinel pub/sub ──► listener ──┐
//!                                   ├──► Engine ──► CoordinationClient ──► ZooKeeper
//!   SENTINEL MASTERS ──► refresher ─┘    (ledger,     (one session,
//!                                         reconciler)  reconnect on failure)
//!
//!   include dir ──► ConfigSnapshot ──► audit ──► exit code
//! ```
//!
//! ZooKeeper layout: `{root}/{group}/master/master` holds
//! `{"addr": "<host>:<port>", "state": "online"}`.
//!
//! ## Usage
//!
//! ```bash
//! # Audit, exit 0 when consistent, 2 on mismatch
//! sentinel-sync -i /etc/redis/sentinel.d -z zk1:2181,zk2:2181 -p 26379 -c
//!
//! # Propagate failovers until stopped
//! sentinel-sync -i /etc/redis/sentinel.d -z zk1:2181,zk2:2181 -p 26379 -m
//! ```

pub mod common;
pub mod coordination;
pub mod engine;
pub mod ops;
pub mod sentinel;

// Re-export commonly used types
pub use common::{Error, Result, SyncConfig};
pub use engine::Engine;

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
