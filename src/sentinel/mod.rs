//! Failover service (Redis Sentinel) side
//!
//! Sentinel announces failovers on pub/sub channels and answers
//! `SENTINEL MASTERS` / `SENTINEL GET-MASTER-ADDR-BY-NAME` queries.

pub mod client;
pub mod events;

pub use client::{FailoverService, GroupMaster, RedisSentinel, StaticFailover};
pub use events::{decode_event, EventStream, RawEvent, SentinelEvent};
