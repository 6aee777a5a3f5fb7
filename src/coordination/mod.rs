//! Coordination store access
//!
//! Downstream clients find the current master of each group by reading
//! `{root}/{group}/master/master`. This module owns:
//! - The record format and path layout
//! - A client wrapping exactly one session, with reconnect
//! - Backends for ZooKeeper and for an in-process store

pub mod backend;
pub mod client;
pub mod memory;
pub mod record;
pub mod zk;

pub use backend::{CoordinationBackend, CoordinationSession};
pub use client::CoordinationClient;
pub use memory::MemoryBackend;
pub use record::{master_path, Address, MasterRecord, MasterState, ReadOutcome};
pub use zk::ZkBackend;
