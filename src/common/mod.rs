//! Common utilities and types shared across sentinel-sync

pub mod config;
pub mod error;
pub mod snapshot;
pub mod utils;

pub use config::SyncConfig;
pub use error::{Error, Result};
pub use snapshot::{parse_monitor_line, ConfigSnapshot, MonitoredGroup};
pub use utils::{parse_duration, tokenize};
