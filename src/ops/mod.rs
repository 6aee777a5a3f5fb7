//! Operating modes

pub mod audit;
pub mod monitor;

pub use audit::{audit, AuditOutcome, AuditReport, EXIT_FAILURE, EXIT_MISMATCH, EXIT_OK};
pub use monitor::{run_monitor, run_propagation};
