//! Reconciliation engine
//!
//! Shared by the event listener and the refresher:
//! - The election ledger deciding who propagates a failover
//! - The reconciler, which serializes every store access behind one lock

pub mod ledger;
pub mod listener;
pub mod reconciler;
pub mod refresher;

pub use ledger::ElectionLedger;
pub use listener::{handle_event, run_listener, EventAction, ListenerExit};
pub use reconciler::{Reconciler, WriteOutcome};
pub use refresher::{refresh_once, run_refresher, RefreshSummary};

/// State shared by both propagation loops.
pub struct Engine {
    ledger: ElectionLedger,
    reconciler: Reconciler,
}

impl Engine {
    pub fn new(reconciler: Reconciler) -> Self {
        Self {
            ledger: ElectionLedger::new(),
            reconciler,
        }
    }

    pub fn ledger(&self) -> &ElectionLedger {
        &self.ledger
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }
}
