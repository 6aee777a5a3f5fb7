//! Event listener loop

use crate::engine::{Engine, WriteOutcome};
use crate::sentinel::{decode_event, RawEvent, SentinelEvent};
use tokio::sync::watch;
use tokio_stream::{Stream, StreamExt};

/// What the engine did with one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventAction {
    /// Recorded that this sentinel runs the group's failover.
    Elected,
    /// Propagated a master switch.
    Propagated(WriteOutcome),
    /// Switch for a group another sentinel is responsible for.
    Deferred,
    /// Channel we do not act on.
    Ignored,
    /// Payload could not be decoded.
    Dropped,
}

/// Apply one raw event to the engine.
pub async fn handle_event(engine: &Engine, raw: &RawEvent) -> EventAction {
    tracing::debug!("event {}: {}", raw.channel, raw.payload);

    let event = match decode_event(raw) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("dropping event: {}", e);
            return EventAction::Dropped;
        }
    };

    match event {
        SentinelEvent::ElectedLeader { group } => {
            tracing::info!(group = %group, "elected to run failover");
            engine.ledger().mark_elected(&group);
            EventAction::Elected
        }
        SentinelEvent::SwitchMaster { group, old, new } => {
            if !engine.ledger().is_elected(&group) {
                tracing::debug!(group = %group, "switch to {} handled by another sentinel", new);
                return EventAction::Deferred;
            }
            tracing::info!(group = %group, "master switched from {} to {}", old, new);
            let outcome = engine.reconciler().set_master(&group, &new, Some(&old)).await;
            engine.ledger().take(&group);
            EventAction::Propagated(outcome)
        }
        SentinelEvent::Other => EventAction::Ignored,
    }
}

/// Why the listener stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerExit {
    /// The subscription ended; the process should exit and be restarted.
    ConnectionClosed,
    Shutdown,
}

/// Consume `events` until the stream ends or `shutdown` flips to true.
///
/// Shutdown is only observed between events; an event being handled runs
/// to completion.
pub async fn run_listener<S>(
    engine: &Engine,
    mut events: S,
    mut shutdown: watch::Receiver<bool>,
) -> ListenerExit
where
    S: Stream<Item = RawEvent> + Unpin,
{
    if *shutdown.borrow() {
        return ListenerExit::Shutdown;
    }

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    tracing::info!("event listener shutting down");
                    return ListenerExit::Shutdown;
                }
            }
            next = events.next() => match next {
                Some(raw) => {
                    handle_event(engine, &raw).await;
                }
                None => {
                    tracing::error!("event subscription closed by the failover service");
                    return ListenerExit::ConnectionClosed;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordination::{CoordinationClient, MemoryBackend};
    use crate::engine::Reconciler;
    use std::sync::Arc;
    use std::time::Duration;

    async fn engine(backend: &MemoryBackend) -> Engine {
        let client = CoordinationClient::connect(Arc::new(backend.clone()), false)
            .await
            .unwrap();
        Engine::new(Reconciler::new(client, "/root", 3, Duration::from_millis(1)))
    }

    #[tokio::test]
    async fn test_elected_switch_is_propagated() {
        let backend = MemoryBackend::new();
        let engine = engine(&backend).await;

        let elected = RawEvent::new("+elected-leader", "master g1 10.0.0.1 6379");
        assert_eq!(handle_event(&engine, &elected).await, EventAction::Elected);
        assert!(engine.ledger().is_elected("g1"));

        let switch = RawEvent::new("+switch-master", "g1 10.0.0.1 6379 10.0.0.2 6379");
        assert_eq!(
            handle_event(&engine, &switch).await,
            EventAction::Propagated(WriteOutcome::Created)
        );
        assert!(!engine.ledger().is_elected("g1"));
        assert_eq!(
            backend.value("/root/g1/master/master").unwrap(),
            br#"{"addr": "10.0.0.2:6379", "state": "online"}"#.to_vec()
        );

        // A replayed switch without a new election is someone else's.
        assert_eq!(handle_event(&engine, &switch).await, EventAction::Deferred);
        assert_eq!(backend.write_count(), 1);
    }

    #[tokio::test]
    async fn test_unelected_switch_is_deferred() {
        let backend = MemoryBackend::new();
        let engine = engine(&backend).await;

        let switch = RawEvent::new("+switch-master", "g1 10.0.0.1 6379 10.0.0.2 6379");
        assert_eq!(handle_event(&engine, &switch).await, EventAction::Deferred);
        assert_eq!(backend.op_count(), 0);
        assert!(engine.ledger().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_switch_is_dropped() {
        let backend = MemoryBackend::new();
        let engine = engine(&backend).await;
        engine.ledger().mark_elected("g1");

        let switch = RawEvent::new("+switch-master", "g1 10.0.0.1 6379");
        assert_eq!(handle_event(&engine, &switch).await, EventAction::Dropped);
        assert!(engine.ledger().is_elected("g1"));
        assert_eq!(backend.op_count(), 0);
    }

    #[tokio::test]
    async fn test_other_channels_ignored() {
        let backend = MemoryBackend::new();
        let engine = engine(&backend).await;
        let raw = RawEvent::new("+sdown", "master g1 10.0.0.1 6379");
        assert_eq!(handle_event(&engine, &raw).await, EventAction::Ignored);
    }

    #[tokio::test]
    async fn test_listener_stops_when_stream_ends() {
        let backend = MemoryBackend::new();
        let engine = engine(&backend).await;
        let (_tx, rx) = watch::channel(false);

        let events = tokio_stream::iter(vec![
            RawEvent::new("+elected-leader", "master g1 10.0.0.1 6379"),
            RawEvent::new("+switch-master", "g1 10.0.0.1"),
            RawEvent::new("+switch-master", "g1 10.0.0.1 6379 10.0.0.3 6380"),
        ]);

        let exit = run_listener(&engine, events, rx).await;
        assert_eq!(exit, ListenerExit::ConnectionClosed);
        assert!(backend.contains("/root/g1/master/master"));
    }

    #[tokio::test]
    async fn test_listener_honours_shutdown() {
        let backend = MemoryBackend::new();
        let engine = engine(&backend).await;
        let (tx, rx) = watch::channel(false);

        let pending = tokio_stream::pending::<RawEvent>();
        let stop = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            tx.send(true).unwrap();
        };
        let (exit, _) = tokio::join!(run_listener(&engine, pending, rx), stop);
        assert_eq!(exit, ListenerExit::Shutdown);
    }
}
