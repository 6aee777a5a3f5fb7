//! Propagation mode: event listener and refresher side by side

use crate::common::{Error, Result, SyncConfig};
use crate::coordination::{CoordinationClient, ZkBackend};
use crate::engine::{run_listener, run_refresher, Engine, ListenerExit, Reconciler};
use crate::sentinel::{EventStream, FailoverService, RedisSentinel};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Run both loops on their own tasks until the subscription closes or
/// `shutdown` resolves.
///
/// Returns an error when the subscription closed, so a supervisor restarts
/// the process.
pub async fn run_propagation<F>(
    engine: Arc<Engine>,
    events: EventStream,
    service: Arc<dyn FailoverService>,
    interval: Duration,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let (stop_tx, stop_rx) = watch::channel(false);

    let mut listener = {
        let engine = engine.clone();
        let stop = stop_rx.clone();
        tokio::spawn(async move { run_listener(&engine, events, stop).await })
    };
    let refresher = {
        let engine = engine.clone();
        tokio::spawn(async move { run_refresher(service.as_ref(), &engine, interval, stop_rx).await })
    };

    let exit = tokio::select! {
        res = &mut listener => res.map_err(|e| Error::Failover(format!("listener task failed: {}", e)))?,
        _ = shutdown => {
            tracing::info!("Shutdown requested");
            let _ = stop_tx.send(true);
            listener
                .await
                .map_err(|e| Error::Failover(format!("listener task failed: {}", e)))?
        }
    };

    let _ = stop_tx.send(true);
    if let Err(e) = refresher.await {
        tracing::warn!("refresher task failed: {}", e);
    }

    match exit {
        ListenerExit::Shutdown => Ok(()),
        ListenerExit::ConnectionClosed => Err(Error::Failover(
            "event subscription closed by the failover service".into(),
        )),
    }
}

/// Connect to ZooKeeper and Sentinel per `config` and propagate until Ctrl-C.
pub async fn run_monitor(config: &SyncConfig) -> Result<()> {
    tracing::info!("Starting propagation");
    tracing::info!("  ZooKeeper: {} (root {})", config.zk_hosts, config.root());
    tracing::info!("  Sentinel: {}:{}", config.sentinel_host, config.sentinel_port);
    tracing::info!("  Refresh interval: {:?}", config.refresh_interval());

    let backend = Arc::new(ZkBackend::new(config.zk_hosts.clone(), config.session_timeout()));
    let client = CoordinationClient::connect(backend, false).await?;
    let engine = Arc::new(Engine::new(Reconciler::new(
        client,
        config.root(),
        config.retry_budget,
        config.retry_backoff(),
    )));

    let sentinel = RedisSentinel::new(config.sentinel_host.clone(), config.sentinel_port);
    let events = sentinel.subscribe().await?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    run_propagation(
        engine,
        events,
        Arc::new(sentinel),
        config.refresh_interval(),
        shutdown,
    )
    .await
}
