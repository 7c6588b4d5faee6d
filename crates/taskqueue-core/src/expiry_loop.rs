//! The heartbeat-driven expiry loop.
//!
//! Runs as its own tokio task. On each tick it pulls every processing task
//! whose heartbeat has gone stale, retires or recycles each one through the
//! same policy `Broker::fail` uses, then sweeps expired confirmations.

use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::oneshot;
use tracing::info;

use crate::broker::{Broker, RetireThreshold};

/// Handle to a running expiry loop. Dropping it does not stop the loop;
/// call [`ExpiryLoopHandle::stop`] for a clean shutdown.
#[derive(Debug)]
pub struct ExpiryLoopHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    join: tokio::task::JoinHandle<()>,
}

impl ExpiryLoopHandle {
    /// Signal the loop to stop and wait for it to finish its current tick.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.join.await;
    }
}

/// Spawn the expiry loop on the current tokio runtime.
pub fn spawn(broker: Arc<Broker>) -> ExpiryLoopHandle {
    let (stop_tx, mut stop_rx) = oneshot::channel();
    let interval = broker.config().keep_alive_interval();

    let join = tokio::spawn(async move {
        info!("expiry loop started");
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    tick(&broker);
                }
                _ = &mut stop_rx => {
                    break;
                }
            }
        }
        info!("expiry loop stopped");
    });

    ExpiryLoopHandle { stop_tx: Some(stop_tx), join }
}

fn tick(broker: &Broker) {
    let cutoff = SystemTime::now() - broker.keep_alive_timeout();
    let stale = broker.pull_stale_processing(cutoff);

    if !stale.is_empty() {
        info!(count = stale.len(), "expiring stale processing tasks");
    }
    for task in stale {
        let failure_count = task.failure_count + 1;
        broker.retire_or_recycle(task, failure_count, RetireThreshold::Exceeds);
    }

    broker.sweep_confirmations();
}
