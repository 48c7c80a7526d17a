//! Recovery scanner.
//!
//! Periodically sweeps the store for operations stuck in a non-terminal
//! state (typically after a crash) and resubmits them to the processor.
//! The processor's per-id lease means a sweep never runs concurrently with
//! an operation's own background invocation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use store::OperationStore;

use crate::OperationProcessor;

/// Periodic sweep task.  Owned by process-wide lifecycle: spawned on
/// startup, stopped via the shutdown channel.
pub struct RecoveryScanner {
    store: Arc<dyn OperationStore>,
    processor: Arc<OperationProcessor>,
    interval: Duration,
}

impl RecoveryScanner {
    pub fn new(
        store: Arc<dyn OperationStore>,
        processor: Arc<OperationProcessor>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            processor,
            interval,
        }
    }

    /// Loop until the shutdown channel flips, sweeping once per interval.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick fires immediately; skip it so a fresh start does
        // not race the operations it just launched.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.scan_once().await;
                }
                _ = shutdown.changed() => {
                    info!("recovery scanner stopped");
                    return;
                }
            }
        }
    }

    /// One sweep: resubmit every non-terminal operation, skipping ids whose
    /// lease is currently held.
    pub async fn scan_once(&self) {
        let unfinished = match self.store.list_unfinished().await {
            Ok(ops) => ops,
            Err(e) => {
                warn!(error = %e, "recovery scan query failed");
                return;
            }
        };

        if unfinished.is_empty() {
            return;
        }
        debug!(count = unfinished.len(), "resuming unfinished operations");

        for op in unfinished {
            match self.processor.try_run(&op.id).await {
                Ok(true) => {}
                Ok(false) => debug!(operation = %op.id, "already running, skipped"),
                Err(e) => warn!(operation = %op.id, error = %e, "resumed operation failed"),
            }
        }
    }
}
