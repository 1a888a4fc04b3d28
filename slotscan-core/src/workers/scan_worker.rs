use crate::{
    events::LedgerEvent, scanner::ScanOrchestrator, watchers::WatcherKind, workers::WatchedEvent,
};
use anyhow::Result;
use tokio::{
    sync::{mpsc, watch},
    time::{sleep, Duration},
};

/// Calls `scan()` on a fixed interval and forwards the events.
///
/// A failed scan is logged and retried on the next tick; the cursor did not
/// move, so the retry covers the same window.
pub struct ScanWorker {
    kind: WatcherKind,
    orchestrator: ScanOrchestrator,
    poll_interval: Duration,
    event_tx: mpsc::Sender<WatchedEvent>,
    shutdown_rx: watch::Receiver<bool>,
}

impl ScanWorker {
    pub fn new(
        kind: WatcherKind,
        orchestrator: ScanOrchestrator,
        poll_interval: Duration,
        event_tx: mpsc::Sender<WatchedEvent>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            kind,
            orchestrator,
            poll_interval,
            event_tx,
            shutdown_rx,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        tracing::info!(watcher = %self.kind, "ScanWorker started.");
        loop {
            let scanned = tokio::select! {
                res = self.orchestrator.scan(None, None) => res,
                _ = self.shutdown_rx.changed() => {
                    tracing::info!(watcher = %self.kind, "Shutdown during scan, cursor left unchanged.");
                    return Ok(());
                }
            };

            match scanned {
                Ok(events) => {
                    if !self.forward(events).await {
                        tracing::info!(watcher = %self.kind, "Event receiver dropped, exiting.");
                        return Ok(());
                    }
                }
                Err(e) => tracing::error!(watcher = %self.kind, "Error during scan: {}", e),
            }

            tokio::select! {
                _ = sleep(self.poll_interval) => {},
                _ = self.shutdown_rx.changed() => {
                    tracing::info!(watcher = %self.kind, "ScanWorker: shutdown signal received, exiting.");
                    return Ok(());
                },
                _ = self.event_tx.closed() => {
                    tracing::info!(watcher = %self.kind, "Event receiver dropped, exiting.");
                    return Ok(());
                }
            }
        }
    }

    /// Sends a scan's events downstream. Returns `false` once nobody listens anymore.
    async fn forward(&self, events: Vec<LedgerEvent>) -> bool {
        if !events.is_empty() {
            tracing::info!(watcher = %self.kind, "Found {} new events.", events.len());
        }
        for event in events {
            let watched = WatchedEvent {
                watcher: self.kind,
                event,
            };
            if self.event_tx.send(watched).await.is_err() {
                return false;
            }
        }
        true
    }
}
