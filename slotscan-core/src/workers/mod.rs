//! # Watcher Manager & Scan Workers
//!
//! This module runs scanners in the background for applications that want a
//! stream of events instead of calling `scan()` themselves.
//!
//! ## Core Components
//!
//! - [`WatcherManager`]: owns one [`ScanWorker`] per configured watcher. It is
//!   consumed when its `run` method is called.
//! - [`WatcherHandle`]: receives the merged event stream and requests shutdown.
//! - [`ScanWorker`]: polls a single `ScanOrchestrator`. Every worker owns its
//!   orchestrator, so no two watchers share a cursor.

mod scan_worker;

pub use scan_worker::ScanWorker;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::{
    client::LedgerClient, config::ScannerConfig, error::ScanError, events::LedgerEvent,
    scanner::ScanOrchestrator, watchers::WatcherKind,
};
use futures::future;
use std::{collections::HashSet, sync::Arc};
use tokio::{
    sync::{mpsc, watch},
    time::Duration,
};

/// An event tagged with the watcher that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct WatchedEvent {
    pub watcher: WatcherKind,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub event: LedgerEvent,
}

/// The application's side of a running [`WatcherManager`].
#[derive(Debug)]
pub struct WatcherHandle {
    events: mpsc::Receiver<WatchedEvent>,
    shutdown_tx: watch::Sender<bool>,
}

impl WatcherHandle {
    /// Receives the next event from any watcher. Returns `None` once all workers have exited.
    pub async fn next_event(&mut self) -> Option<WatchedEvent> {
        self.events.recv().await
    }

    /// Asks every worker to stop. An in-flight scan is abandoned without moving its cursor.
    pub fn stop(&self) {
        if self.shutdown_tx.send(true).is_err() {
            tracing::warn!("Failed to send shutdown to workers: they may already be down");
        }
    }
}

/// Runs a set of watchers until shutdown.
pub struct WatcherManager {
    workers: Vec<ScanWorker>,
}

impl WatcherManager {
    /// Creates a new `WatcherManager` and its [`WatcherHandle`].
    ///
    /// Workers are built here but only start when [`run`](Self::run) is awaited.
    ///
    /// # Arguments
    ///
    /// * `config` - The shared scanner configuration.
    /// * `client` - Ledger access shared by all watchers.
    /// * `watchers` - Which watchers to run; each kind at most once.
    pub fn new(
        config: Arc<ScannerConfig>,
        client: Arc<dyn LedgerClient>,
        watchers: &[WatcherKind],
    ) -> Result<(Self, WatcherHandle), ScanError> {
        let scanners = watchers
            .iter()
            .map(|kind| Ok((*kind, kind.build(&config, client.clone())?)))
            .collect::<Result<Vec<_>, ScanError>>()?;
        Self::from_scanners(config, scanners)
    }

    /// Like [`new`](Self::new), for scanners assembled by the caller.
    pub fn from_scanners(
        config: Arc<ScannerConfig>,
        scanners: Vec<(WatcherKind, ScanOrchestrator)>,
    ) -> Result<(Self, WatcherHandle), ScanError> {
        config.validate()?;
        if scanners.is_empty() {
            return Err(ScanError::Config("at least one watcher is required".into()));
        }
        let mut seen = HashSet::new();
        if let Some((kind, _)) = scanners.iter().find(|(kind, _)| !seen.insert(*kind)) {
            return Err(ScanError::Config(format!(
                "watcher '{}' is configured more than once",
                kind
            )));
        }

        let (event_tx, event_rx) = mpsc::channel(config.channels.event_buffer);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let poll_interval = Duration::from_secs(config.scan.poll_interval_secs);

        let workers = scanners
            .into_iter()
            .map(|(kind, orchestrator)| {
                ScanWorker::new(
                    kind,
                    orchestrator,
                    poll_interval,
                    event_tx.clone(),
                    shutdown_rx.clone(),
                )
            })
            .collect();

        let handle = WatcherHandle {
            events: event_rx,
            shutdown_tx,
        };
        Ok((Self { workers }, handle))
    }

    /// Runs all workers until each of them has exited.
    pub async fn run(self) {
        tracing::info!("Running {} watcher(s).", self.workers.len());
        let results = future::join_all(self.workers.into_iter().map(ScanWorker::run)).await;
        for res in results {
            if let Err(e) = res {
                tracing::error!("ScanWorker exited with an error: {}", e);
            }
        }
        tracing::info!("All watchers have shut down.");
    }
}
