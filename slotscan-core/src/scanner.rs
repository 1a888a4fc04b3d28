//! # Scan Orchestrator
//!
//! [`ScanOrchestrator::scan`] walks an address's signature history backwards,
//! newest first, one page at a time. Each page goes through the
//! [`FetchPipeline`]; the walk stops as soon as one of these holds:
//!
//! 1. the page is empty;
//! 2. the page reaches below the first unscanned slot (the page is trimmed to
//!    the unscanned part first);
//! 3. the record cap for this scan is reached;
//! 4. the page contains the last delivered signature (the page is cut just
//!    before it).
//!
//! The cursor moves once, after the walk finished. A failing page listing
//! aborts the scan and leaves the cursor where it was, so the next call covers
//! the same window again. Dropping a `scan()` future midway has the same
//! effect.

use crate::{
    client::{LedgerClient, PageRequest},
    config::ScanSettings,
    cursor::{Cursor, CursorStore},
    error::ScanError,
    events::LedgerEvent,
    extractors::EventExtractor,
    pipeline::FetchPipeline,
};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

/// Why a scan stopped paging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopReason {
    #[default]
    EmptyPage,
    ReachedScannedSlots,
    RecordCap,
    ReachedLastSignature,
}

/// Summary of one completed scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Head read at the start of the scan; becomes the cursor's `last_slot`.
    pub head: u64,
    pub pages: usize,
    /// Signatures handed to the pipeline.
    pub records: usize,
    pub missing: usize,
    pub failed: usize,
    pub events: usize,
    /// Events dropped because the previous scan already delivered their signature.
    pub duplicates: usize,
    pub stop: StopReason,
    /// Cursor after the scan.
    pub cursor: Cursor,
}

/// Lifecycle notifications delivered to a [`ScanHook`].
#[derive(Debug)]
pub enum ScanLifecycle<'a> {
    Started { cursor: &'a Cursor },
    Completed(&'a ScanReport),
    Failed(&'a ScanError),
}

/// Callback invoked synchronously at each lifecycle step of a scan.
pub type ScanHook = Arc<dyn Fn(ScanLifecycle<'_>) + Send + Sync>;

/// Drives incremental scans of one address and owns that scan's cursor.
///
/// `scan` takes `&mut self`, so two scans on the same orchestrator cannot
/// overlap. Watchers that run side by side each need their own orchestrator.
pub struct ScanOrchestrator {
    address: Pubkey,
    client: Arc<dyn LedgerClient>,
    pipeline: FetchPipeline,
    cursor: CursorStore,
    default_page_limit: usize,
    default_max_records: usize,
    hook: Option<ScanHook>,
}

impl ScanOrchestrator {
    /// Creates a new orchestrator with a cold cursor.
    ///
    /// # Arguments
    ///
    /// * `address` - The account or program whose signatures are scanned.
    /// * `client` - Ledger access shared with the extractor, if it needs any.
    /// * `extractor` - Turns parsed transactions into events.
    /// * `settings` - Default bounds and the fetch concurrency.
    ///
    /// Fails with [`ScanError::Config`] if the concurrency is out of range.
    pub fn new(
        address: Pubkey,
        client: Arc<dyn LedgerClient>,
        extractor: Arc<dyn EventExtractor>,
        settings: &ScanSettings,
    ) -> Result<Self, ScanError> {
        let pipeline = FetchPipeline::new(client.clone(), extractor, settings.concurrency)?;
        Ok(Self {
            address,
            client,
            pipeline,
            cursor: CursorStore::new(),
            default_page_limit: ScanSettings::clamped_page_limit(settings.page_limit),
            default_max_records: ScanSettings::clamped_max_records(settings.max_records_per_scan),
            hook: None,
        })
    }

    /// Registers a lifecycle callback.
    pub fn with_hook(mut self, hook: ScanHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Resumes from a cursor the caller kept from an earlier run.
    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = CursorStore::with_cursor(cursor);
        self
    }

    pub fn address(&self) -> &Pubkey {
        &self.address
    }

    pub fn cursor(&self) -> &Cursor {
        self.cursor.cursor()
    }

    /// Forgets all progress; the next scan is a cold scan.
    pub fn reset_progress(&mut self) {
        tracing::info!(address = %self.address, "Scan progress reset");
        self.cursor.reset();
    }

    /// Runs one incremental scan and returns the new events, ascending by slot.
    ///
    /// `page_limit` and `max_records_per_scan` fall back to the configured
    /// defaults and are clamped to 50..=1000 and 100..=5000.
    pub async fn scan(
        &mut self,
        page_limit: Option<usize>,
        max_records_per_scan: Option<usize>,
    ) -> Result<Vec<LedgerEvent>, ScanError> {
        self.scan_with_report(page_limit, max_records_per_scan)
            .await
            .map(|(events, _)| events)
    }

    /// Like [`scan`](Self::scan), also returning the [`ScanReport`].
    pub async fn scan_with_report(
        &mut self,
        page_limit: Option<usize>,
        max_records_per_scan: Option<usize>,
    ) -> Result<(Vec<LedgerEvent>, ScanReport), ScanError> {
        let page_limit = page_limit
            .map(ScanSettings::clamped_page_limit)
            .unwrap_or(self.default_page_limit);
        let max_records = max_records_per_scan
            .map(ScanSettings::clamped_max_records)
            .unwrap_or(self.default_max_records);

        self.notify(ScanLifecycle::Started {
            cursor: self.cursor.cursor(),
        });

        let (mut events, mut report) = match self.walk(page_limit, max_records).await {
            Ok(walked) => walked,
            Err(e) => {
                tracing::error!(
                    address = %self.address,
                    extractor = self.pipeline.extractor_name(),
                    "Scan failed, cursor left unchanged: {}",
                    e
                );
                self.notify(ScanLifecycle::Failed(&e));
                return Err(e);
            }
        };

        // Extraction order still holds here, which decides ties on the newest slot.
        self.cursor.commit(report.head, &events);
        events.sort_by_key(|event| event.slot);

        report.events = events.len();
        report.cursor = self.cursor.cursor().clone();

        tracing::info!(
            address = %self.address,
            extractor = self.pipeline.extractor_name(),
            pages = report.pages,
            records = report.records,
            events = report.events,
            failed = report.failed,
            stop = ?report.stop,
            last_slot = report.cursor.last_slot,
            "Scan completed"
        );
        self.notify(ScanLifecycle::Completed(&report));

        Ok((events, report))
    }

    /// Pages through the history without touching the cursor.
    async fn walk(
        &self,
        page_limit: usize,
        max_records: usize,
    ) -> Result<(Vec<LedgerEvent>, ScanReport), ScanError> {
        let cursor = self.cursor.cursor().clone();
        let head = self
            .client
            .current_head()
            .await
            .map_err(ScanError::Head)?;
        let from_slot = cursor.from_slot();

        let mut report = ScanReport {
            head,
            ..ScanReport::default()
        };
        let mut events = Vec::new();
        let mut before: Option<String> = None;

        tracing::debug!(
            address = %self.address,
            head,
            from_slot,
            last_signature = ?cursor.last_signature,
            "Starting scan"
        );

        loop {
            let remaining = max_records - report.records;
            let request = PageRequest {
                before: before.clone(),
                until: cursor.last_signature.clone(),
                limit: page_limit.min(remaining),
            };
            let mut page = self
                .client
                .list_signatures(&self.address, &request)
                .await
                .map_err(|source| ScanError::PageFetch {
                    page: report.pages + 1,
                    source,
                })?;
            report.pages += 1;

            let Some(min_slot) = page.iter().map(|info| info.slot).min() else {
                report.stop = StopReason::EmptyPage;
                break;
            };
            before = page.last().map(|info| info.signature.clone());

            let reached_scanned_slots = min_slot < from_slot;
            if reached_scanned_slots {
                page.retain(|info| info.slot >= from_slot);
            }

            let reached_last_signature = match &cursor.last_signature {
                Some(last) => match page.iter().position(|info| &info.signature == last) {
                    Some(pos) => {
                        page.truncate(pos);
                        true
                    }
                    None => false,
                },
                None => false,
            };

            page.truncate(remaining);
            report.records += page.len();

            let outcome = self.pipeline.process(&page).await;
            report.missing += outcome.missing;
            report.failed += outcome.failed;
            for event in outcome.events {
                if self.cursor.was_delivered(&event.signature) {
                    report.duplicates += 1;
                } else {
                    events.push(event);
                }
            }

            tracing::debug!(
                page = report.pages,
                records = report.records,
                events = events.len(),
                "Processed signature page"
            );

            let stop = if reached_scanned_slots {
                Some(StopReason::ReachedScannedSlots)
            } else if report.records >= max_records {
                Some(StopReason::RecordCap)
            } else if reached_last_signature {
                Some(StopReason::ReachedLastSignature)
            } else {
                None
            };
            if let Some(reason) = stop {
                report.stop = reason;
                break;
            }
        }

        Ok((events, report))
    }

    fn notify(&self, step: ScanLifecycle<'_>) {
        if let Some(hook) = &self.hook {
            hook(step);
        }
    }
}
