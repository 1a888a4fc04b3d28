use crate::{
    client::LedgerClient,
    error::ScanError,
    events::{LedgerEvent, SignatureInfo},
    extractors::EventExtractor,
    limiter::ConcurrencyLimiter,
};
use anyhow::Context;
use futures::future::join_all;
use std::sync::Arc;

/// What happened to a single signature.
enum RecordOutcome {
    Extracted(Vec<LedgerEvent>),
    Missing,
    Failed,
}

/// Totals for one processed page.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    pub events: Vec<LedgerEvent>,
    /// Signatures whose body was requested.
    pub fetched: usize,
    /// Signatures the ledger had no body for.
    pub missing: usize,
    /// Signatures whose fetch or extraction failed.
    pub failed: usize,
}

/// Fetches transaction bodies for a page and runs the extractor on each,
/// with at most `concurrency` fetches in flight.
///
/// A failure for one signature is logged and counted as zero events; it never
/// aborts the rest of the page.
#[derive(Clone)]
pub struct FetchPipeline {
    client: Arc<dyn LedgerClient>,
    extractor: Arc<dyn EventExtractor>,
    limiter: ConcurrencyLimiter,
}

impl FetchPipeline {
    pub fn new(
        client: Arc<dyn LedgerClient>,
        extractor: Arc<dyn EventExtractor>,
        concurrency: usize,
    ) -> Result<Self, ScanError> {
        Ok(Self {
            client,
            extractor,
            limiter: ConcurrencyLimiter::new(concurrency)?,
        })
    }

    pub fn extractor_name(&self) -> &'static str {
        self.extractor.name()
    }

    /// Processes every signature of `page` and waits for all of them.
    ///
    /// Events come back in page order; events of one signature keep the
    /// extractor's order.
    pub async fn process(&self, page: &[SignatureInfo]) -> PageOutcome {
        let tasks = page
            .iter()
            .map(|info| self.limiter.run(self.process_one(info)));
        let outcomes = join_all(tasks).await;

        let mut result = PageOutcome {
            fetched: page.len(),
            ..PageOutcome::default()
        };
        for outcome in outcomes {
            match outcome {
                RecordOutcome::Extracted(events) => result.events.extend(events),
                RecordOutcome::Missing => result.missing += 1,
                RecordOutcome::Failed => result.failed += 1,
            }
        }
        result
    }

    async fn process_one(&self, info: &SignatureInfo) -> RecordOutcome {
        match self.fetch_and_extract(info).await {
            Ok(Some(events)) => RecordOutcome::Extracted(events),
            Ok(None) => {
                tracing::debug!(signature = %info.signature, "Transaction not available, skipping");
                RecordOutcome::Missing
            }
            Err(e) => {
                tracing::warn!(
                    signature = %info.signature,
                    slot = info.slot,
                    extractor = self.extractor.name(),
                    "Failed to process transaction: {:#}",
                    e
                );
                RecordOutcome::Failed
            }
        }
    }

    async fn fetch_and_extract(&self, info: &SignatureInfo) -> anyhow::Result<Option<Vec<LedgerEvent>>> {
        let Some(tx) = self
            .client
            .get_transaction(&info.signature)
            .await
            .context("fetching transaction body")?
        else {
            return Ok(None);
        };

        let events = self
            .extractor
            .extract(&tx)
            .await
            .with_context(|| format!("running {} extractor", self.extractor.name()))?;
        Ok(Some(events))
    }
}
