//! # Watcher Registry
//!
//! Each [`WatcherKind`] names one built-in use case of the scanner and knows
//! how to assemble it: which address to scan and which extractor to run.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    cache::SupplyCache,
    client::LedgerClient,
    config::{ScannerConfig, SPL_TOKEN_PROGRAM_ID},
    error::ScanError,
    extractors::{EventExtractor, MintCreationExtractor, WhaleTransferExtractor},
    scanner::ScanOrchestrator,
};
use solana_sdk::pubkey::Pubkey;
use std::{fmt, str::FromStr, sync::Arc};
use tokio::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum WatcherKind {
    /// Newly initialized token mints.
    EmergingTokens,
    /// Token transfers at or above the whale threshold.
    WhaleMovements,
}

impl WatcherKind {
    pub const ALL: [WatcherKind; 2] = [WatcherKind::EmergingTokens, WatcherKind::WhaleMovements];

    pub fn name(&self) -> &'static str {
        match self {
            WatcherKind::EmergingTokens => "emerging-tokens",
            WatcherKind::WhaleMovements => "whale-movements",
        }
    }

    /// The address whose signature history this watcher walks.
    pub fn address(&self) -> Result<Pubkey, ScanError> {
        let raw = match self {
            WatcherKind::EmergingTokens | WatcherKind::WhaleMovements => SPL_TOKEN_PROGRAM_ID,
        };
        Pubkey::from_str(raw)
            .map_err(|e| ScanError::Config(format!("invalid address '{}': {}", raw, e)))
    }

    pub fn extractor(
        &self,
        config: &ScannerConfig,
        client: Arc<dyn LedgerClient>,
    ) -> Arc<dyn EventExtractor> {
        match self {
            WatcherKind::EmergingTokens => {
                let ttl = Duration::from_secs(config.supply_cache.ttl_secs);
                Arc::new(MintCreationExtractor::new(SupplyCache::new(client, ttl)))
            }
            WatcherKind::WhaleMovements => {
                Arc::new(WhaleTransferExtractor::new(config.whale.threshold))
            }
        }
    }

    /// Assembles a scanner with its own cursor for this watcher.
    pub fn build(
        &self,
        config: &ScannerConfig,
        client: Arc<dyn LedgerClient>,
    ) -> Result<ScanOrchestrator, ScanError> {
        let extractor = self.extractor(config, client.clone());
        ScanOrchestrator::new(self.address()?, client, extractor, &config.scan)
    }
}

impl fmt::Display for WatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WatcherKind {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WatcherKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ScanError::Config(format!("unknown watcher '{}'", s)))
    }
}
