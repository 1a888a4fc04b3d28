#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ScanError;
use solana_sdk::commitment_config::CommitmentLevel;

/// Address of the SPL Token program, the default scan target for both watchers.
pub const SPL_TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

pub const PAGE_LIMIT_MIN: usize = 50;
pub const PAGE_LIMIT_MAX: usize = 1000;
pub const MAX_RECORDS_MIN: usize = 100;
pub const MAX_RECORDS_MAX: usize = 5000;
pub const CONCURRENCY_MAX: usize = 64;

/// The top-level configuration for the `slotscan-core` library.
///
/// This struct aggregates the Solana endpoint, scan bounds and extractor
/// settings. It is typically deserialized from a configuration file and
/// handed to the `WatcherManager` or to individual scanners.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", default))]
pub struct ScannerConfig {
    #[cfg_attr(feature = "serde", serde(default))]
    pub solana: Solana,
    #[cfg_attr(feature = "serde", serde(default))]
    pub scan: ScanSettings,
    #[cfg_attr(feature = "serde", serde(default))]
    pub whale: WhaleSettings,
    #[cfg_attr(feature = "serde", serde(default))]
    pub supply_cache: SupplyCacheSettings,
    #[cfg_attr(feature = "serde", serde(default))]
    pub channels: ChannelConfig,
}

/// Defines the connection settings for the Solana cluster.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", default))]
pub struct Solana {
    pub rpc_url: String,
    #[cfg_attr(feature = "serde", serde(with = "serde_commitment"))]
    pub commitment: CommitmentLevel,
}

/// Bounds applied to every `scan()` call.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", default))]
pub struct ScanSettings {
    /// Signatures requested per listing call. Clamped to 50..=1000.
    pub page_limit: usize,
    /// Hard ceiling on records examined by one scan. Clamped to 100..=5000.
    pub max_records_per_scan: usize,
    /// Simultaneous transaction body fetches per page.
    pub concurrency: usize,
    /// Delay between scans when driven by a `ScanWorker`.
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", default))]
pub struct WhaleSettings {
    /// Minimum raw transfer amount, in base units of the token.
    pub threshold: u64,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", default))]
pub struct SupplyCacheSettings {
    pub ttl_secs: u64,
}

/// Defines capacities for the MPSC channels used by the workers.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", default))]
pub struct ChannelConfig {
    /// The buffer capacity of the channel workers push events into.
    pub event_buffer: usize,
}

impl Default for Solana {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8899".to_string(),
            commitment: CommitmentLevel::Confirmed,
        }
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            page_limit: 100,
            max_records_per_scan: 1000,
            concurrency: 5,
            poll_interval_secs: 300,
        }
    }
}

impl Default for WhaleSettings {
    fn default() -> Self {
        Self { threshold: 50_000 }
    }
}

impl Default for SupplyCacheSettings {
    fn default() -> Self {
        Self { ttl_secs: 60 }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self { event_buffer: 256 }
    }
}

impl ScanSettings {
    pub fn clamped_page_limit(requested: usize) -> usize {
        requested.clamp(PAGE_LIMIT_MIN, PAGE_LIMIT_MAX)
    }

    pub fn clamped_max_records(requested: usize) -> usize {
        requested.clamp(MAX_RECORDS_MIN, MAX_RECORDS_MAX)
    }
}

impl ScannerConfig {
    /// Rejects settings that cannot produce a working scanner.
    pub fn validate(&self) -> Result<(), ScanError> {
        validate_concurrency(self.scan.concurrency)?;
        if self.scan.poll_interval_secs == 0 {
            return Err(ScanError::Config(
                "poll-interval-secs must be greater than zero".into(),
            ));
        }
        if self.channels.event_buffer == 0 {
            return Err(ScanError::Config(
                "event-buffer must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_concurrency(concurrency: usize) -> Result<(), ScanError> {
    if concurrency == 0 || concurrency > CONCURRENCY_MAX {
        return Err(ScanError::Config(format!(
            "concurrency must be within 1..={}, got {}",
            CONCURRENCY_MAX, concurrency
        )));
    }
    Ok(())
}

#[cfg(feature = "serde")]
mod serde_commitment {

    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(c: &CommitmentLevel, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = match c {
            CommitmentLevel::Processed => "processed",
            CommitmentLevel::Confirmed => "confirmed",
            CommitmentLevel::Finalized => "finalized",
        };
        serializer.serialize_str(s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<CommitmentLevel, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        match s.to_lowercase().as_str() {
            "processed" => Ok(CommitmentLevel::Processed),
            "confirmed" => Ok(CommitmentLevel::Confirmed),
            "finalized" => Ok(CommitmentLevel::Finalized),
            other => Err(serde::de::Error::custom(format!(
                "unknown commitment level '{}'",
                other
            ))),
        }
    }
}
