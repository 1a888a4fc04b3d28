//! # Event Extractors
//!
//! An [`EventExtractor`] turns one parsed transaction into zero or more
//! [`LedgerEvent`]s. Extractors hold no mutable state and do not limit their own
//! concurrency; the pipeline does that. They may issue auxiliary reads, as
//! [`MintCreationExtractor`] does for the supply.

mod mint;
mod whale;

pub use mint::MintCreationExtractor;
pub use whale::WhaleTransferExtractor;

use crate::events::{LedgerEvent, ParsedInstruction, ParsedTransaction};
use async_trait::async_trait;

/// Program names the JSON parser reports for the two token programs.
pub(crate) const TOKEN_PROGRAMS: [&str; 2] = ["spl-token", "spl-token-2022"];

#[async_trait]
pub trait EventExtractor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Extracts events from `tx`.
    ///
    /// A transaction without matching instructions yields `Ok(vec![])`, as does
    /// one with unexpected instruction shapes. An `Err` is reserved for failed
    /// auxiliary reads.
    async fn extract(&self, tx: &ParsedTransaction) -> anyhow::Result<Vec<LedgerEvent>>;
}

pub(crate) fn is_token_instruction(ix: &ParsedInstruction) -> bool {
    TOKEN_PROGRAMS.contains(&ix.program.as_str())
}
