use super::{is_token_instruction, EventExtractor};
use crate::cache::SupplyCache;
use crate::events::{LedgerEvent, LedgerEventData, ParsedInstruction, ParsedTransaction};
use async_trait::async_trait;

const INITIALIZE_MINT_KINDS: [&str; 2] = ["initializeMint", "initializeMint2"];

/// Emits a `MintCreated` event for every mint initialized in a transaction.
///
/// The supply is read once per new mint through a [`SupplyCache`]; a failed
/// read fails the whole transaction, which the pipeline then counts as
/// yielding no events.
#[derive(Clone)]
pub struct MintCreationExtractor {
    supply: SupplyCache,
}

impl MintCreationExtractor {
    pub fn new(supply: SupplyCache) -> Self {
        Self { supply }
    }
}

fn initialized_mint(ix: &ParsedInstruction) -> Option<&str> {
    if !is_token_instruction(ix) {
        return None;
    }
    let kind = ix.kind.as_deref()?;
    if !INITIALIZE_MINT_KINDS.contains(&kind) {
        return None;
    }
    ix.info_str("mint")
}

#[async_trait]
impl EventExtractor for MintCreationExtractor {
    fn name(&self) -> &'static str {
        "mint-creation"
    }

    async fn extract(&self, tx: &ParsedTransaction) -> anyhow::Result<Vec<LedgerEvent>> {
        if tx.failed {
            return Ok(Vec::new());
        }
        let Some(creator) = tx.fee_payer() else {
            return Ok(Vec::new());
        };

        let mut events = Vec::new();
        for mint in tx.instructions.iter().filter_map(initialized_mint) {
            let supply = self.supply.supply(mint).await?;
            events.push(LedgerEvent {
                signature: tx.signature.clone(),
                slot: tx.slot,
                timestamp: tx.timestamp_ms(),
                data: LedgerEventData::MintCreated {
                    mint: mint.to_string(),
                    creator: creator.to_string(),
                    supply,
                },
            });
        }
        Ok(events)
    }
}
