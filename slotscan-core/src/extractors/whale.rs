use super::{is_token_instruction, EventExtractor};
use crate::events::{LedgerEvent, LedgerEventData, ParsedInstruction, ParsedTransaction};
use async_trait::async_trait;
use serde_json::Value;

/// Emits a `WhaleTransfer` for every token transfer at or above a threshold.
///
/// Matches `transfer`, `transferChecked` and the Token-2022
/// `transferCheckedWithFee`; the amount compared is the gross amount sent,
/// before any transfer fee. Mint-to and burn instructions are not transfers.
///
/// The threshold is compared against the raw amount, so it has to be given in
/// the token's base units.
#[derive(Debug, Clone)]
pub struct WhaleTransferExtractor {
    threshold: u64,
}

impl WhaleTransferExtractor {
    pub fn new(threshold: u64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    fn to_event(&self, tx: &ParsedTransaction, ix: &ParsedInstruction) -> Option<LedgerEvent> {
        let amount = transfer_amount(ix)?;
        if amount < self.threshold {
            return None;
        }
        Some(LedgerEvent {
            signature: tx.signature.clone(),
            slot: tx.slot,
            timestamp: tx.timestamp_ms(),
            data: LedgerEventData::WhaleTransfer {
                mint: ix.info_str("mint").map(str::to_owned),
                amount,
                sender: ix.info_str("source")?.to_string(),
                recipient: ix.info_str("destination")?.to_string(),
            },
        })
    }
}

#[async_trait]
impl EventExtractor for WhaleTransferExtractor {
    fn name(&self) -> &'static str {
        "whale-transfer"
    }

    async fn extract(&self, tx: &ParsedTransaction) -> anyhow::Result<Vec<LedgerEvent>> {
        if tx.failed {
            return Ok(Vec::new());
        }
        Ok(tx
            .instructions
            .iter()
            .filter(|ix| is_token_instruction(ix))
            .filter_map(|ix| self.to_event(tx, ix))
            .collect())
    }
}

/// Raw amount of a transfer instruction.
fn transfer_amount(ix: &ParsedInstruction) -> Option<u64> {
    match ix.kind.as_deref()? {
        "transfer" => ix.info.get("amount").and_then(as_u64),
        "transferChecked" | "transferCheckedWithFee" => ix
            .info
            .get("tokenAmount")
            .and_then(|amount| amount.get("amount"))
            .and_then(as_u64),
        _ => None,
    }
}

/// The parser encodes token amounts as strings; plain numbers are accepted too.
fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => s.parse().ok(),
        other => other.as_u64(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transfer(amount: &str) -> ParsedInstruction {
        ParsedInstruction {
            program: "spl-token".into(),
            program_id: crate::config::SPL_TOKEN_PROGRAM_ID.into(),
            kind: Some("transfer".into()),
            info: json!({
                "amount": amount,
                "source": "SrcAcct",
                "destination": "DstAcct",
                "authority": "Owner",
            }),
        }
    }

    fn tx(instructions: Vec<ParsedInstruction>) -> ParsedTransaction {
        ParsedTransaction {
            signature: "sig-1".into(),
            slot: 77,
            block_time: Some(1_700_000_000),
            account_keys: vec!["Owner".into()],
            instructions,
            ..ParsedTransaction::default()
        }
    }

    #[tokio::test]
    async fn each_qualifying_transfer_becomes_an_event() {
        let extractor = WhaleTransferExtractor::new(1_000);
        let events = extractor
            .extract(&tx(vec![transfer("5000"), transfer("999"), transfer("1000")]))
            .await
            .unwrap();

        assert_eq!(events.len(), 2);
        for event in &events {
            assert_eq!(event.signature, "sig-1");
            assert_eq!(event.slot, 77);
            assert_eq!(event.timestamp, 1_700_000_000_000);
        }
        assert!(matches!(
            &events[0].data,
            LedgerEventData::WhaleTransfer { amount: 5000, mint: None, sender, recipient }
                if sender == "SrcAcct" && recipient == "DstAcct"
        ));
    }

    #[tokio::test]
    async fn transfer_checked_carries_the_mint() {
        let ix = ParsedInstruction {
            program: "spl-token-2022".into(),
            program_id: String::new(),
            kind: Some("transferChecked".into()),
            info: json!({
                "mint": "MintAddr",
                "source": "SrcAcct",
                "destination": "DstAcct",
                "tokenAmount": { "amount": "250000", "decimals": 6, "uiAmount": 0.25 },
            }),
        };
        let events = WhaleTransferExtractor::new(100_000)
            .extract(&tx(vec![ix]))
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0].data,
            LedgerEventData::WhaleTransfer { mint: Some(mint), amount: 250_000, .. } if mint == "MintAddr"
        ));
    }

    #[tokio::test]
    async fn transfer_with_fee_uses_the_gross_amount() {
        let ix = ParsedInstruction {
            program: "spl-token-2022".into(),
            kind: Some("transferCheckedWithFee".into()),
            info: json!({
                "mint": "FeeMint",
                "source": "SrcAcct",
                "destination": "DstAcct",
                "authority": "Owner",
                "tokenAmount": { "amount": "200000", "decimals": 6 },
                "feeAmount": { "amount": "2000", "decimals": 6 },
            }),
            ..ParsedInstruction::default()
        };
        let events = WhaleTransferExtractor::new(200_000)
            .extract(&tx(vec![ix]))
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0].data,
            LedgerEventData::WhaleTransfer { mint: Some(mint), amount: 200_000, .. } if mint == "FeeMint"
        ));
    }

    #[tokio::test]
    async fn ignores_other_programs_failures_and_malformed_shapes() {
        let extractor = WhaleTransferExtractor::new(1);

        let system = ParsedInstruction {
            program: "system".into(),
            kind: Some("transfer".into()),
            info: json!({ "lamports": 5_000_000, "source": "a", "destination": "b" }),
            ..ParsedInstruction::default()
        };
        let malformed = ParsedInstruction {
            program: "spl-token".into(),
            kind: Some("transfer".into()),
            info: json!({ "amount": "not-a-number" }),
            ..ParsedInstruction::default()
        };
        assert!(extractor
            .extract(&tx(vec![system, malformed]))
            .await
            .unwrap()
            .is_empty());

        let mut failed = tx(vec![transfer("10")]);
        failed.failed = true;
        assert!(extractor.extract(&failed).await.unwrap().is_empty());
    }
}
