//! # Ledger Client
//!
//! The [`LedgerClient`] trait is the only way the scanner talks to the ledger.
//! It exposes the four reads the scanner needs: the current head, a
//! reverse-chronological signature listing, a parsed transaction body and a
//! token supply lookup.
//!
//! [`RpcLedger`] implements it on top of the nonblocking Solana `RpcClient`.
//! Tests implement it with in-memory fixtures.

use crate::error::LedgerError;
use crate::events::{ParsedInstruction, ParsedTransaction, SignatureInfo};
use async_trait::async_trait;
use serde_json::{json, Value};
use solana_client::{
    nonblocking::rpc_client::RpcClient, rpc_client::GetConfirmedSignaturesForAddress2Config,
    rpc_config::RpcTransactionConfig, rpc_request::RpcRequest,
};
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    pubkey::Pubkey,
    signature::Signature,
};
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, EncodedTransaction, UiInnerInstructions,
    UiInstruction, UiMessage, UiParsedInstruction, UiTransactionEncoding,
};
use std::{str::FromStr, sync::Arc};

/// Arguments for one signature listing call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Only return signatures older than this one.
    pub before: Option<String>,
    /// Hint to stop once this signature is reached. Upstreams may ignore it.
    pub until: Option<String>,
    pub limit: usize,
}

/// A trait abstracting over the ledger reads the scanner depends on.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Latest known position. Never decreases.
    async fn current_head(&self) -> Result<u64, LedgerError>;

    /// At most `request.limit` signatures touching `address`, newest first.
    async fn list_signatures(
        &self,
        address: &Pubkey,
        request: &PageRequest,
    ) -> Result<Vec<SignatureInfo>, LedgerError>;

    /// The parsed body of a transaction, or `None` if it is missing or not yet confirmed.
    async fn get_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<ParsedTransaction>, LedgerError>;

    /// Current raw supply of a token mint, in base units.
    async fn get_supply(&self, mint: &str) -> Result<u64, LedgerError>;
}

/// A [`LedgerClient`] backed by a Solana JSON RPC node.
#[derive(Clone)]
pub struct RpcLedger {
    rpc_client: Arc<RpcClient>,
    commitment: CommitmentConfig,
}

impl RpcLedger {
    /// Creates a new `RpcLedger`.
    ///
    /// # Arguments
    ///
    /// * `rpc_client` - A shared `Arc<RpcClient>` for communicating with the Solana cluster.
    /// * `commitment` - Commitment level used for every read.
    pub fn new(rpc_client: Arc<RpcClient>, commitment: CommitmentLevel) -> Self {
        Self {
            rpc_client,
            commitment: CommitmentConfig { commitment },
        }
    }

    /// `getTransaction` rejects `processed`, so it is bumped to `confirmed`.
    fn transaction_commitment(&self) -> CommitmentConfig {
        match self.commitment.commitment {
            CommitmentLevel::Processed => CommitmentConfig::confirmed(),
            _ => self.commitment,
        }
    }
}

#[async_trait]
impl LedgerClient for RpcLedger {
    async fn current_head(&self) -> Result<u64, LedgerError> {
        Ok(self
            .rpc_client
            .get_slot_with_commitment(self.commitment)
            .await?)
    }

    async fn list_signatures(
        &self,
        address: &Pubkey,
        request: &PageRequest,
    ) -> Result<Vec<SignatureInfo>, LedgerError> {
        let config = GetConfirmedSignaturesForAddress2Config {
            before: request.before.as_deref().map(parse_signature).transpose()?,
            until: request.until.as_deref().map(parse_signature).transpose()?,
            limit: Some(request.limit),
            commitment: Some(self.commitment),
        };
        let page = self
            .rpc_client
            .get_signatures_for_address_with_config(address, config)
            .await?;

        Ok(page
            .into_iter()
            .map(|status| SignatureInfo::new(status.signature, status.slot))
            .collect())
    }

    async fn get_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<ParsedTransaction>, LedgerError> {
        let sig = parse_signature(signature)?;
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::JsonParsed),
            commitment: Some(self.transaction_commitment()),
            max_supported_transaction_version: Some(0),
        };
        // `send` keeps a `null` result distinguishable from a transport error.
        let tx: Option<EncodedConfirmedTransactionWithStatusMeta> = self
            .rpc_client
            .send(RpcRequest::GetTransaction, json!([sig.to_string(), config]))
            .await?;

        Ok(tx.and_then(|tx| into_parsed_transaction(signature, tx)))
    }

    async fn get_supply(&self, mint: &str) -> Result<u64, LedgerError> {
        let mint_pubkey =
            Pubkey::from_str(mint).map_err(|_| LedgerError::InvalidAddress(mint.to_string()))?;
        let supply = self
            .rpc_client
            .get_token_supply_with_commitment(&mint_pubkey, self.commitment)
            .await?
            .value;

        supply.amount.parse::<u64>().map_err(|e| {
            LedgerError::Malformed(format!("supply '{}' of {}: {}", supply.amount, mint, e))
        })
    }
}

fn parse_signature(raw: &str) -> Result<Signature, LedgerError> {
    Signature::from_str(raw).map_err(|_| LedgerError::InvalidSignature(raw.to_string()))
}

/// Converts a `jsonParsed` RPC transaction into a [`ParsedTransaction`].
///
/// Returns `None` when the node did not return the message in parsed form.
fn into_parsed_transaction(
    signature: &str,
    tx: EncodedConfirmedTransactionWithStatusMeta,
) -> Option<ParsedTransaction> {
    let EncodedConfirmedTransactionWithStatusMeta {
        slot,
        transaction,
        block_time,
        ..
    } = tx;

    let EncodedTransaction::Json(ui_tx) = transaction.transaction else {
        return None;
    };
    let UiMessage::Parsed(message) = ui_tx.message else {
        return None;
    };

    let account_keys = message
        .account_keys
        .into_iter()
        .map(|account| account.pubkey)
        .collect();
    let mut instructions: Vec<ParsedInstruction> = message
        .instructions
        .iter()
        .filter_map(convert_instruction)
        .collect();

    let (log_messages, failed) = match transaction.meta {
        Some(meta) => {
            let inner = Option::<Vec<UiInnerInstructions>>::from(meta.inner_instructions);
            for group in inner.unwrap_or_default() {
                instructions.extend(group.instructions.iter().filter_map(convert_instruction));
            }
            let logs = Option::<Vec<String>>::from(meta.log_messages).unwrap_or_default();
            (logs, meta.err.is_some())
        }
        None => (Vec::new(), false),
    };

    Some(ParsedTransaction {
        signature: signature.to_string(),
        slot,
        block_time,
        account_keys,
        instructions,
        log_messages,
        failed,
    })
}

fn convert_instruction(ix: &UiInstruction) -> Option<ParsedInstruction> {
    match ix {
        UiInstruction::Parsed(UiParsedInstruction::Parsed(parsed)) => Some(ParsedInstruction {
            program: parsed.program.clone(),
            program_id: parsed.program_id.clone(),
            kind: parsed
                .parsed
                .get("type")
                .and_then(Value::as_str)
                .map(str::to_owned),
            info: parsed.parsed.get("info").cloned().unwrap_or(Value::Null),
        }),
        UiInstruction::Parsed(UiParsedInstruction::PartiallyDecoded(partial)) => {
            Some(ParsedInstruction {
                program_id: partial.program_id.clone(),
                ..ParsedInstruction::default()
            })
        }
        UiInstruction::Compiled(_) => None,
    }
}
