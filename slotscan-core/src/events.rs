#[cfg(feature = "serde")]
use serde::Serialize;
use serde_json::Value;

/// One entry of a signature listing: identifies a single ledger record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInfo {
    pub signature: String,
    pub slot: u64,
}

impl SignatureInfo {
    pub fn new(signature: impl Into<String>, slot: u64) -> Self {
        Self {
            signature: signature.into(),
            slot,
        }
    }
}

/// A transaction body reduced to what extractors need.
///
/// Produced by a [`LedgerClient`](crate::client::LedgerClient); the RPC adapter
/// builds it from a `jsonParsed` transaction, mocks build it directly.
#[derive(Debug, Clone, Default)]
pub struct ParsedTransaction {
    pub signature: String,
    pub slot: u64,
    /// Block time in seconds, when the node reports one.
    pub block_time: Option<i64>,
    /// Account keys in message order; the first one is the fee payer.
    pub account_keys: Vec<String>,
    /// Top-level instructions followed by inner (CPI) instructions.
    pub instructions: Vec<ParsedInstruction>,
    pub log_messages: Vec<String>,
    /// Set when the transaction landed with an on-chain error.
    pub failed: bool,
}

impl ParsedTransaction {
    /// Block time in milliseconds, falling back to the wall clock.
    pub fn timestamp_ms(&self) -> i64 {
        self.block_time
            .map(|secs| secs.saturating_mul(1000))
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis())
    }

    pub fn fee_payer(&self) -> Option<&str> {
        self.account_keys.first().map(String::as_str)
    }
}

/// A single instruction in its parsed form.
#[derive(Debug, Clone, Default)]
pub struct ParsedInstruction {
    /// Program name as reported by the parser, e.g. `spl-token`.
    pub program: String,
    pub program_id: String,
    /// The parsed `type` field, e.g. `transfer`.
    pub kind: Option<String>,
    /// The parsed `info` object, `Null` when absent.
    pub info: Value,
}

impl ParsedInstruction {
    pub fn is(&self, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind)
    }

    /// Reads a string field out of `info`.
    pub fn info_str(&self, key: &str) -> Option<&str> {
        self.info.get(key).and_then(Value::as_str)
    }
}

/// A domain event extracted from one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LedgerEvent {
    pub signature: String,
    pub slot: u64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub data: LedgerEventData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")
)]
pub enum LedgerEventData {
    MintCreated {
        mint: String,
        creator: String,
        supply: u64,
    },
    WhaleTransfer {
        /// Only present for `transferChecked`; a plain transfer does not name its mint.
        mint: Option<String>,
        amount: u64,
        sender: String,
        recipient: String,
    },
}

impl LedgerEvent {
    pub fn kind(&self) -> &'static str {
        match self.data {
            LedgerEventData::MintCreated { .. } => "mint-created",
            LedgerEventData::WhaleTransfer { .. } => "whale-transfer",
        }
    }
}
