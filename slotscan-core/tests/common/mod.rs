#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use slotscan_core::{
    config::{ScanSettings, SPL_TOKEN_PROGRAM_ID},
    events::ParsedInstruction,
    extractors::WhaleTransferExtractor,
    LedgerClient, LedgerError, PageRequest, ParsedTransaction, ScanOrchestrator, SignatureInfo,
};
use solana_sdk::pubkey::Pubkey;
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard,
    },
};
use tokio::time::Duration;

/// Amount carried by a transaction that has no explicit transfer list.
pub const DEFAULT_AMOUNT: u64 = 1_000_000;
/// Threshold used by the test scanners; `DEFAULT_AMOUNT` qualifies.
pub const THRESHOLD: u64 = 10_000;

#[derive(Default)]
struct State {
    head: u64,
    /// Newest first, like the real listing.
    history: Vec<SignatureInfo>,
    transfers: HashMap<String, Vec<u64>>,
    failing_bodies: HashSet<String>,
    missing_bodies: HashSet<String>,
    failing_list_calls: HashSet<usize>,
    fail_head: bool,
    honor_until: bool,
    scramble_pages: bool,
    forced_page_size: Option<usize>,
    fetched: Vec<String>,
}

/// An in-memory ledger with a scripted signature history.
#[derive(Default)]
pub struct MockLedger {
    state: Mutex<State>,
    list_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    body_delay: Option<Duration>,
}

pub fn sig(slot: u64, n: usize) -> String {
    format!("sig-{}-{}", slot, n)
}

impl MockLedger {
    pub fn new(head: u64) -> Self {
        let ledger = Self::default();
        ledger.lock().head = head;
        ledger
    }

    pub fn with_body_delay(mut self, delay: Duration) -> Self {
        self.body_delay = Some(delay);
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Appends one new record per slot, oldest slot first.
    pub fn produce(&self, slots: impl IntoIterator<Item = u64>) -> Vec<String> {
        slots
            .into_iter()
            .map(|slot| self.produce_at(slot, 0))
            .collect()
    }

    /// Appends one new record at `slot` and returns its signature.
    pub fn produce_at(&self, slot: u64, n: usize) -> String {
        let signature = sig(slot, n);
        self.lock()
            .history
            .insert(0, SignatureInfo::new(signature.clone(), slot));
        signature
    }

    pub fn set_head(&self, head: u64) {
        self.lock().head = head;
    }

    pub fn set_transfers(&self, signature: &str, amounts: Vec<u64>) {
        self.lock().transfers.insert(signature.to_string(), amounts);
    }

    pub fn fail_body(&self, signature: &str) {
        self.lock().failing_bodies.insert(signature.to_string());
    }

    pub fn miss_body(&self, signature: &str) {
        self.lock().missing_bodies.insert(signature.to_string());
    }

    /// Makes the `call`-th listing call (counting from 1 over the mock's lifetime) fail.
    pub fn fail_list_call(&self, call: usize) {
        self.lock().failing_list_calls.insert(call);
    }

    pub fn fail_head(&self, fail: bool) {
        self.lock().fail_head = fail;
    }

    pub fn honor_until(&self, honor: bool) {
        self.lock().honor_until = honor;
    }

    /// Returns each page out of slot order, keeping its oldest entry last so
    /// paging with `before` still works.
    pub fn scramble_pages(&self, scramble: bool) {
        self.lock().scramble_pages = scramble;
    }

    /// Ignores the requested limit and returns pages of `size` entries.
    pub fn force_page_size(&self, size: usize) {
        self.lock().forced_page_size = Some(size);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn fetched(&self) -> Vec<String> {
        self.lock().fetched.clone()
    }

    pub fn distinct_fetched(&self) -> usize {
        self.lock().fetched.iter().collect::<HashSet<_>>().len()
    }

    pub fn clear_fetched(&self) {
        self.lock().fetched.clear();
    }
}

fn transfer_instruction(amount: u64) -> ParsedInstruction {
    ParsedInstruction {
        program: "spl-token".into(),
        program_id: SPL_TOKEN_PROGRAM_ID.into(),
        kind: Some("transfer".into()),
        info: json!({
            "amount": amount.to_string(),
            "source": "SourceTokenAccount",
            "destination": "DestinationTokenAccount",
            "authority": "Payer",
        }),
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn current_head(&self) -> Result<u64, LedgerError> {
        let state = self.lock();
        if state.fail_head {
            return Err(LedgerError::Unavailable("head lookup failed".into()));
        }
        Ok(state.head)
    }

    async fn list_signatures(
        &self,
        _address: &Pubkey,
        request: &PageRequest,
    ) -> Result<Vec<SignatureInfo>, LedgerError> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let state = self.lock();
        if state.failing_list_calls.contains(&call) {
            return Err(LedgerError::Unavailable(format!("listing call {} failed", call)));
        }

        let start = match &request.before {
            Some(before) => state
                .history
                .iter()
                .position(|info| &info.signature == before)
                .map_or(state.history.len(), |pos| pos + 1),
            None => 0,
        };

        let limit = state.forced_page_size.unwrap_or(request.limit);
        let mut page = Vec::new();
        for info in &state.history[start..] {
            if page.len() == limit {
                break;
            }
            if state.honor_until && request.until.as_ref() == Some(&info.signature) {
                break;
            }
            page.push(info.clone());
        }
        if state.scramble_pages && page.len() > 1 {
            let last = page.len() - 1;
            page[..last].reverse();
        }
        Ok(page)
    }

    async fn get_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<ParsedTransaction>, LedgerError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        match self.body_delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let mut state = self.lock();
        state.fetched.push(signature.to_string());
        if state.failing_bodies.contains(signature) {
            return Err(LedgerError::Unavailable(format!("no body for {}", signature)));
        }
        if state.missing_bodies.contains(signature) {
            return Ok(None);
        }
        let Some(slot) = state
            .history
            .iter()
            .find(|info| info.signature == signature)
            .map(|info| info.slot)
        else {
            return Ok(None);
        };

        let amounts = state
            .transfers
            .get(signature)
            .cloned()
            .unwrap_or_else(|| vec![DEFAULT_AMOUNT]);
        Ok(Some(ParsedTransaction {
            signature: signature.to_string(),
            slot,
            block_time: Some(1_700_000_000 + slot as i64),
            account_keys: vec!["Payer".into()],
            instructions: amounts.into_iter().map(transfer_instruction).collect(),
            ..ParsedTransaction::default()
        }))
    }

    async fn get_supply(&self, _mint: &str) -> Result<u64, LedgerError> {
        Ok(0)
    }
}

pub fn settings(concurrency: usize) -> ScanSettings {
    ScanSettings {
        page_limit: 100,
        max_records_per_scan: 5000,
        concurrency,
        poll_interval_secs: 1,
    }
}

/// A whale scanner over `ledger` where every default transaction qualifies.
pub fn whale_scanner(ledger: &Arc<MockLedger>, concurrency: usize) -> ScanOrchestrator {
    let client: Arc<dyn LedgerClient> = ledger.clone();
    ScanOrchestrator::new(
        Pubkey::new_unique(),
        client,
        Arc::new(WhaleTransferExtractor::new(THRESHOLD)),
        &settings(concurrency),
    )
    .unwrap()
}
