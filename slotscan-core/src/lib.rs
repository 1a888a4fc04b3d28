//! Incremental event scanning over a Solana address's signature history.
//!
//! The ledger only offers a "signatures before X" listing, newest first, with
//! no changefeed. This crate turns that into resumable scans: each call to
//! [`scanner::ScanOrchestrator::scan`] returns only the events that appeared
//! since the previous call, fetched under a bounded concurrency budget.
//!
//! # Key Components
//!
//! *   [`client`]: the [`client::LedgerClient`] trait and its Solana RPC adapter.
//! *   [`scanner`]: the orchestrator, its pagination rules and cursor handling.
//! *   [`pipeline`]: bounded fetch-and-extract of one signature page.
//! *   [`extractors`]: pluggable transaction-to-event functions for new mints
//!     and whale transfers.
//! *   [`workers`]: background polling of several watchers with one event stream.
pub mod cache;
/// Defines configuration structures for the scanner.
pub mod config;
pub mod client;
/// Resumable scan position.
pub mod cursor;
pub mod error;
/// Ledger records and the domain events extracted from them.
pub mod events;
pub mod extractors;
/// Bounded concurrency for transaction body fetches.
pub mod limiter;
pub mod pipeline;
pub mod scanner;
/// Built-in watchers and how each one is assembled.
pub mod watchers;
pub mod workers;

pub use client::{LedgerClient, PageRequest, RpcLedger};
pub use cursor::Cursor;
pub use error::{LedgerError, ScanError};
pub use events::{LedgerEvent, LedgerEventData, ParsedTransaction, SignatureInfo};
pub use scanner::{ScanOrchestrator, ScanReport};
