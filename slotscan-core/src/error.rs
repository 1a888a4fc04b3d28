use solana_client::client_error::ClientError;
use thiserror::Error;

/// Errors returned by a [`LedgerClient`](crate::client::LedgerClient) call.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("RPC request failed: {0}")]
    Rpc(Box<ClientError>),

    #[error("Invalid signature '{0}'")]
    InvalidSignature(String),

    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

impl From<ClientError> for LedgerError {
    fn from(err: ClientError) -> Self {
        LedgerError::Rpc(Box::new(err))
    }
}

/// Errors surfaced to the caller of [`ScanOrchestrator`](crate::scanner::ScanOrchestrator).
///
/// Only construction-time and page-level failures show up here. Failures for a
/// single transaction body are absorbed by the pipeline.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to read the current head: {0}")]
    Head(#[source] LedgerError),

    #[error("Failed to fetch signature page {page}: {source}")]
    PageFetch {
        page: usize,
        #[source]
        source: LedgerError,
    },
}
