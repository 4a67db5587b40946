//! On-chain match resolution errors.
//!
//! Every variant is a `MatchResolutionError` in the sense of the public
//! contract: a failure while locating the executing transaction or fetching
//! its receipt. "No match yet" is not represented here; it is an empty
//! result.

use alloy::primitives::{Address, B256};

/// Errors that can occur while resolving a proposal's execution transaction
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("Log query failed: {reason}")]
    LogQueryFailed { reason: String },

    #[error("Log API rejected the query: {message}")]
    ExplorerRejected { message: String },

    #[error("Malformed log record: {reason}")]
    MalformedLog { reason: String },

    #[error("Failed to fetch receipt for {hash}: {reason}")]
    ReceiptFetchFailed { hash: B256, reason: String },

    #[error("Receipt for {hash} not found on node")]
    ReceiptNotFound { hash: B256 },

    #[error("Failed to read sale configuration from {contract}: {reason}")]
    ContractReadFailed { contract: Address, reason: String },
}
