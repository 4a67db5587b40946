//! Local input validation errors.
//!
//! These are raised synchronously, before anything is sent upstream.

/// Errors caused by malformed caller input
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Invalid address '{input}': expected 40 hex characters after an optional 0x prefix")]
    InvalidAddress { input: String },

    #[error("Invalid amount '{input}': {reason}")]
    InvalidAmount { input: String, reason: String },

    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Invalid 32-byte hash '{input}'")]
    InvalidHash { input: String },

    #[error("Invalid hex data in field {field}: {reason}")]
    InvalidHexData { field: &'static str, reason: String },

    #[error("Failed to load transaction intent from {path}: {reason}")]
    InvalidIntentFile { path: String, reason: String },
}
