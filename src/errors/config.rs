//! Configuration errors.

/// Errors raised while loading or validating configuration.
///
/// A `Misconfigured` error short-circuits the calling flow before any
/// network request is made.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Misconfigured: {message}")]
    Misconfigured { message: String },

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}
