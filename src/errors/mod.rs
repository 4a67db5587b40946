//! Error handling for the proposal verifier.
//!
//! Errors are split by concern, each with its own enum:
//!
//! - **`InputError`**: malformed addresses, amounts, hashes or missing fields.
//!   Always local and reported synchronously; nothing is sent upstream.
//! - **`ConfigError`**: missing credentials or endpoints. Fatal for the calling
//!   flow and raised before any network call.
//! - **`SimulationError`**: upstream simulation failures, either a provider
//!   response with a non-2xx status (`ProviderError`) or no usable response at
//!   all (`TransportError`).
//! - **`ResolutionError`**: failures while locating a proposal's execution
//!   transaction or fetching its receipt.
//!
//! `VerifierError` aggregates all of them and is the error type of the crate
//! wide `Result<T>`. None of the operations retry on their own; callers branch
//! on the variant to decide whether re-invoking makes sense.

pub mod config;
pub mod input;
pub mod resolution;
pub mod simulation;

pub use config::ConfigError;
pub use input::InputError;
pub use resolution::ResolutionError;
pub use simulation::SimulationError;

/// Main result type for the library
pub type Result<T> = std::result::Result<T, VerifierError>;

/// Top-level error enum for the verifier.
///
/// Domain errors convert into it automatically so `?` works across module
/// boundaries. Network errors are deliberately not converted here: each
/// client classifies its own transport failures into `SimulationError` or
/// `ResolutionError` so the caller sees which flow failed.
#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    /// Caller input failed local validation.
    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    /// Required configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The simulation provider rejected the request or could not be reached.
    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),

    /// The execution transaction or its receipt could not be resolved.
    #[error("Match resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// JSON serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Hexadecimal string parsing error.
    #[error("Hex parsing error: {0}")]
    HexParsing(#[from] alloy::hex::FromHexError),

    /// Generic error for cases not covered by specific error types.
    #[error("Generic error: {0}")]
    Other(#[from] anyhow::Error),
}

impl VerifierError {
    /// Whether the error was caused by local input and would fail again unchanged.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::Input(_))
    }

    /// Whether the error is a missing or invalid configuration.
    pub fn is_misconfigured(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
