//! Simulation provider errors.

/// Errors that can occur while talking to the simulation provider
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Simulation provider returned HTTP {status}: {message}")]
    ProviderError {
        status: u16,
        message: String,
        body: serde_json::Value,
    },

    #[error("Simulation transport failure: {reason}")]
    TransportError { reason: String },
}

impl SimulationError {
    /// HTTP status reported by the provider, if the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ProviderError { status, .. } => Some(*status),
            Self::TransportError { .. } => None,
        }
    }
}

impl From<reqwest::Error> for SimulationError {
    fn from(err: reqwest::Error) -> Self {
        Self::TransportError {
            reason: err.to_string(),
        }
    }
}
