//! Builder pattern for SimulationClient

use crate::config::{SimulationConfig, VerifierConfig};
use crate::errors::Result;
use crate::simulation::SimulationClient;

/// Builder for creating SimulationClient instances with a fluent API
pub struct SimulationClientBuilder {
    config: SimulationConfig,
}

impl SimulationClientBuilder {
    /// Create a SimulationClientBuilder from a VerifierConfig
    ///
    /// # Arguments
    ///
    /// * `config` - The verifier configuration to start from
    pub fn from_config(config: &VerifierConfig) -> Self {
        Self {
            config: config.simulation.clone(),
        }
    }

    /// Simulate on a different network than the configured one
    pub fn with_network_id(mut self, network_id: impl Into<String>) -> Self {
        self.config.network_id = network_id.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.timeout_ms = timeout_ms;
        self
    }

    /// Build the SimulationClient
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Misconfigured` if credentials are missing.
    pub fn build(self) -> Result<SimulationClient> {
        SimulationClient::new(self.config)
    }
}
