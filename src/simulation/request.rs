//! Provider payload construction for transaction simulation.

use crate::config::SimulationConfig;
use crate::errors::Result;
use crate::intent::TransactionIntent;
use serde::{Deserialize, Serialize};

/// Gas ceiling every simulation runs with.
pub const SIMULATION_GAS_LIMIT: u64 = 648_318;
/// Provider simulation mode; "full" returns decoded call traces.
pub const SIMULATION_TYPE: &str = "full";

/// Body of a `POST .../simulate` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub network_id: String,
    pub from: String,
    pub to: String,
    pub input: String,
    /// Value in wei, as a decimal string
    pub value: String,
    pub gas: u64,
    pub save: bool,
    pub save_if_fails: bool,
    pub simulation_type: String,
    /// Contract ABI, JSON-encoded into a string as the provider expects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_abi: Option<String>,
}

impl SimulationRequest {
    /// Validate an intent and build the provider payload for it.
    ///
    /// # Errors
    ///
    /// Any `InputError` raised by `TransactionIntent::validate`, or a
    /// serialization error if the ABI cannot be encoded.
    pub fn build(intent: &TransactionIntent, config: &SimulationConfig) -> Result<Self> {
        let validated = intent.validate()?;

        let contract_abi = intent
            .contract_abi
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let request = Self {
            network_id: config.network_id.clone(),
            from: validated.from.to_checksum(None),
            to: validated.to.to_checksum(None),
            input: validated.input.to_string(),
            value: validated.value_wei,
            gas: SIMULATION_GAS_LIMIT,
            save: true,
            save_if_fails: true,
            simulation_type: SIMULATION_TYPE.to_string(),
            contract_abi,
        };

        tracing::debug!(
            kind = intent.kind.label(),
            unit = %intent.unit(),
            request = ?request.loggable(),
            "Simulation request built"
        );

        Ok(request)
    }

    /// Copy of the payload without the ABI, which can be arbitrarily large.
    pub fn loggable(&self) -> SimulationRequest {
        SimulationRequest {
            contract_abi: None,
            ..self.clone()
        }
    }
}
