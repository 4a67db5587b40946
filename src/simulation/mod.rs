//! Pre-vote transaction simulation against a remote simulation provider.
//!
//! - `SimulationRequest`: validated provider payload built from an intent
//! - `SimulationClient`: sends one request per call and interprets the reply
//! - `SimulationOutcome`: success flag, simulation id and dashboard link
//!
//! Simulations may be billed by the provider, so the client never retries.

pub mod request;

pub use request::{SimulationRequest, SIMULATION_GAS_LIMIT, SIMULATION_TYPE};

use crate::config::{SimulationConfig, VerifierConfig};
use crate::errors::{ConfigError, Result, SimulationError};
use crate::intent::TransactionIntent;
use reqwest::{Client as HttpClient, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Result of one simulation call.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutcome {
    pub succeeded: bool,
    pub simulation_id: String,
    /// Link to the saved simulation; derived from configuration, never persisted
    pub dashboard_url: String,
    /// Full provider response, kept for diagnostics
    pub raw: Value,
}

impl SimulationOutcome {
    pub fn message(&self) -> &'static str {
        if self.succeeded {
            "Simulation succeeded"
        } else {
            "Simulation failed"
        }
    }
}

/// Client for the simulation provider's REST API.
pub struct SimulationClient {
    http_client: HttpClient,
    config: SimulationConfig,
}

impl SimulationClient {
    /// Create a new SimulationClient from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Misconfigured` if credentials or the endpoint are
    /// missing. No request is ever attempted with an incomplete configuration.
    pub fn from_config(config: &VerifierConfig) -> Result<Self> {
        Self::new(config.simulation.clone())
    }

    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let http_client = HttpClient::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ConfigError::Misconfigured {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self { http_client, config })
    }

    /// Validate `intent`, build its payload and simulate it.
    pub async fn simulate(&self, intent: &TransactionIntent) -> Result<SimulationOutcome> {
        let request = SimulationRequest::build(intent, &self.config)?;
        self.submit(&request).await
    }

    /// Send a prepared payload to the provider. Exactly one HTTP request is made.
    pub async fn submit(&self, request: &SimulationRequest) -> Result<SimulationOutcome> {
        let endpoint = self.config.simulate_endpoint();
        let start_time = Instant::now();

        tracing::debug!(
            endpoint = %endpoint,
            request = ?request.loggable(),
            "Sending simulation request"
        );

        let response = self
            .http_client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header("X-Access-Key", &self.config.access_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    duration_ms = start_time.elapsed().as_millis(),
                    "Simulation request failed before a response was received"
                );
                SimulationError::from(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(SimulationError::from)?;
        let outcome = self.interpret(status, &body);

        match &outcome {
            Ok(outcome) => tracing::info!(
                simulation_id = %outcome.simulation_id,
                succeeded = outcome.succeeded,
                dashboard_url = %outcome.dashboard_url,
                duration_ms = start_time.elapsed().as_millis(),
                "Simulation completed"
            ),
            Err(e) => tracing::error!(
                error = %e,
                status = status.as_u16(),
                duration_ms = start_time.elapsed().as_millis(),
                "Simulation rejected"
            ),
        }

        outcome
    }

    fn interpret(&self, status: StatusCode, body: &str) -> Result<SimulationOutcome> {
        if !status.is_success() {
            let body: Value =
                serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()));
            let message = provider_error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
            });
            return Err(SimulationError::ProviderError {
                status: status.as_u16(),
                message,
                body,
            }
            .into());
        }

        let raw: Value = serde_json::from_str(body).map_err(|e| SimulationError::TransportError {
            reason: format!("invalid simulation response: {}", e),
        })?;

        let succeeded = raw.pointer("/simulation/status").and_then(Value::as_bool) == Some(true);
        let simulation_id = match raw.pointer("/simulation/id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(SimulationError::TransportError {
                    reason: "simulation response is missing simulation.id".to_string(),
                }
                .into())
            }
        };
        let dashboard_url = self.config.dashboard_link(&simulation_id);

        Ok(SimulationOutcome {
            succeeded,
            simulation_id,
            dashboard_url,
            raw,
        })
    }
}

/// Pull a human-readable message out of a provider error body.
fn provider_error_message(body: &Value) -> Option<String> {
    match body.get("error") {
        Some(Value::String(message)) => return Some(message.clone()),
        Some(error) => {
            if let Some(message) = error.get("message").and_then(Value::as_str) {
                return Some(message.to_string());
            }
        }
        None => {}
    }
    body.get("message").and_then(Value::as_str).map(str::to_string)
}
