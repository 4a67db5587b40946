//! Explorer log API client.
//!
//! Speaks the Etherscan-compatible `module=logs&action=getLogs` API, which
//! Basescan and most block explorers expose.

use super::{LogRecord, LogSource, MatchQuery};
use crate::config::VerifierConfig;
use crate::errors::{ResolutionError, Result};
use alloy::primitives::Bytes;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;

/// Message explorers return alongside `status: "0"` when nothing matched.
const NO_RECORDS_FOUND: &str = "No records found";

/// Envelope of every explorer API response.
#[derive(Deserialize, Debug)]
pub struct ExplorerResponse {
    pub status: String,
    pub message: String,
    pub result: Value,
}

/// One log entry as the explorer returns it; numbers are hex strings.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    pub block_number: String,
    #[serde(default)]
    pub log_index: String,
    pub transaction_hash: String,
}

impl ExplorerLog {
    fn into_record(self) -> Result<LogRecord> {
        let malformed = |reason: String| ResolutionError::MalformedLog { reason };

        let address = crate::utils::string_to_h160(&self.address)
            .map_err(|_| malformed(format!("invalid address '{}'", self.address)))?;
        let topics = self
            .topics
            .iter()
            .map(|topic| {
                crate::utils::normalize_hash(topic)
                    .map_err(|_| malformed(format!("invalid topic '{}'", topic)))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let data = Bytes::from_str(&self.data)
            .map_err(|e| malformed(format!("invalid data field: {}", e)))?;
        let block_number = crate::utils::parse_quantity(&self.block_number)
            .ok_or_else(|| malformed(format!("invalid block number '{}'", self.block_number)))?;
        let log_index = if self.log_index.is_empty() {
            0
        } else {
            crate::utils::parse_quantity(&self.log_index)
                .ok_or_else(|| malformed(format!("invalid log index '{}'", self.log_index)))?
        };

        Ok(LogRecord {
            address,
            topics,
            data,
            block_number,
            log_index,
            transaction_hash: self.transaction_hash,
        })
    }
}

/// Client for an Etherscan-compatible log API.
pub struct ExplorerLogClient {
    http_client: HttpClient,
    api_url: String,
    api_key: Option<String>,
}

impl ExplorerLogClient {
    pub fn from_config(config: &VerifierConfig) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_millis(config.explorer.timeout_ms))
            .build()
            .map_err(|e| crate::errors::ConfigError::Misconfigured {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            api_url: config.explorer.api_url.clone(),
            api_key: config.explorer.api_key.clone(),
        })
    }

    fn query_params(&self, query: &MatchQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("module", "logs".to_string()),
            ("action", "getLogs".to_string()),
            ("address", format!("{:#x}", query.contract_address)),
            ("fromBlock", query.from_block.to_string()),
            ("toBlock", "latest".to_string()),
            ("topic0", format!("{:#x}", query.event_topic)),
        ];
        if let Some(api_key) = &self.api_key {
            params.push(("apikey", api_key.clone()));
        }
        params
    }
}

#[async_trait]
impl LogSource for ExplorerLogClient {
    async fn find_logs(&self, query: &MatchQuery) -> Result<Vec<LogRecord>> {
        tracing::debug!(
            explorer = %crate::utils::mask_url(&self.api_url),
            contract = %query.contract_address,
            from_block = query.from_block,
            topic0 = %query.event_topic,
            "Querying explorer logs"
        );

        let response = self
            .http_client
            .get(&self.api_url)
            .query(&self.query_params(query))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ResolutionError::LogQueryFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolutionError::LogQueryFailed {
                reason: format!("explorer returned HTTP {}", status.as_u16()),
            }
            .into());
        }

        let body: ExplorerResponse =
            response
                .json()
                .await
                .map_err(|e| ResolutionError::LogQueryFailed {
                    reason: format!("failed to parse explorer response: {}", e),
                })?;

        if body.status != "1" {
            if body.message.starts_with(NO_RECORDS_FOUND) {
                return Ok(Vec::new());
            }
            let detail = body.result.as_str().unwrap_or_default();
            return Err(ResolutionError::ExplorerRejected {
                message: if detail.is_empty() {
                    body.message
                } else {
                    format!("{}: {}", body.message, detail)
                },
            }
            .into());
        }

        let logs: Vec<ExplorerLog> =
            serde_json::from_value(body.result).map_err(|e| ResolutionError::MalformedLog {
                reason: e.to_string(),
            })?;

        let records = logs
            .into_iter()
            .map(ExplorerLog::into_record)
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(log_count = records.len(), "Explorer logs received");
        Ok(records)
    }
}
