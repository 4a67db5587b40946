//! Builder pattern for ExecutionResolver

use crate::config::{ResolverSettings, VerifierConfig};
use crate::errors::{ConfigError, Result};
use crate::resolver::{ExecutionResolver, ExplorerLogClient, LogSource, NodeClient, ReceiptSource};
use std::sync::Arc;

/// Builder for creating ExecutionResolver instances with a fluent API
///
/// Sources that are not set explicitly are created from the configuration:
/// `ExplorerLogClient` for logs and `NodeClient` for receipts.
#[derive(Default)]
pub struct ExecutionResolverBuilder {
    config: Option<VerifierConfig>,
    log_source: Option<Arc<dyn LogSource>>,
    receipt_source: Option<Arc<dyn ReceiptSource>>,
    created_contract_log_index: Option<usize>,
}

impl ExecutionResolverBuilder {
    /// Create a new ExecutionResolverBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the verifier configuration
    pub fn with_config(mut self, config: VerifierConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_log_source(mut self, source: Arc<dyn LogSource>) -> Self {
        self.log_source = Some(source);
        self
    }

    pub fn with_receipt_source(mut self, source: Arc<dyn ReceiptSource>) -> Self {
        self.receipt_source = Some(source);
        self
    }

    /// Index of the receipt log whose emitter is the created contract
    pub fn with_created_contract_log_index(mut self, index: usize) -> Self {
        self.created_contract_log_index = Some(index);
        self
    }

    /// Build the ExecutionResolver
    ///
    /// # Errors
    ///
    /// Returns an error if a source is missing and there is no configuration
    /// to create it from, or if creating it from configuration fails.
    pub fn build(self) -> Result<ExecutionResolver> {
        let missing = |what: &str| ConfigError::Misconfigured {
            message: format!("{} or a configuration is required to build ExecutionResolver", what),
        };

        let log_source: Arc<dyn LogSource> = match (self.log_source, &self.config) {
            (Some(source), _) => source,
            (None, Some(config)) => Arc::new(ExplorerLogClient::from_config(config)?),
            (None, None) => return Err(missing("A log source").into()),
        };
        let receipt_source: Arc<dyn ReceiptSource> = match (self.receipt_source, &self.config) {
            (Some(source), _) => source,
            (None, Some(config)) => Arc::new(NodeClient::from_config(config)?),
            (None, None) => return Err(missing("A receipt source").into()),
        };

        let mut settings = self
            .config
            .as_ref()
            .map(|config| config.resolver.clone())
            .unwrap_or_default();
        if let Some(index) = self.created_contract_log_index {
            settings = ResolverSettings {
                created_contract_log_index: index,
            };
        }

        Ok(ExecutionResolver::new(log_source, receipt_source, &settings))
    }
}
