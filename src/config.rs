//! Configuration management for the proposal verifier.
//!
//! Configuration is loaded once at start-up into an immutable
//! `VerifierConfig` and passed by reference into each component's
//! constructor. Nothing reads the environment after that point.

use crate::errors::{ConfigError, Result};
use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Default Tenderly REST API root.
pub const DEFAULT_SIMULATION_API_URL: &str = "https://api.tenderly.co/api/v1";
/// Default Tenderly dashboard root used for human-followable links.
pub const DEFAULT_DASHBOARD_URL: &str = "https://dashboard.tenderly.co";
/// Default Etherscan-compatible log API for Base.
pub const DEFAULT_EXPLORER_API_URL: &str = "https://api.basescan.org/api";
/// Default public JSON-RPC endpoint for Base.
pub const DEFAULT_RPC_URL: &str = "https://mainnet.base.org";
/// Fixed protocol fee charged per minted token: 0.000777 ETH.
pub const DEFAULT_PROTOCOL_FEE_WEI: u64 = 777_000_000_000_000;

/// Simulation provider credentials and endpoints
#[derive(Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// REST API root, without the account/project path
    pub api_url: String,
    /// Dashboard root used to build simulation links
    pub dashboard_url: String,
    pub account_slug: String,
    pub project_slug: String,
    /// Access key sent in the `X-Access-Key` header
    pub access_key: String,
    /// Network the simulation runs against (chain id as a string)
    pub network_id: String,
    /// Timeout for simulation requests in milliseconds
    pub timeout_ms: u64,
}

impl fmt::Debug for SimulationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationConfig")
            .field("api_url", &self.api_url)
            .field("dashboard_url", &self.dashboard_url)
            .field("account_slug", &self.account_slug)
            .field("project_slug", &self.project_slug)
            .field("access_key", &"**masked**")
            .field("network_id", &self.network_id)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_SIMULATION_API_URL.to_string(),
            dashboard_url: DEFAULT_DASHBOARD_URL.to_string(),
            account_slug: String::new(),
            project_slug: String::new(),
            access_key: String::new(),
            network_id: "8453".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl SimulationConfig {
    /// Check that everything needed to call the provider is present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Misconfigured` naming every missing setting.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("TENDERLY_ACCOUNT_SLUG", self.account_slug.as_str()),
            ("TENDERLY_PROJECT_SLUG", self.project_slug.as_str()),
            ("TENDERLY_ACCESS_KEY", self.access_key.as_str()),
            ("TENDERLY_API_URL", self.api_url.as_str()),
            ("SIMULATION_NETWORK_ID", self.network_id.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(ConfigError::Misconfigured {
                message: format!("missing simulation settings: {}", missing.join(", ")),
            }
            .into());
        }

        validate_url("TENDERLY_API_URL", &self.api_url)?;
        validate_url("TENDERLY_DASHBOARD_URL", &self.dashboard_url)?;
        Ok(())
    }

    /// Full URL of the simulate endpoint for the configured account and project.
    pub fn simulate_endpoint(&self) -> String {
        format!(
            "{}/account/{}/project/{}/simulate",
            self.api_url.trim_end_matches('/'),
            self.account_slug,
            self.project_slug
        )
    }

    /// Dashboard link for a saved simulation.
    pub fn dashboard_link(&self, simulation_id: &str) -> String {
        format!(
            "{}/{}/{}/simulator/{}",
            self.dashboard_url.trim_end_matches('/'),
            self.account_slug,
            self.project_slug,
            simulation_id
        )
    }
}

/// Explorer-style log API configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ExplorerConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl fmt::Debug for ExplorerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplorerConfig")
            .field("api_url", &self.api_url)
            .field("has_api_key", &self.api_key.is_some())
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_EXPLORER_API_URL.to_string(),
            api_key: None,
            timeout_ms: 10_000,
        }
    }
}

/// JSON-RPC node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub rpc_url: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
        }
    }
}

/// Assumptions the resolver makes about the executing contract
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverSettings {
    /// Index of the receipt log whose emitting address is the created contract.
    ///
    /// The drop factory emits the new contract's first event before anything
    /// else in the execution transaction, so index 0 is the default. Other
    /// contract families may need a different index.
    pub created_contract_log_index: usize,
}

/// Price reconciliation constants
#[derive(Debug, Clone)]
pub struct PricingSettings {
    /// Protocol fee charged per unit, in wei
    pub fee_per_unit_wei: U256,
    /// Live prices at or below this value are treated as "no live data"
    pub empty_price_sentinel_wei: U256,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            fee_per_unit_wei: U256::from(DEFAULT_PROTOCOL_FEE_WEI),
            empty_price_sentinel_wei: U256::ZERO,
        }
    }
}

/// Main configuration structure for the verifier
#[derive(Debug, Clone, Default)]
pub struct VerifierConfig {
    pub simulation: SimulationConfig,
    pub explorer: ExplorerConfig,
    pub node: NodeConfig,
    pub resolver: ResolverSettings,
    pub pricing: PricingSettings,
}

impl VerifierConfig {
    /// Create a new configuration from environment variables
    ///
    /// # Environment Variables
    ///
    /// ## Simulation (validated when a `SimulationClient` is built)
    /// - `TENDERLY_ACCOUNT_SLUG`, `TENDERLY_PROJECT_SLUG`, `TENDERLY_ACCESS_KEY`
    /// - `TENDERLY_API_URL` (default: Tenderly v1 API)
    /// - `TENDERLY_DASHBOARD_URL` (default: Tenderly dashboard)
    /// - `VERIFIER_CHAIN` (default: base) or `SIMULATION_NETWORK_ID` to override
    /// - `SIMULATION_TIMEOUT_MS` (default: 30000)
    ///
    /// ## Resolution
    /// - `EXPLORER_API_URL`, `EXPLORER_API_KEY`, `EXPLORER_TIMEOUT_MS`
    /// - `RPC_URL`
    /// - `CREATED_CONTRACT_LOG_INDEX` (default: 0)
    ///
    /// ## Pricing
    /// - `PROTOCOL_FEE_WEI` (default: 777000000000000)
    ///
    /// # Errors
    ///
    /// Returns an error if a value is present but malformed. Missing
    /// simulation credentials are not an error here, since the resolution
    /// flow does not need them.
    pub fn from_env() -> Result<Self> {
        tracing::info!("Loading verifier configuration from environment");

        let chain = env::var("VERIFIER_CHAIN").unwrap_or_else(|_| "base".to_string());
        let network_id = match env::var("SIMULATION_NETWORK_ID") {
            Ok(id) => id,
            Err(_) => crate::utils::chain_id(&chain)?.to_string(),
        };

        let simulation = SimulationConfig {
            api_url: env_or("TENDERLY_API_URL", DEFAULT_SIMULATION_API_URL),
            dashboard_url: env_or("TENDERLY_DASHBOARD_URL", DEFAULT_DASHBOARD_URL),
            account_slug: env_or("TENDERLY_ACCOUNT_SLUG", ""),
            project_slug: env_or("TENDERLY_PROJECT_SLUG", ""),
            access_key: env_or("TENDERLY_ACCESS_KEY", ""),
            network_id,
            timeout_ms: env_parse("SIMULATION_TIMEOUT_MS", 30_000)?,
        };

        if simulation.validate().is_err() {
            tracing::debug!("Simulation credentials incomplete - simulation will be unavailable");
        }

        let explorer = ExplorerConfig {
            api_url: env_or("EXPLORER_API_URL", DEFAULT_EXPLORER_API_URL),
            api_key: env::var("EXPLORER_API_KEY").ok().filter(|k| !k.is_empty()),
            timeout_ms: env_parse("EXPLORER_TIMEOUT_MS", 10_000)?,
        };
        validate_url("EXPLORER_API_URL", &explorer.api_url)?;

        let node = NodeConfig {
            rpc_url: env_or("RPC_URL", DEFAULT_RPC_URL),
        };
        validate_url("RPC_URL", &node.rpc_url)?;

        let resolver = ResolverSettings {
            created_contract_log_index: env_parse("CREATED_CONTRACT_LOG_INDEX", 0)?,
        };

        let pricing = PricingSettings {
            fee_per_unit_wei: env_parse("PROTOCOL_FEE_WEI", U256::from(DEFAULT_PROTOCOL_FEE_WEI))?,
            ..PricingSettings::default()
        };

        let config = Self {
            simulation,
            explorer,
            node,
            resolver,
            pricing,
        };

        tracing::info!(
            chain = %chain,
            network_id = %config.simulation.network_id,
            explorer = %crate::utils::mask_url(&config.explorer.api_url),
            rpc = %crate::utils::mask_url(&config.node.rpc_url),
            created_contract_log_index = config.resolver.created_contract_log_index,
            fee_per_unit_wei = %config.pricing.fee_per_unit_wei,
            "Verifier configuration loaded successfully"
        );

        Ok(config)
    }

    /// Create a configuration for tests, pointing every endpoint at `base_url`.
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            simulation: SimulationConfig {
                api_url: base_url.to_string(),
                dashboard_url: DEFAULT_DASHBOARD_URL.to_string(),
                account_slug: "test-account".to_string(),
                project_slug: "test-project".to_string(),
                access_key: "test-access-key".to_string(),
                network_id: "8453".to_string(),
                timeout_ms: 5_000,
            },
            explorer: ExplorerConfig {
                api_url: format!("{}/api", base_url.trim_end_matches('/')),
                api_key: Some("test-explorer-key".to_string()),
                timeout_ms: 5_000,
            },
            node: NodeConfig {
                rpc_url: base_url.to_string(),
            },
            resolver: ResolverSettings::default(),
            pricing: PricingSettings::default(),
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| {
            tracing::error!(variable = name, value = %raw, "Invalid configuration value");
            ConfigError::InvalidValue {
                name: name.to_string(),
                reason: e.to_string(),
            }
            .into()
        }),
        Err(_) => Ok(default),
    }
}

fn validate_url(name: &str, value: &str) -> Result<()> {
    url::Url::parse(value).map_err(|e| ConfigError::InvalidValue {
        name: name.to_string(),
        reason: format!("invalid URL: {}", e),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Use a mutex to ensure tests don't interfere with each other's environment variables
    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "TENDERLY_ACCOUNT_SLUG",
        "TENDERLY_PROJECT_SLUG",
        "TENDERLY_ACCESS_KEY",
        "TENDERLY_API_URL",
        "SIMULATION_NETWORK_ID",
        "VERIFIER_CHAIN",
        "EXPLORER_API_URL",
        "RPC_URL",
        "CREATED_CONTRACT_LOG_INDEX",
        "PROTOCOL_FEE_WEI",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_from_env_defaults() {
        let _guard = TEST_MUTEX.lock().unwrap();
        clear_env();

        let config = VerifierConfig::from_env().unwrap();
        assert_eq!(config.simulation.network_id, "8453");
        assert_eq!(config.resolver.created_contract_log_index, 0);
        assert_eq!(config.pricing.fee_per_unit_wei, U256::from(DEFAULT_PROTOCOL_FEE_WEI));
        assert!(config.simulation.validate().is_err());
    }

    #[test]
    fn test_from_env_overrides() {
        let _guard = TEST_MUTEX.lock().unwrap();
        clear_env();

        env::set_var("TENDERLY_ACCOUNT_SLUG", "dao");
        env::set_var("TENDERLY_PROJECT_SLUG", "governance");
        env::set_var("TENDERLY_ACCESS_KEY", "secret");
        env::set_var("VERIFIER_CHAIN", "ethereum");
        env::set_var("CREATED_CONTRACT_LOG_INDEX", "2");

        let config = VerifierConfig::from_env().unwrap();
        assert_eq!(config.simulation.network_id, "1");
        assert_eq!(config.resolver.created_contract_log_index, 2);
        assert!(config.simulation.validate().is_ok());

        clear_env();
    }

    #[test]
    fn test_from_env_rejects_malformed_values() {
        let _guard = TEST_MUTEX.lock().unwrap();
        clear_env();

        env::set_var("CREATED_CONTRACT_LOG_INDEX", "first");
        let err = VerifierConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("CREATED_CONTRACT_LOG_INDEX"));

        clear_env();
        env::set_var("RPC_URL", "not a url");
        assert!(VerifierConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    fn test_missing_credentials_are_misconfigured() {
        let config = SimulationConfig::default();
        let err = config.validate().unwrap_err();
        assert!(err.is_misconfigured());
        assert!(err.to_string().contains("TENDERLY_ACCESS_KEY"));
    }

    #[test]
    fn test_endpoint_and_dashboard_link() {
        let config = VerifierConfig::for_testing("http://localhost:1234/");
        assert_eq!(
            config.simulation.simulate_endpoint(),
            "http://localhost:1234/account/test-account/project/test-project/simulate"
        );
        assert_eq!(
            config.simulation.dashboard_link("42"),
            "https://dashboard.tenderly.co/test-account/test-project/simulator/42"
        );
    }

    #[test]
    fn test_debug_masks_secrets() {
        let config = VerifierConfig::for_testing("http://localhost:1234");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("test-access-key"));
        assert!(!rendered.contains("test-explorer-key"));
    }
}
