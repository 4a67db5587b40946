use clap::{Parser, Subcommand};
use proposal_verifier::config::VerifierConfig;
use proposal_verifier::errors::Result;
use proposal_verifier::resolver::PROPOSAL_EXECUTED_TOPIC;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Explicit flag only: VERIFIER_CHAIN from the environment is handled by the
    /// configuration loader, where SIMULATION_NETWORK_ID takes precedence.
    #[clap(long, help = "Target chain (e.g., base, base-sepolia)")]
    pub chain: Option<String>,

    #[clap(long, env = "RPC_URL", help = "RPC URL for receipts and contract reads")]
    pub rpc_url: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate a proposal transaction before the vote
    Simulate {
        #[clap(long, help = "Path to a JSON transaction intent")]
        intent: PathBuf,
    },

    /// Find the transaction that executed a proposal and read its receipt
    Resolve {
        #[clap(long, help = "Governor contract that emits the execution event")]
        contract: String,

        #[clap(long, help = "First block to search, usually the proposal's creation block")]
        from_block: u64,

        #[clap(long, default_value = PROPOSAL_EXECUTED_TOPIC, help = "Event topic to match")]
        topic: String,

        #[clap(long, help = "Hash the matching log must contain, e.g. the description hash")]
        content_hash: Option<String>,

        #[clap(long, default_value_t = 1, help = "Number of searches before giving up")]
        attempts: u32,

        #[clap(long, default_value_t = 5_000, help = "Delay between searches in milliseconds")]
        interval_ms: u64,

        #[clap(
            long,
            allow_hyphen_values = true,
            help = "Also quote minting this many units of the created contract"
        )]
        quote_quantity: Option<i64>,
    },

    /// Quote the total cost of minting from a drop
    Quote {
        #[clap(long, help = "Drop contract to read the live sale configuration from")]
        contract: Option<String>,

        #[clap(long, conflicts_with = "static_config", help = "Static price per unit in ether")]
        static_price: Option<String>,

        #[clap(long, help = "Path to the proposal's static sale configuration (JSON)")]
        static_config: Option<PathBuf>,

        #[clap(long, allow_hyphen_values = true, help = "Number of units to mint")]
        quantity: i64,
    },
}

impl Args {
    /// Load configuration from the environment and apply command-line overrides
    pub fn verifier_config(&self) -> Result<VerifierConfig> {
        let mut config = VerifierConfig::from_env()?;
        self.apply_overrides(&mut config)?;

        tracing::debug!(
            network_id = %config.simulation.network_id,
            rpc_url = %proposal_verifier::utils::mask_url(&config.node.rpc_url),
            "Configuration loaded"
        );

        Ok(config)
    }

    fn apply_overrides(&self, config: &mut VerifierConfig) -> Result<()> {
        if let Some(chain) = &self.chain {
            config.simulation.network_id = proposal_verifier::utils::chain_id(chain)?.to_string();
        }
        if let Some(rpc_url) = &self.rpc_url {
            config.node.rpc_url = rpc_url.clone();
        }
        Ok(())
    }
}

pub fn parse_cli_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults_to_execution_topic() {
        let args = Args::try_parse_from([
            "proposal-verifier",
            "resolve",
            "--contract",
            "0x3dd4e53a232b7b715c9ae455f4e732465ed71b4c",
            "--from-block",
            "21000000",
        ])
        .unwrap();

        match args.command {
            Command::Resolve { topic, attempts, .. } => {
                assert_eq!(topic, PROPOSAL_EXECUTED_TOPIC);
                assert_eq!(attempts, 1);
            }
            other => panic!("expected resolve, got {:?}", other),
        }
    }

    #[test]
    fn test_chain_is_not_read_from_environment() {
        std::env::set_var("VERIFIER_CHAIN", "base-sepolia");
        let args =
            Args::try_parse_from(["proposal-verifier", "quote", "--quantity", "1"]).unwrap();
        std::env::remove_var("VERIFIER_CHAIN");
        assert!(args.chain.is_none());

        let mut config = VerifierConfig::for_testing("http://localhost");
        config.simulation.network_id = "31337".to_string();
        args.apply_overrides(&mut config).unwrap();
        assert_eq!(config.simulation.network_id, "31337");
    }

    #[test]
    fn test_explicit_chain_and_rpc_override_configuration() {
        let args = Args::try_parse_from([
            "proposal-verifier",
            "--chain",
            "base-sepolia",
            "--rpc-url",
            "http://localhost:8545",
            "quote",
            "--quantity",
            "1",
        ])
        .unwrap();

        let mut config = VerifierConfig::for_testing("http://localhost");
        args.apply_overrides(&mut config).unwrap();
        assert_eq!(config.simulation.network_id, "84532");
        assert_eq!(config.node.rpc_url, "http://localhost:8545");
    }

    #[test]
    fn test_quote_accepts_negative_quantity() {
        let args =
            Args::try_parse_from(["proposal-verifier", "quote", "--quantity", "-1"]).unwrap();
        assert!(matches!(args.command, Command::Quote { quantity: -1, .. }));
    }
}
