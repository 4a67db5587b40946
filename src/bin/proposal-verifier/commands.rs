use proposal_verifier::config::VerifierConfig;
use proposal_verifier::errors::Result;
use proposal_verifier::pricing::{PriceReconciler, Quote, StaticPrice, StaticSaleConfig};
use proposal_verifier::resolver::{ExecutionResolver, MatchQuery, NodeClient, ResolvedExecution};
use proposal_verifier::units::{self, Unit};
use proposal_verifier::{ExecutionResolverBuilder, SimulationClientBuilder, TransactionIntent};
use serde_json::json;
use std::path::Path;
use std::time::Duration;

use crate::cli::Command;

pub async fn run(command: Command, config: &VerifierConfig) -> Result<()> {
    match command {
        Command::Simulate { intent } => simulate(&intent, config).await,
        Command::Resolve {
            contract,
            from_block,
            topic,
            content_hash,
            attempts,
            interval_ms,
            quote_quantity,
        } => {
            let query =
                MatchQuery::parse(&contract, from_block, &topic, content_hash.as_deref())?;
            let interval = Duration::from_millis(interval_ms);
            resolve(&query, attempts, interval, quote_quantity, config).await
        }
        Command::Quote {
            contract,
            static_price,
            static_config,
            quantity,
        } => {
            let contract = contract
                .as_deref()
                .map(proposal_verifier::utils::string_to_h160)
                .transpose()?;
            let static_config =
                load_static_config(static_price.as_deref(), static_config.as_deref())?;
            let quote = quote(contract, static_config.as_ref(), quantity, config).await?;
            print_json(&quote_summary(&quote))
        }
    }
}

async fn simulate(path: &Path, config: &VerifierConfig) -> Result<()> {
    let intent = TransactionIntent::from_json_file(path)?;
    let client = SimulationClientBuilder::from_config(config).build()?;

    tracing::info!(kind = intent.kind.label(), "Simulating proposal transaction");
    let outcome = client.simulate(&intent).await?;

    print_json(&json!({
        "succeeded": outcome.succeeded,
        "message": outcome.message(),
        "simulationId": outcome.simulation_id,
        "dashboardUrl": outcome.dashboard_url,
    }))
}

async fn resolve(
    query: &MatchQuery,
    attempts: u32,
    interval: Duration,
    quote_quantity: Option<i64>,
    config: &VerifierConfig,
) -> Result<()> {
    let resolver = ExecutionResolverBuilder::new().with_config(config.clone()).build()?;

    match resolve_with_attempts(&resolver, query, attempts, interval).await? {
        Some(resolved) => {
            print_json(&resolved)?;

            if let (Some(quantity), Some(contract)) = (quote_quantity, resolved.created_contract) {
                let quote = quote(Some(contract), None, quantity, config).await?;
                print_json(&quote_summary(&quote))?;
            }
            Ok(())
        }
        None => print_json(&json!({ "matched": null })),
    }
}

/// Re-invoke `resolve_execution` up to `attempts` times, sleeping `interval`
/// between searches that found nothing. Errors end the loop immediately.
async fn resolve_with_attempts(
    resolver: &ExecutionResolver,
    query: &MatchQuery,
    attempts: u32,
    interval: Duration,
) -> Result<Option<ResolvedExecution>> {
    let attempts = attempts.max(1);

    for attempt in 1..=attempts {
        if let Some(resolved) = resolver.resolve_execution(query).await? {
            return Ok(Some(resolved));
        }

        if attempt < attempts {
            tracing::info!(
                attempt,
                attempts,
                interval_ms = interval.as_millis(),
                "Execution transaction not found yet, retrying"
            );
            tokio::time::sleep(interval).await;
        }
    }

    tracing::warn!(
        contract = %query.contract_address,
        from_block = query.from_block,
        attempts,
        "No matching execution transaction found"
    );
    Ok(None)
}

async fn quote(
    contract: Option<alloy::primitives::Address>,
    static_config: Option<&StaticSaleConfig>,
    quantity: i64,
    config: &VerifierConfig,
) -> Result<Quote> {
    let node = NodeClient::from_config(config)?;
    let reconciler = PriceReconciler::from_config(config);
    Ok(reconciler
        .quote_for_contract(&node, contract, static_config, quantity)
        .await)
}

fn load_static_config(
    price: Option<&str>,
    path: Option<&Path>,
) -> Result<Option<StaticSaleConfig>> {
    if let Some(price) = price {
        return Ok(Some(StaticSaleConfig {
            public_sale_price: Some(StaticPrice::Wei(units::to_base_units(price, Unit::Ether)?)),
            ..Default::default()
        }));
    }

    match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path).map_err(|e| {
                anyhow::anyhow!(
                    "failed to read static sale configuration {}: {}",
                    path.display(),
                    e
                )
            })?;
            Ok(Some(serde_json::from_str(&contents)?))
        }
        None => Ok(None),
    }
}

fn quote_summary(quote: &Quote) -> serde_json::Value {
    json!({
        "priceSource": quote.price_source,
        "salePhase": quote.sale_phase,
        "quantity": quote.quantity,
        "pricePerUnit": quote.price_per_unit_ether(),
        "mintTotal": quote.mint_total_ether(),
        "protocolFeeTotal": quote.fee_total_ether(),
        "total": quote.total_ether(),
        "totalWei": quote.total_wei.to_string(),
        "signals": quote.signals,
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, Address, Bytes, B256, U256};
    use async_trait::async_trait;
    use proposal_verifier::config::ResolverSettings;
    use proposal_verifier::pricing::{PriceSource, QuoteSignal};
    use proposal_verifier::resolver::{
        ExecutionReceipt, LogRecord, LogSource, ReceiptLog, ReceiptSource,
        PROPOSAL_EXECUTED_TOPIC,
    };
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const GOVERNOR: Address = address!("3dd4e53a232b7b715c9ae455f4e732465ed71b4c");
    const CREATED: Address = address!("cafe00000000000000000000000000000000cafe");

    fn topic() -> B256 {
        proposal_verifier::utils::normalize_hash(PROPOSAL_EXECUTED_TOPIC).unwrap()
    }

    /// Returns no logs until `match_on_call`, then one matching log
    struct EventuallyMined {
        match_on_call: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LogSource for EventuallyMined {
        async fn find_logs(&self, _query: &MatchQuery) -> Result<Vec<LogRecord>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call < self.match_on_call {
                return Ok(Vec::new());
            }
            Ok(vec![LogRecord {
                address: GOVERNOR,
                topics: vec![topic()],
                data: Bytes::new(),
                block_number: 120,
                log_index: 0,
                transaction_hash: format!("{:#x}", B256::repeat_byte(0xaa)),
            }])
        }
    }

    #[derive(Default)]
    struct CountingReceipts {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReceiptSource for CountingReceipts {
        async fn receipt(&self, hash: B256) -> Result<Option<ExecutionReceipt>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(ExecutionReceipt {
                transaction_hash: hash,
                block_number: Some(120),
                status: true,
                logs: vec![ReceiptLog {
                    address: CREATED,
                    topics: vec![],
                    data: Bytes::new(),
                }],
            }))
        }
    }

    fn resolver(
        match_on_call: usize,
    ) -> (ExecutionResolver, Arc<EventuallyMined>, Arc<CountingReceipts>) {
        let logs = Arc::new(EventuallyMined {
            match_on_call,
            calls: AtomicUsize::new(0),
        });
        let receipts = Arc::new(CountingReceipts::default());
        let resolver =
            ExecutionResolver::new(logs.clone(), receipts.clone(), &ResolverSettings::default());
        (resolver, logs, receipts)
    }

    fn query() -> MatchQuery {
        MatchQuery::new(GOVERNOR, 100, topic())
    }

    #[tokio::test]
    async fn test_resolve_retries_until_the_execution_is_mined() {
        let (resolver, logs, receipts) = resolver(2);

        let resolved = resolve_with_attempts(&resolver, &query(), 5, Duration::from_millis(1))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(resolved.created_contract, Some(CREATED));
        assert_eq!(logs.calls.load(Ordering::SeqCst), 2);
        assert_eq!(receipts.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_attempt_searches_once() {
        let (resolver, logs, receipts) = resolver(2);

        let resolved = resolve_with_attempts(&resolver, &query(), 1, Duration::from_millis(1))
            .await
            .unwrap();

        assert!(resolved.is_none());
        assert_eq!(logs.calls.load(Ordering::SeqCst), 1);
        assert_eq!(receipts.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_searches_once() {
        let (resolver, logs, _receipts) = resolver(1);

        let resolved = resolve_with_attempts(&resolver, &query(), 0, Duration::from_millis(1))
            .await
            .unwrap();

        assert!(resolved.is_some());
        assert_eq!(logs.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_static_price_flag_is_ether() {
        let config = load_static_config(Some("0.02"), None).unwrap().unwrap();
        assert_eq!(
            config.price_wei().unwrap(),
            Some(U256::from(20_000_000_000_000_000u64))
        );

        let quote = PriceReconciler::default().compute_total(None, Some(&config), 1);
        assert_eq!(quote.price_source, PriceSource::Static);
        assert_eq!(quote.total_ether(), "0.020777");

        assert!(load_static_config(Some("-1"), None).is_err());
    }

    #[test]
    fn test_static_config_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "publicSalePrice": "5000000000000000", "maxSalePurchasePerAddress": 1 }}"#
        )
        .unwrap();

        let config = load_static_config(None, Some(file.path())).unwrap().unwrap();
        assert_eq!(config.max_sale_purchase_per_address, 1);

        let quote = PriceReconciler::default().compute_total(None, Some(&config), 2);
        assert_eq!(quote.mint_total_ether(), "0.01");
        assert!(quote.has_signal(&QuoteSignal::ExceedsMaxPerAddress { max: 1 }));
    }

    #[test]
    fn test_missing_static_inputs() {
        assert!(load_static_config(None, None).unwrap().is_none());
        assert!(load_static_config(None, Some(Path::new("/nonexistent/sale.json"))).is_err());
    }
}
