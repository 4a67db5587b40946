//! Post-execution verification: find the transaction that executed a
//! proposal and read what it created.
//!
//! Resolution runs through three states, `Searching` → `Found` →
//! `ReceiptFetched`, and any failure ends in `Failed`. Each invocation makes
//! at most one log query and, only if that query matched, one receipt fetch.
//! The resolver never polls; a caller that needs to wait for the execution
//! transaction to be mined re-invokes `resolve_execution` or `advance` on
//! its own schedule.
//!
//! The collaborators are traits so the explorer API and the node can be
//! swapped or mocked:
//!
//! - `LogSource`: explorer-style log query (`ExplorerLogClient`)
//! - `ReceiptSource`: receipt lookup on a node (`NodeClient`)

pub mod explorer;
pub mod node;

pub use explorer::ExplorerLogClient;
pub use node::NodeClient;

use crate::config::{ResolverSettings, VerifierConfig};
use crate::errors::{ResolutionError, Result, VerifierError};
use alloy::primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use itertools::Itertools;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Topic of the governor's proposal execution event.
pub const PROPOSAL_EXECUTED_TOPIC: &str =
    "0x7b1bcf1ccf901a11589afff5504d59fd0a53780eed2a952adade0348985139e0";

/// What to look for when locating an execution transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchQuery {
    /// Contract that emitted the event (the governor)
    pub contract_address: Address,
    /// First block to consider, usually the proposal's creation block
    pub from_block: u64,
    /// Event signature hash (topic 0)
    pub event_topic: B256,
    /// Hash the matching log's payload must contain, e.g. the proposal's
    /// description hash when several proposals executed close together
    pub content_hash: Option<B256>,
}

impl MatchQuery {
    pub fn new(contract_address: Address, from_block: u64, event_topic: B256) -> Self {
        Self {
            contract_address,
            from_block,
            event_topic,
            content_hash: None,
        }
    }

    pub fn with_content_hash(mut self, content_hash: B256) -> Self {
        self.content_hash = Some(content_hash);
        self
    }

    /// Build a query from user-supplied strings.
    pub fn parse(
        contract_address: &str,
        from_block: u64,
        event_topic: &str,
        content_hash: Option<&str>,
    ) -> Result<Self> {
        let query = Self::new(
            crate::utils::string_to_h160(contract_address)?,
            from_block,
            crate::utils::normalize_hash(event_topic)?,
        );
        match content_hash {
            Some(hash) => Ok(query.with_content_hash(crate::utils::normalize_hash(hash)?)),
            None => Ok(query),
        }
    }
}

/// One candidate log returned by a `LogSource`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: u64,
    pub log_index: u64,
    /// Transaction hash exactly as the source returned it
    pub transaction_hash: String,
}

impl LogRecord {
    /// Whether the log's indexed topics or any 32-byte data word equal `hash`.
    pub fn contains_hash(&self, hash: &B256) -> bool {
        self.topics.iter().any(|topic| topic == hash)
            || self.data.chunks_exact(32).any(|word| word == hash.as_slice())
    }
}

/// The transaction that emitted the matched log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedTransaction {
    pub hash: String,
    pub block_number: u64,
    pub log_index: u64,
}

/// One log from an execution receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// The parts of a transaction receipt the verifier relies on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub status: bool,
    pub logs: Vec<ReceiptLog>,
}

impl ExecutionReceipt {
    /// Address that emitted the log at `log_index`.
    ///
    /// For drop proposals this is the newly deployed token contract, because
    /// the factory's first emitted event comes from the new contract. That is
    /// an ordering convention of the deploying contract, not a chain rule.
    pub fn created_contract(&self, log_index: usize) -> Option<Address> {
        self.logs.get(log_index).map(|log| log.address)
    }
}

/// A fully resolved execution: match, receipt and created contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedExecution {
    pub matched: MatchedTransaction,
    pub receipt: ExecutionReceipt,
    pub created_contract: Option<Address>,
}

/// Resolution progress for callers that drive the steps themselves
#[derive(Debug)]
pub enum ResolutionState {
    Searching,
    Found(MatchedTransaction),
    ReceiptFetched(ResolvedExecution),
    Failed(ResolutionError),
}

impl ResolutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ReceiptFetched(_) | Self::Failed(_))
    }
}

/// Source of candidate logs for a match query
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn find_logs(&self, query: &MatchQuery) -> Result<Vec<LogRecord>>;
}

/// Source of transaction receipts
#[async_trait]
pub trait ReceiptSource: Send + Sync {
    /// `Ok(None)` when the node does not know the transaction.
    async fn receipt(&self, hash: B256) -> Result<Option<ExecutionReceipt>>;
}

/// Locates the execution transaction of a proposal and fetches its receipt.
pub struct ExecutionResolver {
    logs: Arc<dyn LogSource>,
    receipts: Arc<dyn ReceiptSource>,
    created_contract_log_index: usize,
}

impl ExecutionResolver {
    pub fn new(
        logs: Arc<dyn LogSource>,
        receipts: Arc<dyn ReceiptSource>,
        settings: &ResolverSettings,
    ) -> Self {
        Self {
            logs,
            receipts,
            created_contract_log_index: settings.created_contract_log_index,
        }
    }

    /// Create a resolver backed by the configured explorer API and node.
    pub fn from_config(config: &VerifierConfig) -> Result<Self> {
        let logs = ExplorerLogClient::from_config(config)?;
        let receipts = NodeClient::from_config(config)?;
        Ok(Self::new(Arc::new(logs), Arc::new(receipts), &config.resolver))
    }

    pub fn created_contract_log_index(&self) -> usize {
        self.created_contract_log_index
    }

    /// Run one log query and pick the first chronological matching log.
    ///
    /// Returns `Ok(None)` when nothing matches yet; that is not an error.
    pub async fn search(&self, query: &MatchQuery) -> Result<Option<MatchedTransaction>> {
        let start_time = Instant::now();
        let candidates = self.logs.find_logs(query).await.map_err(|e| {
            into_resolution_error(e, |reason| ResolutionError::LogQueryFailed { reason })
        })?;
        let candidate_count = candidates.len();

        let matched = select_match(query, candidates).map(|log| MatchedTransaction {
            hash: log.transaction_hash,
            block_number: log.block_number,
            log_index: log.log_index,
        });

        match &matched {
            Some(tx) => tracing::info!(
                contract = %query.contract_address,
                from_block = query.from_block,
                candidates = candidate_count,
                tx_hash = %tx.hash,
                block_number = tx.block_number,
                duration_ms = start_time.elapsed().as_millis(),
                "Execution transaction found"
            ),
            None => tracing::debug!(
                contract = %query.contract_address,
                from_block = query.from_block,
                candidates = candidate_count,
                has_content_hash = query.content_hash.is_some(),
                "No matching execution transaction yet"
            ),
        }

        Ok(matched)
    }

    /// Fetch the receipt of a matched transaction and extract the created contract.
    pub async fn fetch_receipt(&self, matched: &MatchedTransaction) -> Result<ResolvedExecution> {
        let hash = crate::utils::normalize_hash(&matched.hash).map_err(|_| {
            ResolutionError::MalformedLog {
                reason: format!("invalid transaction hash '{}'", matched.hash),
            }
        })?;

        let receipt = self
            .receipts
            .receipt(hash)
            .await
            .map_err(|e| {
                into_resolution_error(e, |reason| ResolutionError::ReceiptFetchFailed {
                    hash,
                    reason,
                })
            })?
            .ok_or(ResolutionError::ReceiptNotFound { hash })?;

        let created_contract = receipt.created_contract(self.created_contract_log_index);
        if created_contract.is_none() {
            tracing::warn!(
                tx_hash = %hash,
                log_count = receipt.logs.len(),
                log_index = self.created_contract_log_index,
                "Receipt has no log at the created-contract index"
            );
        }

        tracing::info!(
            tx_hash = %hash,
            status = receipt.status,
            log_count = receipt.logs.len(),
            created_contract = ?created_contract,
            "Execution receipt fetched"
        );

        Ok(ResolvedExecution {
            matched: matched.clone(),
            receipt,
            created_contract,
        })
    }

    /// Search once and, if a transaction matched, fetch its receipt.
    ///
    /// The receipt fetch is strictly sequential after the search since it
    /// needs the matched hash. `Ok(None)` means "no match yet".
    pub async fn resolve_execution(&self, query: &MatchQuery) -> Result<Option<ResolvedExecution>> {
        match self.search(query).await? {
            Some(matched) => Ok(Some(self.fetch_receipt(&matched).await?)),
            None => Ok(None),
        }
    }

    /// Perform the single step that moves `state` forward.
    ///
    /// `Searching` stays `Searching` when nothing matched. Terminal states are
    /// returned unchanged.
    pub async fn advance(&self, query: &MatchQuery, state: ResolutionState) -> ResolutionState {
        match state {
            ResolutionState::Searching => match self.search(query).await {
                Ok(Some(matched)) => ResolutionState::Found(matched),
                Ok(None) => ResolutionState::Searching,
                Err(e) => ResolutionState::Failed(as_resolution_error(e)),
            },
            ResolutionState::Found(matched) => match self.fetch_receipt(&matched).await {
                Ok(resolved) => ResolutionState::ReceiptFetched(resolved),
                Err(e) => ResolutionState::Failed(as_resolution_error(e)),
            },
            terminal => terminal,
        }
    }
}

/// First log, in (block, log index) order, that satisfies the query.
fn select_match(query: &MatchQuery, candidates: Vec<LogRecord>) -> Option<LogRecord> {
    candidates
        .into_iter()
        .sorted_by_key(|log| (log.block_number, log.log_index))
        .find(|log| {
            log.block_number >= query.from_block
                && log.address == query.contract_address
                && log.topics.first() == Some(&query.event_topic)
                && query
                    .content_hash
                    .as_ref()
                    .map_or(true, |hash| log.contains_hash(hash))
        })
}

fn into_resolution_error(
    err: VerifierError,
    wrap: impl FnOnce(String) -> ResolutionError,
) -> VerifierError {
    match err {
        VerifierError::Resolution(e) => VerifierError::Resolution(e),
        other => VerifierError::Resolution(wrap(other.to_string())),
    }
}

fn as_resolution_error(err: VerifierError) -> ResolutionError {
    match err {
        VerifierError::Resolution(e) => e,
        other => ResolutionError::LogQueryFailed {
            reason: other.to_string(),
        },
    }
}


#[cfg(test)]
mod tests {
    use super::mocks::*;
    use super::*;
    use alloy::primitives::{address, b256};
    use std::sync::atomic::Ordering;

    const GOVERNOR: Address = address!("3dd4e53a232b7b715c9ae455f4e732465ed71b4c");
    const CREATED: Address = address!("cafe00000000000000000000000000000000cafe");
    const DESCRIPTION_HASH: B256 =
        b256!("1111111111111111111111111111111111111111111111111111111111111111");
    const TX_HASH: &str = "aa00000000000000000000000000000000000000000000000000000000000001";

    fn topic() -> B256 {
        crate::utils::normalize_hash(PROPOSAL_EXECUTED_TOPIC).unwrap()
    }

    fn log(block_number: u64, log_index: u64, data: Bytes, tx: &str) -> LogRecord {
        LogRecord {
            address: GOVERNOR,
            topics: vec![topic()],
            data,
            block_number,
            log_index,
            transaction_hash: tx.to_string(),
        }
    }

    fn receipt(first_log: Address) -> ExecutionReceipt {
        ExecutionReceipt {
            transaction_hash: crate::utils::normalize_hash(TX_HASH).unwrap(),
            block_number: Some(120),
            status: true,
            logs: vec![
                ReceiptLog {
                    address: first_log,
                    topics: vec![],
                    data: Bytes::new(),
                },
                ReceiptLog {
                    address: GOVERNOR,
                    topics: vec![topic()],
                    data: Bytes::new(),
                },
            ],
        }
    }

    fn resolver(logs: Arc<dyn LogSource>, receipts: Arc<StaticReceipts>) -> ExecutionResolver {
        ExecutionResolver::new(logs, receipts, &ResolverSettings::default())
    }

    fn query() -> MatchQuery {
        MatchQuery::new(GOVERNOR, 100, topic())
    }

    #[tokio::test]
    async fn test_no_candidates_returns_none_without_receipt_fetch() {
        let logs = Arc::new(StaticLogs::new(vec![]));
        let receipts = Arc::new(StaticReceipts::new(Some(receipt(CREATED))));
        let resolver = resolver(logs.clone(), receipts.clone());

        let result = resolver.resolve_execution(&query()).await.unwrap();
        assert!(result.is_none());
        assert_eq!(logs.calls.load(Ordering::SeqCst), 1);
        assert_eq!(receipts.request_count(), 0);
    }

    #[tokio::test]
    async fn test_single_candidate_resolves_created_contract() {
        let logs = Arc::new(StaticLogs::new(vec![log(120, 3, Bytes::new(), TX_HASH)]));
        let receipts = Arc::new(StaticReceipts::new(Some(receipt(CREATED))));
        let resolver = resolver(logs, receipts.clone());

        let resolved = resolver.resolve_execution(&query()).await.unwrap().unwrap();
        assert_eq!(resolved.created_contract, Some(CREATED));
        assert_eq!(resolved.matched.block_number, 120);

        // The bare hash was normalized before the fetch.
        let requested = receipts.requested.lock().unwrap();
        assert_eq!(requested.as_slice(), &[crate::utils::normalize_hash(TX_HASH).unwrap()]);
    }

    #[tokio::test]
    async fn test_created_contract_index_is_configurable() {
        let logs = Arc::new(StaticLogs::new(vec![log(120, 0, Bytes::new(), TX_HASH)]));
        let receipts = Arc::new(StaticReceipts::new(Some(receipt(CREATED))));
        let settings = ResolverSettings {
            created_contract_log_index: 1,
        };
        let resolver = ExecutionResolver::new(logs, receipts, &settings);

        let resolved = resolver.resolve_execution(&query()).await.unwrap().unwrap();
        assert_eq!(resolved.created_contract, Some(GOVERNOR));
    }

    #[tokio::test]
    async fn test_empty_receipt_has_no_created_contract() {
        let logs = Arc::new(StaticLogs::new(vec![log(120, 0, Bytes::new(), TX_HASH)]));
        let mut empty = receipt(CREATED);
        empty.logs.clear();
        let receipts = Arc::new(StaticReceipts::new(Some(empty)));

        let resolved = resolver(logs, receipts).resolve_execution(&query()).await.unwrap().unwrap();
        assert_eq!(resolved.created_contract, None);
    }

    #[tokio::test]
    async fn test_content_hash_selects_the_right_proposal() {
        let other = Bytes::from(B256::repeat_byte(0x22).to_vec());
        let ours = Bytes::from(DESCRIPTION_HASH.to_vec());
        let ours_tx = "0xbb00000000000000000000000000000000000000000000000000000000000002";
        let logs = Arc::new(StaticLogs::new(vec![
            log(130, 0, ours, ours_tx),
            log(110, 0, other, TX_HASH),
        ]));
        let receipts = Arc::new(StaticReceipts::new(Some(receipt(CREATED))));
        let resolver = resolver(logs, receipts);

        let matched = resolver
            .search(&query().with_content_hash(DESCRIPTION_HASH))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(matched.hash, ours_tx);

        // Without the hash, the earliest log wins.
        let matched = resolver.search(&query()).await.unwrap().unwrap();
        assert_eq!(matched.hash, TX_HASH);
    }

    #[tokio::test]
    async fn test_logs_before_from_block_or_other_topics_are_ignored() {
        let mut wrong_topic = log(150, 0, Bytes::new(), TX_HASH);
        wrong_topic.topics = vec![B256::repeat_byte(0x99)];
        let logs = Arc::new(StaticLogs::new(vec![log(99, 0, Bytes::new(), TX_HASH), wrong_topic]));
        let receipts = Arc::new(StaticReceipts::new(None));

        let matched = resolver(logs, receipts).search(&query()).await.unwrap();
        assert!(matched.is_none());
    }

    #[tokio::test]
    async fn test_missing_receipt_is_resolution_error() {
        let logs = Arc::new(StaticLogs::new(vec![log(120, 0, Bytes::new(), TX_HASH)]));
        let receipts = Arc::new(StaticReceipts::new(None));

        let err = resolver(logs, receipts).resolve_execution(&query()).await.unwrap_err();
        assert!(matches!(
            err,
            VerifierError::Resolution(ResolutionError::ReceiptNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_log_source_failure_is_wrapped() {
        let receipts = Arc::new(StaticReceipts::new(None));
        let resolver = resolver(Arc::new(FailingLogs), receipts);

        let err = resolver.search(&query()).await.unwrap_err();
        match err {
            VerifierError::Resolution(ResolutionError::LogQueryFailed { reason }) => {
                assert!(reason.contains("connection reset"))
            }
            other => panic!("expected log query failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_state_machine_steps() {
        let logs = Arc::new(StaticLogs::new(vec![log(120, 0, Bytes::new(), TX_HASH)]));
        let receipts = Arc::new(StaticReceipts::new(Some(receipt(CREATED))));
        let resolver = resolver(logs, receipts);
        let query = query();

        let state = resolver.advance(&query, ResolutionState::Searching).await;
        assert!(matches!(state, ResolutionState::Found(_)));
        assert!(!state.is_terminal());

        let state = resolver.advance(&query, state).await;
        match &state {
            ResolutionState::ReceiptFetched(resolved) => {
                assert_eq!(resolved.created_contract, Some(CREATED))
            }
            other => panic!("expected receipt, got {:?}", other),
        }
        assert!(state.is_terminal());

        let state = resolver.advance(&query, state).await;
        assert!(matches!(state, ResolutionState::ReceiptFetched(_)));
    }

    #[tokio::test]
    async fn test_state_machine_stays_searching_and_fails_terminally() {
        let receipts = Arc::new(StaticReceipts::new(None));
        let empty = resolver(Arc::new(StaticLogs::new(vec![])), receipts.clone());
        let state = empty.advance(&query(), ResolutionState::Searching).await;
        assert!(matches!(state, ResolutionState::Searching));

        let failing = resolver(Arc::new(FailingLogs), receipts);
        let state = failing.advance(&query(), ResolutionState::Searching).await;
        assert!(matches!(state, ResolutionState::Failed(ResolutionError::LogQueryFailed { .. })));
        assert!(state.is_terminal());
    }

    #[test]
    fn test_match_query_parse() {
        let query = MatchQuery::parse(
            "0x3dd4e53a232b7b715c9ae455f4e732465ed71b4c",
            100,
            PROPOSAL_EXECUTED_TOPIC,
            Some("1111111111111111111111111111111111111111111111111111111111111111"),
        )
        .unwrap();
        assert_eq!(query.contract_address, GOVERNOR);
        assert_eq!(query.content_hash, Some(DESCRIPTION_HASH));

        assert!(MatchQuery::parse("0x1234", 100, PROPOSAL_EXECUTED_TOPIC, None).is_err());
    }
}
