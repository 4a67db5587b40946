//! JSON-RPC node access: receipts and live sale configuration.

use super::{ExecutionReceipt, ReceiptLog, ReceiptSource};
use crate::config::VerifierConfig;
use crate::errors::{ConfigError, ResolutionError, Result};
use crate::pricing::{SaleConfig, SaleConfigSource};
use alloy::{
    network::Ethereum,
    primitives::{Address, TxKind, B256, U256},
    providers::{Provider, RootProvider},
    rpc::types::{TransactionInput, TransactionReceipt, TransactionRequest},
    sol_types::SolCall,
};
use async_trait::async_trait;

mod erc721_drop {
    alloy::sol! {
        #[derive(Debug)]
        interface IERC721Drop {
            function salesConfig() external view returns (
                uint104 publicSalePrice,
                uint32 maxSalePurchasePerAddress,
                uint64 publicSaleStart,
                uint64 publicSaleEnd,
                uint64 presaleStart,
                uint64 presaleEnd,
                bytes32 presaleMerkleRoot
            );
        }
    }
}

use erc721_drop::IERC721Drop;

impl From<&TransactionReceipt> for ExecutionReceipt {
    fn from(receipt: &TransactionReceipt) -> Self {
        let logs = receipt
            .inner
            .logs()
            .iter()
            .map(|log| ReceiptLog {
                address: log.address(),
                topics: log.topics().to_vec(),
                data: log.data().data.clone(),
            })
            .collect();

        Self {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            status: receipt.status(),
            logs,
        }
    }
}

/// Read-only client for a JSON-RPC node.
pub struct NodeClient {
    provider: RootProvider<Ethereum>,
}

impl NodeClient {
    pub fn from_config(config: &VerifierConfig) -> Result<Self> {
        let url = config
            .node
            .rpc_url
            .parse::<url::Url>()
            .map_err(|e| ConfigError::InvalidValue {
                name: "RPC_URL".to_string(),
                reason: format!("invalid URL: {}", e),
            })?;

        tracing::debug!(
            rpc = %crate::utils::mask_url(&config.node.rpc_url),
            "Node client created"
        );

        Ok(Self {
            provider: RootProvider::<Ethereum>::new_http(url),
        })
    }
}

#[async_trait]
impl ReceiptSource for NodeClient {
    async fn receipt(&self, hash: B256) -> Result<Option<ExecutionReceipt>> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| ResolutionError::ReceiptFetchFailed {
                hash,
                reason: e.to_string(),
            })?;

        Ok(receipt.as_ref().map(ExecutionReceipt::from))
    }
}

#[async_trait]
impl SaleConfigSource for NodeClient {
    async fn sale_config(&self, contract: Address) -> Result<Option<SaleConfig>> {
        let read_failed = |reason: String| ResolutionError::ContractReadFailed { contract, reason };

        let request = TransactionRequest {
            to: Some(TxKind::Call(contract)),
            input: TransactionInput {
                input: Some(IERC721Drop::salesConfigCall {}.abi_encode().into()),
                data: None,
            },
            ..Default::default()
        };

        let output = self
            .provider
            .call(request)
            .await
            .map_err(|e| read_failed(e.to_string()))?;

        // Accounts without code answer eth_call with empty data.
        if output.is_empty() {
            tracing::debug!(contract = %contract, "Contract returned no sale configuration");
            return Ok(None);
        }

        let decoded = IERC721Drop::salesConfigCall::abi_decode_returns(&output)
            .map_err(|e| read_failed(e.to_string()))?;

        let config = SaleConfig {
            price_per_unit: U256::from(decoded.publicSalePrice),
            max_per_address: decoded.maxSalePurchasePerAddress,
            public_sale_start: decoded.publicSaleStart,
            public_sale_end: decoded.publicSaleEnd,
            presale_start: decoded.presaleStart,
            presale_end: decoded.presaleEnd,
            presale_merkle_root: decoded.presaleMerkleRoot,
        };

        tracing::debug!(
            contract = %contract,
            price_per_unit = %config.price_per_unit,
            max_per_address = config.max_per_address,
            "Live sale configuration read"
        );

        Ok(Some(config))
    }
}
