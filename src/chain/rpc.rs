//! Forwarder access over JSON-RPC

use super::{BatchReceipt, ForwarderChain};
use crate::batch::Batch;
use crate::constants::{RECEIPT_POLL_ATTEMPTS, RECEIPT_POLL_INTERVAL};
use crate::contracts::IForwarder;
use alloy::network::{Ethereum, EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{Log, TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolCall;
use alloy::transports::http::reqwest::Url;
use eyre::{Context, Result};
use std::sync::Arc;

/// Forwarder client backed by an HTTP provider
///
/// With a relayer key it can submit batches and pays their fees; without one
/// it only answers queries (what a request-building client needs).
pub struct RpcForwarder {
    /// Provider with wallet filler when a key is present - handles nonce, gas, chain_id, and signing
    provider: Arc<dyn Provider<Ethereum>>,
    forwarder: Address,
    relayer: Option<Address>,
}

impl RpcForwarder {
    /// Connect with the relayer's private key so batches can be submitted
    ///
    /// # Arguments
    ///
    /// * `private_key` - Hex-encoded private key (with or without 0x prefix)
    /// * `rpc_url` - RPC endpoint URL
    /// * `forwarder` - Forwarder contract address
    pub fn connect(
        private_key: impl AsRef<str>,
        rpc_url: impl AsRef<str>,
        forwarder: Address,
    ) -> Result<Self> {
        let key = private_key.as_ref();
        let key = key.strip_prefix("0x").unwrap_or(key);

        let signer: PrivateKeySigner = key.parse().context("Failed to parse relayer private key")?;
        let relayer = signer.address();
        let wallet = EthereumWallet::from(signer);

        let url: Url = rpc_url.as_ref().parse().context("Invalid RPC URL")?;
        let provider = ProviderBuilder::new().wallet(wallet).connect_http(url);

        Ok(Self {
            provider: Arc::new(provider),
            forwarder,
            relayer: Some(relayer),
        })
    }

    /// Connect without a key, for queries only
    pub fn read_only(rpc_url: impl AsRef<str>, forwarder: Address) -> Result<Self> {
        let url: Url = rpc_url.as_ref().parse().context("Invalid RPC URL")?;
        // Read-only provider without fillers (we only do eth_call operations)
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .network::<Ethereum>()
            .connect_http(url);

        Ok(Self {
            provider: Arc::new(provider),
            forwarder,
            relayer: None,
        })
    }

    /// Address paying for relayed batches, if this client can submit
    pub fn relayer(&self) -> Option<Address> {
        self.relayer
    }

    /// Forwarder contract address
    pub fn forwarder(&self) -> Address {
        self.forwarder
    }

    fn execute_tx(&self, batch: &Batch) -> TransactionRequest {
        let (requests, signatures) = batch.clone().into_parts();
        let call = IForwarder::executeTransactionCall {
            requests,
            signatures,
        };
        let tx = TransactionRequest::default()
            .with_to(self.forwarder)
            .with_input(Bytes::from(call.abi_encode()));
        match self.relayer {
            Some(relayer) => tx.with_from(relayer),
            None => tx,
        }
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt> {
        for attempt in 0..RECEIPT_POLL_ATTEMPTS {
            let receipt: Option<TransactionReceipt> = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .context("Failed to get transaction receipt")?;

            if let Some(receipt) = receipt {
                return Ok(receipt);
            }

            tracing::debug!(%tx_hash, attempt = attempt + 1, "Waiting for batch receipt");
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }

        eyre::bail!("Transaction receipt not found after timeout: {}", tx_hash)
    }
}

impl ForwarderChain for RpcForwarder {
    async fn get_nonce(&self, from: Address) -> Result<U256> {
        let call = IForwarder::getNonceCall { from };

        let result: Bytes = self
            .provider
            .call(
                TransactionRequest::default()
                    .with_to(self.forwarder)
                    .with_input(call.abi_encode()),
            )
            .await
            .context("Failed to call getNonce")?;

        let nonce = IForwarder::getNonceCall::abi_decode_returns(&result)
            .context("Failed to decode nonce")?;

        Ok(nonce)
    }

    async fn block_number(&self) -> Result<u64> {
        self.provider
            .get_block_number()
            .await
            .context("Failed to get block number")
    }

    async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .context("Failed to get chain id")
    }

    async fn estimate_execute(&self, batch: &Batch) -> Result<u64> {
        self.provider
            .estimate_gas(self.execute_tx(batch))
            .await
            .context("Failed to estimate executeTransaction gas")
    }

    async fn execute(&self, batch: &Batch) -> Result<BatchReceipt> {
        if self.relayer.is_none() {
            eyre::bail!("Read-only forwarder client cannot submit batches");
        }

        // Send transaction - provider will fill nonce, gas, chain_id and sign
        let pending_tx = self
            .provider
            .send_transaction(self.execute_tx(batch))
            .await
            .context("Failed to send executeTransaction")?;
        let tx_hash = *pending_tx.tx_hash();
        tracing::info!(%tx_hash, items = batch.len(), "Submitted batch");

        let receipt = self.wait_for_receipt(tx_hash).await?;
        if !receipt.status() {
            eyre::bail!("executeTransaction reverted: {}", tx_hash);
        }

        let results = call_results(receipt.inner.logs(), self.forwarder)
            .ok_or_else(|| eyre::eyre!("No CallResult event in receipt {}", tx_hash))?;

        Ok(BatchReceipt { tx_hash, results })
    }
}

/// Per-item outcomes from the first `CallResult` the Forwarder emitted
fn call_results(logs: &[Log], forwarder: Address) -> Option<Vec<bool>> {
    logs.iter()
        .filter(|log| log.address() == forwarder)
        .find_map(|log| log.log_decode::<IForwarder::CallResult>().ok())
        .map(|event| event.inner.data.results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{ForwardRequest, IERC20};
    use alloy::primitives::{address, LogData};
    use alloy::sol_types::SolEvent;

    const FORWARDER: Address = address!("f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0");

    fn log(address: Address, data: LogData) -> Log {
        Log {
            inner: alloy::primitives::Log { address, data },
            ..Default::default()
        }
    }

    fn call_result(results: Vec<bool>) -> LogData {
        let requests = results
            .iter()
            .enumerate()
            .map(|(i, _)| ForwardRequest {
                from: Address::repeat_byte(1),
                to: Address::repeat_byte(0x70),
                nonce: U256::from(i),
                expiryBlock: U256::from(150),
                data: Bytes::new(),
            })
            .collect();
        IForwarder::CallResult { requests, results }.encode_log_data()
    }

    #[test]
    fn test_call_results_from_forwarder_log() {
        let transfer = IERC20::Transfer {
            from: Address::repeat_byte(1),
            to: Address::repeat_byte(2),
            value: U256::from(1),
        };
        let logs = vec![
            log(Address::repeat_byte(0x70), transfer.encode_log_data()),
            log(FORWARDER, call_result(vec![true, false, true])),
        ];
        assert_eq!(call_results(&logs, FORWARDER), Some(vec![true, false, true]));
    }

    #[test]
    fn test_call_result_from_other_contract_is_ignored() {
        let logs = vec![log(Address::repeat_byte(0xee), call_result(vec![true]))];
        assert_eq!(call_results(&logs, FORWARDER), None);
        assert_eq!(call_results(&[], FORWARDER), None);
    }
}
