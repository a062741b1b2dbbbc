//! The on-chain Forwarder, seen from the relay
//!
//! This module provides a trait-based abstraction over the Forwarder contract
//! so the relay pipeline can run against a live RPC endpoint or an in-memory
//! stand-in.

mod rpc;

#[cfg(test)]
pub(crate) mod mock;

pub use rpc::RpcForwarder;

use crate::batch::Batch;
use alloy::primitives::{Address, TxHash, U256};
use eyre::Result;

/// What a confirmed `executeTransaction` reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReceipt {
    /// Hash of the mined batch transaction
    pub tx_hash: TxHash,
    /// Per-item outcomes from the `CallResult` event, in input order
    pub results: Vec<bool>,
}

/// Trait for the Forwarder operations the relay and its clients consume
///
/// The contract re-verifies signature, nonce and expiry for every item and
/// skips bad ones; implementations report that through `BatchReceipt`, never
/// as an error.
pub trait ForwarderChain: Send + Sync {
    /// Current valid nonce for `from`
    fn get_nonce(&self, from: Address) -> impl std::future::Future<Output = Result<U256>> + Send;

    /// Latest block height
    fn block_number(&self) -> impl std::future::Future<Output = Result<u64>> + Send;

    /// Chain id the Forwarder is deployed on
    fn chain_id(&self) -> impl std::future::Future<Output = Result<u64>> + Send;

    /// Simulate `executeTransaction` for `batch` without committing it
    fn estimate_execute(
        &self,
        batch: &Batch,
    ) -> impl std::future::Future<Output = Result<u64>> + Send;

    /// Submit `batch`, wait for confirmation and return the per-item outcomes
    fn execute(
        &self,
        batch: &Batch,
    ) -> impl std::future::Future<Output = Result<BatchReceipt>> + Send;
}
