//! Gas estimation for the pending batch

use crate::batch::Batch;
use crate::chain::ForwarderChain;
use crate::constants::BASE_TX_GAS;
use crate::error::RelayError;
use std::sync::Arc;

/// Asks the Forwarder what relaying a batch would cost
///
/// Estimation is a policy input for the scheduler only; it never flushes.
pub struct GasEstimator<C> {
    chain: Arc<C>,
}

impl<C> Clone for GasEstimator<C> {
    fn clone(&self) -> Self {
        Self {
            chain: Arc::clone(&self.chain),
        }
    }
}

impl<C: ForwarderChain> GasEstimator<C> {
    pub fn new(chain: Arc<C>) -> Self {
        Self { chain }
    }

    /// Gas units `executeTransaction(batch)` would use
    ///
    /// An empty batch costs [`BASE_TX_GAS`] and is answered without a chain call.
    pub async fn estimate(&self, batch: &Batch) -> Result<u64, RelayError> {
        if batch.is_empty() {
            return Ok(BASE_TX_GAS);
        }
        self.chain
            .estimate_execute(batch)
            .await
            .map_err(RelayError::Chain)
    }
}
