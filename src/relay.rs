//! Relay - the relay-facing side of the pipeline
//!
//! Ties the verifier, the pending batch, the estimator, the dispatcher and the
//! history together for one Forwarder deployment. Both the HTTP server and the
//! scheduler work through this type.

use crate::batch::PendingBatch;
use crate::chain::ForwarderChain;
use crate::dispatcher::Dispatcher;
use crate::error::{eyre, RelayError};
use crate::estimator::GasEstimator;
use crate::history::RelayHistory;
use crate::scheduler::{Scheduler, SchedulerConfig};
use crate::types::{ExecutionResult, FlushOutcome, PendingView, SignedRequest};
use crate::verifier::{forwarder_domain, verify};
use alloy::primitives::Address;
use alloy::sol_types::Eip712Domain;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Relay for one Forwarder deployment
pub struct Relay<C> {
    domain: Eip712Domain,
    batch: Arc<PendingBatch>,
    estimator: GasEstimator<C>,
    dispatcher: Arc<Dispatcher<C>>,
    history: Arc<RelayHistory>,
}

impl<C: ForwarderChain> Relay<C> {
    /// Create a relay with an empty queue and history
    ///
    /// # Arguments
    ///
    /// * `chain` - Forwarder the batches are submitted to
    /// * `chain_id` - Chain id of the signing domain, must match `chain`'s network
    /// * `forwarder` - Forwarder address, the domain's verifying contract
    /// * `submission_timeout` - How long one flush may wait for confirmation
    pub fn new(
        chain: Arc<C>,
        chain_id: u64,
        forwarder: Address,
        submission_timeout: Duration,
    ) -> Self {
        Self::with_history(
            chain,
            chain_id,
            forwarder,
            submission_timeout,
            RelayHistory::new(),
        )
    }

    /// Same as [`Relay::new`] with a caller-sized history
    pub fn with_history(
        chain: Arc<C>,
        chain_id: u64,
        forwarder: Address,
        submission_timeout: Duration,
        history: RelayHistory,
    ) -> Self {
        let batch = Arc::new(PendingBatch::new());
        let history = Arc::new(history);
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&batch),
            Arc::clone(&chain),
            Arc::clone(&history),
            submission_timeout,
        ));

        Self {
            domain: forwarder_domain(chain_id, forwarder),
            batch,
            estimator: GasEstimator::new(chain),
            dispatcher,
            history,
        }
    }

    pub fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    pub fn batch(&self) -> &Arc<PendingBatch> {
        &self.batch
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher<C>> {
        &self.dispatcher
    }

    /// Accept a signed request into the pending batch
    ///
    /// Only the signature is checked. A stale nonce or an expired request is
    /// queued anyway and comes back as a `false` result after the flush.
    pub fn submit(&self, signed: SignedRequest) -> Result<(), RelayError> {
        let request = &signed.request;
        if let Err(err) = verify(&self.domain, request, &signed.signature) {
            tracing::warn!(from = %request.from, nonce = %request.nonce, error = %err, "Rejected request");
            return Err(err);
        }

        tracing::info!(
            from = %request.from,
            to = %request.to,
            nonce = %request.nonce,
            expiry_block = %request.expiryBlock,
            "Request queued"
        );
        self.batch.enqueue(signed.request, signed.signature);
        Ok(())
    }

    /// Everything pending and what relaying it now would cost
    pub async fn pending(&self) -> Result<PendingView, RelayError> {
        let snapshot = self.batch.snapshot();
        let estimated_gas = self.estimator.estimate(&snapshot).await?;
        let (requests, _) = snapshot.into_parts();
        Ok(PendingView {
            requests,
            estimated_gas,
        })
    }

    /// Relay everything pending now, outside the scheduler's timing
    ///
    /// The flush runs on its own task, so dropping this future (e.g. an HTTP
    /// client hanging up) does not cancel a submission already under way.
    pub async fn flush(&self) -> Result<FlushOutcome, RelayError>
    where
        C: 'static,
    {
        let dispatcher = Arc::clone(&self.dispatcher);
        tokio::spawn(async move { dispatcher.flush().await })
            .await
            .map_err(|e| RelayError::NetworkFailure(eyre!("flush task failed: {e}")))?
    }

    /// The retained results, oldest first
    pub fn history(&self) -> Vec<ExecutionResult> {
        self.history.all()
    }

    /// Receive each future flush's results
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<[ExecutionResult]>> {
        self.history.subscribe()
    }

    /// A scheduler driving this relay's flushes
    pub fn scheduler(&self, config: SchedulerConfig) -> Scheduler<C> {
        Scheduler::new(
            Arc::clone(&self.batch),
            self.estimator.clone(),
            Arc::clone(&self.dispatcher),
            config,
        )
    }
}
