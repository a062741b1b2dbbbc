//! Flushing the pending batch to the Forwarder
//!
//! The dispatcher is a two-state machine (idle / flushing) behind a
//! single-flight flag. A flush drains the queue, submits the drained batch,
//! and either publishes the per-item results or puts the batch back in front
//! of the queue. The drained batch is never dropped without one of the two.

use crate::batch::{Batch, PendingBatch};
use crate::chain::ForwarderChain;
use crate::error::{eyre, RelayError};
use crate::history::RelayHistory;
use crate::types::{ExecutionResult, FlushOutcome};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Clears the flushing flag however the flush ends, including cancellation
struct FlushGuard<'a>(&'a AtomicBool);

impl<'a> FlushGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Holds a drained batch until it is published or handed back; dropped
/// while armed (the flush future was cancelled), it requeues the batch
struct Drained<'a> {
    queue: &'a PendingBatch,
    batch: Batch,
    armed: bool,
}

impl<'a> Drained<'a> {
    fn new(queue: &'a PendingBatch, batch: Batch) -> Self {
        Self {
            queue,
            batch,
            armed: true,
        }
    }

    fn batch(&self) -> &Batch {
        &self.batch
    }

    fn disarm(mut self) -> Batch {
        self.armed = false;
        std::mem::take(&mut self.batch)
    }
}

impl Drop for Drained<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!(items = self.batch.len(), "Flush abandoned mid-submission, requeued");
            self.queue.requeue_front(std::mem::take(&mut self.batch));
        }
    }
}

/// Drains, submits and reports one batch at a time
pub struct Dispatcher<C> {
    batch: Arc<PendingBatch>,
    chain: Arc<C>,
    history: Arc<RelayHistory>,
    submission_timeout: Duration,
    flushing: AtomicBool,
}

impl<C: ForwarderChain> Dispatcher<C> {
    pub fn new(
        batch: Arc<PendingBatch>,
        chain: Arc<C>,
        history: Arc<RelayHistory>,
        submission_timeout: Duration,
    ) -> Self {
        Self {
            batch,
            chain,
            history,
            submission_timeout,
            flushing: AtomicBool::new(false),
        }
    }

    /// Whether a flush is currently running
    pub fn is_flushing(&self) -> bool {
        self.flushing.load(Ordering::Acquire)
    }

    /// Relay everything pending
    ///
    /// Returns `InProgress` without touching the queue if another flush is
    /// running, and `Empty` if there was nothing to relay. On
    /// `NetworkFailure` the drained requests are back at the front of the
    /// queue for the next attempt.
    pub async fn flush(&self) -> Result<FlushOutcome, RelayError> {
        let Some(_guard) = FlushGuard::acquire(&self.flushing) else {
            tracing::debug!("Flush already in progress, trigger coalesced");
            return Ok(FlushOutcome::InProgress);
        };

        let drained = self.batch.drain_all();
        if drained.is_empty() {
            return Ok(FlushOutcome::Empty);
        }
        // declared after the flag guard so the batch is back before the flag clears
        let drained = Drained::new(&self.batch, drained);

        let items = drained.batch().len();
        tracing::info!(items, "Relaying batch");

        let submitted = tokio::time::timeout(
            self.submission_timeout,
            self.chain.execute(drained.batch()),
        )
        .await;
        let receipt = match submitted {
            Ok(Ok(receipt)) => receipt,
            Ok(Err(err)) => return Err(self.requeue(drained.disarm(), err)),
            Err(_) => {
                let err = eyre!("no confirmation within {:?}", self.submission_timeout);
                return Err(self.requeue(drained.disarm(), err));
            }
        };

        // Mined at this point; requeueing would only replay consumed nonces.
        let drained = drained.disarm();
        if receipt.results.len() != items {
            tracing::error!(
                tx_hash = %receipt.tx_hash,
                items,
                results = receipt.results.len(),
                "Forwarder reported a result count that does not match the batch"
            );
            return Err(RelayError::LengthMismatch {
                requests: items,
                other: receipt.results.len(),
                what: "results",
            });
        }

        let (requests, _) = drained.into_parts();
        let results: Vec<ExecutionResult> = requests
            .into_iter()
            .zip(receipt.results)
            .map(|(request, success)| ExecutionResult { request, success })
            .collect();

        let relayed = results.iter().filter(|r| r.success).count();
        tracing::info!(
            tx_hash = %receipt.tx_hash,
            relayed,
            skipped = items - relayed,
            "Batch confirmed"
        );
        self.history.publish(&results);

        Ok(FlushOutcome::Relayed {
            tx_hash: receipt.tx_hash,
            results,
        })
    }

    fn requeue(&self, drained: Batch, err: eyre::Report) -> RelayError {
        tracing::warn!(items = drained.len(), error = %err, "Batch submission failed, requeued");
        self.batch.requeue_front(drained);
        RelayError::NetworkFailure(err)
    }
}
