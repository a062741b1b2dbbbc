//! Deciding when to flush
//!
//! One task reacts to two named triggers: a fixed flush interval, and a
//! shorter gas poll that flushes early once the pending batch gets expensive.
//! Both go through the dispatcher's single-flight guard.

use crate::batch::PendingBatch;
use crate::chain::ForwarderChain;
use crate::dispatcher::Dispatcher;
use crate::estimator::GasEstimator;
use crate::types::FlushOutcome;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// What caused a flush attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The flush interval elapsed with work pending
    Interval,
    /// The pending batch's estimated gas crossed the threshold
    GasThreshold { estimated: u64 },
}

/// Timing and threshold policy
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub flush_interval: Duration,
    pub gas_poll_interval: Duration,
    pub gas_threshold: u64,
}

/// Periodic flush driver for one relay process
pub struct Scheduler<C> {
    batch: Arc<PendingBatch>,
    estimator: GasEstimator<C>,
    dispatcher: Arc<Dispatcher<C>>,
    config: SchedulerConfig,
}

impl<C: ForwarderChain> Scheduler<C> {
    pub fn new(
        batch: Arc<PendingBatch>,
        estimator: GasEstimator<C>,
        dispatcher: Arc<Dispatcher<C>>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            batch,
            estimator,
            dispatcher,
            config,
        }
    }

    /// Check both triggers until `cancel` fires
    ///
    /// A flush already running when `cancel` fires is allowed to finish.
    pub async fn run(self, cancel: CancellationToken) {
        let mut flush_tick = tokio::time::interval(self.config.flush_interval);
        let mut gas_tick = tokio::time::interval(self.config.gas_poll_interval);
        flush_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        gas_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // both fire immediately on creation
        flush_tick.tick().await;
        gas_tick.tick().await;

        tracing::info!(
            flush_interval = ?self.config.flush_interval,
            gas_poll_interval = ?self.config.gas_poll_interval,
            gas_threshold = self.config.gas_threshold,
            "Scheduler started"
        );

        loop {
            let trigger = tokio::select! {
                _ = cancel.cancelled() => break,
                _ = flush_tick.tick() => self.interval_trigger(),
                _ = gas_tick.tick() => self.gas_trigger().await,
            };
            if let Some(trigger) = trigger {
                self.fire(trigger).await;
            }
        }

        tracing::info!(pending = self.batch.len(), "Scheduler stopped");
    }

    fn interval_trigger(&self) -> Option<Trigger> {
        (!self.batch.is_empty()).then_some(Trigger::Interval)
    }

    async fn gas_trigger(&self) -> Option<Trigger> {
        let snapshot = self.batch.snapshot();
        if snapshot.is_empty() {
            return None;
        }
        match self.estimator.estimate(&snapshot).await {
            Ok(estimated) if estimated > self.config.gas_threshold => {
                Some(Trigger::GasThreshold { estimated })
            }
            Ok(estimated) => {
                tracing::trace!(estimated, pending = snapshot.len(), "Below gas threshold");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "Gas estimate failed");
                None
            }
        }
    }

    async fn fire(&self, trigger: Trigger) {
        tracing::debug!(?trigger, "Flush triggered");
        match self.dispatcher.flush().await {
            Ok(FlushOutcome::Relayed { tx_hash, results }) => {
                tracing::debug!(?trigger, %tx_hash, items = results.len(), "Flush done");
            }
            Ok(FlushOutcome::Empty | FlushOutcome::InProgress) => {}
            // requeued by the dispatcher, the next tick retries
            Err(err) if err.is_retryable() => {
                tracing::warn!(?trigger, error = %err, "Flush failed, will retry");
            }
            Err(err) => {
                tracing::error!(?trigger, error = %err, "Flush failed");
            }
        }
    }
}
