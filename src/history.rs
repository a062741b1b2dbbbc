//! Record of relayed requests and their outcomes

use crate::constants::DEFAULT_HISTORY_LIMIT;
use crate::types::ExecutionResult;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

/// Capacity of the live results channel; slow subscribers see `Lagged`
const SUBSCRIBER_BUFFER: usize = 64;

/// Keeps the most recent flush results and fans each flush out to subscribers
pub struct RelayHistory {
    results: Mutex<VecDeque<ExecutionResult>>,
    limit: usize,
    live: broadcast::Sender<Arc<[ExecutionResult]>>,
}

impl Default for RelayHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayHistory {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Keep at most `limit` results, dropping the oldest first
    pub fn with_limit(limit: usize) -> Self {
        let (live, _) = broadcast::channel(SUBSCRIBER_BUFFER);
        Self {
            results: Mutex::new(VecDeque::new()),
            limit,
            live,
        }
    }

    /// Append one flush's results, in submission order
    pub fn publish(&self, results: &[ExecutionResult]) {
        {
            let mut kept = self.results.lock().unwrap_or_else(PoisonError::into_inner);
            kept.extend(results.iter().cloned());
            let excess = kept.len().saturating_sub(self.limit);
            kept.drain(..excess);
        }
        // no receivers is fine
        let _ = self.live.send(Arc::from(results));
    }

    /// The retained results, oldest first
    pub fn all(&self) -> Vec<ExecutionResult> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Receive each future flush's results as they are published
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<[ExecutionResult]>> {
        self.live.subscribe()
    }
}
