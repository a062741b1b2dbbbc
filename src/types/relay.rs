//! Wire types of the relay protocol

use crate::contracts::ForwardRequest;
use alloy::primitives::{Bytes, TxHash};
use serde::{Deserialize, Serialize};

/// A request together with the sender's signature over it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRequest {
    pub request: ForwardRequest,
    pub signature: Bytes,
}

impl SignedRequest {
    /// Pair a request with its signature
    pub fn new(request: ForwardRequest, signature: impl Into<Bytes>) -> Self {
        Self {
            request,
            signature: signature.into(),
        }
    }
}

/// Outcome of one relayed request
///
/// `success == false` means the Forwarder skipped the item (stale nonce,
/// expired, bad signature, or the token call failed). Siblings are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub request: ForwardRequest,
    pub success: bool,
}

/// Result of asking the dispatcher to flush
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FlushOutcome {
    /// The drained batch was submitted and confirmed
    #[serde(rename_all = "camelCase")]
    Relayed {
        tx_hash: TxHash,
        results: Vec<ExecutionResult>,
    },
    /// Nothing was pending
    Empty,
    /// Another flush holds the single-flight guard
    InProgress,
}

impl FlushOutcome {
    /// Per-item results, empty unless a batch was relayed
    pub fn results(&self) -> &[ExecutionResult] {
        match self {
            Self::Relayed { results, .. } => results,
            Self::Empty | Self::InProgress => &[],
        }
    }
}

/// Pending requests plus the cost of flushing them right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingView {
    pub requests: Vec<ForwardRequest>,
    pub estimated_gas: u64,
}
