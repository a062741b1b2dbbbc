//! Error types for the relay
//!
//! Plumbing (RPC, HTTP, parsing) uses `eyre` for ergonomic error handling with
//! context. Outcomes that callers must tell apart are `RelayError` variants.

pub use eyre::{eyre, Context, Report, Result};

use alloy::primitives::Address;

/// Errors surfaced by the relay pipeline
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Signature does not decode, or recovers to someone other than `from`
    #[error("invalid signature: expected signer {expected}, recovered {recovered:?}")]
    InvalidSignature {
        expected: Address,
        recovered: Option<Address>,
    },

    /// TransferFrom built with the acting caller as the token owner
    #[error("transferFrom requires an owner distinct from the caller {caller}")]
    MissingOwner { caller: Address },

    /// Malformed operation arguments, rejected before signing
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Requests and signatures (or results) out of step
    #[error("length mismatch: {requests} requests vs {other} {what}")]
    LengthMismatch {
        requests: usize,
        other: usize,
        what: &'static str,
    },

    /// Submission or confirmation did not complete; the batch was requeued
    #[error("network failure: {0:#}")]
    NetworkFailure(Report),

    /// A read-only query against the forwarder failed
    #[error("chain query failed: {0:#}")]
    Chain(Report),
}

impl RelayError {
    /// Whether the caller may retry the same operation later
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkFailure(_) | Self::Chain(_))
    }
}
