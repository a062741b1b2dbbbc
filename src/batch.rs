//! The pending batch: accepted requests waiting to be relayed
//!
//! This is the only state shared between inbound submissions and the flush
//! path. Requests and signatures are stored as pairs so the two sequences
//! handed to the Forwarder can never drift apart.

use crate::contracts::ForwardRequest;
use crate::error::RelayError;
use crate::types::SignedRequest;
use alloy::primitives::{Address, Bytes, U256};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// An owned, length-matched `(requests, signatures)` pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    requests: Vec<ForwardRequest>,
    signatures: Vec<Bytes>,
}

impl Batch {
    /// Build from two sequences, which must have equal length
    pub fn new(requests: Vec<ForwardRequest>, signatures: Vec<Bytes>) -> Result<Self, RelayError> {
        if requests.len() != signatures.len() {
            return Err(RelayError::LengthMismatch {
                requests: requests.len(),
                other: signatures.len(),
                what: "signatures",
            });
        }
        Ok(Self {
            requests,
            signatures,
        })
    }

    pub fn requests(&self) -> &[ForwardRequest] {
        &self.requests
    }

    pub fn signatures(&self) -> &[Bytes] {
        &self.signatures
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Split into the two arrays `executeTransaction` takes
    pub fn into_parts(self) -> (Vec<ForwardRequest>, Vec<Bytes>) {
        (self.requests, self.signatures)
    }

    /// Iterate `(request, signature)` pairs in submission order
    pub fn iter(&self) -> impl Iterator<Item = (&ForwardRequest, &Bytes)> {
        self.requests.iter().zip(self.signatures.iter())
    }
}

impl FromIterator<SignedRequest> for Batch {
    fn from_iter<I: IntoIterator<Item = SignedRequest>>(iter: I) -> Self {
        let (requests, signatures) = iter
            .into_iter()
            .map(|signed| (signed.request, signed.signature))
            .unzip();
        Self {
            requests,
            signatures,
        }
    }
}

/// Process-wide queue of verified requests, in submission order
#[derive(Debug, Default)]
pub struct PendingBatch {
    items: Mutex<VecDeque<SignedRequest>>,
}

impl PendingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    // Every critical section leaves the queue consistent, so a panic
    // elsewhere while holding the lock does not invalidate it.
    fn lock(&self) -> MutexGuard<'_, VecDeque<SignedRequest>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a verified request
    pub fn enqueue(&self, request: ForwardRequest, signature: Bytes) {
        self.lock().push_back(SignedRequest { request, signature });
    }

    /// Take everything and leave the queue empty, in one critical section
    pub fn drain_all(&self) -> Batch {
        let drained = std::mem::take(&mut *self.lock());
        drained.into_iter().collect()
    }

    /// Copy the current content without removing it
    pub fn snapshot(&self) -> Batch {
        self.lock().iter().cloned().collect()
    }

    /// Put a drained batch back ahead of anything enqueued since the drain
    pub fn requeue_front(&self, batch: Batch) {
        let (requests, signatures) = batch.into_parts();
        let mut items = self.lock();
        for (request, signature) in requests.into_iter().zip(signatures).rev() {
            items.push_front(SignedRequest { request, signature });
        }
    }

    /// Nonce of `sender`'s most recently queued request, if any
    pub fn latest_nonce(&self, sender: Address) -> Option<U256> {
        self.lock()
            .iter()
            .rev()
            .find(|item| item.request.from == sender)
            .map(|item| item.request.nonce)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
