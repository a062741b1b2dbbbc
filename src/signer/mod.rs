//! Request signer abstraction
//!
//! Senders sign the EIP-712 document of each request off-chain; the relay
//! never signs on their behalf. This trait lets clients plug in a local key
//! or any other holder of the sender's key.

mod local;

pub use local::LocalSigner;

use crate::builder::TypedDocument;
use alloy::primitives::{Address, Bytes};
use eyre::Result;

/// Trait for producing a sender's signature over a typed document
pub trait RequestSigner: Send + Sync {
    /// Returns the signer's EVM address
    fn address(&self) -> Address;

    /// Signs the document's EIP-712 digest, returning the 65-byte signature
    fn sign_document(
        &self,
        document: &TypedDocument,
    ) -> impl std::future::Future<Output = Result<Bytes>> + Send;
}
