//! Client-side construction of forward requests and their signing documents

use crate::batch::PendingBatch;
use crate::chain::ForwarderChain;
use crate::constants::{DEFAULT_EXPIRY_WINDOW, DOMAIN_NAME, DOMAIN_VERSION};
use crate::contracts::ForwardRequest;
use crate::error::RelayError;
use crate::types::Operation;
use crate::verifier::forwarder_domain;
use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::{Eip712Domain, SolStruct};
use serde_json::{json, Value};
use std::sync::Arc;

/// The EIP-712 document a sender signs for one request
///
/// Never sent anywhere itself; it exists to produce the digest.
#[derive(Debug, Clone)]
pub struct TypedDocument {
    pub chain_id: u64,
    pub domain: Eip712Domain,
    pub message: ForwardRequest,
}

impl TypedDocument {
    /// `keccak256("\x19\x01" ‖ domainSeparator ‖ hashStruct(message))`
    pub fn signing_hash(&self) -> B256 {
        self.message.eip712_signing_hash(&self.domain)
    }

    /// The `eth_signTypedData_v4` payload, for signing in an external wallet
    pub fn to_json(&self) -> Value {
        json!({
            "types": {
                "EIP712Domain": [
                    { "name": "name", "type": "string" },
                    { "name": "version", "type": "string" },
                    { "name": "chainId", "type": "uint256" },
                    { "name": "verifyingContract", "type": "address" },
                ],
                "ForwardRequest": [
                    { "name": "from", "type": "address" },
                    { "name": "to", "type": "address" },
                    { "name": "nonce", "type": "uint256" },
                    { "name": "expiryBlock", "type": "uint256" },
                    { "name": "data", "type": "bytes" },
                ],
            },
            "domain": {
                "name": DOMAIN_NAME,
                "version": DOMAIN_VERSION,
                "chainId": self.chain_id,
                "verifyingContract": self.domain.verifying_contract,
            },
            "primaryType": "ForwardRequest",
            "message": self.message,
        })
    }
}

/// Bind the Forwarder domain and schema to a concrete request
pub fn build_typed_document(
    forwarder: Address,
    chain_id: u64,
    request: ForwardRequest,
) -> TypedDocument {
    TypedDocument {
        chain_id,
        domain: forwarder_domain(chain_id, forwarder),
        message: request,
    }
}

/// Assembles requests against one Forwarder deployment
pub struct RequestBuilder<C> {
    chain: Arc<C>,
    forwarder: Address,
    chain_id: u64,
    expiry_window: u64,
    pending: Option<Arc<PendingBatch>>,
}

impl<C: ForwarderChain> RequestBuilder<C> {
    pub fn new(chain: Arc<C>, forwarder: Address, chain_id: u64) -> Self {
        Self {
            chain,
            forwarder,
            chain_id,
            expiry_window: DEFAULT_EXPIRY_WINDOW,
            pending: None,
        }
    }

    /// Blocks a built request stays valid for
    pub fn with_expiry_window(mut self, blocks: u64) -> Self {
        self.expiry_window = blocks;
        self
    }

    /// Use an in-process pending batch as the nonce hint source
    pub fn with_pending_batch(mut self, pending: Arc<PendingBatch>) -> Self {
        self.pending = Some(pending);
        self
    }

    pub fn forwarder(&self) -> Address {
        self.forwarder
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Build a request from `sender` calling `target` (the token)
    pub async fn build(
        &self,
        operation: Operation,
        sender: Address,
        target: Address,
    ) -> Result<ForwardRequest, RelayError> {
        let hint = self
            .pending
            .as_ref()
            .and_then(|pending| pending.latest_nonce(sender));
        self.build_with_hint(operation, sender, target, hint).await
    }

    /// Build using the sender's queued requests (e.g. from the relay's
    /// `/requests` listing) as the nonce hint
    pub async fn build_with_pending(
        &self,
        operation: Operation,
        sender: Address,
        target: Address,
        pending: &[ForwardRequest],
    ) -> Result<ForwardRequest, RelayError> {
        let hint = pending
            .iter()
            .rev()
            .find(|request| request.from == sender)
            .map(|request| request.nonce);
        self.build_with_hint(operation, sender, target, hint).await
    }

    async fn build_with_hint(
        &self,
        operation: Operation,
        sender: Address,
        target: Address,
        latest_pending: Option<U256>,
    ) -> Result<ForwardRequest, RelayError> {
        // before any chain call or signature
        operation.validate(sender)?;
        if target.is_zero() {
            return Err(RelayError::InvalidArgument(
                "target contract is the zero address".to_string(),
            ));
        }

        let chain_nonce = self
            .chain
            .get_nonce(sender)
            .await
            .map_err(RelayError::Chain)?;
        // the chain is authoritative; the hint only lets a sender queue ahead
        let nonce = match latest_pending {
            Some(latest) => chain_nonce.max(latest.saturating_add(U256::from(1))),
            None => chain_nonce,
        };

        let height = self
            .chain
            .block_number()
            .await
            .map_err(RelayError::Chain)?;

        let request = ForwardRequest {
            from: sender,
            to: target,
            nonce,
            expiryBlock: U256::from(height.saturating_add(self.expiry_window)),
            data: operation.encode(),
        };
        tracing::debug!(
            from = %sender,
            selector = %alloy::hex::encode(operation.selector()),
            %nonce,
            expiry_block = %request.expiryBlock,
            "Built forward request"
        );
        Ok(request)
    }

    /// The document to sign for `request` on this deployment
    pub fn typed_document(&self, request: ForwardRequest) -> TypedDocument {
        build_typed_document(self.forwarder, self.chain_id, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::MockForwarder;
    use crate::verifier::verify;
    use alloy::primitives::{address, Bytes, U256};
    use alloy::signers::local::PrivateKeySigner;
    use alloy::signers::SignerSync;

    const FORWARDER: Address = address!("f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0");
    const TOKEN: Address = address!("7070707070707070707070707070707070707070");

    fn builder() -> (Arc<MockForwarder>, RequestBuilder<MockForwarder>) {
        let chain = Arc::new(MockForwarder::new(80001, FORWARDER, TOKEN));
        let builder = RequestBuilder::new(Arc::clone(&chain), FORWARDER, 80001);
        (chain, builder)
    }

    #[tokio::test]
    async fn test_build_uses_chain_nonce_and_expiry_window() {
        let (chain, builder) = builder();
        let sender = Address::repeat_byte(1);
        let op = Operation::transfer(Address::repeat_byte(2), U256::from(5));

        let request = builder.build(op.clone(), sender, TOKEN).await.unwrap();
        assert_eq!(request.from, sender);
        assert_eq!(request.to, TOKEN);
        assert_eq!(request.nonce, chain.nonce(sender));
        assert_eq!(request.expiryBlock, U256::from(100 + DEFAULT_EXPIRY_WINDOW));
        assert_eq!(request.data, op.encode());

        let short = builder.with_expiry_window(3);
        let request = short.build(op, sender, TOKEN).await.unwrap();
        assert_eq!(request.expiryBlock, U256::from(103));
    }

    #[tokio::test]
    async fn test_pending_hint_lets_sender_queue_ahead() {
        let (_chain, builder) = builder();
        let pending = Arc::new(PendingBatch::new());
        let builder = builder.with_pending_batch(Arc::clone(&pending));
        let sender = Address::repeat_byte(1);
        let op = Operation::transfer(Address::repeat_byte(2), U256::from(1));

        let first = builder.build(op.clone(), sender, TOKEN).await.unwrap();
        pending.enqueue(first.clone(), Bytes::new());
        let second = builder.build(op, sender, TOKEN).await.unwrap();
        assert_eq!(second.nonce, first.nonce + U256::from(1));
    }

    #[tokio::test]
    async fn test_stale_hint_never_goes_below_chain_nonce() {
        let (chain, builder) = builder();
        let sender = Address::repeat_byte(1);
        chain.set_nonce(sender, U256::from(5));
        let stale = ForwardRequest {
            from: sender,
            to: TOKEN,
            nonce: U256::ZERO,
            expiryBlock: U256::ZERO,
            data: Bytes::new(),
        };
        let other = ForwardRequest {
            from: Address::repeat_byte(9),
            nonce: U256::from(40),
            ..stale.clone()
        };
        let op = Operation::approve(Address::repeat_byte(2), U256::from(1));
        let request = builder
            .build_with_pending(op, sender, TOKEN, &[stale, other])
            .await
            .unwrap();
        assert_eq!(request.nonce, U256::from(5));
    }

    #[tokio::test]
    async fn test_transfer_from_owner_is_caller_fails_before_chain() {
        let (chain, builder) = builder();
        let caller = Address::repeat_byte(1);
        let op = Operation::transfer_from(caller, caller, Address::repeat_byte(2), U256::from(1));
        let err = builder.build(op, caller, TOKEN).await.unwrap_err();
        assert!(matches!(err, RelayError::MissingOwner { .. }));
        assert_eq!(chain.submissions(), 0);
    }

    #[test]
    fn test_typed_document_signs_and_verifies() {
        let signer = PrivateKeySigner::random();
        let request = ForwardRequest {
            from: signer.address(),
            to: TOKEN,
            nonce: U256::from(2),
            expiryBlock: U256::from(150),
            data: Operation::transfer(Address::repeat_byte(2), U256::from(1)).encode(),
        };
        let doc = build_typed_document(FORWARDER, 80001, request.clone());
        let signature = signer.sign_hash_sync(&doc.signing_hash()).unwrap();
        let recovered = verify(&doc.domain, &request, &signature.as_bytes()).unwrap();
        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn test_typed_document_json_shape() {
        let request = ForwardRequest {
            from: Address::repeat_byte(1),
            to: TOKEN,
            nonce: U256::ZERO,
            expiryBlock: U256::from(150),
            data: Bytes::new(),
        };
        let json = build_typed_document(FORWARDER, 80001, request).to_json();
        assert_eq!(json["primaryType"], "ForwardRequest");
        assert_eq!(json["domain"]["name"], "Forwarder");
        assert_eq!(json["domain"]["version"], "0.0.1");
        assert_eq!(json["domain"]["chainId"], 80001);
        assert_eq!(json["types"]["ForwardRequest"].as_array().unwrap().len(), 5);
        assert!(json["message"].get("expiryBlock").is_some());
    }
}
