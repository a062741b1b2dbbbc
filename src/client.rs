//! Clients of a running relay
//!
//! `RelayClient` speaks the relay's HTTP protocol. `MetaTxClient` is the
//! sender's side of the flow: build a request, sign it, hand it to the relay.

use crate::builder::RequestBuilder;
use crate::chain::ForwarderChain;
use crate::signer::RequestSigner;
use crate::types::{ExecutionResult, FlushOutcome, Operation, PendingView, SignedRequest};
use alloy::primitives::Address;
use eyre::{Context, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

/// HTTP client for the relay endpoints
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: Client,
    base_url: String,
}

impl RelayClient {
    /// Create a client for the relay at `base_url` (e.g. `http://localhost:4000`)
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Submit a signed request for relaying
    pub async fn submit(&self, signed: &SignedRequest) -> Result<()> {
        let resp = self
            .client
            .post(self.url("/txRequest"))
            .json(signed)
            .send()
            .await
            .context("Failed to submit request")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            eyre::bail!("Relay rejected request: {} - {}", status, body);
        }
        Ok(())
    }

    /// Pending requests and the gas estimate for relaying them
    pub async fn pending(&self) -> Result<PendingView> {
        let resp = self
            .client
            .get(self.url("/requests"))
            .send()
            .await
            .context("Failed to fetch pending requests")?;
        parse(resp, "pending requests").await
    }

    /// Ask the relay to flush now
    pub async fn flush(&self) -> Result<FlushOutcome> {
        let resp = self
            .client
            .post(self.url("/relayTransaction"))
            .send()
            .await
            .context("Failed to request relay")?;
        parse(resp, "relay outcome").await
    }

    /// Every result the relay has published
    pub async fn history(&self) -> Result<Vec<ExecutionResult>> {
        let resp = self
            .client
            .get(self.url("/history"))
            .send()
            .await
            .context("Failed to fetch history")?;
        parse(resp, "history").await
    }
}

async fn parse<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        eyre::bail!("Failed to fetch {}: {} - {}", what, status, body);
    }
    resp.json()
        .await
        .with_context(|| format!("Failed to parse {} response", what))
}

/// Sender-side client: builds, signs and submits meta-transactions
pub struct MetaTxClient<S: RequestSigner, C: ForwarderChain> {
    signer: S,
    builder: RequestBuilder<C>,
    relay: RelayClient,
    token: Address,
}

impl<S: RequestSigner, C: ForwarderChain> MetaTxClient<S, C> {
    /// Create a client signing with `signer` for calls to `token`
    pub fn new(signer: S, builder: RequestBuilder<C>, relay: RelayClient, token: Address) -> Self {
        Self {
            signer,
            builder,
            relay,
            token,
        }
    }

    /// Get the signer's address
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn relay(&self) -> &RelayClient {
        &self.relay
    }

    /// Build and sign `operation` without submitting it
    ///
    /// The relay's pending list is the nonce hint, so several requests can be
    /// queued before the first one is relayed.
    pub async fn sign(&self, operation: Operation) -> Result<SignedRequest> {
        let pending = self.relay.pending().await?;
        let request = self
            .builder
            .build_with_pending(operation, self.address(), self.token, &pending.requests)
            .await?;

        let document = self.builder.typed_document(request.clone());
        let signature = self.signer.sign_document(&document).await?;
        Ok(SignedRequest::new(request, signature))
    }

    /// Build, sign and submit `operation`
    ///
    /// # Returns
    ///
    /// The submitted request, to match against the relay's history later
    pub async fn send(&self, operation: Operation) -> Result<SignedRequest> {
        let signed = self.sign(operation).await?;
        self.relay.submit(&signed).await?;
        tracing::info!(
            from = %signed.request.from,
            nonce = %signed.request.nonce,
            "Request submitted to relay"
        );
        Ok(signed)
    }
}
