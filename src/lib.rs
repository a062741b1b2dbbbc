//! Forwarder relay
//!
//! A gasless meta-transaction relay for an EIP-712 Forwarder contract. Senders
//! sign `ForwardRequest`s off-chain; the relay checks each signature, queues
//! the request, and periodically submits the whole queue in one
//! `executeTransaction` call, paying the fees itself.
//!
//! # Features
//!
//! - Build and sign forward requests for ERC-20 `transfer`, `approve` and `transferFrom`
//! - Verify and queue signed requests
//! - Flush on an interval or once the batch's gas estimate crosses a threshold
//! - Per-request results, published to a history and to live subscribers
//!
//! # Example
//!
//! ```rust,ignore
//! use forwarder_relay::{Relay, RelayConfig, RpcForwarder};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> eyre::Result<()> {
//!     let config = RelayConfig::from_env()?;
//!     let chain = RpcForwarder::connect("0x...", &config.network.rpc_url, config.network.forwarder)?;
//!     let relay = Arc::new(Relay::new(
//!         Arc::new(chain),
//!         config.network.chain_id,
//!         config.network.forwarder,
//!         config.submission_timeout,
//!     ));
//!
//!     // Flush whatever was submitted so far
//!     let outcome = relay.flush().await?;
//!     println!("{} requests relayed", outcome.results().len());
//!
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod builder;
pub mod chain;
pub mod client;
pub mod config;
pub mod constants;
pub mod contracts;
pub mod dispatcher;
pub mod error;
pub mod estimator;
pub mod history;
pub mod relay;
pub mod scheduler;
pub mod server;
pub mod signer;
pub mod types;
pub mod verifier;

// Re-export main types for convenience
pub use batch::{Batch, PendingBatch};
pub use builder::{build_typed_document, RequestBuilder, TypedDocument};
pub use chain::{BatchReceipt, ForwarderChain, RpcForwarder};
pub use client::{MetaTxClient, RelayClient};
pub use config::{NetworkConfig, RelayConfig};
pub use contracts::ForwardRequest;
pub use dispatcher::Dispatcher;
pub use error::{eyre, Context, RelayError, Report, Result};
pub use estimator::GasEstimator;
pub use history::RelayHistory;
pub use relay::Relay;
pub use scheduler::{Scheduler, SchedulerConfig, Trigger};
pub use server::router;
pub use signer::{LocalSigner, RequestSigner};
pub use types::{ExecutionResult, FlushOutcome, Operation, PendingView, SignedRequest};
pub use verifier::{forwarder_domain, verify};
