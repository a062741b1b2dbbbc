//! Sign one token transfer and hand it to a running relay
//!
//! Run with: cargo run --example send_transfer -- <recipient> <amount>
//!
//! Requires PRIVATE_KEY, RPC_URL, FORWARDER_ADDRESS and TOKEN_ADDRESS
//! environment variables; RELAY_URL defaults to http://localhost:4000

use forwarder_relay::constants::scale_token;
use forwarder_relay::{
    LocalSigner, MetaTxClient, NetworkConfig, Operation, RelayClient, RequestBuilder, RpcForwarder,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let recipient = args
        .next()
        .ok_or_else(|| eyre::eyre!("usage: send_transfer <recipient> <amount>"))?
        .parse()?;
    let amount: f64 = args.next().unwrap_or_else(|| "1".to_string()).parse()?;

    let private_key =
        std::env::var("PRIVATE_KEY").map_err(|_| eyre::eyre!("PRIVATE_KEY must be set"))?;
    let relay_url =
        std::env::var("RELAY_URL").unwrap_or_else(|_| "http://localhost:4000".to_string());

    let config = NetworkConfig::from_env()?;
    let token = config
        .token
        .ok_or_else(|| eyre::eyre!("TOKEN_ADDRESS must be set"))?;

    // Queries only; the relay pays for the batch
    let chain = Arc::new(RpcForwarder::read_only(&config.rpc_url, config.forwarder)?);
    let builder = RequestBuilder::new(chain, config.forwarder, config.chain_id)
        .with_expiry_window(config.expiry_window);
    let signer = LocalSigner::from_private_key(&private_key)?;
    let client = MetaTxClient::new(signer, builder, RelayClient::new(relay_url), token);

    println!("Sender: {}", client.address());

    let signed = client
        .send(Operation::transfer(recipient, scale_token(amount)))
        .await?;
    println!(
        "Queued transfer of {} to {} (nonce {}, expires at block {})",
        amount, recipient, signed.request.nonce, signed.request.expiryBlock
    );

    let outcome = client.relay().flush().await?;
    for result in outcome.results() {
        println!(
            "{} nonce {}: {}",
            result.request.from,
            result.request.nonce,
            if result.success { "relayed" } else { "skipped" }
        );
    }

    Ok(())
}
