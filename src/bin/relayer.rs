//! Forwarder relay binary.

use forwarder_relay::{
    router, ForwarderChain, Relay, RelayConfig, RelayHistory, RpcForwarder,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting forwarder relay");

    let config = RelayConfig::from_env()?;
    let private_key = std::env::var("RELAYER_PRIVATE_KEY")
        .map_err(|_| eyre::eyre!("RELAYER_PRIVATE_KEY environment variable must be set"))?;

    let chain = RpcForwarder::connect(
        &private_key,
        &config.network.rpc_url,
        config.network.forwarder,
    )?;

    let network_chain_id = chain.chain_id().await?;
    if network_chain_id != config.network.chain_id {
        eyre::bail!(
            "CHAIN_ID is {} but the RPC endpoint serves chain {}",
            config.network.chain_id,
            network_chain_id
        );
    }

    info!(
        forwarder = %config.network.forwarder,
        chain_id = config.network.chain_id,
        relayer = ?chain.relayer(),
        "Configuration loaded"
    );

    let relay = Arc::new(Relay::with_history(
        Arc::new(chain),
        config.network.chain_id,
        config.network.forwarder,
        config.submission_timeout,
        RelayHistory::with_limit(config.history_limit),
    ));

    let cancel = CancellationToken::new();
    let scheduler = relay.scheduler(config.scheduler_config());
    let scheduler_task = tokio::spawn(scheduler.run(cancel.clone()));

    let app = router(Arc::clone(&relay));

    info!(address = %config.bind_address, "Listening");

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, stopping scheduler...");
    cancel.cancel();
    if let Err(e) = scheduler_task.await {
        error!(error = %e, "Scheduler task failed");
    }

    let pending = relay.batch().len();
    if pending > 0 {
        error!(pending, "Shutting down with unrelayed requests; they are lost");
    }

    info!("Relay shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
