//! Configuration for the relay and its clients

use crate::constants::{
    DEFAULT_BIND_ADDRESS, DEFAULT_CHAIN_ID, DEFAULT_EXPIRY_WINDOW, DEFAULT_FLUSH_INTERVAL,
    DEFAULT_GAS_POLL_INTERVAL, DEFAULT_GAS_THRESHOLD, DEFAULT_HISTORY_LIMIT,
    DEFAULT_SUBMISSION_TIMEOUT,
};
use crate::scheduler::SchedulerConfig;
use alloy::primitives::Address;
use eyre::{eyre, Context, Result};
use std::str::FromStr;
use std::time::Duration;

/// Network configuration: where the Forwarder lives
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Chain ID, part of the signing domain
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: String,
    /// Forwarder contract address
    pub forwarder: Address,
    /// Token the requests call into (client side only)
    pub token: Option<Address>,
    /// Blocks a built request stays valid for (client side only)
    pub expiry_window: u64,
}

impl NetworkConfig {
    /// Configuration for a Forwarder at `forwarder` on the default chain
    pub fn new(rpc_url: impl Into<String>, forwarder: Address) -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            rpc_url: rpc_url.into(),
            forwarder,
            token: None,
            expiry_window: DEFAULT_EXPIRY_WINDOW,
        }
    }

    /// Read `RPC_URL`, `FORWARDER_ADDRESS`, `CHAIN_ID`, `TOKEN_ADDRESS` and
    /// `EXPIRY_WINDOW_BLOCKS`
    pub fn from_env() -> Result<Self> {
        let rpc_url = required("RPC_URL")?;
        let forwarder = parse_required("FORWARDER_ADDRESS")?;
        let chain_id = parse_optional("CHAIN_ID")?.unwrap_or(DEFAULT_CHAIN_ID);
        let token = parse_optional("TOKEN_ADDRESS")?;
        let expiry_window = parse_optional("EXPIRY_WINDOW_BLOCKS")?.unwrap_or(DEFAULT_EXPIRY_WINDOW);
        if expiry_window == 0 {
            eyre::bail!("Expiry window must be at least one block");
        }

        Ok(Self {
            chain_id,
            rpc_url,
            forwarder,
            token,
            expiry_window,
        })
    }

    /// Set the chain id
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Set the token address
    pub fn with_token(mut self, token: Address) -> Self {
        self.token = Some(token);
        self
    }

    /// Set the expiry window of built requests
    pub fn with_expiry_window(mut self, blocks: u64) -> Self {
        self.expiry_window = blocks;
        self
    }
}

/// Everything the relay process needs besides its key
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub network: NetworkConfig,
    pub flush_interval: Duration,
    pub gas_poll_interval: Duration,
    /// Flush early once the pending batch's estimate exceeds this
    pub gas_threshold: u64,
    pub submission_timeout: Duration,
    /// Results kept for `/history`
    pub history_limit: usize,
    pub bind_address: String,
}

impl RelayConfig {
    /// Defaults for everything but the network
    pub fn new(network: NetworkConfig) -> Self {
        Self {
            network,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            gas_poll_interval: DEFAULT_GAS_POLL_INTERVAL,
            gas_threshold: DEFAULT_GAS_THRESHOLD,
            submission_timeout: DEFAULT_SUBMISSION_TIMEOUT,
            history_limit: DEFAULT_HISTORY_LIMIT,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
        }
    }

    /// Read the network settings plus `FLUSH_INTERVAL_SECS`,
    /// `GAS_POLL_INTERVAL_SECS`, `GAS_THRESHOLD`, `SUBMISSION_TIMEOUT_SECS`,
    /// `HISTORY_LIMIT` and `BIND_ADDRESS`; unset ones keep defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(NetworkConfig::from_env()?);

        if let Some(secs) = parse_optional("FLUSH_INTERVAL_SECS")? {
            config.flush_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_optional("GAS_POLL_INTERVAL_SECS")? {
            config.gas_poll_interval = Duration::from_secs(secs);
        }
        if let Some(gas) = parse_optional("GAS_THRESHOLD")? {
            config.gas_threshold = gas;
        }
        if let Some(secs) = parse_optional("SUBMISSION_TIMEOUT_SECS")? {
            config.submission_timeout = Duration::from_secs(secs);
        }
        if let Some(limit) = parse_optional("HISTORY_LIMIT")? {
            config.history_limit = limit;
        }
        if let Ok(bind) = std::env::var("BIND_ADDRESS") {
            config.bind_address = bind;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the scheduler cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.flush_interval.is_zero() || self.gas_poll_interval.is_zero() {
            eyre::bail!("Flush and gas poll intervals must be non-zero");
        }
        if self.submission_timeout.is_zero() {
            eyre::bail!("Submission timeout must be non-zero");
        }
        if self.history_limit == 0 {
            eyre::bail!("History limit must be at least one result");
        }
        Ok(())
    }

    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    pub fn with_gas_poll_interval(mut self, interval: Duration) -> Self {
        self.gas_poll_interval = interval;
        self
    }

    pub fn with_gas_threshold(mut self, gas: u64) -> Self {
        self.gas_threshold = gas;
        self
    }

    pub fn with_submission_timeout(mut self, timeout: Duration) -> Self {
        self.submission_timeout = timeout;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_bind_address(mut self, bind_address: impl Into<String>) -> Self {
        self.bind_address = bind_address.into();
        self
    }

    /// The scheduler's share of the settings
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            flush_interval: self.flush_interval,
            gas_poll_interval: self.gas_poll_interval,
            gas_threshold: self.gas_threshold,
        }
    }
}

fn required(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{} environment variable must be set", name))
}

fn parse_required<T>(name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = required(name)?;
    raw.trim()
        .parse()
        .map_err(|e| eyre!("Invalid {}: {}", name, e))
}

fn parse_optional<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| eyre!("Invalid {}: {}", name, e)),
        Err(_) => Ok(None),
    }
}
