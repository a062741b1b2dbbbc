//! Protocol constants and defaults for the relay

use alloy::primitives::U256;
use std::time::Duration;

/// EIP-712 domain name of the Forwarder contract
pub const DOMAIN_NAME: &str = "Forwarder";

/// EIP-712 domain version of the Forwarder contract
pub const DOMAIN_VERSION: &str = "0.0.1";

/// Default chain (Polygon Mumbai, where the Forwarder was first deployed)
pub const DEFAULT_CHAIN_ID: u64 = 80001;

/// Blocks a signed request stays eligible for execution
pub const DEFAULT_EXPIRY_WINDOW: u64 = 50;

/// Interval between unconditional flushes of a non-empty batch
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(30);

/// Interval between gas estimates of the pending batch
pub const DEFAULT_GAS_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Estimated gas above which the pending batch is flushed early
pub const DEFAULT_GAS_THRESHOLD: u64 = 1_000_000;

/// Upper bound on submit + confirmation of one batch
pub const DEFAULT_SUBMISSION_TIMEOUT: Duration = Duration::from_secs(180);

/// Address the relay HTTP API binds to
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:4000";

/// Results the relay history retains before dropping the oldest
pub const DEFAULT_HISTORY_LIMIT: usize = 10_000;

/// Intrinsic cost of any transaction, reported for an empty batch
pub const BASE_TX_GAS: u64 = 21_000;

/// Receipt polling: 90 attempts * 2 seconds = 3 minutes
pub const RECEIPT_POLL_ATTEMPTS: u32 = 90;
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// The recipient token uses 18 decimals
pub const TOKEN_DECIMALS: u8 = 18;

/// Scale a floating point value to U256 with specified decimals
pub fn scale_to_decimals(value: f64, decimals: u8) -> U256 {
    // split so 18-decimal values do not overflow the f64 mantissa into garbage
    let whole = value.trunc();
    let frac = value - whole;
    let unit = U256::from(10u64).pow(U256::from(decimals));
    let frac_scaled = (frac * 10f64.powi(decimals as i32)).round() as u128;
    U256::from(whole as u128) * unit + U256::from(frac_scaled)
}

/// Scale a token amount (18 decimals)
pub fn scale_token(amount: f64) -> U256 {
    scale_to_decimals(amount, TOKEN_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_token() {
        // 1 token = 10^18
        let one = U256::from(10u64).pow(U256::from(18u64));
        assert_eq!(scale_token(1.0), one);
        // 0.5 token = 5 * 10^17
        assert_eq!(scale_token(0.5), one / U256::from(2u64));
        // 1000 tokens, as minted for testers at deploy time
        assert_eq!(scale_token(1000.0), one * U256::from(1000u64));
    }
}
