//! Forwarder contract bindings

use alloy::sol;

sol! {
    /// A meta-transaction: `from` asks the Forwarder to call `to` with `data`
    ///
    /// This one declaration is both the ABI tuple passed to
    /// `executeTransaction` and the EIP-712 struct the sender signs.
    #[derive(Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
    struct ForwardRequest {
        address from;
        address to;
        uint256 nonce;
        uint256 expiryBlock;   // must be > block.number at execution
        bytes data;            // selector ++ abi-encoded arguments
    }

    /// Forwarder contract interface
    #[sol(rpc)]
    interface IForwarder {
        /// Current valid nonce for a sender
        function getNonce(address from) external view returns (uint256);

        /// Verify and execute each request independently
        ///
        /// Items with a bad signature, stale nonce or past expiry are skipped
        /// (false) without reverting their siblings.
        function executeTransaction(
            ForwardRequest[] calldata requests,
            bytes[] calldata signatures
        ) external returns (bool[] memory);

        /// Emitted once per batch, positionally matched to the input
        event CallResult(ForwardRequest[] requests, bool[] results);
    }
}
