//! Token operations a sender can ask the Forwarder to perform

use crate::contracts::IERC20;
use crate::error::RelayError;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;

/// One call against the recipient token, selected when the request is built
///
/// The encoded call never carries the sender: the token reads it from the
/// Forwarder-appended calldata, so `Transfer` moves the sender's own tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Move `amount` of the sender's tokens to `to`
    Transfer { to: Address, amount: U256 },
    /// Allow `spender` to move up to `amount` of the sender's tokens
    Approve { spender: Address, amount: U256 },
    /// `caller` moves `owner`'s tokens to `to` under a prior allowance
    TransferFrom {
        caller: Address,
        owner: Address,
        to: Address,
        amount: U256,
    },
}

impl Operation {
    /// Create a transfer
    pub fn transfer(to: Address, amount: U256) -> Self {
        Self::Transfer { to, amount }
    }

    /// Create an approval
    pub fn approve(spender: Address, amount: U256) -> Self {
        Self::Approve { spender, amount }
    }

    /// Create a delegated transfer
    pub fn transfer_from(caller: Address, owner: Address, to: Address, amount: U256) -> Self {
        Self::TransferFrom {
            caller,
            owner,
            to,
            amount,
        }
    }

    /// Canonical signature the selector is derived from
    pub fn signature(&self) -> &'static str {
        match self {
            Self::Transfer { .. } => IERC20::transferCall::SIGNATURE,
            Self::Approve { .. } => IERC20::approveCall::SIGNATURE,
            Self::TransferFrom { .. } => IERC20::transferFromCall::SIGNATURE,
        }
    }

    /// 4-byte selector, `keccak256(signature)[..4]`
    pub fn selector(&self) -> [u8; 4] {
        match self {
            Self::Transfer { .. } => IERC20::transferCall::SELECTOR,
            Self::Approve { .. } => IERC20::approveCall::SELECTOR,
            Self::TransferFrom { .. } => IERC20::transferFromCall::SELECTOR,
        }
    }

    /// Check arguments for a request signed by `sender`
    pub fn validate(&self, sender: Address) -> Result<(), RelayError> {
        match self {
            Self::Transfer { to, .. } => non_zero(*to, "transfer recipient"),
            Self::Approve { spender, .. } => non_zero(*spender, "approval spender"),
            Self::TransferFrom {
                caller, owner, to, ..
            } => {
                if owner == caller {
                    return Err(RelayError::MissingOwner { caller: *caller });
                }
                if *caller != sender {
                    return Err(RelayError::InvalidArgument(format!(
                        "transferFrom caller {caller} is not the signer {sender}"
                    )));
                }
                non_zero(*owner, "transferFrom owner")?;
                non_zero(*to, "transferFrom recipient")
            }
        }
    }

    /// Calldata: selector followed by the abi-encoded arguments
    pub fn encode(&self) -> Bytes {
        let data = match self {
            Self::Transfer { to, amount } => IERC20::transferCall {
                to: *to,
                amount: *amount,
            }
            .abi_encode(),
            Self::Approve { spender, amount } => IERC20::approveCall {
                spender: *spender,
                amount: *amount,
            }
            .abi_encode(),
            Self::TransferFrom {
                owner, to, amount, ..
            } => IERC20::transferFromCall {
                from: *owner,
                to: *to,
                amount: *amount,
            }
            .abi_encode(),
        };
        Bytes::from(data)
    }

    /// Decode calldata sent by `caller` back into an operation
    pub fn decode(caller: Address, data: &[u8]) -> Option<Self> {
        let selector: [u8; 4] = data.get(..4)?.try_into().ok()?;
        if selector == IERC20::transferCall::SELECTOR {
            let call = IERC20::transferCall::abi_decode(data).ok()?;
            Some(Self::transfer(call.to, call.amount))
        } else if selector == IERC20::approveCall::SELECTOR {
            let call = IERC20::approveCall::abi_decode(data).ok()?;
            Some(Self::approve(call.spender, call.amount))
        } else if selector == IERC20::transferFromCall::SELECTOR {
            let call = IERC20::transferFromCall::abi_decode(data).ok()?;
            Some(Self::transfer_from(caller, call.from, call.to, call.amount))
        } else {
            None
        }
    }
}

fn non_zero(address: Address, what: &str) -> Result<(), RelayError> {
    if address.is_zero() {
        return Err(RelayError::InvalidArgument(format!("{what} is the zero address")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, hex, keccak256};

    const ALICE: Address = address!("00000000000000000000000000000000000000a1");
    const BOB: Address = address!("00000000000000000000000000000000000000b0");

    #[test]
    fn test_selectors_match_canonical_signatures() {
        for op in [
            Operation::transfer(BOB, U256::from(1)),
            Operation::approve(BOB, U256::from(1)),
            Operation::transfer_from(BOB, ALICE, BOB, U256::from(1)),
        ] {
            let expected = &keccak256(op.signature().as_bytes())[..4];
            assert_eq!(&op.selector()[..], expected);
            assert_eq!(&op.encode()[..4], expected);
        }
        assert_eq!(Operation::transfer(BOB, U256::ZERO).selector(), hex!("a9059cbb"));
        assert_eq!(Operation::approve(BOB, U256::ZERO).selector(), hex!("095ea7b3"));
    }

    #[test]
    fn test_transfer_from_encodes_owner_not_caller() {
        let op = Operation::transfer_from(BOB, ALICE, BOB, U256::from(7));
        let call = IERC20::transferFromCall::abi_decode(&op.encode()).unwrap();
        assert_eq!(call.from, ALICE);
        assert_eq!(call.to, BOB);
        assert_eq!(call.amount, U256::from(7));
        assert_eq!(Operation::decode(BOB, &op.encode()), Some(op));
    }

    #[test]
    fn test_owner_equal_to_caller_is_missing_owner() {
        let op = Operation::transfer_from(ALICE, ALICE, BOB, U256::from(1));
        assert!(matches!(
            op.validate(ALICE),
            Err(RelayError::MissingOwner { caller }) if caller == ALICE
        ));
    }

    #[test]
    fn test_caller_must_be_signer() {
        let op = Operation::transfer_from(BOB, ALICE, BOB, U256::from(1));
        assert!(matches!(op.validate(ALICE), Err(RelayError::InvalidArgument(_))));
        assert!(op.validate(BOB).is_ok());
    }

    #[test]
    fn test_zero_counterparty_rejected() {
        let op = Operation::transfer(Address::ZERO, U256::from(1));
        assert!(matches!(op.validate(ALICE), Err(RelayError::InvalidArgument(_))));
    }

    #[test]
    fn test_decode_unknown_selector() {
        assert_eq!(Operation::decode(ALICE, &hex!("deadbeef")), None);
        assert_eq!(Operation::decode(ALICE, &[0x01]), None);
    }
}
