//! EIP-712 signature verification for forward requests

use crate::constants::{DOMAIN_NAME, DOMAIN_VERSION};
use crate::contracts::ForwardRequest;
use crate::error::RelayError;
use alloy::primitives::{Address, Signature, U256};
use alloy::sol_types::{Eip712Domain, SolStruct};

/// The Forwarder's fixed signing domain on a given deployment
pub fn forwarder_domain(chain_id: u64, forwarder: Address) -> Eip712Domain {
    Eip712Domain::new(
        Some(DOMAIN_NAME.into()),
        Some(DOMAIN_VERSION.into()),
        Some(U256::from(chain_id)),
        Some(forwarder),
        None,
    )
}

/// Recover the signer of `request` and check it is `request.from`
///
/// Returns the recovered address. Nothing here checks nonce or expiry; the
/// Forwarder does that at execution time.
pub fn verify(
    domain: &Eip712Domain,
    request: &ForwardRequest,
    signature: &[u8],
) -> Result<Address, RelayError> {
    let invalid = |recovered| RelayError::InvalidSignature {
        expected: request.from,
        recovered,
    };

    let signature = Signature::try_from(signature).map_err(|_| invalid(None))?;
    let hash = request.eip712_signing_hash(domain);
    let recovered = signature
        .recover_address_from_prehash(&hash)
        .map_err(|_| invalid(None))?;

    if recovered != request.from {
        return Err(invalid(Some(recovered)));
    }
    Ok(recovered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, Bytes};
    use alloy::signers::local::PrivateKeySigner;
    use alloy::signers::SignerSync;

    const FORWARDER: Address = address!("5fbdb2315678afecb367f032d93f642f64180aa3");

    fn request(from: Address) -> ForwardRequest {
        ForwardRequest {
            from,
            to: address!("e7f1725e7734ce288f8367e1bb143e90bb3f0512"),
            nonce: U256::ZERO,
            expiryBlock: U256::from(100),
            data: Bytes::from(vec![0xa9, 0x05, 0x9c, 0xbb]),
        }
    }

    fn sign(signer: &PrivateKeySigner, domain: &Eip712Domain, req: &ForwardRequest) -> Vec<u8> {
        let hash = req.eip712_signing_hash(domain);
        signer.sign_hash_sync(&hash).unwrap().as_bytes().to_vec()
    }

    #[test]
    fn test_recovers_sender() {
        let signer = PrivateKeySigner::random();
        let domain = forwarder_domain(80001, FORWARDER);
        let req = request(signer.address());
        let sig = sign(&signer, &domain, &req);
        assert_eq!(verify(&domain, &req, &sig).unwrap(), signer.address());
    }

    #[test]
    fn test_rejects_other_signer() {
        let signer = PrivateKeySigner::random();
        let impostor = PrivateKeySigner::random();
        let domain = forwarder_domain(80001, FORWARDER);
        let req = request(signer.address());
        let sig = sign(&impostor, &domain, &req);
        match verify(&domain, &req, &sig) {
            Err(RelayError::InvalidSignature { recovered, .. }) => {
                assert_eq!(recovered, Some(impostor.address()))
            }
            other => panic!("expected InvalidSignature, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_wrong_chain() {
        let signer = PrivateKeySigner::random();
        let req = request(signer.address());
        let sig = sign(&signer, &forwarder_domain(1, FORWARDER), &req);
        assert!(verify(&forwarder_domain(80001, FORWARDER), &req, &sig).is_err());
    }

    #[test]
    fn test_rejects_tampered_request() {
        let signer = PrivateKeySigner::random();
        let domain = forwarder_domain(80001, FORWARDER);
        let mut req = request(signer.address());
        let sig = sign(&signer, &domain, &req);
        req.nonce = U256::from(1);
        assert!(verify(&domain, &req, &sig).is_err());
    }

    #[test]
    fn test_rejects_malformed_signature() {
        let domain = forwarder_domain(80001, FORWARDER);
        let req = request(Address::repeat_byte(1));
        assert!(matches!(
            verify(&domain, &req, &[0u8; 12]),
            Err(RelayError::InvalidSignature { recovered: None, .. })
        ));
    }
}
