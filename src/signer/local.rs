//! Local private key signer implementation

use super::RequestSigner;
use crate::builder::TypedDocument;
use alloy::primitives::{Address, Bytes};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use eyre::{Context, Result};

/// Local signer using a private key
pub struct LocalSigner {
    signer: PrivateKeySigner,
}

impl LocalSigner {
    /// Create a new LocalSigner from a private key hex string
    ///
    /// # Arguments
    ///
    /// * `private_key` - Hex-encoded private key (with or without 0x prefix)
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let signer = LocalSigner::from_private_key("0x...")?;
    /// ```
    pub fn from_private_key(private_key: impl AsRef<str>) -> Result<Self> {
        let key = private_key.as_ref();
        let key = key.strip_prefix("0x").unwrap_or(key);

        let signer: PrivateKeySigner = key.parse().context("Failed to parse private key")?;
        Ok(Self { signer })
    }

    /// Create a signer with a fresh random key
    pub fn random() -> Self {
        Self {
            signer: PrivateKeySigner::random(),
        }
    }
}

impl From<PrivateKeySigner> for LocalSigner {
    fn from(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }
}

impl RequestSigner for LocalSigner {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn sign_document(&self, document: &TypedDocument) -> Result<Bytes> {
        let signature = self
            .signer
            .sign_hash(&document.signing_hash())
            .await
            .context("Failed to sign forward request")?;

        Ok(Bytes::from(signature.as_bytes().to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_typed_document;
    use crate::contracts::ForwardRequest;
    use crate::verifier::verify;
    use alloy::primitives::U256;

    #[tokio::test]
    async fn test_signature_recovers_to_signer() {
        let signer = LocalSigner::random();
        let request = ForwardRequest {
            from: signer.address(),
            to: Address::repeat_byte(0x70),
            nonce: U256::ZERO,
            expiryBlock: U256::from(150),
            data: Bytes::new(),
        };
        let doc = build_typed_document(Address::repeat_byte(0xf0), 80001, request.clone());
        let signature = signer.sign_document(&doc).await.unwrap();

        assert_eq!(signature.len(), 65);
        assert_eq!(verify(&doc.domain, &request, &signature).unwrap(), signer.address());
    }

    #[test]
    fn test_parses_prefixed_and_bare_keys() {
        let key = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let bare = LocalSigner::from_private_key(key).unwrap();
        let prefixed = LocalSigner::from_private_key(format!("0x{key}")).unwrap();
        assert_eq!(bare.address(), prefixed.address());
        assert!(LocalSigner::from_private_key("not a key").is_err());
    }
}
