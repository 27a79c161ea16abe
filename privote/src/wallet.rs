use crate::*;
use alloy_primitives::Address;
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("signature request rejected")]
    Rejected,

    #[error("{0}")]
    Failed(String),
}

/// The voter's wallet.
///
/// Signs UTF-8 messages with the Ethereum personal message scheme (EIP-191) and returns the
/// signature as `0x`-prefixed hex.
#[async_trait]
pub trait Wallet: Send + Sync {
    fn address(&self) -> Address;

    /// May wait on the voter. Rejection must be reported as [`WalletError::Rejected`].
    async fn sign_message(&self, message: &str) -> Result<String, WalletError>;
}

/// A wallet backed by an in-process secp256k1 key.
#[derive(Clone)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
}

impl LocalWallet {
    pub fn new(signer: PrivateKeySigner) -> Self {
        LocalWallet { signer }
    }

    pub fn random() -> Self {
        LocalWallet::new(PrivateKeySigner::random())
    }

    /// Hex encoded secp256k1 private key, with or without `0x`.
    pub fn from_hex(key: &str) -> Result<Self, Error> {
        let signer: PrivateKeySigner = key
            .trim()
            .parse()
            .map_err(|e| Error::InvalidKey(format!("invalid wallet key: {}", e)))?;
        Ok(LocalWallet::new(signer))
    }

    /// Sign without going through the async interface.
    pub fn sign(&self, message: &str) -> Result<String, WalletError> {
        let signature = self
            .signer
            .sign_message_sync(message.as_bytes())
            .map_err(|e| WalletError::Failed(e.to_string()))?;
        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }
}

#[async_trait]
impl Wallet for LocalWallet {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn sign_message(&self, message: &str) -> Result<String, WalletError> {
        self.sign(message)
    }
}
