//! Transaction signing collaborator.
//!
//! Wallet and key management belong to the caller; the uploader only needs
//! a public identity and a signature over the canonical signing payload.

use jsonwebtoken::{Algorithm, EncodingKey};
use permastore_core::{Result, StoreError};
use serde::Deserialize;
use std::path::Path;

use crate::tx::b64_decode;

pub trait Signer: Send + Sync {
    /// Public identity bound into the transaction (base64url RSA modulus).
    fn owner(&self) -> &str;

    /// Sign the canonical signing payload.
    fn sign(&self, message: &[u8]) -> anyhow::Result<Vec<u8>>;
}

/// Wallet file layout: public identity plus the RSA private key in PEM.
#[derive(Deserialize)]
struct WalletFile {
    owner: String,
    private_key_pem: String,
}

/// RSA-PSS (SHA-256) signer backed by a wallet file.
pub struct RsaPssSigner {
    owner: String,
    key: EncodingKey,
}

impl RsaPssSigner {
    pub fn from_wallet_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let wallet: WalletFile = serde_json::from_str(&content)
            .map_err(|e| StoreError::InvalidWallet(format!("{}: {e}", path.display())))?;
        let key = EncodingKey::from_rsa_pem(wallet.private_key_pem.as_bytes())
            .map_err(|e| StoreError::InvalidWallet(format!("bad RSA PEM: {e}")))?;
        Ok(Self {
            owner: wallet.owner,
            key,
        })
    }
}

impl Signer for RsaPssSigner {
    fn owner(&self) -> &str {
        &self.owner
    }

    fn sign(&self, message: &[u8]) -> anyhow::Result<Vec<u8>> {
        let encoded = jsonwebtoken::crypto::sign(message, &self.key, Algorithm::PS256)?;
        Ok(b64_decode(&encoded)?)
    }
}
