//! Format-2 data transaction: assembly, tag encoding, canonical signing
//! payload, and identifier derivation.
//!
//! The identifier is the network's addressing convention:
//! `id = base64url(sha256(signature_bytes))`. It is fixed the moment the
//! transaction is signed and never changes across an interrupted and
//! resumed upload.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use permastore_core::types::Tag;
use permastore_core::{Result, StoreError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::deephash::{DeepHashItem, deep_hash};
use crate::signer::Signer;

pub(crate) fn b64(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

pub(crate) fn b64_decode(s: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(s)
}

/// A tag as it appears on the wire: base64url name and value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedTag {
    pub name: String,
    pub value: String,
}

pub fn encode_tags(tags: &[Tag]) -> Vec<EncodedTag> {
    tags.iter()
        .map(|t| EncodedTag {
            name: b64(t.name.as_bytes()),
            value: b64(t.value.as_bytes()),
        })
        .collect()
}

pub fn decode_tags(tags: &[EncodedTag]) -> Result<Vec<Tag>> {
    tags.iter()
        .map(|t| {
            let name = b64_decode(&t.name)
                .map_err(|e| StoreError::RetrievalFailed(format!("invalid tag name: {e}")))?;
            let value = b64_decode(&t.value)
                .map_err(|e| StoreError::RetrievalFailed(format!("invalid tag value: {e}")))?;
            Ok(Tag {
                name: String::from_utf8(name)
                    .map_err(|e| StoreError::RetrievalFailed(format!("tag name not utf-8: {e}")))?,
                value: String::from_utf8(value).map_err(|e| {
                    StoreError::RetrievalFailed(format!("tag value not utf-8: {e}"))
                })?,
            })
        })
        .collect()
}

/// A format-2 transaction, serialized field-for-field as the network
/// expects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub format: u8,
    pub id: String,
    pub last_tx: String,
    pub owner: String,
    pub tags: Vec<EncodedTag>,
    pub target: String,
    pub quantity: String,
    pub data_root: String,
    pub data_size: String,
    pub data: String,
    pub reward: String,
    pub signature: String,
}

impl Transaction {
    /// Assemble an unsigned data transaction: encoded tags, base64 payload,
    /// size, reward, freshness anchor, and the signer's public identity.
    pub fn assemble(
        payload: &[u8],
        tags: &[Tag],
        reward: u64,
        anchor: String,
        owner: String,
        data_root: &[u8; 32],
    ) -> Self {
        Self {
            format: 2,
            id: String::new(),
            last_tx: anchor,
            owner,
            tags: encode_tags(tags),
            target: String::new(),
            quantity: "0".to_string(),
            data_root: b64(data_root),
            data_size: payload.len().to_string(),
            data: b64(payload),
            reward: reward.to_string(),
            signature: String::new(),
        }
    }

    /// Canonical signing payload: the deep hash of
    /// `[format, owner, target, quantity, reward, anchor, tags, size, root]`.
    pub fn signature_data(&self) -> Result<[u8; 48]> {
        let decode = |field: &str, what: &str| {
            b64_decode(field)
                .map_err(|e| StoreError::SigningFailed(format!("invalid {what} encoding: {e}")))
        };

        let tag_items = self
            .tags
            .iter()
            .map(|t| {
                Ok(DeepHashItem::List(vec![
                    DeepHashItem::Blob(decode(&t.name, "tag name")?),
                    DeepHashItem::Blob(decode(&t.value, "tag value")?),
                ]))
            })
            .collect::<Result<Vec<_>>>()?;

        let item = DeepHashItem::List(vec![
            DeepHashItem::blob(self.format.to_string().into_bytes()),
            DeepHashItem::Blob(decode(&self.owner, "owner")?),
            DeepHashItem::Blob(decode(&self.target, "target")?),
            DeepHashItem::blob(self.quantity.as_bytes().to_vec()),
            DeepHashItem::blob(self.reward.as_bytes().to_vec()),
            DeepHashItem::Blob(decode(&self.last_tx, "anchor")?),
            DeepHashItem::List(tag_items),
            DeepHashItem::blob(self.data_size.as_bytes().to_vec()),
            DeepHashItem::Blob(decode(&self.data_root, "data root")?),
        ]);

        Ok(deep_hash(&item))
    }

    /// Sign and derive the identifier from the signature bytes.
    pub fn sign(&mut self, signer: &dyn Signer) -> Result<()> {
        let message = self.signature_data()?;
        let signature = signer
            .sign(&message)
            .map_err(|e| StoreError::SigningFailed(e.to_string()))?;
        self.id = b64(&Sha256::digest(&signature));
        self.signature = b64(&signature);
        Ok(())
    }

    /// Wire header: the transaction with the inline data field cleared.
    /// The payload itself travels as chunks, bound by `data_root`.
    pub fn header(&self) -> Self {
        let mut header = self.clone();
        header.data = String::new();
        header
    }
}
