//! Gateway collaborator: the network endpoints the uploader depends on.
//! Chunk posting must be idempotent per (transaction, chunk-index) pair:
//! the resume path relies on it.

use anyhow::Context;
use async_trait::async_trait;
use permastore_core::types::Tag;
use serde::{Deserialize, Serialize};

use crate::tx::{EncodedTag, Transaction, b64_decode, decode_tags};

/// One chunk as posted to the network, with its merkle proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkUpload {
    pub data_root: String,
    pub data_size: String,
    pub data_path: String,
    pub offset: String,
    pub chunk: String,
}

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Transmission cost for a payload of the given size.
    async fn price(&self, data_size: usize) -> anyhow::Result<u64>;

    /// Freshness anchor binding a transaction against replay.
    async fn anchor(&self) -> anyhow::Result<String>;

    /// Announce a signed transaction header.
    async fn post_transaction(&self, tx: &Transaction) -> anyhow::Result<()>;

    /// Transmit one chunk with its proof.
    async fn post_chunk(&self, chunk: &ChunkUpload) -> anyhow::Result<()>;

    /// Fetch the stored payload of a transaction.
    async fn transaction_data(&self, id: &str) -> anyhow::Result<Vec<u8>>;

    /// Fetch a transaction's tags, decoded to plaintext.
    async fn transaction_tags(&self, id: &str) -> anyhow::Result<Vec<Tag>>;
}

/// HTTP gateway client.
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn price(&self, data_size: usize) -> anyhow::Result<u64> {
        let body = self
            .http
            .get(self.url(&format!("price/{data_size}")))
            .send()
            .await
            .context("pricing request failed")?
            .error_for_status()?
            .text()
            .await?;
        body.trim()
            .parse::<u64>()
            .with_context(|| format!("unparseable price response: {body:?}"))
    }

    async fn anchor(&self) -> anyhow::Result<String> {
        let anchor = self
            .http
            .get(self.url("tx_anchor"))
            .send()
            .await
            .context("anchor request failed")?
            .error_for_status()?
            .text()
            .await?;
        Ok(anchor.trim().to_string())
    }

    async fn post_transaction(&self, tx: &Transaction) -> anyhow::Result<()> {
        self.http
            .post(self.url("tx"))
            .json(tx)
            .send()
            .await
            .context("transaction post failed")?
            .error_for_status()?;
        Ok(())
    }

    async fn post_chunk(&self, chunk: &ChunkUpload) -> anyhow::Result<()> {
        self.http
            .post(self.url("chunk"))
            .json(chunk)
            .send()
            .await
            .context("chunk post failed")?
            .error_for_status()?;
        Ok(())
    }

    async fn transaction_data(&self, id: &str) -> anyhow::Result<Vec<u8>> {
        let body = self
            .http
            .get(self.url(&format!("tx/{id}/data")))
            .send()
            .await
            .context("data request failed")?
            .error_for_status()?
            .text()
            .await?;
        b64_decode(body.trim()).context("transaction data is not valid base64url")
    }

    async fn transaction_tags(&self, id: &str) -> anyhow::Result<Vec<Tag>> {
        let encoded: Vec<EncodedTag> = self
            .http
            .get(self.url(&format!("tx/{id}/tags")))
            .send()
            .await
            .context("tags request failed")?
            .error_for_status()?
            .json()
            .await?;
        Ok(decode_tags(&encoded)?)
    }
}
