//! High-level client: wires the gateway, signer, and checkpoint store into
//! the begin/resume upload operations plus pass-through retrieval.

use std::sync::Arc;

use permastore_core::checkpoint::CheckpointStore;
use permastore_core::types::{Tag, UploadReceipt};
use permastore_core::{Result, StoreError};

use crate::gateway::Gateway;
use crate::merkle;
use crate::signer::Signer;
use crate::tx::Transaction;
use crate::uploader::{TransactionUploader, UploadCheckpoint};

pub struct ArweaveClient {
    gateway: Arc<dyn Gateway>,
    signer: Arc<dyn Signer>,
    checkpoints: Arc<dyn CheckpointStore>,
    /// Chunks transmitted per pass before checkpointing; `None` runs a
    /// pass to completion.
    chunks_per_pass: Option<usize>,
}

impl ArweaveClient {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        signer: Arc<dyn Signer>,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            gateway,
            signer,
            checkpoints,
            chunks_per_pass: None,
        }
    }

    pub fn with_chunks_per_pass(mut self, limit: Option<usize>) -> Self {
        self.chunks_per_pass = limit;
        self
    }

    /// Price, anchor, sign, and start transmitting a payload.
    ///
    /// The returned receipt carries the final transaction identifier even
    /// when the pass limit left the upload incomplete; progress is then
    /// persisted under `checkpoint_key` for [`resume_upload`].
    ///
    /// [`resume_upload`]: ArweaveClient::resume_upload
    pub async fn begin_upload(
        &self,
        payload: &[u8],
        tags: &[Tag],
        checkpoint_key: &str,
    ) -> Result<UploadReceipt> {
        if payload.is_empty() {
            return Err(StoreError::EmptyPayload);
        }

        let reward = self
            .gateway
            .price(payload.len())
            .await
            .map_err(|e| StoreError::PricingUnavailable(e.to_string()))?;
        let anchor = self
            .gateway
            .anchor()
            .await
            .map_err(|e| StoreError::AnchorUnavailable(e.to_string()))?;

        let tree = merkle::generate_tree(payload)?;
        let mut tx = Transaction::assemble(
            payload,
            tags,
            reward,
            anchor,
            self.signer.owner().to_string(),
            &tree.data_root,
        );
        tx.sign(self.signer.as_ref())?;
        tracing::info!(
            "assembled transaction {} ({} bytes, {} chunks, reward {})",
            tx.id,
            payload.len(),
            tree.chunks.len(),
            reward
        );

        let mut uploader = TransactionUploader::new(tx, tree);
        let limit = self.chunks_per_pass.unwrap_or(usize::MAX);
        self.transmit(&mut uploader, payload, limit, checkpoint_key)
            .await?;

        Ok(UploadReceipt {
            id: uploader.id().to_string(),
            chunks_sent: uploader.chunk_index(),
            total_chunks: uploader.total_chunks(),
        })
    }

    /// Resume a checkpointed upload to completion with the same payload
    /// bytes originally submitted. Returns the unchanged identifier.
    pub async fn resume_upload(&self, payload: &[u8], checkpoint_key: &str) -> Result<String> {
        let bytes = self
            .checkpoints
            .load(checkpoint_key)
            .await
            .map_err(|e| StoreError::CheckpointIo(e.to_string()))?
            .ok_or_else(|| StoreError::CheckpointNotFound(checkpoint_key.to_string()))?;

        let checkpoint: UploadCheckpoint = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::CheckpointCorrupt(e.to_string()))?;

        let mut uploader = TransactionUploader::from_checkpoint(checkpoint, payload)?;
        if uploader.is_complete() {
            tracing::info!("upload {} already complete", uploader.id());
            self.delete_checkpoint(checkpoint_key).await?;
            return Ok(uploader.id().to_string());
        }

        tracing::info!(
            "resuming upload {} at chunk {}/{}",
            uploader.id(),
            uploader.chunk_index(),
            uploader.total_chunks()
        );
        self.transmit(&mut uploader, payload, usize::MAX, checkpoint_key)
            .await?;
        Ok(uploader.id().to_string())
    }

    /// Fetch the stored payload for a transaction.
    pub async fn download(&self, id: &str) -> Result<Vec<u8>> {
        self.gateway
            .transaction_data(id)
            .await
            .map_err(|e| StoreError::RetrievalFailed(e.to_string()))
    }

    /// Fetch a transaction's tags, decoded to plaintext name/value pairs.
    pub async fn tags(&self, id: &str) -> Result<Vec<Tag>> {
        self.gateway
            .transaction_tags(id)
            .await
            .map_err(|e| StoreError::RetrievalFailed(e.to_string()))
    }

    /// Drive the uploader for at most `limit` chunks. Completion deletes
    /// the checkpoint; anything short of it (pass limit reached or a
    /// transmit failure) persists the highest confirmed cursor.
    async fn transmit(
        &self,
        uploader: &mut TransactionUploader,
        payload: &[u8],
        limit: usize,
        checkpoint_key: &str,
    ) -> Result<()> {
        let mut sent = 0usize;
        while !uploader.is_complete() && sent < limit {
            if let Err(e) = uploader.upload_chunk(self.gateway.as_ref(), payload).await {
                self.save_checkpoint(uploader, checkpoint_key).await?;
                return Err(e);
            }
            sent += 1;
        }

        if uploader.is_complete() {
            self.delete_checkpoint(checkpoint_key).await?;
            tracing::info!("upload {} complete", uploader.id());
        } else {
            self.save_checkpoint(uploader, checkpoint_key).await?;
        }
        Ok(())
    }

    async fn save_checkpoint(
        &self,
        uploader: &TransactionUploader,
        checkpoint_key: &str,
    ) -> Result<()> {
        let bytes = serde_json::to_vec(&uploader.checkpoint())?;
        self.checkpoints
            .save(checkpoint_key, &bytes)
            .await
            .map_err(|e| StoreError::CheckpointIo(e.to_string()))?;
        tracing::info!(
            "checkpointed upload {} at chunk {}/{}",
            uploader.id(),
            uploader.chunk_index(),
            uploader.total_chunks()
        );
        Ok(())
    }

    async fn delete_checkpoint(&self, checkpoint_key: &str) -> Result<()> {
        self.checkpoints
            .delete(checkpoint_key)
            .await
            .map_err(|e| StoreError::CheckpointIo(e.to_string()))
    }
}
