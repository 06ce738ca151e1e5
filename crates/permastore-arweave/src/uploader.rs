//! The checkpointed chunk uploader.
//!
//! An uploader walks a signed transaction through
//! `PartiallySent(cursor) -> Complete`: the header is announced before the
//! first chunk, chunks go out strictly in order, and the cursor advances
//! only after the network confirms a chunk. At any point the uploader can
//! be serialized to an [`UploadCheckpoint`]: everything needed to resume
//! except the payload bytes themselves, which the caller re-supplies.

use chrono::{DateTime, Utc};
use permastore_core::{Result, StoreError};
use serde::{Deserialize, Serialize};

use crate::gateway::{ChunkUpload, Gateway};
use crate::merkle::{self, ChunkRange, Proof};
use crate::tx::{Transaction, b64};

/// Durable snapshot of upload progress. Holds the wire header (inline data
/// cleared), the chunk cursor, and the per-chunk proofs already computed.
/// Never the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadCheckpoint {
    pub transaction: Transaction,
    pub chunk_index: usize,
    pub tx_posted: bool,
    pub chunks: Vec<ChunkRange>,
    pub proofs: Vec<Proof>,
    pub created_at: DateTime<Utc>,
}

impl UploadCheckpoint {
    pub fn is_complete(&self) -> bool {
        self.tx_posted && self.chunk_index >= self.chunks.len()
    }
}

pub struct TransactionUploader {
    tx: Transaction,
    chunks: Vec<ChunkRange>,
    proofs: Vec<Proof>,
    chunk_index: usize,
    tx_posted: bool,
}

impl TransactionUploader {
    pub fn new(tx: Transaction, tree: merkle::ChunkTree) -> Self {
        Self {
            tx,
            chunks: tree.chunks,
            proofs: tree.proofs,
            chunk_index: 0,
            tx_posted: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.tx.id
    }

    /// Count of chunks confirmed so far; also the index of the next chunk.
    pub fn chunk_index(&self) -> usize {
        self.chunk_index
    }

    pub fn total_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_complete(&self) -> bool {
        self.tx_posted && self.chunk_index >= self.chunks.len()
    }

    /// Transmit the next chunk (announcing the header first if it hasn't
    /// been posted). The cursor advances only on confirmed success, so a
    /// failed call leaves the uploader resumable at the same chunk.
    pub async fn upload_chunk(&mut self, gateway: &dyn Gateway, payload: &[u8]) -> Result<()> {
        if self.is_complete() {
            return Ok(());
        }

        if !self.tx_posted {
            gateway
                .post_transaction(&self.tx.header())
                .await
                .map_err(|e| StoreError::ChunkTransmitFailed {
                    index: self.chunk_index,
                    reason: format!("header post failed: {e}"),
                })?;
            self.tx_posted = true;
            tracing::info!("posted transaction header {}", self.tx.id);
        }

        let range = &self.chunks[self.chunk_index];
        let proof = &self.proofs[self.chunk_index];
        let upload = ChunkUpload {
            data_root: self.tx.data_root.clone(),
            data_size: self.tx.data_size.clone(),
            data_path: b64(&proof.proof),
            offset: proof.offset.to_string(),
            chunk: b64(&payload[range.min_byte_range..range.max_byte_range]),
        };

        gateway
            .post_chunk(&upload)
            .await
            .map_err(|e| StoreError::ChunkTransmitFailed {
                index: self.chunk_index,
                reason: e.to_string(),
            })?;

        self.chunk_index += 1;
        tracing::debug!(
            "chunk {}/{} confirmed for {}",
            self.chunk_index,
            self.chunks.len(),
            self.tx.id
        );
        Ok(())
    }

    /// Snapshot the current progress for durable storage.
    pub fn checkpoint(&self) -> UploadCheckpoint {
        UploadCheckpoint {
            transaction: self.tx.header(),
            chunk_index: self.chunk_index,
            tx_posted: self.tx_posted,
            chunks: self.chunks.clone(),
            proofs: self.proofs.clone(),
            created_at: Utc::now(),
        }
    }

    /// Rebuild an uploader from a checkpoint and the original payload.
    ///
    /// The checkpoint does not retain the payload, so it is recomputed into
    /// a chunk tree and cross-checked against the checkpointed data root;
    /// resume must reuse the same transaction, never rebuild it.
    pub fn from_checkpoint(checkpoint: UploadCheckpoint, payload: &[u8]) -> Result<Self> {
        let tree = merkle::generate_tree(payload)?;
        let recomputed_root = b64(&tree.data_root);
        if recomputed_root != checkpoint.transaction.data_root {
            return Err(StoreError::PayloadMismatch(format!(
                "data root {} does not match checkpointed {}",
                recomputed_root, checkpoint.transaction.data_root
            )));
        }
        if checkpoint.chunk_index > checkpoint.chunks.len()
            || checkpoint.chunks.len() != checkpoint.proofs.len()
        {
            return Err(StoreError::CheckpointCorrupt(format!(
                "inconsistent cursor {} for {} chunks / {} proofs",
                checkpoint.chunk_index,
                checkpoint.chunks.len(),
                checkpoint.proofs.len()
            )));
        }
        // The cursor only advances after the header post, so a nonzero
        // cursor without tx_posted cannot come from a real upload.
        if checkpoint.chunk_index > 0 && !checkpoint.tx_posted {
            return Err(StoreError::CheckpointCorrupt(format!(
                "cursor {} with unposted transaction header",
                checkpoint.chunk_index
            )));
        }
        Ok(Self {
            tx: checkpoint.transaction,
            chunks: checkpoint.chunks,
            proofs: checkpoint.proofs,
            chunk_index: checkpoint.chunk_index,
            tx_posted: checkpoint.tx_posted,
        })
    }
}
