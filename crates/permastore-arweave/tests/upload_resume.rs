//! End-to-end upload/resume scenarios against a recording in-process
//! gateway: interrupted uploads resume with the same identifier, each
//! chunk is transmitted exactly once per cursor value, and broken
//! checkpoints fail before any network call.

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

use permastore_arweave::gateway::{ChunkUpload, Gateway};
use permastore_arweave::merkle::MAX_CHUNK_SIZE;
use permastore_arweave::signer::Signer;
use permastore_arweave::tx::{Transaction, decode_tags};
use permastore_arweave::uploader::UploadCheckpoint;
use permastore_arweave::ArweaveClient;
use permastore_core::StoreError;
use permastore_core::checkpoint::{CheckpointStore, MemoryCheckpointStore};
use permastore_core::types::Tag;

struct StubSigner;

impl Signer for StubSigner {
    fn owner(&self) -> &str {
        // base64url("stub-owner")
        "c3R1Yi1vd25lcg"
    }

    fn sign(&self, message: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut hasher = Sha256::new();
        hasher.update(b"stub-rsa-pss");
        hasher.update(message);
        Ok(hasher.finalize().to_vec())
    }
}

#[derive(Default)]
struct MockGateway {
    price_calls: Mutex<usize>,
    anchor_calls: Mutex<usize>,
    transactions: Mutex<Vec<Transaction>>,
    chunks: Mutex<Vec<ChunkUpload>>,
    /// Fail the chunk post once this many chunks have been accepted.
    fail_at_chunk: Mutex<Option<usize>>,
}

impl MockGateway {
    fn new() -> Self {
        Self::default()
    }

    fn set_fail_at_chunk(&self, accepted: Option<usize>) {
        *self.fail_at_chunk.lock().unwrap() = accepted;
    }

    fn chunk_count(&self) -> usize {
        self.chunks.lock().unwrap().len()
    }

    fn total_calls(&self) -> usize {
        *self.price_calls.lock().unwrap()
            + *self.anchor_calls.lock().unwrap()
            + self.transactions.lock().unwrap().len()
            + self.chunk_count()
    }

    fn chunk_offsets(&self) -> Vec<usize> {
        self.chunks
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.offset.parse().unwrap())
            .collect()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn price(&self, _data_size: usize) -> anyhow::Result<u64> {
        *self.price_calls.lock().unwrap() += 1;
        Ok(1000)
    }

    async fn anchor(&self) -> anyhow::Result<String> {
        *self.anchor_calls.lock().unwrap() += 1;
        Ok(URL_SAFE_NO_PAD.encode(b"mock-anchor"))
    }

    async fn post_transaction(&self, tx: &Transaction) -> anyhow::Result<()> {
        self.transactions.lock().unwrap().push(tx.clone());
        Ok(())
    }

    async fn post_chunk(&self, chunk: &ChunkUpload) -> anyhow::Result<()> {
        let mut chunks = self.chunks.lock().unwrap();
        if let Some(limit) = *self.fail_at_chunk.lock().unwrap() {
            if chunks.len() == limit {
                anyhow::bail!("injected chunk failure");
            }
        }
        chunks.push(chunk.clone());
        Ok(())
    }

    async fn transaction_data(&self, id: &str) -> anyhow::Result<Vec<u8>> {
        let transactions = self.transactions.lock().unwrap();
        let tx = transactions
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| anyhow::anyhow!("unknown transaction {id}"))?;

        let mut stored: Vec<&ChunkUpload> = Vec::new();
        let chunks = self.chunks.lock().unwrap();
        for chunk in chunks.iter() {
            if chunk.data_root == tx.data_root {
                stored.push(chunk);
            }
        }
        stored.sort_by_key(|c| c.offset.parse::<usize>().unwrap());

        let mut data = Vec::new();
        for chunk in stored {
            data.extend_from_slice(&URL_SAFE_NO_PAD.decode(&chunk.chunk)?);
        }
        Ok(data)
    }

    async fn transaction_tags(&self, id: &str) -> anyhow::Result<Vec<Tag>> {
        let transactions = self.transactions.lock().unwrap();
        let tx = transactions
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| anyhow::anyhow!("unknown transaction {id}"))?;
        Ok(decode_tags(&tx.tags)?)
    }
}

fn client(
    gateway: &Arc<MockGateway>,
    store: &Arc<MemoryCheckpointStore>,
    chunks_per_pass: Option<usize>,
) -> ArweaveClient {
    ArweaveClient::new(
        gateway.clone() as Arc<dyn Gateway>,
        Arc::new(StubSigner),
        store.clone() as Arc<dyn CheckpointStore>,
    )
    .with_chunks_per_pass(chunks_per_pass)
}

fn five_chunk_payload() -> Vec<u8> {
    (0..MAX_CHUNK_SIZE * 5).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn single_pass_upload_completes_and_round_trips() {
    let gateway = Arc::new(MockGateway::new());
    let store = Arc::new(MemoryCheckpointStore::new());
    let client = client(&gateway, &store, None);

    let payload = b"well under one chunk".to_vec();
    let tags = vec![Tag::new("Content-Type", "text/plain")];

    let receipt = client.begin_upload(&payload, &tags, "job-1").await.unwrap();
    assert!(receipt.is_complete());
    assert_eq!(receipt.total_chunks, 1);
    assert_eq!(receipt.chunks_sent, 1);

    // Complete on the first transmission: nothing checkpointed.
    assert!(store.load("job-1").await.unwrap().is_none());

    // What was stored matches what was submitted.
    assert_eq!(client.download(&receipt.id).await.unwrap(), payload);
    assert_eq!(client.tags(&receipt.id).await.unwrap(), tags);
}

#[tokio::test]
async fn interrupted_upload_resumes_with_same_id() {
    let gateway = Arc::new(MockGateway::new());
    let store = Arc::new(MemoryCheckpointStore::new());
    let client = client(&gateway, &store, Some(2));

    let payload = five_chunk_payload();
    let receipt = client
        .begin_upload(&payload, &[], "job-resume")
        .await
        .unwrap();
    assert!(!receipt.is_complete());
    assert_eq!(receipt.total_chunks, 5);
    assert_eq!(receipt.chunks_sent, 2);
    assert_eq!(gateway.chunk_count(), 2);

    let bytes = store.load("job-resume").await.unwrap().unwrap();
    let checkpoint: UploadCheckpoint = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(checkpoint.chunk_index, 2);
    assert!(checkpoint.tx_posted);

    let id = client.resume_upload(&payload, "job-resume").await.unwrap();
    assert_eq!(id, receipt.id);
    assert_eq!(gateway.chunk_count(), 5);
    assert!(store.load("job-resume").await.unwrap().is_none());

    // Exactly once per cursor value: all offsets distinct and increasing.
    let offsets = gateway.chunk_offsets();
    let mut sorted = offsets.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), 5);
    assert_eq!(offsets, sorted);

    assert_eq!(client.download(&id).await.unwrap(), payload);
}

#[tokio::test]
async fn identifier_matches_uninterrupted_upload() {
    let payload = five_chunk_payload();

    let gateway_a = Arc::new(MockGateway::new());
    let store_a = Arc::new(MemoryCheckpointStore::new());
    let one_shot = client(&gateway_a, &store_a, None)
        .begin_upload(&payload, &[], "a")
        .await
        .unwrap();

    let gateway_b = Arc::new(MockGateway::new());
    let store_b = Arc::new(MemoryCheckpointStore::new());
    let interrupted = client(&gateway_b, &store_b, Some(2));
    let receipt = interrupted.begin_upload(&payload, &[], "b").await.unwrap();
    let resumed_id = interrupted.resume_upload(&payload, "b").await.unwrap();

    assert_eq!(receipt.id, resumed_id);
    assert_eq!(one_shot.id, resumed_id);
}

#[tokio::test]
async fn resume_of_completed_checkpoint_transmits_nothing() {
    let gateway = Arc::new(MockGateway::new());
    let store = Arc::new(MemoryCheckpointStore::new());
    let client = client(&gateway, &store, Some(2));

    let payload = five_chunk_payload();
    let receipt = client.begin_upload(&payload, &[], "job-done").await.unwrap();

    // Mark the checkpoint complete by hand.
    let bytes = store.load("job-done").await.unwrap().unwrap();
    let mut checkpoint: UploadCheckpoint = serde_json::from_slice(&bytes).unwrap();
    checkpoint.chunk_index = checkpoint.chunks.len();
    checkpoint.tx_posted = true;
    store
        .save("job-done", &serde_json::to_vec(&checkpoint).unwrap())
        .await
        .unwrap();

    let sent_before = gateway.chunk_count();
    let id = client.resume_upload(&payload, "job-done").await.unwrap();
    assert_eq!(id, receipt.id);
    assert_eq!(gateway.chunk_count(), sent_before);
    assert!(store.load("job-done").await.unwrap().is_none());
}

#[tokio::test]
async fn resume_rejects_full_cursor_with_unposted_header() {
    let gateway = Arc::new(MockGateway::new());
    let store = Arc::new(MemoryCheckpointStore::new());
    let client = client(&gateway, &store, Some(2));

    let payload = five_chunk_payload();
    client.begin_upload(&payload, &[], "job-tamper").await.unwrap();
    let sent_before = gateway.chunk_count();

    // A cursor at the end with the header never posted cannot come from a
    // real upload; resume must surface it as corruption, not panic.
    let bytes = store.load("job-tamper").await.unwrap().unwrap();
    let mut checkpoint: UploadCheckpoint = serde_json::from_slice(&bytes).unwrap();
    checkpoint.chunk_index = checkpoint.chunks.len();
    checkpoint.tx_posted = false;
    store
        .save("job-tamper", &serde_json::to_vec(&checkpoint).unwrap())
        .await
        .unwrap();

    let result = client.resume_upload(&payload, "job-tamper").await;
    assert!(matches!(result, Err(StoreError::CheckpointCorrupt(_))));
    assert_eq!(gateway.chunk_count(), sent_before);
}

#[tokio::test]
async fn empty_payload_rejected_before_any_network_call() {
    let gateway = Arc::new(MockGateway::new());
    let store = Arc::new(MemoryCheckpointStore::new());
    let client = client(&gateway, &store, None);

    let result = client.begin_upload(&[], &[], "job-empty").await;
    assert!(matches!(result, Err(StoreError::EmptyPayload)));
    assert_eq!(gateway.total_calls(), 0);
}

#[tokio::test]
async fn corrupt_checkpoint_fails_before_any_network_call() {
    let gateway = Arc::new(MockGateway::new());
    let store = Arc::new(MemoryCheckpointStore::new());
    let client = client(&gateway, &store, None);

    store.save("job-bad", b"{ definitely not json").await.unwrap();

    let result = client.resume_upload(&five_chunk_payload(), "job-bad").await;
    assert!(matches!(result, Err(StoreError::CheckpointCorrupt(_))));
    assert_eq!(gateway.total_calls(), 0);
}

#[tokio::test]
async fn missing_checkpoint_is_distinct_condition() {
    let gateway = Arc::new(MockGateway::new());
    let store = Arc::new(MemoryCheckpointStore::new());
    let client = client(&gateway, &store, None);

    let result = client.resume_upload(b"payload", "never-started").await;
    assert!(matches!(result, Err(StoreError::CheckpointNotFound(_))));
    assert_eq!(gateway.total_calls(), 0);
}

#[tokio::test]
async fn resume_with_wrong_payload_sends_nothing() {
    let gateway = Arc::new(MockGateway::new());
    let store = Arc::new(MemoryCheckpointStore::new());
    let client = client(&gateway, &store, Some(2));

    let payload = five_chunk_payload();
    client.begin_upload(&payload, &[], "job-swap").await.unwrap();
    let sent_before = gateway.chunk_count();

    let mut wrong = payload.clone();
    wrong[0] ^= 1;
    let result = client.resume_upload(&wrong, "job-swap").await;
    assert!(matches!(result, Err(StoreError::PayloadMismatch(_))));
    assert_eq!(gateway.chunk_count(), sent_before);

    // The checkpoint survives a rejected resume; the right payload finishes.
    let id = client.resume_upload(&payload, "job-swap").await.unwrap();
    assert_eq!(client.download(&id).await.unwrap(), payload);
}

#[tokio::test]
async fn transmit_failure_persists_last_good_cursor() {
    let gateway = Arc::new(MockGateway::new());
    let store = Arc::new(MemoryCheckpointStore::new());
    let client = client(&gateway, &store, None);

    let payload = five_chunk_payload();
    gateway.set_fail_at_chunk(Some(1));

    let result = client.begin_upload(&payload, &[], "job-fail").await;
    match result {
        Err(StoreError::ChunkTransmitFailed { index, .. }) => assert_eq!(index, 1),
        other => panic!("expected ChunkTransmitFailed, got {other:?}"),
    }

    let bytes = store.load("job-fail").await.unwrap().unwrap();
    let checkpoint: UploadCheckpoint = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(checkpoint.chunk_index, 1);

    gateway.set_fail_at_chunk(None);
    let id = client.resume_upload(&payload, "job-fail").await.unwrap();
    assert_eq!(gateway.chunk_count(), 5);
    assert_eq!(client.download(&id).await.unwrap(), payload);
    assert!(store.load("job-fail").await.unwrap().is_none());
}
