use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    // IO
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Config
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found at {0}, run `permastore init` first")]
    ConfigNotFound(String),

    // Upload
    #[error("Payload is empty, nothing to upload")]
    EmptyPayload,

    #[error("Pricing service unavailable: {0}")]
    PricingUnavailable(String),

    #[error("Transaction anchor unavailable: {0}")]
    AnchorUnavailable(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Chunk {index} transmit failed: {reason}")]
    ChunkTransmitFailed { index: usize, reason: String },

    // Checkpoint
    #[error("Checkpoint is corrupt: {0}")]
    CheckpointCorrupt(String),

    #[error("No checkpoint found for key {0}")]
    CheckpointNotFound(String),

    #[error("Checkpoint store failure: {0}")]
    CheckpointIo(String),

    #[error("Payload does not match checkpointed transaction: {0}")]
    PayloadMismatch(String),

    // Retrieval
    #[error("Retrieval failed: {0}")]
    RetrievalFailed(String),

    // Wallet
    #[error("Invalid wallet file: {0}")]
    InvalidWallet(String),

    // Serialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(String),

    #[error("TOML serialization error: {0}")]
    TomlSer(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
