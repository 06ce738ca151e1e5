pub mod config;
pub mod init;
pub mod ipfs;
pub mod resume;
pub mod retrieve;
pub mod upload;

use std::path::Path;
use std::sync::Arc;

use permastore_arweave::{ArweaveClient, HttpGateway, RsaPssSigner};
use permastore_core::checkpoint::FileCheckpointStore;
use permastore_core::config::StoreConfig;
use sha2::{Digest, Sha256};

pub(crate) fn load_config(base_dir: &Path) -> anyhow::Result<StoreConfig> {
    Ok(StoreConfig::load(&StoreConfig::default_path(base_dir))?)
}

pub(crate) fn arweave_client(
    config: &StoreConfig,
    chunks_per_pass: Option<usize>,
) -> anyhow::Result<ArweaveClient> {
    let gateway = Arc::new(HttpGateway::new(&config.arweave.gateway_url));
    let signer = Arc::new(RsaPssSigner::from_wallet_file(Path::new(
        &config.arweave.wallet_path,
    ))?);
    let checkpoints = Arc::new(FileCheckpointStore::new(Path::new(
        &config.arweave.checkpoint_dir,
    ))?);
    Ok(ArweaveClient::new(gateway, signer, checkpoints)
        .with_chunks_per_pass(chunks_per_pass.or(config.arweave.chunks_per_pass)))
}

/// Checkpoint key for a source file: one upload job per canonical path.
pub(crate) fn checkpoint_key(path: &Path) -> anyhow::Result<String> {
    let canonical = path.canonicalize()?;
    let digest = Sha256::digest(canonical.display().to_string().as_bytes());
    Ok(hex::encode(digest))
}
