use anyhow::Result;
use permastore_core::config::StoreConfig;
use std::path::Path;

pub fn run(base_dir: &Path) -> Result<()> {
    let path = StoreConfig::default_path(base_dir);
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }

    let config = StoreConfig::default_config(base_dir);
    config.save(&path)?;
    std::fs::create_dir_all(&config.arweave.checkpoint_dir)?;

    println!("Wrote {}", path.display());
    println!(
        "Point arweave.wallet_path at a wallet file (owner + RSA private key PEM) before uploading."
    );
    Ok(())
}
