use anyhow::Result;
use permastore_arweave::{Gateway, HttpGateway};
use permastore_core::types::tags_to_json;
use std::io::Write;
use std::path::Path;

// Retrieval needs no wallet or checkpoint store, only the gateway.

pub async fn download(id: &str, out: Option<&Path>, base_dir: &Path) -> Result<()> {
    let config = super::load_config(base_dir)?;
    let gateway = HttpGateway::new(&config.arweave.gateway_url);

    let data = gateway.transaction_data(id).await?;
    match out {
        Some(path) => {
            std::fs::write(path, &data)?;
            println!("wrote {} bytes to {}", data.len(), path.display());
        }
        None => std::io::stdout().write_all(&data)?,
    }
    Ok(())
}

pub async fn tags(id: &str, base_dir: &Path) -> Result<()> {
    let config = super::load_config(base_dir)?;
    let gateway = HttpGateway::new(&config.arweave.gateway_url);

    let tags = gateway.transaction_tags(id).await?;
    println!("{}", tags_to_json(&tags)?);
    Ok(())
}
