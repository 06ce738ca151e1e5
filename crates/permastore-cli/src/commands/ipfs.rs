use anyhow::{Context, Result};
use permastore_ipfs::IpfsClient;
use std::io::Write;
use std::path::Path;

pub async fn add(path: &Path, base_dir: &Path) -> Result<()> {
    let config = super::load_config(base_dir)?;
    let client = IpfsClient::new(&config.ipfs.api_url);

    let data = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let cid = client.add(data).await?;
    println!("{cid}");
    Ok(())
}

pub async fn cat(cid: &str, out: Option<&Path>, base_dir: &Path) -> Result<()> {
    let config = super::load_config(base_dir)?;
    let client = IpfsClient::new(&config.ipfs.api_url);

    let data = client.cat(cid).await?;
    match out {
        Some(path) => {
            std::fs::write(path, &data)?;
            println!("wrote {} bytes to {}", data.len(), path.display());
        }
        None => std::io::stdout().write_all(&data)?,
    }
    Ok(())
}
