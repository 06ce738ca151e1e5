use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::path::Path;
use std::time::Duration;

pub async fn run(path: &Path, base_dir: &Path) -> Result<()> {
    let config = super::load_config(base_dir)?;
    let client = super::arweave_client(&config, None)?;

    let payload =
        std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let key = super::checkpoint_key(path)?;

    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("resuming upload of {}", path.display()));

    let id = client.resume_upload(&payload, &key).await?;
    pb.finish_and_clear();

    println!("upload complete: {id}");
    Ok(())
}
