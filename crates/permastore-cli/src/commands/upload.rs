use anyhow::{Context, Result, bail};
use indicatif::ProgressBar;
use permastore_core::types::Tag;
use std::path::Path;
use std::time::Duration;

pub async fn run(
    path: &Path,
    tag_args: &[String],
    checkpoint_every: Option<usize>,
    base_dir: &Path,
) -> Result<()> {
    let config = super::load_config(base_dir)?;
    let client = super::arweave_client(&config, checkpoint_every)?;

    let payload =
        std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let tags = parse_tags(tag_args)?;
    let key = super::checkpoint_key(path)?;

    let total = permastore_arweave::merkle::chunk_count(payload.len());
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("uploading {} ({total} chunks)", path.display()));

    let receipt = client.begin_upload(&payload, &tags, &key).await?;
    pb.finish_and_clear();

    println!("transaction id: {}", receipt.id);
    if receipt.is_complete() {
        println!("upload complete ({} chunks)", receipt.total_chunks);
    } else {
        println!(
            "uploaded {}/{} chunks, run `permastore resume {}` to finish",
            receipt.chunks_sent,
            receipt.total_chunks,
            path.display()
        );
    }
    Ok(())
}

fn parse_tags(args: &[String]) -> Result<Vec<Tag>> {
    args.iter()
        .map(|raw| match raw.split_once('=') {
            Some((name, value)) => Ok(Tag::new(name, value)),
            None => bail!("invalid tag {raw:?}, expected name=value"),
        })
        .collect()
}
