use anyhow::{Context, Result};
use permastore_core::config::StoreConfig;
use std::path::Path;

pub fn run(base_dir: &Path) -> Result<()> {
    let path = StoreConfig::default_path(base_dir);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("no config at {}, run `permastore init`", path.display()))?;
    println!("# {}", path.display());
    print!("{content}");
    Ok(())
}
