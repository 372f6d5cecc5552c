use anyhow::{anyhow, Result};
use std::path::Path;

pub fn ensure_market_data_file(path: &Path) -> Result<()> {
    if path.is_file() {
        return Ok(());
    }

    Err(anyhow!(
        "Market data file not found at {}. Provide a JSON bar file or a snapshot written by `snapshot`.",
        path.display()
    ))
}
