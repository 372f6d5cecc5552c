use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes `value` as pretty JSON to `output`, or to stdout when no path is given.
pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory {}", parent.display())
                    })?;
                }
            }
            let file = File::create(path)
                .with_context(|| format!("Unable to create output file {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value).context("Failed to encode JSON")?;
            writer.write_all(b"\n")?;
            writer.flush().context("Failed to flush output file")?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, value).context("Failed to encode JSON")?;
            handle.write_all(b"\n")?;
        }
    }
    Ok(())
}
