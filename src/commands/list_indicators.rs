use crate::commands::output::write_json;
use crate::strategy::catalog;
use anyhow::Result;
use std::path::Path;

pub fn run(output: Option<&Path>) -> Result<()> {
    write_json(&catalog(), output)
}
