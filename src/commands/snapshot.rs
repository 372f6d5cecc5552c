use crate::commands::market_data_snapshot::ensure_market_data_file;
use crate::context::AppContext;
use anyhow::Result;
use log::info;
use std::path::Path;

pub fn run(app: &AppContext, input_path: &Path, output_path: &Path) -> Result<()> {
    ensure_market_data_file(input_path)?;
    info!(
        "Generating market data snapshot at {} from {}",
        output_path.display(),
        input_path.display()
    );

    let market_data = app.load_market_data(input_path)?;
    market_data.save_to_file(output_path)?;
    info!(
        "Market data snapshot for {} ({} bars) successfully written to {}",
        market_data.symbol(),
        market_data.series().len(),
        output_path.display()
    );

    Ok(())
}
