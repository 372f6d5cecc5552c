use crate::analysis::normalize_symbol;
use crate::models::{PriceBar, PriceSeries};
use anyhow::{anyhow, Context, Result};
use chrono::prelude::*;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

const MARKET_DATA_SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct MarketDataSnapshot {
    version: u32,
    generated_at: DateTime<Utc>,
    symbol: String,
    bars: Vec<PriceBar>,
}

/// Human-editable layout accepted from `.json` files.
#[derive(Serialize, Deserialize)]
struct MarketDataFile {
    symbol: String,
    bars: Vec<PriceBar>,
}

/// Daily bars of one symbol, already fetched and validated.
#[derive(Debug, Clone)]
pub struct MarketData {
    symbol: String,
    series: PriceSeries,
}

impl MarketData {
    pub fn new(symbol: &str, bars: Vec<PriceBar>) -> Result<Self> {
        let symbol = normalize_symbol(symbol)?;
        let series = PriceSeries::new(bars)
            .with_context(|| format!("Invalid price bars for {}", symbol))?;
        Ok(Self { symbol, series })
    }

    /// Loads a `.json` file or, for any other extension, a binary snapshot
    /// written by [`MarketData::save_to_file`].
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open market data at {}", path.display()))?;
        let reader = BufReader::new(file);

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let (symbol, bars) = if is_json {
            let data: MarketDataFile = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse market data JSON {}", path.display()))?;
            (data.symbol, data.bars)
        } else {
            let snapshot: MarketDataSnapshot =
                bincode::deserialize_from(reader).context("Snapshot decode failed")?;
            if snapshot.version != MARKET_DATA_SNAPSHOT_VERSION {
                return Err(anyhow!(
                    "Market data snapshot version mismatch (found {}, expected {})",
                    snapshot.version,
                    MARKET_DATA_SNAPSHOT_VERSION
                ));
            }
            (snapshot.symbol, snapshot.bars)
        };

        let market_data = Self::new(&symbol, bars)?;
        info!(
            "Loaded {} bars for {} from {} ({})",
            market_data.series.len(),
            market_data.symbol,
            path.display(),
            market_data.describe_range()
        );
        Ok(market_data)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create snapshot directory {}", parent.display())
                })?;
            }
        }

        let file = File::create(path).with_context(|| {
            format!(
                "Unable to create market data snapshot at {}",
                path.display()
            )
        })?;
        let mut writer = BufWriter::new(file);
        let snapshot = MarketDataSnapshot {
            version: MARKET_DATA_SNAPSHOT_VERSION,
            generated_at: Utc::now(),
            symbol: self.symbol.clone(),
            bars: self.series.bars().to_vec(),
        };
        bincode::serialize_into(&mut writer, &snapshot)
            .context("Failed to serialize market data snapshot")?;
        writer
            .flush()
            .context("Failed to flush market data snapshot to disk")?;
        Ok(())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    fn describe_range(&self) -> String {
        match (self.series.first_date(), self.series.last_date()) {
            (Some(start), Some(end)) => format!("{} - {}", start, end),
            _ => "no bars".to_string(),
        }
    }
}
