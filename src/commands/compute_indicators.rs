use crate::calculator::IndicatorCalculator;
use crate::commands::market_data_snapshot::ensure_market_data_file;
use crate::commands::output::write_json;
use crate::context::AppContext;
use crate::models::PriceSeries;
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use log::info;
use serde::Serialize;
use std::path::Path;

/// Bars of one symbol decorated with every indicator column that could be
/// computed for them.
#[derive(Serialize)]
pub struct StockDataView {
    pub symbol: String,
    pub indicators: Vec<String>,
    pub series: PriceSeries,
}

pub fn build_view(
    symbol: &str,
    series: &PriceSeries,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<StockDataView> {
    let mut series = series.restrict_to_range(
        start_date.unwrap_or(NaiveDate::MIN),
        end_date.unwrap_or(NaiveDate::MAX),
    );
    if series.is_empty() {
        return Err(anyhow!("No bars for {} in the requested range", symbol));
    }

    let indicators = IndicatorCalculator::calculate_all(&mut series);
    Ok(StockDataView {
        symbol: symbol.to_string(),
        indicators,
        series,
    })
}

pub fn run(
    app: &AppContext,
    data_file: &Path,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    output: Option<&Path>,
) -> Result<()> {
    ensure_market_data_file(data_file)?;
    let market_data = app.load_market_data(data_file)?;
    let view = build_view(
        market_data.symbol(),
        market_data.series(),
        start_date,
        end_date,
    )?;
    info!(
        "Computed {} indicator columns for {} over {} bars",
        view.indicators.len(),
        view.symbol,
        view.series.len()
    );
    write_json(&view, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceBar;
    use chrono::Duration;

    fn series(len: usize) -> PriceSeries {
        let base = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let bars = (0..len)
            .map(|i| {
                let close = 30.0 + (i as f64 * 0.4).sin();
                PriceBar {
                    date: base + Duration::days(i as i64),
                    open: close,
                    high: close + 0.3,
                    low: close - 0.3,
                    close,
                    volume: 2_000,
                }
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    #[test]
    fn decorates_the_requested_range() {
        let source = series(60);
        let start = NaiveDate::from_ymd_opt(2022, 1, 13).unwrap();
        let view = build_view("XLE", &source, Some(start), None).unwrap();

        assert_eq!(view.series.len(), 50);
        assert_eq!(view.series.first_date(), Some(start));
        assert!(view.indicators.iter().any(|name| name == "rsi"));
        assert!(view.indicators.iter().any(|name| name == "obv"));
        // 50 bars cover the longest lookbacks (MACD 34, ADX 28)
        assert!(view.indicators.iter().any(|name| name == "macd"));
        assert!(view.indicators.iter().any(|name| name == "adx"));
    }

    #[test]
    fn empty_range_is_an_error() {
        let source = series(10);
        let far = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert!(build_view("XLE", &source, Some(far), None).is_err());
    }
}
