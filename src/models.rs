use crate::error::{EngineError, EngineResult};
use crate::strategy::IndicatorKind;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One trading day of OHLCV data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PriceBar {
    pub fn validate(&self) -> EngineResult<()> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|price| !price.is_finite()) {
            return Err(EngineError::invalid(format!(
                "bar {} has a non-finite price",
                self.date
            )));
        }
        if self.high < self.low {
            return Err(EngineError::invalid(format!(
                "bar {} has high {} below low {}",
                self.date, self.high, self.low
            )));
        }
        if self.high < self.open.max(self.close) {
            return Err(EngineError::invalid(format!(
                "bar {} has high {} below open/close",
                self.date, self.high
            )));
        }
        if self.low > self.open.min(self.close) {
            return Err(EngineError::invalid(format!(
                "bar {} has low {} above open/close",
                self.date, self.low
            )));
        }
        if self.volume < 0 {
            return Err(EngineError::invalid(format!(
                "bar {} has negative volume {}",
                self.date, self.volume
            )));
        }
        Ok(())
    }
}

/// Validated, date-ordered bars plus named indicator columns aligned to them.
///
/// Columns hold `f64::NAN` for warm-up bars. Only the indicator calculator
/// writes columns; everything downstream reads them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl PriceSeries {
    pub fn new(bars: Vec<PriceBar>) -> EngineResult<Self> {
        for bar in &bars {
            bar.validate()?;
        }
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(EngineError::invalid(format!(
                    "bar dates must be strictly increasing ({} follows {})",
                    pair[1].date, pair[0].date
                )));
            }
        }

        Ok(Self {
            bars,
            columns: BTreeMap::new(),
        })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|bar| bar.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|bar| bar.date)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.volume as f64).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Bars dated within `[start, end]`. Indicator columns are not carried
    /// over because their warm-up depends on the retained history.
    pub fn restrict_to_range(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        let bars = self
            .bars
            .iter()
            .filter(|bar| bar.date >= start && bar.date <= end)
            .cloned()
            .collect();
        PriceSeries {
            bars,
            columns: BTreeMap::new(),
        }
    }

    pub(crate) fn insert_column(&mut self, name: impl Into<String>, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.bars.len());
        self.columns.insert(name.into(), values);
    }
}

/// Directional stance for one bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Signal {
    Sell,
    #[default]
    Flat,
    Buy,
}

impl Signal {
    pub fn value(self) -> i8 {
        match self {
            Signal::Sell => -1,
            Signal::Flat => 0,
            Signal::Buy => 1,
        }
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.value())
    }

    pub fn is_flat(self) -> bool {
        self == Signal::Flat
    }
}

impl From<Signal> for i8 {
    fn from(signal: Signal) -> Self {
        signal.value()
    }
}

impl TryFrom<i8> for Signal {
    type Error = EngineError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Signal::Sell),
            0 => Ok(Signal::Flat),
            1 => Ok(Signal::Buy),
            other => Err(EngineError::invalid(format!(
                "signal must be -1, 0 or 1 (value: {other})"
            ))),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Summary statistics of one indicator backtest. Percent-valued fields are
/// already multiplied by 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestMetrics {
    pub success_rate: f64,
    pub avg_return: f64,
    pub total_signals: usize,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
}

/// Metrics together with the bar-aligned series they were reduced from.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub indicator: IndicatorKind,
    pub metrics: BacktestMetrics,
    pub signals: Vec<Signal>,
    pub position_changes: Vec<bool>,
    pub daily_returns: Vec<f64>,
    pub strategy_returns: Vec<f64>,
    pub cumulative_returns: Vec<f64>,
    pub exposed_bars: usize,
    pub total_return: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorInfo {
    pub name: String,
    pub display_name: String,
    pub category: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub indicators: Vec<String>,
    #[serde(default)]
    pub include_series: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorResult {
    pub stock_symbol: String,
    pub indicator_name: String,
    pub timeframe: String,
    pub success_rate: f64,
    pub avg_return: f64,
    pub total_signals: usize,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub date_calculated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub stock: String,
    pub period: String,
    pub indicators_analyzed: usize,
    pub data_points: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub results: Vec<IndicatorResult>,
    pub summary: AnalysisSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub backtests: Vec<BacktestReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn rejects_non_monotonic_dates() {
        let err = PriceSeries::new(vec![bar(2, 10.0), bar(1, 11.0)]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));

        let err = PriceSeries::new(vec![bar(1, 10.0), bar(1, 11.0)]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn rejects_malformed_bars() {
        let mut inverted = bar(1, 10.0);
        inverted.high = 8.0;
        inverted.low = 9.0;
        assert!(PriceSeries::new(vec![inverted]).is_err());

        let mut negative_volume = bar(1, 10.0);
        negative_volume.volume = -5;
        assert!(PriceSeries::new(vec![negative_volume]).is_err());

        let mut close_above_high = bar(1, 10.0);
        close_above_high.close = 12.0;
        assert!(PriceSeries::new(vec![close_above_high]).is_err());

        let mut nan_open = bar(1, 10.0);
        nan_open.open = f64::NAN;
        assert!(PriceSeries::new(vec![nan_open]).is_err());
    }

    #[test]
    fn restrict_to_range_is_inclusive_and_drops_columns() {
        let mut series = PriceSeries::new((1..=10).map(|d| bar(d, 10.0 + d as f64)).collect())
            .expect("valid series");
        series.insert_column("sma_2", vec![1.0; 10]);

        let start = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        let restricted = series.restrict_to_range(start, end);

        assert_eq!(restricted.len(), 4);
        assert_eq!(restricted.first_date(), Some(start));
        assert_eq!(restricted.last_date(), Some(end));
        assert!(!restricted.has_column("sma_2"));
    }

    #[test]
    fn signal_serializes_as_integer() {
        let json = serde_json::to_string(&vec![Signal::Sell, Signal::Flat, Signal::Buy]).unwrap();
        assert_eq!(json, "[-1,0,1]");

        let parsed: Vec<Signal> = serde_json::from_str("[1,-1,0]").unwrap();
        assert_eq!(parsed, vec![Signal::Buy, Signal::Sell, Signal::Flat]);

        assert!(serde_json::from_str::<Signal>("2").is_err());
    }

    #[test]
    fn undefined_column_values_serialize_as_null() {
        let mut series = PriceSeries::new(vec![bar(1, 10.0), bar(2, 11.0)]).unwrap();
        series.insert_column("sma_2", vec![f64::NAN, 10.5]);

        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["columns"]["sma_2"], serde_json::json!([null, 10.5]));
    }
}
