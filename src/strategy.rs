use crate::calculator::{
    IndicatorCalculator, DEFAULT_BOLLINGER_STD_DEV, DEFAULT_BOLLINGER_WINDOW, DEFAULT_RSI_WINDOW,
    MACD_SIGNAL_PERIOD, MACD_SLOW_PERIOD,
};
use crate::error::{EngineError, EngineResult};
use crate::models::{IndicatorInfo, PriceSeries, Signal};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const SMA_CROSSOVER_WINDOW: usize = 50;

/// Oscillator levels used by the RSI rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalThresholds {
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
        }
    }
}

/// The indicators a backtest can be run for, each with a fixed trading rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndicatorKind {
    #[serde(rename = "sma_50", alias = "sma_crossover")]
    SmaCrossover,
    #[serde(rename = "rsi")]
    Rsi,
    #[serde(rename = "macd")]
    Macd,
    #[serde(rename = "bollinger_bands")]
    BollingerBands,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 4] = [
        IndicatorKind::SmaCrossover,
        IndicatorKind::Rsi,
        IndicatorKind::Macd,
        IndicatorKind::BollingerBands,
    ];

    pub fn from_identifier(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sma_50" | "sma_crossover" => Some(IndicatorKind::SmaCrossover),
            "rsi" => Some(IndicatorKind::Rsi),
            "macd" => Some(IndicatorKind::Macd),
            "bollinger_bands" => Some(IndicatorKind::BollingerBands),
            _ => None,
        }
    }

    pub fn identifier(self) -> &'static str {
        match self {
            IndicatorKind::SmaCrossover => "sma_50",
            IndicatorKind::Rsi => "rsi",
            IndicatorKind::Macd => "macd",
            IndicatorKind::BollingerBands => "bollinger_bands",
        }
    }

    /// Columns the rule reads, in the order [`IndicatorKind::signal`] expects them.
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            IndicatorKind::SmaCrossover => &["sma_50"],
            IndicatorKind::Rsi => &["rsi"],
            IndicatorKind::Macd => &["macd", "macd_signal"],
            IndicatorKind::BollingerBands => &["bb_high", "bb_low"],
        }
    }

    /// Shortest series the indicator columns can be computed for.
    pub fn min_bars(self) -> usize {
        match self {
            IndicatorKind::SmaCrossover => SMA_CROSSOVER_WINDOW,
            IndicatorKind::Rsi => DEFAULT_RSI_WINDOW + 1,
            IndicatorKind::Macd => MACD_SLOW_PERIOD + MACD_SIGNAL_PERIOD - 1,
            IndicatorKind::BollingerBands => DEFAULT_BOLLINGER_WINDOW,
        }
    }

    /// Computes the columns this rule needs.
    pub fn prepare(self, series: &mut PriceSeries) -> EngineResult<()> {
        match self {
            IndicatorKind::SmaCrossover => {
                IndicatorCalculator::calculate_sma(series, SMA_CROSSOVER_WINDOW)
            }
            IndicatorKind::Rsi => IndicatorCalculator::calculate_rsi(series, DEFAULT_RSI_WINDOW),
            IndicatorKind::Macd => IndicatorCalculator::calculate_macd(series),
            IndicatorKind::BollingerBands => IndicatorCalculator::calculate_bollinger_bands(
                series,
                DEFAULT_BOLLINGER_WINDOW,
                DEFAULT_BOLLINGER_STD_DEV,
            ),
        }
    }

    /// Applies the rule to one bar. `values` holds that bar's entries of
    /// [`IndicatorKind::required_columns`]; any undefined value means flat.
    pub fn signal(self, close: f64, values: &[f64], thresholds: &SignalThresholds) -> Signal {
        if !close.is_finite() || values.iter().any(|value| !value.is_finite()) {
            return Signal::Flat;
        }

        match (self, values) {
            (IndicatorKind::SmaCrossover, &[sma]) => directional(close > sma, close < sma),
            (IndicatorKind::Rsi, &[rsi]) => directional(
                rsi < thresholds.rsi_oversold,
                rsi > thresholds.rsi_overbought,
            ),
            (IndicatorKind::Macd, &[macd, macd_signal]) => {
                directional(macd > macd_signal, macd < macd_signal)
            }
            (IndicatorKind::BollingerBands, &[bb_high, bb_low]) => {
                directional(close < bb_low, close > bb_high)
            }
            _ => Signal::Flat,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            IndicatorKind::SmaCrossover => "50-Day Simple Moving Average",
            IndicatorKind::Rsi => "Relative Strength Index",
            IndicatorKind::Macd => "MACD",
            IndicatorKind::BollingerBands => "Bollinger Bands",
        }
    }

    pub fn category(self) -> &'static str {
        match self {
            IndicatorKind::SmaCrossover => "Trend",
            IndicatorKind::Rsi | IndicatorKind::Macd => "Momentum",
            IndicatorKind::BollingerBands => "Volatility",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            IndicatorKind::SmaCrossover => {
                "Average price over the last 50 days; long above it, short below it"
            }
            IndicatorKind::Rsi => {
                "Overbought/oversold oscillator on a 0-100 scale; long below 30, short above 70"
            }
            IndicatorKind::Macd => {
                "Moving Average Convergence Divergence; long while the MACD line is above its signal line"
            }
            IndicatorKind::BollingerBands => {
                "Standard deviation bands around a 20-day average; long below the lower band, short above the upper band"
            }
        }
    }

    pub fn info(self) -> IndicatorInfo {
        IndicatorInfo {
            name: self.identifier().to_string(),
            display_name: self.display_name().to_string(),
            category: self.category().to_string(),
            description: self.description().to_string(),
        }
    }
}

fn directional(buy: bool, sell: bool) -> Signal {
    if buy {
        Signal::Buy
    } else if sell {
        Signal::Sell
    } else {
        Signal::Flat
    }
}

impl FromStr for IndicatorKind {
    type Err = EngineError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        IndicatorKind::from_identifier(raw)
            .ok_or_else(|| EngineError::invalid(format!("unknown indicator: {raw}")))
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// The indicators available for analysis.
pub fn catalog() -> Vec<IndicatorInfo> {
    IndicatorKind::ALL.iter().map(|kind| kind.info()).collect()
}
