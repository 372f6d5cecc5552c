use crate::error::{EngineError, EngineResult};
use crate::indicators;
use crate::models::PriceSeries;
use log::{debug, warn};

pub const DEFAULT_SMA_WINDOW: usize = 20;
pub const DEFAULT_EMA_WINDOW: usize = 20;
pub const DEFAULT_RSI_WINDOW: usize = 14;
pub const MACD_FAST_PERIOD: usize = 12;
pub const MACD_SLOW_PERIOD: usize = 26;
pub const MACD_SIGNAL_PERIOD: usize = 9;
pub const DEFAULT_BOLLINGER_WINDOW: usize = 20;
pub const DEFAULT_BOLLINGER_STD_DEV: f64 = 2.0;
pub const DEFAULT_STOCHASTIC_WINDOW: usize = 14;
pub const STOCHASTIC_SMOOTHING: usize = 3;
pub const DEFAULT_ATR_WINDOW: usize = 14;
pub const DEFAULT_ADX_WINDOW: usize = 14;

/// Writes indicator columns into a [`PriceSeries`].
///
/// Each operation inserts or overwrites its named columns and touches nothing
/// else. A series shorter than the indicator's lookback is rejected with
/// [`EngineError::InsufficientData`]; warm-up bars inside a long enough series
/// simply hold `NaN`.
pub struct IndicatorCalculator;

impl IndicatorCalculator {
    pub fn calculate_sma(series: &mut PriceSeries, window: usize) -> EngineResult<()> {
        let name = format!("sma_{window}");
        Self::ensure_window(&name, window)?;
        Self::ensure_length(series, &name, window)?;

        let values = indicators::calculate_sma(&series.closes(), window);
        Self::store(series, name, values);
        Ok(())
    }

    pub fn calculate_ema(series: &mut PriceSeries, window: usize) -> EngineResult<()> {
        let name = format!("ema_{window}");
        Self::ensure_window(&name, window)?;
        Self::ensure_length(series, &name, window)?;

        let values = indicators::calculate_ema(&series.closes(), window);
        Self::store(series, name, values);
        Ok(())
    }

    pub fn calculate_rsi(series: &mut PriceSeries, window: usize) -> EngineResult<()> {
        Self::ensure_window("rsi", window)?;
        Self::ensure_length(series, "rsi", window + 1)?;

        let values = indicators::calculate_rsi(&series.closes(), window);
        Self::store(series, "rsi", values);
        Ok(())
    }

    /// MACD with the standard 12/26/9 periods.
    pub fn calculate_macd(series: &mut PriceSeries) -> EngineResult<()> {
        Self::ensure_length(series, "macd", MACD_SLOW_PERIOD + MACD_SIGNAL_PERIOD - 1)?;

        let output = indicators::calculate_macd(
            &series.closes(),
            MACD_FAST_PERIOD,
            MACD_SLOW_PERIOD,
            MACD_SIGNAL_PERIOD,
        );
        Self::store(series, "macd", output.macd);
        Self::store(series, "macd_signal", output.signal);
        Self::store(series, "macd_diff", output.histogram);
        Ok(())
    }

    pub fn calculate_bollinger_bands(
        series: &mut PriceSeries,
        window: usize,
        std_dev: f64,
    ) -> EngineResult<()> {
        Self::ensure_window("bollinger_bands", window)?;
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(EngineError::invalid(format!(
                "bollinger_bands std_dev must be a non-negative number (value: {std_dev})"
            )));
        }
        Self::ensure_length(series, "bollinger_bands", window)?;

        let output = indicators::calculate_bollinger_bands(&series.closes(), window, std_dev);
        Self::store(series, "bb_high", output.upper);
        Self::store(series, "bb_mid", output.middle);
        Self::store(series, "bb_low", output.lower);
        Ok(())
    }

    pub fn calculate_stochastic(series: &mut PriceSeries, window: usize) -> EngineResult<()> {
        Self::ensure_window("stochastic", window)?;
        Self::ensure_length(series, "stochastic", window + STOCHASTIC_SMOOTHING - 1)?;

        let output = indicators::calculate_stochastic(
            &series.highs(),
            &series.lows(),
            &series.closes(),
            window,
            STOCHASTIC_SMOOTHING,
        );
        Self::store(series, "stoch_k", output.k);
        Self::store(series, "stoch_d", output.d);
        Ok(())
    }

    pub fn calculate_atr(series: &mut PriceSeries, window: usize) -> EngineResult<()> {
        Self::ensure_window("atr", window)?;
        Self::ensure_length(series, "atr", window + 1)?;

        let values =
            indicators::calculate_atr(&series.highs(), &series.lows(), &series.closes(), window);
        Self::store(series, "atr", values);
        Ok(())
    }

    pub fn calculate_obv(series: &mut PriceSeries) -> EngineResult<()> {
        Self::ensure_length(series, "obv", 1)?;

        let values = indicators::calculate_obv(&series.closes(), &series.volumes());
        Self::store(series, "obv", values);
        Ok(())
    }

    pub fn calculate_adx(series: &mut PriceSeries, window: usize) -> EngineResult<()> {
        Self::ensure_window("adx", window)?;
        Self::ensure_length(series, "adx", 2 * window)?;

        let values =
            indicators::calculate_adx(&series.highs(), &series.lows(), &series.closes(), window);
        Self::store(series, "adx", values);
        Ok(())
    }

    /// Every indicator with its default parameters. Indicators the series is
    /// too short for are skipped; the names of the written columns are returned.
    pub fn calculate_all(series: &mut PriceSeries) -> Vec<String> {
        let steps: [(&str, fn(&mut PriceSeries) -> EngineResult<()>); 9] = [
            ("sma", |s| Self::calculate_sma(s, DEFAULT_SMA_WINDOW)),
            ("ema", |s| Self::calculate_ema(s, DEFAULT_EMA_WINDOW)),
            ("rsi", |s| Self::calculate_rsi(s, DEFAULT_RSI_WINDOW)),
            ("macd", Self::calculate_macd),
            ("bollinger_bands", |s| {
                Self::calculate_bollinger_bands(
                    s,
                    DEFAULT_BOLLINGER_WINDOW,
                    DEFAULT_BOLLINGER_STD_DEV,
                )
            }),
            ("stochastic", |s| {
                Self::calculate_stochastic(s, DEFAULT_STOCHASTIC_WINDOW)
            }),
            ("atr", |s| Self::calculate_atr(s, DEFAULT_ATR_WINDOW)),
            ("obv", Self::calculate_obv),
            ("adx", |s| Self::calculate_adx(s, DEFAULT_ADX_WINDOW)),
        ];

        for (label, step) in steps {
            if let Err(err) = step(series) {
                warn!("Skipping {label}: {err}");
            }
        }

        series.column_names().map(str::to_string).collect()
    }

    fn ensure_window(indicator: &str, window: usize) -> EngineResult<()> {
        if window == 0 {
            return Err(EngineError::invalid(format!(
                "{indicator} window must be at least 1"
            )));
        }
        Ok(())
    }

    fn ensure_length(series: &PriceSeries, indicator: &str, required: usize) -> EngineResult<()> {
        if series.len() < required {
            return Err(EngineError::insufficient(indicator, required, series.len()));
        }
        Ok(())
    }

    fn store(series: &mut PriceSeries, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        let defined = values.iter().filter(|value| !value.is_nan()).count();
        debug!(
            "Computed column {} ({} of {} bars defined)",
            name,
            defined,
            values.len()
        );
        series.insert_column(name, values);
    }
}
