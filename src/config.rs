use crate::performance::TRADING_DAYS_PER_YEAR;
use crate::strategy::SignalThresholds;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::env;

pub const SETTING_KEYS: [&str; 5] = [
    "MIN_ANALYSIS_BARS",
    "MAX_ANALYSIS_RANGE_DAYS",
    "RSI_OVERSOLD_LEVEL",
    "RSI_OVERBOUGHT_LEVEL",
    "TRADING_DAYS_PER_YEAR",
];

/// Tunables for analysis requests and the backtest engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub min_analysis_bars: usize,
    pub max_analysis_range_days: i64,
    pub rsi_oversold_level: f64,
    pub rsi_overbought_level: f64,
    pub trading_days_per_year: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            min_analysis_bars: 50,
            max_analysis_range_days: 3 * 365,
            rsi_oversold_level: 30.0,
            rsi_overbought_level: 70.0,
            trading_days_per_year: TRADING_DAYS_PER_YEAR,
        }
    }
}

impl EngineSettings {
    /// Builds settings from a key/value map. Absent keys keep their defaults;
    /// present keys must parse and fall within range.
    pub fn from_settings_map(settings: &HashMap<String, String>) -> Result<Self> {
        let defaults = Self::default();

        let min_analysis_bars =
            setting_usize(settings, "MIN_ANALYSIS_BARS", defaults.min_analysis_bars, 2)?;
        let max_analysis_range_days = setting_usize(
            settings,
            "MAX_ANALYSIS_RANGE_DAYS",
            defaults.max_analysis_range_days as usize,
            1,
        )? as i64;
        let rsi_oversold_level = setting_f64(
            settings,
            "RSI_OVERSOLD_LEVEL",
            defaults.rsi_oversold_level,
            Some(0.0),
            Some(100.0),
        )?;
        let rsi_overbought_level = setting_f64(
            settings,
            "RSI_OVERBOUGHT_LEVEL",
            defaults.rsi_overbought_level,
            Some(0.0),
            Some(100.0),
        )?;
        let trading_days_per_year = setting_f64(
            settings,
            "TRADING_DAYS_PER_YEAR",
            defaults.trading_days_per_year,
            Some(1.0),
            Some(366.0),
        )?;

        if rsi_oversold_level >= rsi_overbought_level {
            return Err(anyhow!(
                "RSI_OVERSOLD_LEVEL ({}) must be below RSI_OVERBOUGHT_LEVEL ({})",
                rsi_oversold_level,
                rsi_overbought_level
            ));
        }

        Ok(Self {
            min_analysis_bars,
            max_analysis_range_days,
            rsi_oversold_level,
            rsi_overbought_level,
            trading_days_per_year,
        })
    }

    /// Reads the known setting keys from the process environment.
    pub fn from_env() -> Result<Self> {
        let settings: HashMap<String, String> = SETTING_KEYS
            .iter()
            .filter_map(|key| env::var(key).ok().map(|value| (key.to_string(), value)))
            .collect();
        Self::from_settings_map(&settings)
    }

    pub fn signal_thresholds(&self) -> SignalThresholds {
        SignalThresholds {
            rsi_oversold: self.rsi_oversold_level,
            rsi_overbought: self.rsi_overbought_level,
        }
    }
}

fn optional_setting<'a>(settings: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    settings
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn setting_f64(
    settings: &HashMap<String, String>,
    key: &str,
    default: f64,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<f64> {
    let Some(raw) = optional_setting(settings, key) else {
        return Ok(default);
    };
    let value = raw
        .parse::<f64>()
        .map_err(|_| anyhow!("Setting {} must be a number (value: {})", key, raw))?;
    if !value.is_finite() {
        return Err(anyhow!("Setting {} must be finite (value: {})", key, raw));
    }
    if let Some(min_value) = min {
        if value < min_value {
            return Err(anyhow!(
                "Setting {} must be >= {} (value: {})",
                key,
                min_value,
                raw
            ));
        }
    }
    if let Some(max_value) = max {
        if value > max_value {
            return Err(anyhow!(
                "Setting {} must be <= {} (value: {})",
                key,
                max_value,
                raw
            ));
        }
    }
    Ok(value)
}

fn setting_usize(
    settings: &HashMap<String, String>,
    key: &str,
    default: usize,
    min: usize,
) -> Result<usize> {
    let Some(raw) = optional_setting(settings, key) else {
        return Ok(default);
    };
    let value = raw
        .parse::<f64>()
        .map_err(|_| anyhow!("Setting {} must be a number (value: {})", key, raw))?;
    if !value.is_finite() {
        return Err(anyhow!("Setting {} must be finite (value: {})", key, raw));
    }
    if value.fract() != 0.0 {
        return Err(anyhow!(
            "Setting {} must be an integer (value: {})",
            key,
            raw
        ));
    }
    if value < min as f64 {
        return Err(anyhow!(
            "Setting {} must be >= {} (value: {})",
            key,
            min,
            raw
        ));
    }
    Ok(value as usize)
}
