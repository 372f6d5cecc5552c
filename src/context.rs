use crate::config::EngineSettings;
use crate::data_context::MarketData;
use anyhow::{Context, Result};
use log::debug;
use std::path::Path;

#[derive(Clone)]
pub struct AppContext {
    settings: EngineSettings,
}

impl AppContext {
    pub fn initialize() -> Result<Self> {
        let settings =
            EngineSettings::from_env().context("Failed to read engine settings from environment")?;
        debug!("Engine settings: {:?}", settings);
        Ok(Self { settings })
    }

    pub fn with_settings(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn load_market_data<P: AsRef<Path>>(&self, data_file: P) -> Result<MarketData> {
        MarketData::load_from_file(data_file)
    }
}
