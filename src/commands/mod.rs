pub mod analyze;
pub mod compute_indicators;
pub mod list_indicators;
pub mod market_data_snapshot;
pub mod output;
pub mod snapshot;
