use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use indicator_backtest::{
    commands::{
        analyze::{self, AnalyzeArgs},
        compute_indicators, list_indicators, snapshot,
    },
    context::AppContext,
};
use log::info;
use std::path::PathBuf;

const DEFAULT_MARKET_DATA_FILE: &str = "data/market-data.bin";

#[derive(Parser)]
#[command(name = "indicator-backtest")]
#[command(about = "Backtests technical indicators over daily price history")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest indicators over a date range and report their metrics
    Analyze {
        /// First day of the analysis window (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Last day of the analysis window (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
        /// Comma separated indicator identifiers (defaults to all)
        #[arg(short, long, value_delimiter = ',')]
        indicators: Vec<String>,
        /// Symbol to report under (defaults to the symbol stored in the data file)
        #[arg(long)]
        symbol: Option<String>,
        /// Include per-bar signals and returns in the report
        #[arg(long)]
        include_series: bool,
        /// Path to the market data file (.json or snapshot)
        #[arg(long = "data-file", value_name = "PATH")]
        data_file: Option<PathBuf>,
        /// Write the report here instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Compute every indicator column for the stored bars
    Indicators {
        /// First day to include (YYYY-MM-DD, defaults to the first stored bar)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day to include (YYYY-MM-DD, defaults to the last stored bar)
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Path to the market data file (.json or snapshot)
        #[arg(long = "data-file", value_name = "PATH")]
        data_file: Option<PathBuf>,
        /// Write the decorated series here instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// List the indicators available for analysis
    ListIndicators {
        /// Write the catalog here instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Convert a JSON bar file into a binary market data snapshot
    Snapshot {
        /// Source JSON file
        input: PathBuf,
        /// Destination file for the snapshot
        #[arg(short, long = "output", value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let Cli { command } = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let app_context = AppContext::initialize()?;

    info!("Starting indicator backtest. Past performance does not predict future results.");

    match command {
        Commands::Analyze {
            start,
            end,
            indicators,
            symbol,
            include_series,
            data_file,
            output,
        } => {
            let data_path = resolve_market_data_path(data_file);
            analyze::run(
                &app_context,
                AnalyzeArgs {
                    data_file: &data_path,
                    symbol,
                    start_date: start,
                    end_date: end,
                    indicators,
                    include_series,
                    output: output.as_deref(),
                },
            )?;
        }
        Commands::Indicators {
            start,
            end,
            data_file,
            output,
        } => {
            let data_path = resolve_market_data_path(data_file);
            compute_indicators::run(&app_context, &data_path, start, end, output.as_deref())?;
        }
        Commands::ListIndicators { output } => {
            list_indicators::run(output.as_deref())?;
        }
        Commands::Snapshot { input, output } => {
            let output_path = resolve_market_data_path(output);
            snapshot::run(&app_context, &input, &output_path)?;
        }
    }

    Ok(())
}

fn resolve_market_data_path(cli_value: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_value {
        return path;
    }

    PathBuf::from(DEFAULT_MARKET_DATA_FILE)
}
