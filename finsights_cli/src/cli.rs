use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use finsights_rs::ratio::{curated_pairs, RatioPair};
use finsights_rs::Config;

#[derive(Parser, Debug)]
#[command(
    name = "finsights",
    about = "Derives market-insight tables (ATH recency, change recency, index ratios) from close-price dumps"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute close, days-since-ATH, and days-since-change tables
    #[command(name = "report")]
    Report(ReportArgs),

    /// Compute index-to-index ratio tables
    #[command(name = "ratios")]
    Ratios(RatiosArgs),
}

#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Directory with <prefix>_daily_YYYYMMDD.csv close-price dumps
    #[arg(long = "data-dir", value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub data_dir: PathBuf,

    /// Snapshot directory used when the primary has no dump for a symbol
    #[arg(long = "fallback-dir", value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub fallback_dir: Option<PathBuf>,

    /// Output directory for the CSV artefacts
    #[arg(long = "output-dir", value_hint = clap::ValueHint::DirPath)]
    pub output_dir: PathBuf,

    /// Symbol codes to report on (defaults to the stock-index selection)
    #[arg(long = "symbols", value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Percent-change threshold; positive = gains, zero/negative = losses
    #[arg(long = "change", default_value_t = 3.0, allow_hyphen_values = true)]
    pub change: f64,

    /// Look-back window (in trading days) for the percent change
    #[arg(long = "days-period", default_value_t = 1)]
    pub days_period: usize,

    /// Tolerance for the days-since-ATH reset (default: exact new highs only)
    #[arg(long = "ath-eps")]
    pub ath_eps: Option<f64>,

    /// Inclusive start date filter (YYYY-MM-DD)
    #[arg(long = "date-start")]
    pub date_start: Option<String>,

    /// Inclusive end date filter (YYYY-MM-DD)
    #[arg(long = "date-end")]
    pub date_end: Option<String>,

    /// Disable the log file in the output directory
    #[arg(long = "no-file-log", default_value_t = false)]
    pub no_file_log: bool,
}

impl ReportArgs {
    pub fn into_config(self) -> Result<Config> {
        Ok(Config {
            data_dir: self.data_dir,
            fallback_dir: self.fallback_dir,
            output_dir: self.output_dir,
            symbols: self.symbols,
            change_pct: self.change,
            days_period: self.days_period,
            ath_eps: self.ath_eps,
            include_date_start: parse_date_arg(self.date_start.as_deref(), "--date-start")?,
            include_date_end: parse_date_arg(self.date_end.as_deref(), "--date-end")?,
            subsample_step: 1,
        })
    }
}

#[derive(Parser, Debug)]
pub struct RatiosArgs {
    /// Directory with <prefix>_daily_YYYYMMDD.csv close-price dumps
    #[arg(long = "data-dir", value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub data_dir: PathBuf,

    /// Snapshot directory used when the primary has no dump for a symbol
    #[arg(long = "fallback-dir", value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub fallback_dir: Option<PathBuf>,

    /// Output directory for the CSV artefacts
    #[arg(long = "output-dir", value_hint = clap::ValueHint::DirPath)]
    pub output_dir: PathBuf,

    /// Ratio pairs as num/den symbol codes (defaults to the curated set)
    #[arg(long = "pairs", value_delimiter = ',')]
    pub pairs: Vec<String>,

    /// Keep every Nth row of the ratio table
    #[arg(long = "subsample", default_value_t = 1)]
    pub subsample: usize,

    /// Inclusive start date filter (YYYY-MM-DD)
    #[arg(long = "date-start")]
    pub date_start: Option<String>,

    /// Inclusive end date filter (YYYY-MM-DD)
    #[arg(long = "date-end")]
    pub date_end: Option<String>,

    /// Disable the log file in the output directory
    #[arg(long = "no-file-log", default_value_t = false)]
    pub no_file_log: bool,
}

impl RatiosArgs {
    pub fn into_config(self) -> Result<(Config, Vec<RatioPair>)> {
        let pairs = if self.pairs.is_empty() {
            curated_pairs()
        } else {
            self.pairs
                .iter()
                .map(|spec| RatioPair::parse(spec))
                .collect::<Result<Vec<_>>>()?
        };

        let config = Config {
            data_dir: self.data_dir,
            fallback_dir: self.fallback_dir,
            output_dir: self.output_dir,
            symbols: Vec::new(),
            change_pct: 3.0,
            days_period: 1,
            ath_eps: None,
            include_date_start: parse_date_arg(self.date_start.as_deref(), "--date-start")?,
            include_date_end: parse_date_arg(self.date_end.as_deref(), "--date-end")?,
            subsample_step: self.subsample,
        };
        Ok((config, pairs))
    }
}

fn parse_date_arg(raw: Option<&str>, flag: &str) -> Result<Option<NaiveDate>> {
    raw.map(|value| {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .with_context(|| format!("{flag} expects YYYY-MM-DD, got '{value}'"))
    })
    .transpose()
}
