use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Parameters of one report/ratios run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the `<prefix>_daily_YYYYMMDD.csv` dumps.
    pub data_dir: PathBuf,
    /// Optional snapshot directory consulted when the primary directory has
    /// no dump for a symbol.
    #[serde(default)]
    pub fallback_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// Symbol codes to report on. Empty means the default selection.
    #[serde(default)]
    pub symbols: Vec<String>,
    /// Percent-change threshold for the days-since-change counter. Positive
    /// looks for gains, non-positive for losses.
    #[serde(default = "default_change_pct")]
    pub change_pct: f64,
    /// Look-back window (in observations) over which the percent change is
    /// measured.
    #[serde(default = "default_days_period")]
    pub days_period: usize,
    /// Optional tolerance for the days-since-ATH reset, to ignore negligible
    /// new-high noise. None means exact new highs only.
    #[serde(default)]
    pub ath_eps: Option<f64>,
    /// Inclusive start-date filter applied to the output tables.
    #[serde(default)]
    pub include_date_start: Option<NaiveDate>,
    /// Inclusive end-date filter applied to the output tables.
    #[serde(default)]
    pub include_date_end: Option<NaiveDate>,
    /// Keep every Nth row of the ratio table.
    #[serde(default = "default_subsample_step")]
    pub subsample_step: usize,
}

const fn default_change_pct() -> f64 {
    3.0
}

const fn default_days_period() -> usize {
    1
}

const fn default_subsample_step() -> usize {
    1
}
