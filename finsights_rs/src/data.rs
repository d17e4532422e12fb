use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use tracing::{info, warn};

use crate::cache::{LoadCache, SharedSeries};
use crate::error::InsightError;
use crate::series::TimeSeries;
use crate::symbols::SymbolProfile;

/// Loader for date-stamped close-price dumps.
///
/// Dumps are CSV files named `<prefix>_daily_YYYYMMDD.csv`, one per
/// instrument, carrying at least `Date` and `Close` columns (the layout the
/// download job writes). The store picks the most recent stamp per instrument
/// from the primary directory and falls back to a secondary snapshot
/// directory when the primary has no dump for it. Loaded series are cached by
/// (symbol, stamp).
pub struct DumpStore {
    data_dir: PathBuf,
    fallback_dir: Option<PathBuf>,
    cache: LoadCache,
}

impl DumpStore {
    pub fn new(data_dir: impl Into<PathBuf>, fallback_dir: Option<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            fallback_dir,
            cache: LoadCache::new(),
        }
    }

    pub fn cache(&self) -> &LoadCache {
        &self.cache
    }

    /// Locate the freshest dump for a symbol, preferring the primary data
    /// directory over the fallback snapshot directory.
    pub fn resolve_dump(&self, profile: &SymbolProfile) -> Result<(PathBuf, String)> {
        if let Some(stamp) = latest_stamp(&self.data_dir, profile.dump_prefix)? {
            let path = dump_path(&self.data_dir, profile.dump_prefix, &stamp);
            return Ok((path, stamp));
        }

        if let Some(fallback) = &self.fallback_dir {
            if let Some(stamp) = latest_stamp(fallback, profile.dump_prefix)? {
                warn!(
                    symbol = profile.code,
                    fallback = %fallback.display(),
                    "No primary dump found; using fallback snapshot"
                );
                let path = dump_path(fallback, profile.dump_prefix, &stamp);
                return Ok((path, stamp));
            }
        }

        Err(anyhow!(
            "No dump matching {}_daily_YYYYMMDD.csv for '{}' under {} (or its fallback)",
            profile.dump_prefix,
            profile.code,
            self.data_dir.display()
        ))
    }

    /// Load the daily close series for one symbol, consulting the cache
    /// first.
    pub fn load_close(&self, profile: &SymbolProfile) -> Result<SharedSeries> {
        let (path, stamp) = self.resolve_dump(profile)?;
        if let Some(cached) = self.cache.get(profile.code, &stamp) {
            return Ok(cached);
        }

        let series = read_close_csv(&path)
            .with_context(|| format!("Failed to load close series from {}", path.display()))?;
        info!(
            symbol = profile.code,
            stamp,
            rows = series.len(),
            "Loaded close series"
        );
        Ok(self.cache.insert(profile.code, &stamp, series))
    }

    /// Load several symbols into one table aligned on the union of their date
    /// indices. The final row is dropped so every column ends on a complete
    /// trading day (the freshest dump may hold a partial last observation).
    pub fn load_close_table(&self, profiles: &[&SymbolProfile]) -> Result<CloseTable> {
        if profiles.is_empty() {
            return Err(anyhow!("No symbols requested"));
        }

        let mut loaded: Vec<(&SymbolProfile, SharedSeries)> = Vec::with_capacity(profiles.len());
        for profile in profiles {
            loaded.push((profile, self.load_close(profile)?));
        }

        let union: BTreeSet<NaiveDate> = loaded
            .iter()
            .flat_map(|(_, series)| series.dates().iter().copied())
            .collect();
        let mut dates: Vec<NaiveDate> = union.into_iter().collect();
        if dates.is_empty() {
            return Err(anyhow!("All requested dumps are empty"));
        }
        // Drop the latest day; it may not yet be closed on every exchange.
        dates.pop();

        let columns = loaded
            .iter()
            .map(|(profile, series)| {
                let values = dates
                    .iter()
                    .map(|&date| series.value_at(date).unwrap_or(f64::NAN))
                    .collect();
                (profile.code.to_string(), values)
            })
            .collect();

        Ok(CloseTable { dates, columns })
    }
}

/// Daily closes for several instruments over one shared date index. Columns
/// hold NAN where an instrument did not trade (e.g. an exchange holiday).
#[derive(Debug, Clone)]
pub struct CloseTable {
    dates: Vec<NaiveDate>,
    columns: Vec<(String, Vec<f64>)>,
}

impl CloseTable {
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(code, _)| code.as_str())
    }

    pub fn height(&self) -> usize {
        self.dates.len()
    }

    pub fn column(&self, code: &str) -> Option<TimeSeries> {
        self.columns.iter().find(|(name, _)| name == code).map(|(_, values)| {
            TimeSeries::new(self.dates.clone(), values.clone())
                .expect("table index is sorted and unique")
        })
    }

    /// Keep only rows within the optional inclusive `[start, end]` range.
    pub fn filter_date_range(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> CloseTable {
        if start.is_none() && end.is_none() {
            return self.clone();
        }

        let keep: Vec<bool> = self
            .dates
            .iter()
            .map(|&date| {
                start.map_or(true, |from| date >= from) && end.map_or(true, |to| date <= to)
            })
            .collect();

        let dates = self
            .dates
            .iter()
            .zip(&keep)
            .filter(|(_, keep)| **keep)
            .map(|(date, _)| *date)
            .collect();
        let columns = self
            .columns
            .iter()
            .map(|(code, values)| {
                let kept = values
                    .iter()
                    .zip(&keep)
                    .filter(|(_, keep)| **keep)
                    .map(|(value, _)| *value)
                    .collect();
                (code.clone(), kept)
            })
            .collect();

        CloseTable { dates, columns }
    }

    pub fn to_data_frame(&self) -> Result<DataFrame> {
        date_frame(&self.dates, &self.columns)
    }
}

/// Assemble a dataframe with a `date` column plus one float column per
/// entry; NAN values become nulls so CSV output leaves them blank.
pub(crate) fn date_frame(dates: &[NaiveDate], columns: &[(String, Vec<f64>)]) -> Result<DataFrame> {
    let date_strings: Vec<String> = dates
        .iter()
        .map(|date| date.format("%Y-%m-%d").to_string())
        .collect();
    let mut series = vec![Series::new("date", date_strings)];
    for (name, values) in columns {
        let chunked = Float64Chunked::from_iter_options(
            name.as_str(),
            values
                .iter()
                .map(|value| if value.is_nan() { None } else { Some(*value) }),
        );
        series.push(chunked.into_series());
    }
    DataFrame::new(series).context("Failed to assemble output dataframe")
}

fn dump_path(dir: &Path, prefix: &str, stamp: &str) -> PathBuf {
    dir.join(format!("{prefix}_daily_{stamp}.csv"))
}

/// Most recent `YYYYMMDD` stamp among `<prefix>_daily_*.csv` files in `dir`,
/// or None when the directory has no matching dump (including when it does
/// not exist).
fn latest_stamp(dir: &Path, prefix: &str) -> Result<Option<String>> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Ok(None);
    };

    let head = format!("{prefix}_daily_");
    let mut best: Option<String> = None;
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(rest) = name.strip_prefix(&head) else {
            continue;
        };
        let Some(stamp) = rest.strip_suffix(".csv") else {
            continue;
        };
        if stamp.len() != 8 || !stamp.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        if best.as_deref().is_none_or(|current| stamp > current) {
            best = Some(stamp.to_string());
        }
    }
    Ok(best)
}

/// Read one dump CSV into a close series. The `Date` column must parse as
/// dates (either a native date dtype or `YYYY-MM-DD` strings); anything else
/// is an index error, not a runtime condition.
pub fn read_close_csv(path: &Path) -> Result<TimeSeries> {
    let df = LazyCsvReader::new(path)
        .has_header(true)
        .with_try_parse_dates(true)
        .with_ignore_errors(true)
        .finish()
        .with_context(|| format!("Failed to initialize CSV reader for {}", path.display()))?
        .collect()
        .with_context(|| format!("Failed to read dump {}", path.display()))?;

    let dates = date_column(&df)?;
    let closes = df
        .column("Close")
        .with_context(|| format!("Missing 'Close' column in {}", path.display()))?
        .cast(&DataType::Float64)
        .context("Failed to interpret 'Close' column as float")?;
    let values: Vec<f64> = closes
        .f64()
        .context("Failed to interpret 'Close' column as float")?
        .into_iter()
        .map(|value| value.unwrap_or(f64::NAN))
        .collect();

    Ok(TimeSeries::new(dates, values)?)
}

fn date_column(df: &DataFrame) -> Result<Vec<NaiveDate>> {
    let series = df
        .column("Date")
        .context("Missing required 'Date' column")?;

    match series.dtype() {
        DataType::Date => {
            let ca = series.date().context("Failed to interpret 'Date' column")?;
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch");
            let mut out = Vec::with_capacity(ca.len());
            for value in ca.into_iter() {
                let days = value.ok_or_else(|| {
                    InsightError::IncompatibleIndex("'Date' column contains nulls".to_string())
                })?;
                out.push(epoch + chrono::Duration::days(days as i64));
            }
            Ok(out)
        }
        DataType::String => {
            let mut out = Vec::with_capacity(series.len());
            for value in series.iter() {
                let raw = match value {
                    AnyValue::String(s) => s.to_string(),
                    AnyValue::StringOwned(ref s) => s.to_string(),
                    AnyValue::Null => {
                        return Err(InsightError::IncompatibleIndex(
                            "'Date' column contains nulls".to_string(),
                        )
                        .into());
                    }
                    other => {
                        return Err(InsightError::IncompatibleIndex(format!(
                            "'Date' column must hold dates or strings (got {:?})",
                            other.dtype()
                        ))
                        .into());
                    }
                };
                let parsed = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                    InsightError::IncompatibleIndex(format!(
                        "'Date' value '{raw}' is not a YYYY-MM-DD date"
                    ))
                })?;
                out.push(parsed);
            }
            Ok(out)
        }
        other => Err(InsightError::IncompatibleIndex(format!(
            "'Date' column is not date-typed (got {other:?})"
        ))
        .into()),
    }
}
