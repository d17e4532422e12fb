use std::collections::BTreeSet;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use tracing::info;

use crate::data::{date_frame, DumpStore};
use crate::error::InsightError;
use crate::series::{align_and_divide, TimeSeries};
use crate::symbols::find_symbol;

/// One index-to-index ratio, written `numerator/denominator` in symbol codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatioPair {
    pub numerator: String,
    pub denominator: String,
}

impl RatioPair {
    pub fn new(numerator: impl Into<String>, denominator: impl Into<String>) -> Self {
        Self {
            numerator: numerator.into(),
            denominator: denominator.into(),
        }
    }

    /// Parse a `num/den` pair spec, validating both symbol codes.
    pub fn parse(spec: &str) -> Result<Self> {
        let (num, den) = spec
            .split_once('/')
            .ok_or_else(|| anyhow!("Ratio pair '{spec}' must be of the form num/den"))?;
        let num = num.trim();
        let den = den.trim();
        if num.is_empty() || den.is_empty() {
            return Err(anyhow!("Ratio pair '{spec}' must name two symbols"));
        }
        for code in [num, den] {
            if find_symbol(code).is_none() {
                return Err(anyhow!("Unknown symbol '{code}' in ratio pair '{spec}'"));
            }
        }
        Ok(Self::new(num.to_ascii_lowercase(), den.to_ascii_lowercase()))
    }

    pub fn name(&self) -> String {
        format!("{}/{}", self.numerator, self.denominator)
    }
}

/// The ratio pairs the dashboard pages chart by default: S&P 500 breadth,
/// NASDAQ concentration, and market-cap-to-GDP comparisons.
pub fn curated_pairs() -> Vec<RatioPair> {
    [
        ("spx", "ftw5000"),
        ("spx", "spxew"),
        ("ndx", "spx"),
        ("ndx", "ixic"),
        ("spx", "usgdp"),
        ("ftw5000", "usgdp"),
    ]
    .iter()
    .map(|(num, den)| RatioPair::new(*num, *den))
    .collect()
}

/// Ratio series for several pairs over one shared date index.
#[derive(Debug, Clone)]
pub struct RatioTable {
    dates: Vec<NaiveDate>,
    columns: Vec<(String, Vec<f64>)>,
}

impl RatioTable {
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn height(&self) -> usize {
        self.dates.len()
    }

    pub fn pair_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<TimeSeries> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, values)| {
                TimeSeries::new(self.dates.clone(), values.clone())
                    .expect("table index is sorted and unique")
            })
    }

    pub fn filter_date_range(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> RatioTable {
        if start.is_none() && end.is_none() {
            return self.clone();
        }

        let mut table = RatioTable {
            dates: Vec::new(),
            columns: self
                .columns
                .iter()
                .map(|(name, _)| (name.clone(), Vec::new()))
                .collect(),
        };
        for (row, &date) in self.dates.iter().enumerate() {
            if start.is_some_and(|from| date < from) || end.is_some_and(|to| date > to) {
                continue;
            }
            table.dates.push(date);
            for (column, (_, values)) in table.columns.iter_mut().zip(&self.columns) {
                column.1.push(values[row]);
            }
        }
        table
    }

    pub fn to_data_frame(&self) -> Result<DataFrame> {
        date_frame(&self.dates, &self.columns)
    }
}

/// Build the ratio table: each pair's series are loaded, forward-filled, and
/// divided after carrying the denominator onto the numerator's dates; the
/// columns are then laid over the union of their date indices. With
/// `subsample_step` > 1 only every Nth row is kept, which keeps chart
/// payloads small without visibly changing multi-decade lines.
pub fn ratio_table(
    store: &DumpStore,
    pairs: &[RatioPair],
    subsample_step: usize,
) -> Result<RatioTable> {
    if subsample_step == 0 {
        return Err(InsightError::InvalidArgument(
            "subsample_step must be at least 1".to_string(),
        )
        .into());
    }
    if pairs.is_empty() {
        return Err(anyhow!("No ratio pairs requested"));
    }

    let mut ratios: Vec<(String, TimeSeries)> = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let numerator = find_symbol(&pair.numerator)
            .ok_or_else(|| anyhow!("Unknown symbol '{}'", pair.numerator))?;
        let denominator = find_symbol(&pair.denominator)
            .ok_or_else(|| anyhow!("Unknown symbol '{}'", pair.denominator))?;

        let num = store
            .load_close(numerator)
            .with_context(|| format!("Failed to load numerator of {}", pair.name()))?
            .forward_fill();
        let den = store
            .load_close(denominator)
            .with_context(|| format!("Failed to load denominator of {}", pair.name()))?
            .forward_fill();

        let ratio = align_and_divide(&num, &den)?;
        ratios.push((pair.name(), ratio));
    }

    let union: BTreeSet<NaiveDate> = ratios
        .iter()
        .flat_map(|(_, series)| series.dates().iter().copied())
        .collect();
    let dates: Vec<NaiveDate> = union.into_iter().step_by(subsample_step).collect();

    let columns = ratios
        .iter()
        .map(|(name, series)| {
            let values = dates
                .iter()
                .map(|&date| series.value_at(date).unwrap_or(f64::NAN))
                .collect();
            (name.clone(), values)
        })
        .collect();

    info!(
        pairs = ratios.len(),
        rows = dates.len(),
        subsample_step,
        "Built ratio table"
    );

    Ok(RatioTable { dates, columns })
}
