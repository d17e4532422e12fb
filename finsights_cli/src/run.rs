use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use tracing::info;

use finsights_rs::ratio::{ratio_table, RatioPair};
use finsights_rs::recency::{
    days_since_ath, days_since_change, ChangeRecencyOptions, RecencySeries,
};
use finsights_rs::symbols::{default_symbols, find_symbol, SymbolProfile};
use finsights_rs::{Config, DumpStore};

/// Compute the report artefacts: aligned closes, days-since-ATH counters,
/// and days-since-change counters for the selected symbols.
pub fn run_report(config: Config) -> Result<()> {
    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Unable to create {}", config.output_dir.display()))?;

    let profiles = resolve_symbols(&config.symbols)?;
    let store = DumpStore::new(config.data_dir.clone(), config.fallback_dir.clone());
    let table = store
        .load_close_table(&profiles)?
        .filter_date_range(config.include_date_start, config.include_date_end);

    write_frame(
        table.to_data_frame()?,
        &config.output_dir.join("closes.csv"),
    )?;

    let mut ath_counters: Vec<(String, RecencySeries)> = Vec::with_capacity(profiles.len());
    let mut change_counters: Vec<(String, RecencySeries)> = Vec::with_capacity(profiles.len());
    for profile in &profiles {
        let series = table
            .column(profile.code)
            .ok_or_else(|| anyhow!("Symbol '{}' missing from close table", profile.code))?;

        let ath = days_since_ath(&series, config.ath_eps)
            .with_context(|| format!("days_since_ath failed for '{}'", profile.code))?;
        let change = days_since_change(
            &series,
            config.change_pct,
            config.days_period,
            ChangeRecencyOptions {
                with_pct_change: false,
                with_occurrences: true,
            },
        )
        .with_context(|| format!("days_since_change failed for '{}'", profile.code))?;

        info!(
            symbol = profile.code,
            change_pct = config.change_pct,
            days_period = config.days_period,
            occurrences = change.occurrences.unwrap_or(0),
            "Qualifying moves over loaded history"
        );

        ath_counters.push((profile.code.to_string(), ath));
        change_counters.push((profile.code.to_string(), change.days));
    }

    write_frame(
        counter_frame(&ath_counters)?,
        &config.output_dir.join("days_since_ath.csv"),
    )?;
    write_frame(
        counter_frame(&change_counters)?,
        &config.output_dir.join("days_since_change.csv"),
    )?;

    info!(
        output_dir = %config.output_dir.display(),
        symbols = profiles.len(),
        rows = table.height(),
        "Report artefacts written"
    );
    Ok(())
}

/// Compute the index-ratio table and write it as one CSV.
pub fn run_ratios(config: Config, pairs: Vec<RatioPair>) -> Result<()> {
    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Unable to create {}", config.output_dir.display()))?;

    let store = DumpStore::new(config.data_dir.clone(), config.fallback_dir.clone());
    let table = ratio_table(&store, &pairs, config.subsample_step)?
        .filter_date_range(config.include_date_start, config.include_date_end);

    write_frame(
        table.to_data_frame()?,
        &config.output_dir.join("index_ratios.csv"),
    )?;

    info!(
        output_dir = %config.output_dir.display(),
        pairs = pairs.len(),
        rows = table.height(),
        "Ratio artefacts written"
    );
    Ok(())
}

fn resolve_symbols(codes: &[String]) -> Result<Vec<&'static SymbolProfile>> {
    if codes.is_empty() {
        return Ok(default_symbols());
    }
    codes
        .iter()
        .map(|code| find_symbol(code).ok_or_else(|| anyhow!("Unknown symbol '{code}'")))
        .collect()
}

/// Lay recency counters over the union of their date indices. Columns are
/// null before a symbol's cleaned history begins.
fn counter_frame(counters: &[(String, RecencySeries)]) -> Result<DataFrame> {
    let union: BTreeSet<NaiveDate> = counters
        .iter()
        .flat_map(|(_, recency)| recency.dates().iter().copied())
        .collect();
    let dates: Vec<NaiveDate> = union.into_iter().collect();

    let date_strings: Vec<String> = dates
        .iter()
        .map(|date| date.format("%Y-%m-%d").to_string())
        .collect();
    let mut series = vec![Series::new("date", date_strings)];
    for (code, recency) in counters {
        let values: Vec<Option<u32>> = dates
            .iter()
            .map(|date| {
                recency
                    .dates()
                    .binary_search(date)
                    .ok()
                    .map(|idx| recency.days()[idx])
            })
            .collect();
        series.push(Series::new(code.as_str(), values));
    }
    DataFrame::new(series).context("Failed to assemble counter dataframe")
}

fn write_frame(mut df: DataFrame, path: &Path) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Unable to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
