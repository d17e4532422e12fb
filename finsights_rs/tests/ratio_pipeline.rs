use std::path::Path;

use anyhow::Result;
use tempfile::tempdir;

use finsights_rs::ratio::{ratio_table, RatioPair};
use finsights_rs::symbols::find_symbol;
use finsights_rs::DumpStore;

fn write_dump(dir: &Path, prefix: &str, stamp: &str, rows: &[(&str, &str)]) {
    let mut body = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for (date, close) in rows {
        body.push_str(&format!("{date},1,1,1,{close},{close},1000\n"));
    }
    std::fs::write(dir.join(format!("{prefix}_daily_{stamp}.csv")), body)
        .expect("failed to write dump fixture");
}

fn seeded_store(dir: &Path) -> DumpStore {
    let spx = find_symbol("spx").expect("cataloged symbol");
    let ftw = find_symbol("ftw5000").expect("cataloged symbol");
    write_dump(
        dir,
        spx.dump_prefix,
        "20240208",
        &[
            ("2024-01-02", "100"),
            ("2024-01-03", "110"),
            ("2024-01-04", "120"),
            ("2024-01-05", "130"),
        ],
    );
    // The denominator misses Jan 4; its Jan 3 value should carry forward.
    write_dump(
        dir,
        ftw.dump_prefix,
        "20240208",
        &[("2024-01-02", "50"), ("2024-01-03", "55"), ("2024-01-05", "65")],
    );
    DumpStore::new(dir, None)
}

#[test]
fn ratio_table_divides_with_carry_forward() -> Result<()> {
    let dir = tempdir()?;
    let store = seeded_store(dir.path());

    let table = ratio_table(&store, &[RatioPair::new("spx", "ftw5000")], 1)?;
    let ratio = table.column("spx/ftw5000").expect("ratio column");

    assert_eq!(ratio.len(), 4);
    assert_eq!(ratio.values()[0], 2.0);
    assert_eq!(ratio.values()[1], 2.0);
    // Jan 4 divides 120 by the carried-forward 55.
    assert!((ratio.values()[2] - 120.0 / 55.0).abs() < 1e-12);
    assert_eq!(ratio.values()[3], 2.0);
    Ok(())
}

#[test]
fn ratio_table_subsamples_rows() -> Result<()> {
    let dir = tempdir()?;
    let store = seeded_store(dir.path());

    let table = ratio_table(&store, &[RatioPair::new("spx", "ftw5000")], 2)?;
    assert_eq!(table.height(), 2, "every second row should remain");
    Ok(())
}

#[test]
fn ratio_table_rejects_zero_subsample_step() {
    let dir = tempdir().expect("tempdir");
    let store = seeded_store(dir.path());

    let err = ratio_table(&store, &[RatioPair::new("spx", "ftw5000")], 0).unwrap_err();
    assert!(
        err.to_string().contains("subsample_step"),
        "unexpected error: {err}"
    );
}

#[test]
fn ratio_table_rejects_unknown_symbols() {
    let dir = tempdir().expect("tempdir");
    let store = seeded_store(dir.path());

    let err = ratio_table(&store, &[RatioPair::new("spx", "nope")], 1).unwrap_err();
    assert!(err.to_string().contains("nope"), "unexpected error: {err}");
}
