pub mod cache;
pub mod config;
pub mod data;
pub mod error;
pub mod ratio;
pub mod recency;
pub mod series;
pub mod symbols;

pub use config::Config;
pub use data::{CloseTable, DumpStore};
pub use error::InsightError;
pub use ratio::{curated_pairs, ratio_table, RatioPair, RatioTable};
pub use recency::{
    count_occurrences, days_since_ath, days_since_change, ChangeRecency, ChangeRecencyOptions,
    RecencySeries,
};
pub use series::{align_and_divide, TimeSeries};
pub use symbols::{find_symbol, SymbolProfile, SYMBOLS};
