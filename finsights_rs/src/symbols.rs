use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    EquityIndex,
    Crypto,
    Macro,
}

/// Static profile of a tracked instrument: where its close-price dumps live
/// and how to present it.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolProfile {
    pub code: &'static str,
    pub label: &'static str,
    /// Dump files are named `<dump_prefix>_daily_YYYYMMDD.csv`.
    pub dump_prefix: &'static str,
    pub class: AssetClass,
    pub description: &'static str,
    /// Whether the symbol is selected by default in reports.
    pub default_selected: bool,
}

pub const SYMBOLS: &[SymbolProfile] = &[
    SymbolProfile {
        code: "spx",
        label: "S&P 500",
        dump_prefix: "s&p500",
        class: AssetClass::EquityIndex,
        description: "S&P 500 Index. A market-capitalization-weighted index of the 500 largest \
                      US companies.",
        default_selected: true,
    },
    SymbolProfile {
        code: "spxew",
        label: "S&P 500 Equal Weight",
        dump_prefix: "s&p500_ew",
        class: AssetClass::EquityIndex,
        description: "S&P 500 Equal Weight Index. An equal-weighted version of the S&P 500 Index.",
        default_selected: false,
    },
    SymbolProfile {
        code: "ixic",
        label: "NASDAQ Composite",
        dump_prefix: "nasdaq_comp",
        class: AssetClass::EquityIndex,
        description: "A market-capitalization-weighted index of all common stocks listed on \
                      NASDAQ.",
        default_selected: true,
    },
    SymbolProfile {
        code: "ndx",
        label: "NASDAQ 100",
        dump_prefix: "nasdaq100",
        class: AssetClass::EquityIndex,
        description: "NASDAQ 100 Index. A market-capitalization-weighted index of the 100 \
                      largest non-financial companies listed on NASDAQ.",
        default_selected: false,
    },
    SymbolProfile {
        code: "rut",
        label: "Russell 2000",
        dump_prefix: "russel2000",
        class: AssetClass::EquityIndex,
        description: "Russell 2000 Index. A market-capitalization-weighted index of 2000 US \
                      small-cap companies.",
        default_selected: true,
    },
    SymbolProfile {
        code: "ftw5000",
        label: "Wilshire 5000",
        dump_prefix: "wilshire5000",
        class: AssetClass::EquityIndex,
        description: "Total market index of all American stocks. A market-capitalization-weighted \
                      index with around 3.5k stocks, including the majority of common stocks and \
                      REITs traded through NYSE, NASDAQ, or AMEX, and excluding limited \
                      partnerships and ADRs.",
        default_selected: false,
    },
    SymbolProfile {
        code: "usgdp",
        label: "US GDP real",
        dump_prefix: "usgdp",
        class: AssetClass::Macro,
        description: "US real gross domestic product, used as an economic anchor for \
                      market-cap-to-economy ratios.",
        default_selected: false,
    },
    SymbolProfile {
        code: "btc",
        label: "Bitcoin",
        dump_prefix: "btc_usd",
        class: AssetClass::Crypto,
        description: "Bitcoin, denominated in USD.",
        default_selected: false,
    },
    SymbolProfile {
        code: "eth",
        label: "Ether",
        dump_prefix: "eth_usd",
        class: AssetClass::Crypto,
        description: "Ether, denominated in USD.",
        default_selected: false,
    },
];

static SYMBOL_INDEX: Lazy<HashMap<&'static str, &'static SymbolProfile>> =
    Lazy::new(|| SYMBOLS.iter().map(|profile| (profile.code, profile)).collect());

pub fn find_symbol(code: &str) -> Option<&'static SymbolProfile> {
    let lower = code.to_ascii_lowercase();
    SYMBOL_INDEX.get(lower.as_str()).copied()
}

/// Symbols selected when the caller does not name any.
pub fn default_symbols() -> Vec<&'static SymbolProfile> {
    SYMBOLS
        .iter()
        .filter(|profile| profile.default_selected)
        .collect()
}
