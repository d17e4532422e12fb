use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::series::TimeSeries;

pub type SharedSeries = Arc<TimeSeries>;

/// Explicit cache for loaded close series, keyed by symbol code and dump
/// stamp. Replaces the memoized-fetch decorator the dashboard layered over
/// its loaders: the loader owns one of these and consults it before touching
/// the filesystem.
#[derive(Clone, Debug, Default)]
pub struct LoadCache {
    inner: Arc<RwLock<HashMap<(String, String), SharedSeries>>>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str, stamp: &str) -> Option<SharedSeries> {
        let hit = self.inner.read().ok().and_then(|guard| {
            guard
                .get(&(symbol.to_string(), stamp.to_string()))
                .cloned()
        });
        match &hit {
            Some(_) => debug!(symbol, stamp, "load cache hit"),
            None => debug!(symbol, stamp, "load cache miss"),
        }
        hit
    }

    pub fn insert(&self, symbol: &str, stamp: &str, series: TimeSeries) -> SharedSeries {
        let arc = Arc::new(series);
        if let Ok(mut guard) = self.inner.write() {
            guard.insert((symbol.to_string(), stamp.to_string()), arc.clone());
        }
        arc
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.inner.write() {
            guard.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{daily_series, date};

    #[test]
    fn cache_round_trips_by_symbol_and_stamp() {
        let cache = LoadCache::new();
        assert!(cache.get("spx", "20240208").is_none());

        let series = daily_series(date(2024, 1, 1), &[1.0, 2.0]);
        cache.insert("spx", "20240208", series.clone());

        let cached = cache.get("spx", "20240208").expect("cached entry");
        assert_eq!(*cached, series);
        // A different stamp is a distinct entry.
        assert!(cache.get("spx", "20240209").is_none());
    }
}
