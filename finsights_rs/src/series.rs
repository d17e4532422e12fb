use chrono::NaiveDate;

use crate::error::InsightError;

/// A daily close (or derived) series: one observation per trading day,
/// strictly increasing by date. Missing observations are stored as `f64::NAN`,
/// matching the convention used for nullable float columns elsewhere in the
/// workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Build a series from parallel date/value vectors.
    ///
    /// An unsorted index is sorted (values follow their dates); duplicate
    /// dates are rejected since two closes for the same trading day indicate
    /// a caller bug.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self, InsightError> {
        if dates.len() != values.len() {
            return Err(InsightError::IncompatibleIndex(format!(
                "{} dates vs {} values",
                dates.len(),
                values.len()
            )));
        }

        let sorted = dates.windows(2).all(|pair| pair[0] < pair[1]);
        if sorted {
            return Ok(Self { dates, values });
        }

        let mut pairs: Vec<(NaiveDate, f64)> = dates.into_iter().zip(values).collect();
        pairs.sort_by_key(|(date, _)| *date);
        for window in pairs.windows(2) {
            if window[0].0 == window[1].0 {
                return Err(InsightError::IncompatibleIndex(format!(
                    "duplicate date {} in series index",
                    window[0].0
                )));
            }
        }

        let (dates, values) = pairs.into_iter().unzip();
        Ok(Self { dates, values })
    }

    /// An empty series (produced e.g. by forward-filling an all-missing one).
    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Value at an exact date, if that date is present in the index.
    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|idx| self.values[idx])
    }

    /// Drop all entries before the first non-missing value, then replace every
    /// remaining missing value with the most recent non-missing value.
    ///
    /// The output has no missing values unless the input was empty or entirely
    /// missing, in which case it is empty. Idempotent.
    pub fn forward_fill(&self) -> TimeSeries {
        let Some(first_valid) = self.values.iter().position(|value| !value.is_nan()) else {
            return TimeSeries::empty();
        };

        let dates = self.dates[first_valid..].to_vec();
        let mut values = Vec::with_capacity(self.values.len() - first_valid);
        let mut last = self.values[first_valid];
        for &value in &self.values[first_valid..] {
            if !value.is_nan() {
                last = value;
            }
            values.push(last);
        }

        TimeSeries { dates, values }
    }

    /// Keep only entries within the optional inclusive `[start, end]` range.
    pub fn filter_date_range(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> TimeSeries {
        if start.is_none() && end.is_none() {
            return self.clone();
        }

        let mut dates = Vec::new();
        let mut values = Vec::new();
        for (&date, &value) in self.dates.iter().zip(&self.values) {
            if let Some(from) = start {
                if date < from {
                    continue;
                }
            }
            if let Some(to) = end {
                if date > to {
                    continue;
                }
            }
            dates.push(date);
            values.push(value);
        }

        TimeSeries { dates, values }
    }

    /// Re-index this series onto `target_dates` (sorted ascending) using
    /// last-known-value carry-forward. Target dates earlier than the first
    /// observation yield NAN; there is no backward extrapolation.
    pub fn reindex_ffill(&self, target_dates: &[NaiveDate]) -> Vec<f64> {
        let mut out = Vec::with_capacity(target_dates.len());
        let mut cursor = 0usize;
        let mut last = f64::NAN;
        for &date in target_dates {
            while cursor < self.dates.len() && self.dates[cursor] <= date {
                if !self.values[cursor].is_nan() {
                    last = self.values[cursor];
                }
                cursor += 1;
            }
            out.push(last);
        }
        out
    }
}

/// Divide `numerator` by `denominator` after re-indexing the denominator onto
/// the numerator's dates with last-known-value carry-forward.
///
/// The result is defined only over the numerator's dates. Dates preceding the
/// denominator's first observation (and dates where either side is missing)
/// come out as NAN.
pub fn align_and_divide(
    numerator: &TimeSeries,
    denominator: &TimeSeries,
) -> Result<TimeSeries, InsightError> {
    let den = denominator.reindex_ffill(numerator.dates());
    let values = numerator
        .values()
        .iter()
        .zip(&den)
        .map(|(&num, &den)| num / den)
        .collect();
    TimeSeries::new(numerator.dates().to_vec(), values)
}

#[cfg(test)]
pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

#[cfg(test)]
pub(crate) fn daily_series(start: NaiveDate, values: &[f64]) -> TimeSeries {
    let dates = (0..values.len() as i64)
        .map(|offset| start + chrono::Duration::days(offset))
        .collect();
    TimeSeries::new(dates, values.to_vec()).expect("valid test series")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_fill_drops_leading_gaps_and_fills_interior_ones() {
        let series = daily_series(date(2024, 1, 1), &[f64::NAN, f64::NAN, 10.0, f64::NAN, 12.0]);
        let filled = series.forward_fill();

        assert_eq!(filled.dates().first(), Some(&date(2024, 1, 3)));
        assert_eq!(filled.values(), &[10.0, 10.0, 12.0]);
    }

    #[test]
    fn forward_fill_is_idempotent() {
        let series = daily_series(date(2024, 1, 1), &[f64::NAN, 5.0, f64::NAN, 7.0]);
        let once = series.forward_fill();
        let twice = once.forward_fill();
        assert_eq!(once, twice);
    }

    #[test]
    fn forward_fill_of_all_missing_series_is_empty() {
        let series = daily_series(date(2024, 1, 1), &[f64::NAN, f64::NAN]);
        assert!(series.forward_fill().is_empty());
        assert!(TimeSeries::empty().forward_fill().is_empty());
    }

    #[test]
    fn new_sorts_an_unsorted_index() {
        let series = TimeSeries::new(
            vec![date(2024, 1, 3), date(2024, 1, 1), date(2024, 1, 2)],
            vec![3.0, 1.0, 2.0],
        )
        .expect("sortable index");
        assert_eq!(
            series.dates(),
            &[date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]
        );
        assert_eq!(series.values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn new_rejects_duplicate_dates() {
        let err = TimeSeries::new(
            vec![date(2024, 1, 2), date(2024, 1, 1), date(2024, 1, 2)],
            vec![1.0, 2.0, 3.0],
        )
        .unwrap_err();
        assert!(matches!(err, InsightError::IncompatibleIndex(_)));
    }

    #[test]
    fn new_rejects_mismatched_lengths() {
        let err = TimeSeries::new(vec![date(2024, 1, 1)], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, InsightError::IncompatibleIndex(_)));
    }

    #[test]
    fn align_and_divide_carries_denominator_forward() {
        // Numerator trades every day; denominator skips Jan 3 (e.g. a holiday
        // on the other exchange).
        let numerator = daily_series(date(2024, 1, 1), &[10.0, 20.0, 30.0, 40.0]);
        let denominator = TimeSeries::new(
            vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 4)],
            vec![2.0, 4.0, 8.0],
        )
        .expect("valid denominator");

        let ratio = align_and_divide(&numerator, &denominator).expect("alignable");
        assert_eq!(ratio.dates(), numerator.dates());
        // Jan 3 divides by the carried-forward Jan 2 value.
        assert_eq!(ratio.values(), &[5.0, 5.0, 7.5, 5.0]);
    }

    #[test]
    fn align_and_divide_has_no_backward_extrapolation() {
        let numerator = daily_series(date(2024, 1, 1), &[10.0, 20.0, 30.0]);
        let denominator = TimeSeries::new(vec![date(2024, 1, 3)], vec![10.0]).expect("valid");

        let ratio = align_and_divide(&numerator, &denominator).expect("alignable");
        assert!(ratio.values()[0].is_nan());
        assert!(ratio.values()[1].is_nan());
        assert_eq!(ratio.values()[2], 3.0);
    }

    #[test]
    fn align_and_divide_is_scale_invariant() {
        let numerator = daily_series(date(2024, 1, 1), &[3.0, 6.0, 9.0]);
        let scaled = daily_series(date(2024, 1, 1), &[7.5, 15.0, 22.5]);
        let denominator = daily_series(date(2024, 1, 1), &[1.5, 3.0, 4.5]);

        let base = align_and_divide(&numerator, &denominator).expect("alignable");
        let k = align_and_divide(&scaled, &denominator).expect("alignable");
        for (lhs, rhs) in base.values().iter().zip(k.values()) {
            assert!((lhs * 2.5 - rhs).abs() < 1e-12);
        }
    }

    #[test]
    fn reindex_skips_missing_denominator_values() {
        let series = daily_series(date(2024, 1, 1), &[2.0, f64::NAN, 6.0]);
        let targets = [date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)];
        let reindexed = series.reindex_ffill(&targets);
        assert_eq!(reindexed[0], 2.0);
        // The missing Jan 2 observation falls back to the Jan 1 value.
        assert_eq!(reindexed[1], 2.0);
        assert_eq!(reindexed[2], 6.0);
    }

    #[test]
    fn filter_date_range_is_inclusive_on_both_ends() {
        let series = daily_series(date(2024, 1, 1), &[1.0, 2.0, 3.0, 4.0]);
        let filtered = series.filter_date_range(Some(date(2024, 1, 2)), Some(date(2024, 1, 3)));
        assert_eq!(filtered.dates(), &[date(2024, 1, 2), date(2024, 1, 3)]);
        assert_eq!(filtered.values(), &[2.0, 3.0]);
    }
}
