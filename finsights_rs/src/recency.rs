use chrono::NaiveDate;

use crate::error::InsightError;
use crate::series::TimeSeries;

/// An integer series aligned 1:1 with a cleaned source series, counting
/// observations elapsed since the last time a reset condition held. The count
/// is 0 exactly where the condition holds (index 0 by convention) and the
/// previous count plus one everywhere else.
#[derive(Debug, Clone, PartialEq)]
pub struct RecencySeries {
    dates: Vec<NaiveDate>,
    days: Vec<u32>,
}

impl RecencySeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn days(&self) -> &[u32] {
        &self.days
    }
}

/// Days since the latest all-time-high.
///
/// The running ATH starts at the first observation. A day resets the counter
/// when `ath - price < eps` (and bumps the ATH to `max(ath, price)`);
/// otherwise the counter is the previous value plus one. `eps` defaults to 0,
/// in which case only a strictly new high resets; a small positive tolerance
/// avoids resetting on negligible new-high noise.
///
/// The input is cleaned via [`TimeSeries::forward_fill`] first.
pub fn days_since_ath(
    series: &TimeSeries,
    eps: Option<f64>,
) -> Result<RecencySeries, InsightError> {
    let eps = eps.unwrap_or(0.0);
    if !eps.is_finite() || eps < 0.0 {
        return Err(InsightError::InvalidArgument(format!(
            "ATH tolerance must be a non-negative finite number, got {eps}"
        )));
    }

    let clean = series.forward_fill();
    if clean.is_empty() {
        return Err(InsightError::EmptySeries(
            "days_since_ath needs at least one observation".to_string(),
        ));
    }

    let values = clean.values();
    let mut ath = values[0];
    let mut days = Vec::with_capacity(values.len());
    days.push(0u32);
    for &price in &values[1..] {
        if ath - price < eps {
            ath = ath.max(price);
            days.push(0);
        } else {
            days.push(days.last().copied().unwrap_or(0) + 1);
        }
    }

    Ok(RecencySeries {
        dates: clean.dates().to_vec(),
        days,
    })
}

/// Count how many day-over-day percent changes meet `change_pct`.
///
/// Positive thresholds count gains of at least `change_pct` percent; zero and
/// negative thresholds count changes of at most `change_pct` percent. Note
/// the asymmetry at zero: the branch is picked by `change_pct > 0`, so a zero
/// threshold counts every non-positive change.
pub fn count_occurrences(series: &TimeSeries, change_pct: f64) -> Result<u64, InsightError> {
    if !change_pct.is_finite() {
        return Err(InsightError::InvalidArgument(format!(
            "change threshold must be finite, got {change_pct}"
        )));
    }

    let clean = series.forward_fill();
    Ok(count_qualifying(&step_changes(clean.values(), 1), change_pct))
}

/// Optional extra outputs for [`days_since_change`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ChangeRecencyOptions {
    /// Also return the full percent-change series.
    pub with_pct_change: bool,
    /// Also return the total occurrence count over the period-step changes.
    pub with_occurrences: bool,
}

/// Result of [`days_since_change`]. The optional fields are populated
/// according to [`ChangeRecencyOptions`]; the default is the counter alone.
#[derive(Debug, Clone)]
pub struct ChangeRecency {
    pub days: RecencySeries,
    pub pct_change: Option<TimeSeries>,
    pub occurrences: Option<u64>,
}

/// Days since the latest qualifying percent move.
///
/// The move is measured over `days_period` observations (1 = day-over-day,
/// 5 = weekly, ...). The counter starts at 0 by convention and keeps
/// incrementing through the first `days_period` entries, where the change is
/// undefined; from then on it resets to 0 wherever the period change meets
/// `change_pct` under the same sign convention as [`count_occurrences`].
///
/// The input is cleaned via [`TimeSeries::forward_fill`] first.
pub fn days_since_change(
    series: &TimeSeries,
    change_pct: f64,
    days_period: usize,
    options: ChangeRecencyOptions,
) -> Result<ChangeRecency, InsightError> {
    if !change_pct.is_finite() {
        return Err(InsightError::InvalidArgument(format!(
            "change threshold must be finite, got {change_pct}"
        )));
    }
    if days_period == 0 {
        return Err(InsightError::InvalidArgument(
            "days_period must be at least 1".to_string(),
        ));
    }

    let clean = series.forward_fill();
    if clean.is_empty() {
        return Err(InsightError::EmptySeries(
            "days_since_change needs at least one observation".to_string(),
        ));
    }

    let changes = step_changes(clean.values(), days_period);
    let mut days = Vec::with_capacity(clean.len());
    days.push(0u32);
    for (idx, &pct) in changes.iter().enumerate().skip(1) {
        if !pct.is_nan() && qualifies(pct, change_pct) {
            days.push(0);
        } else {
            days.push(days[idx - 1] + 1);
        }
    }

    let pct_change = if options.with_pct_change {
        Some(TimeSeries::new(clean.dates().to_vec(), changes.clone())?)
    } else {
        None
    };
    let occurrences = if options.with_occurrences {
        Some(count_qualifying(&changes, change_pct))
    } else {
        None
    };

    Ok(ChangeRecency {
        days: RecencySeries {
            dates: clean.dates().to_vec(),
            days,
        },
        pct_change,
        occurrences,
    })
}

/// Percent change over `period` observations; NAN where undefined (the first
/// `period` entries).
fn step_changes(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len().min(period)];
    for idx in period..values.len() {
        let base = values[idx - period];
        out.push((values[idx] - base) / base * 100.0);
    }
    out
}

fn qualifies(pct: f64, change_pct: f64) -> bool {
    if change_pct > 0.0 {
        pct >= change_pct
    } else {
        pct <= change_pct
    }
}

fn count_qualifying(changes: &[f64], change_pct: f64) -> u64 {
    changes
        .iter()
        .filter(|pct| !pct.is_nan() && qualifies(**pct, change_pct))
        .count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{daily_series, date};

    #[test]
    fn ath_counter_matches_reference_example() {
        let series = daily_series(date(2024, 1, 1), &[100.0, 105.0, 103.0, 108.0, 107.0]);
        let recency = days_since_ath(&series, None).expect("valid input");
        assert_eq!(recency.days(), &[0, 0, 1, 0, 1]);
        assert_eq!(recency.dates(), series.dates());
    }

    #[test]
    fn ath_counter_either_resets_or_increments_by_one() {
        let series = daily_series(
            date(2024, 1, 1),
            &[50.0, 48.0, 47.0, 51.0, 50.5, 49.0, 52.0],
        );
        let recency = days_since_ath(&series, None).expect("valid input");
        assert_eq!(recency.days()[0], 0);
        for idx in 1..recency.len() {
            let current = recency.days()[idx];
            let previous = recency.days()[idx - 1];
            assert!(
                current == 0 || current == previous + 1,
                "counter must reset or increment by one (idx {idx})"
            );
        }
    }

    #[test]
    fn ath_tolerance_absorbs_small_drawdowns() {
        // With eps=2, a dip to 99 still counts as "at the high".
        let series = daily_series(date(2024, 1, 1), &[100.0, 99.0, 104.0]);
        let recency = days_since_ath(&series, Some(2.0)).expect("valid input");
        assert_eq!(recency.days(), &[0, 0, 0]);
        // Without tolerance the dip increments.
        let strict = days_since_ath(&series, None).expect("valid input");
        assert_eq!(strict.days(), &[0, 1, 0]);
    }

    #[test]
    fn ath_counter_cleans_its_input_first() {
        let series = daily_series(
            date(2024, 1, 1),
            &[f64::NAN, 100.0, f64::NAN, 105.0, 103.0],
        );
        let recency = days_since_ath(&series, None).expect("valid input");
        // Leading gap dropped, interior gap forward-filled (100 -> not a new high).
        assert_eq!(recency.days(), &[0, 1, 0, 1]);
        assert_eq!(recency.dates().first(), Some(&date(2024, 1, 2)));
    }

    #[test]
    fn ath_rejects_negative_tolerance() {
        let series = daily_series(date(2024, 1, 1), &[100.0, 101.0]);
        let err = days_since_ath(&series, Some(-0.5)).unwrap_err();
        assert!(matches!(err, InsightError::InvalidArgument(_)));
    }

    #[test]
    fn ath_rejects_empty_series() {
        let err = days_since_ath(&TimeSeries::empty(), None).unwrap_err();
        assert!(matches!(err, InsightError::EmptySeries(_)));
    }

    #[test]
    fn occurrence_count_matches_reference_example() {
        // Day-over-day changes: [3.0, -3.88.., 2.02..]
        let series = daily_series(date(2024, 1, 1), &[100.0, 103.0, 99.0, 101.0]);
        assert_eq!(count_occurrences(&series, 2.0).expect("valid"), 2);
        assert_eq!(count_occurrences(&series, -2.0).expect("valid"), 1);
    }

    #[test]
    fn zero_threshold_counts_non_positive_changes() {
        // change_pct = 0 takes the loss branch: it counts every change <= 0,
        // not exact non-moves.
        let series = daily_series(date(2024, 1, 1), &[100.0, 100.0, 99.0, 101.0]);
        assert_eq!(count_occurrences(&series, 0.0).expect("valid"), 2);
    }

    #[test]
    fn occurrence_count_of_trivial_series_is_zero() {
        let single = daily_series(date(2024, 1, 1), &[100.0]);
        assert_eq!(count_occurrences(&single, 2.0).expect("valid"), 0);
        assert_eq!(count_occurrences(&TimeSeries::empty(), 2.0).expect("valid"), 0);
    }

    #[test]
    fn change_counter_matches_reference_example() {
        let series = daily_series(date(2024, 1, 1), &[100.0, 103.0, 99.0, 101.0]);
        let result =
            days_since_change(&series, 2.0, 1, ChangeRecencyOptions::default()).expect("valid");
        assert_eq!(result.days.days(), &[0, 0, 1, 0]);
        assert!(result.pct_change.is_none());
        assert!(result.occurrences.is_none());
    }

    #[test]
    fn change_counter_increments_through_undefined_head() {
        // With a 3-day period, indices 1 and 2 have no defined change and the
        // counter just keeps incrementing there.
        let series = daily_series(date(2024, 1, 1), &[100.0, 101.0, 102.0, 104.0, 103.0]);
        let result =
            days_since_change(&series, 3.0, 3, ChangeRecencyOptions::default()).expect("valid");
        // 3-day changes: [_, _, _, 4.0, ~1.98] -> reset at index 3 only.
        assert_eq!(result.days.days(), &[0, 1, 2, 0, 1]);
    }

    #[test]
    fn change_extras_are_returned_on_request() {
        let series = daily_series(date(2024, 1, 1), &[100.0, 103.0, 99.0, 101.0]);
        let result = days_since_change(
            &series,
            2.0,
            1,
            ChangeRecencyOptions {
                with_pct_change: true,
                with_occurrences: true,
            },
        )
        .expect("valid");

        let pct = result.pct_change.expect("requested pct series");
        assert!(pct.values()[0].is_nan());
        assert!((pct.values()[1] - 3.0).abs() < 1e-9);
        assert_eq!(result.occurrences, Some(2));
    }

    #[test]
    fn change_counter_rejects_zero_period() {
        let series = daily_series(date(2024, 1, 1), &[100.0, 101.0]);
        let err =
            days_since_change(&series, 2.0, 0, ChangeRecencyOptions::default()).unwrap_err();
        assert!(matches!(err, InsightError::InvalidArgument(_)));
    }

    #[test]
    fn change_counter_rejects_non_finite_threshold() {
        let series = daily_series(date(2024, 1, 1), &[100.0, 101.0]);
        let err = days_since_change(&series, f64::NAN, 1, ChangeRecencyOptions::default())
            .unwrap_err();
        assert!(matches!(err, InsightError::InvalidArgument(_)));
    }
}
