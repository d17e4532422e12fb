use thiserror::Error;

/// Contract violations raised by the transform core.
///
/// All variants are programmer-error-class failures: they indicate a caller
/// bug (bad parameter, malformed index), not a runtime condition to recover
/// from, and are raised immediately at the point of violation.
#[derive(Debug, Error, PartialEq)]
pub enum InsightError {
    /// A scalar parameter is outside its contract (negative tolerance,
    /// zero look-back period, non-finite threshold).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A series index cannot serve as a date index (mismatched lengths,
    /// duplicate dates, or an unparsable date column at the loading boundary).
    #[error("incompatible index: {0}")]
    IncompatibleIndex(String),

    /// A transform that needs a first observation received a zero-length or
    /// all-missing series.
    #[error("empty series: {0}")]
    EmptySeries(String),
}
