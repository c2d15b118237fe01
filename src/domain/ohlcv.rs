//! OHLCV bar representation.

use chrono::NaiveDate;

use super::error::BacktestError;

/// One immutable OHLCV sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Check that a series is usable by the engine: non-empty, strictly
/// increasing by date, and priced with finite positive closes.
///
/// Rows are reported 1-based, counting data rows only.
pub fn validate_series(bars: &[Bar], source_name: &str) -> Result<(), BacktestError> {
    if bars.is_empty() {
        return Err(BacktestError::NoData {
            source_name: source_name.to_string(),
        });
    }

    for (i, bar) in bars.iter().enumerate() {
        let row = i + 1;
        if !bar.close.is_finite() || bar.close <= 0.0 {
            return Err(BacktestError::malformed(
                row,
                format!("close must be a positive number, got {}", bar.close),
            ));
        }
        if i > 0 && bar.date <= bars[i - 1].date {
            return Err(BacktestError::malformed(
                row,
                format!(
                    "date {} does not follow previous date {}",
                    bar.date,
                    bars[i - 1].date
                ),
            ));
        }
    }
    Ok(())
}
