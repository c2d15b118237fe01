//! Bar series access port trait.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::Bar;

pub trait DataPort {
    /// Load the whole series, oldest bar first.
    ///
    /// A malformed row fails the load; rows are never skipped.
    fn fetch_bars(&self) -> Result<Vec<Bar>, BacktestError>;

    /// Human-readable origin of the series, used in messages.
    fn source_name(&self) -> String;
}
