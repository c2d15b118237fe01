//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktestError;

/// Port for emitting finished backtests.
pub trait ReportPort {
    fn write(&mut self, result: &BacktestResult) -> Result<(), BacktestError>;

    /// Default implementation: writes each result in order.
    fn write_all(&mut self, results: &[BacktestResult]) -> Result<(), BacktestError> {
        for result in results {
            self.write(result)?;
        }
        Ok(())
    }
}
