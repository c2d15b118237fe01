//! Plain-text run summary.

use std::io::Write;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktestError;
use crate::ports::report_port::ReportPort;

const NOT_AVAILABLE: &str = "not available";

/// Writes one summary block per run to `out` (stdout in the binary).
pub struct ConsoleReportAdapter<W: Write> {
    out: W,
}

impl<W: Write> ConsoleReportAdapter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn optional(value: Option<f64>, suffix: &str) -> String {
    match value {
        Some(v) => format!("{:.2}{}", v, suffix),
        None => NOT_AVAILABLE.to_string(),
    }
}

impl<W: Write> ReportPort for ConsoleReportAdapter<W> {
    fn write(&mut self, result: &BacktestResult) -> Result<(), BacktestError> {
        let r = &result.report;
        let out = &mut self.out;

        writeln!(out, "=== {} ===", result.strategy.name)?;
        writeln!(out, "Rule:                     {}", result.strategy.rule)?;
        writeln!(out, "Bars:                     {}", r.bars)?;
        writeln!(out, "Starting Portfolio Value: {:.2}", r.starting_value)?;
        writeln!(out, "Final Portfolio Value:    {:.2}", r.final_value)?;
        writeln!(out, "Total Return:             {:.2}%", r.total_return)?;
        writeln!(out, "Sharpe Ratio:             {}", optional(r.sharpe_ratio, ""))?;
        writeln!(out, "Annual Return:            {}", optional(r.annual_return, "%"))?;
        writeln!(out, "Max Drawdown:             {}", optional(r.max_drawdown, "%"))?;
        writeln!(out, "Total Trades:             {}", r.total_trades)?;
        writeln!(out, "Winning Trades:           {}", r.wins)?;
        writeln!(out, "Losing Trades:            {}", r.losses)?;
        writeln!(out, "Win Rate:                 {:.2}%", r.win_rate * 100.0)?;
        writeln!(out, "Rejected Orders:          {}", r.rejected_orders)?;
        writeln!(out)?;
        out.flush()?;
        Ok(())
    }
}
