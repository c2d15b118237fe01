//! Backtest engine and event loop.
//!
//! Per bar, strictly in order:
//! 1. Indicator engine absorbs the bar
//! 2. Strategy decides from the snapshot and current position
//! 3. Broker executes at most one order at the bar's close
//! 4. Portfolio records equity
//!
//! Each run owns a fresh portfolio, so runs over a shared series are
//! independent and may execute in parallel.

use rayon::prelude::*;

use super::error::BacktestError;
use super::execution::{self, FillResult};
use super::indicator::IndicatorEngine;
use super::metrics::{AnalysisReport, Frequency};
use super::ohlcv::Bar;
use super::portfolio::Portfolio;
use super::strategy::Strategy;

pub const DEFAULT_STARTING_CASH: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub starting_cash: f64,
    pub frequency: Frequency,
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            starting_cash: DEFAULT_STARTING_CASH,
            frequency: Frequency::Daily,
            risk_free_rate: 0.0,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), BacktestError> {
        if !self.starting_cash.is_finite() || self.starting_cash <= 0.0 {
            return Err(BacktestError::invalid(
                "backtest",
                "starting_cash",
                "starting_cash must be positive",
            ));
        }
        if !(0.0..1.0).contains(&self.risk_free_rate) {
            return Err(BacktestError::invalid(
                "backtest",
                "risk_free_rate",
                "risk_free_rate must be between 0 and 1",
            ));
        }
        let periods = self.frequency.periods_per_year();
        if !periods.is_finite() || periods <= 0.0 {
            return Err(BacktestError::invalid(
                "backtest",
                "frequency",
                "periods per year must be positive",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub strategy: Strategy,
    pub portfolio: Portfolio,
    pub report: AnalysisReport,
}

/// Run one strategy over `bars` from a fresh portfolio.
///
/// Configuration problems fail before the first bar; rejected orders only
/// show up in the portfolio ledger.
pub fn run_backtest(
    bars: &[Bar],
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Result<BacktestResult, BacktestError> {
    config.validate()?;
    strategy.rule.validate("strategy")?;
    super::ohlcv::validate_series(bars, "bar series")?;

    let indicator = strategy.rule.indicator();
    let mut engine = IndicatorEngine::new(std::slice::from_ref(&indicator))?;
    let mut portfolio = Portfolio::new(config.starting_cash);

    if bars.len() < indicator.warmup() {
        log::warn!(
            "{}: {} bars is shorter than the {} bar warm-up of {}",
            strategy.name,
            bars.len(),
            indicator.warmup(),
            indicator
        );
    }

    let mut fills = 0usize;
    for (i, bar) in bars.iter().enumerate() {
        let snapshot = engine.update(bar);
        let decision = strategy.rule.decide(&snapshot, &portfolio.position);
        if let FillResult::Bought { .. } | FillResult::Closed { .. } =
            execution::execute(decision, i, bar, &mut portfolio)
        {
            fills += 1;
        }
        portfolio.record_equity(bar.date, bar.close);
    }

    if let (Some(trade), Some(last)) = (portfolio.open_trade(), bars.last()) {
        log::info!(
            "{}: {} units still held from {}, unrealized {:.2}",
            strategy.name,
            trade.size,
            trade.entry_date,
            portfolio.position.unrealized_pnl(last.close)
        );
    }

    let report = AnalysisReport::compute(&portfolio, config.frequency, config.risk_free_rate);
    log::info!(
        "{}: {} bars, {} fills, {} rejected, final value {:.2}",
        strategy.name,
        bars.len(),
        fills,
        portfolio.rejections.len(),
        report.final_value
    );

    Ok(BacktestResult {
        strategy: strategy.clone(),
        portfolio,
        report,
    })
}

/// Run every strategy over the same series in parallel.
///
/// Results come back in the order of `strategies`. The first configuration
/// error aborts the whole batch.
pub fn run_many(
    bars: &[Bar],
    strategies: &[Strategy],
    config: &BacktestConfig,
) -> Result<Vec<BacktestResult>, BacktestError> {
    strategies
        .par_iter()
        .map(|strategy| run_backtest(bars, strategy, config))
        .collect()
}
