//! Performance metrics and statistics.
//!
//! Returns are per bar: r_t = equity[t] / equity[t-1] - 1. Annualisation
//! uses the configured sampling [`Frequency`]. Statistics that cannot be
//! computed are `None` ("not available").

use std::fmt;
use std::str::FromStr;

use super::portfolio::Portfolio;
use super::position::Trade;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Bar sampling frequency, used to annualise returns and Sharpe.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Frequency {
    Hourly,
    #[default]
    Daily,
    Weekly,
    Monthly,
    PeriodsPerYear(f64),
}

impl Frequency {
    pub fn periods_per_year(&self) -> f64 {
        match *self {
            // 6.5 trading hours a day.
            Frequency::Hourly => TRADING_DAYS_PER_YEAR * 6.5,
            Frequency::Daily => TRADING_DAYS_PER_YEAR,
            Frequency::Weekly => 52.0,
            Frequency::Monthly => 12.0,
            Frequency::PeriodsPerYear(n) => n,
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hourly" => Ok(Frequency::Hourly),
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => match other.parse::<f64>() {
                Ok(n) if n.is_finite() && n > 0.0 => Ok(Frequency::PeriodsPerYear(n)),
                _ => Err(format!(
                    "expected hourly, daily, weekly, monthly or a positive number, got '{}'",
                    s.trim()
                )),
            },
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Hourly => write!(f, "hourly"),
            Frequency::Daily => write!(f, "daily"),
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::PeriodsPerYear(n) => write!(f, "{} periods/year", n),
        }
    }
}

/// Summary of one finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub starting_value: f64,
    pub final_value: f64,
    /// Percent.
    pub total_return: f64,
    pub sharpe_ratio: Option<f64>,
    /// Percent, compounded to one year.
    pub annual_return: Option<f64>,
    /// Percent of the running peak.
    pub max_drawdown: Option<f64>,
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// Fraction in [0, 1].
    pub win_rate: f64,
    pub bars: usize,
    pub rejected_orders: usize,
}

impl AnalysisReport {
    pub fn compute(portfolio: &Portfolio, frequency: Frequency, risk_free_rate: f64) -> Self {
        let equity = portfolio.equity_values();
        let mut report = finalize(
            &portfolio.trades,
            &equity,
            portfolio.initial_capital,
            frequency,
            risk_free_rate,
        );
        report.rejected_orders = portfolio.rejections.len();
        report
    }
}

/// Build the report from the trade ledger and equity curve.
///
/// `equity_curve[0]` is the seed value; each later entry is one bar.
pub fn finalize(
    trades: &[Trade],
    equity_curve: &[f64],
    starting_cash: f64,
    frequency: Frequency,
    risk_free_rate: f64,
) -> AnalysisReport {
    let periods_per_year = frequency.periods_per_year();
    let final_value = equity_curve.last().copied().unwrap_or(starting_cash);

    let total_return = if starting_cash > 0.0 {
        (final_value / starting_cash - 1.0) * 100.0
    } else {
        0.0
    };

    let (total_trades, wins, losses) = trade_counts(trades);
    let win_rate = if total_trades > 0 {
        wins as f64 / total_trades as f64
    } else {
        0.0
    };

    let returns = period_returns(equity_curve);
    let period_rf = risk_free_rate / periods_per_year;

    AnalysisReport {
        starting_value: starting_cash,
        final_value,
        total_return,
        sharpe_ratio: compute_sharpe(&returns, period_rf, periods_per_year),
        annual_return: compute_annual_return(
            starting_cash,
            final_value,
            returns.len(),
            periods_per_year,
        ),
        max_drawdown: compute_max_drawdown(equity_curve),
        total_trades,
        wins,
        losses,
        win_rate,
        bars: equity_curve.len().saturating_sub(1),
        rejected_orders: 0,
    }
}

fn trade_counts(trades: &[Trade]) -> (usize, usize, usize) {
    let mut total = 0usize;
    let mut wins = 0usize;
    let mut losses = 0usize;

    for pnl in trades.iter().filter_map(Trade::pnl) {
        total += 1;
        if pnl > 0.0 {
            wins += 1;
        } else if pnl < 0.0 {
            losses += 1;
        }
    }
    (total, wins, losses)
}

fn period_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

/// mean(excess r) / population stddev(r) × √periods_per_year.
fn compute_sharpe(returns: &[f64], period_rf: f64, periods_per_year: f64) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev.is_nan() || stddev <= 0.0 {
        return None;
    }
    Some((mean - period_rf) / stddev * periods_per_year.sqrt())
}

/// ((final / start)^(periods_per_year / n) - 1) × 100.
fn compute_annual_return(
    starting_cash: f64,
    final_value: f64,
    periods: usize,
    periods_per_year: f64,
) -> Option<f64> {
    if periods == 0 || starting_cash <= 0.0 || final_value < 0.0 {
        return None;
    }
    let growth = final_value / starting_cash;
    let annual = growth.powf(periods_per_year / periods as f64) - 1.0;
    annual.is_finite().then_some(annual * 100.0)
}

/// Largest peak-to-trough decline as a percent of the peak.
fn compute_max_drawdown(equity_curve: &[f64]) -> Option<f64> {
    let (&first, rest) = equity_curve.split_first()?;

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &equity in rest {
        if equity > peak {
            peak = equity;
        } else if peak > 0.0 {
            let dd = (peak - equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    Some(max_dd * 100.0)
}
