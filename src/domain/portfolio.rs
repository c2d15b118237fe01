//! Portfolio state and equity tracking.

use chrono::NaiveDate;

use super::position::{Position, Trade};

/// Portfolio value after one bar. The seed point has no date.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: Option<NaiveDate>,
    pub equity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InsufficientCash,
    AlreadyInPosition,
    NotInPosition,
}

/// A decision the broker declined to fill. Recorded, never raised.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedOrder {
    pub bar: usize,
    pub date: NaiveDate,
    pub reason: RejectReason,
}

/// Cash, the single position, and the run's ledgers.
///
/// At every bar boundary `cash + position.size × close` equals the last
/// equity point.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Position,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub rejections: Vec<RejectedOrder>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            position: Position::flat(),
            trades: Vec::new(),
            equity_curve: vec![EquityPoint {
                date: None,
                equity: initial_capital,
            }],
            rejections: Vec::new(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_flat()
    }

    pub fn open_trade(&self) -> Option<&Trade> {
        self.trades.last().filter(|t| t.is_open())
    }

    pub(crate) fn open_trade_mut(&mut self) -> Option<&mut Trade> {
        self.trades.last_mut().filter(|t| t.is_open())
    }

    pub fn closed_trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(|t| t.is_closed())
    }

    pub fn total_equity(&self, price: f64) -> f64 {
        self.cash + self.position.market_value(price)
    }

    pub fn record_equity(&mut self, date: NaiveDate, price: f64) {
        let equity = self.total_equity(price);
        self.equity_curve.push(EquityPoint {
            date: Some(date),
            equity,
        });
    }

    pub fn record_rejection(&mut self, bar: usize, date: NaiveDate, reason: RejectReason) {
        self.rejections.push(RejectedOrder { bar, date, reason });
    }

    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|p| p.equity).collect()
    }
}
