//! Order execution and fill simulation.
//!
//! Orders fill at the close of the bar that produced the decision, all or
//! nothing, without slippage or commission. A decision whose preconditions
//! fail is rejected and recorded on the portfolio; it is never an error.

use super::ohlcv::Bar;
use super::portfolio::{Portfolio, RejectReason};
use super::position::{Position, Trade};
use super::strategy::Decision;

/// Outcome of executing one decision.
#[derive(Debug, Clone, PartialEq)]
pub enum FillResult {
    NoOrder,
    Bought {
        size: u64,
        price: f64,
        cost: f64,
    },
    Closed {
        size: u64,
        price: f64,
        proceeds: f64,
        pnl: f64,
    },
    Rejected(RejectReason),
}

/// Execute `decision` against `portfolio` at `bar.close`.
///
/// `bar_index` is the bar's position in the series and is stored on trades
/// and rejections.
pub fn execute(
    decision: Decision,
    bar_index: usize,
    bar: &Bar,
    portfolio: &mut Portfolio,
) -> FillResult {
    let result = match decision {
        Decision::Hold => FillResult::NoOrder,
        Decision::Buy => buy(bar_index, bar, portfolio),
        Decision::CloseAll => close_all(bar_index, bar, portfolio),
    };

    match &result {
        FillResult::Rejected(reason) => {
            log::debug!("{}: {:?} rejected ({:?})", bar.date, decision, reason);
            portfolio.record_rejection(bar_index, bar.date, *reason);
        }
        FillResult::Bought { size, price, .. } => {
            log::debug!("{}: bought {} @ {:.2}", bar.date, size, price);
        }
        FillResult::Closed { size, price, pnl, .. } => {
            log::debug!("{}: sold {} @ {:.2}, pnl {:.2}", bar.date, size, price, pnl);
        }
        FillResult::NoOrder => {}
    }

    result
}

/// Enter with every whole unit the cash can buy.
///
/// Steps:
/// 1. Reject when a position is already open
/// 2. size = floor(cash / close); reject when zero
/// 3. Deduct size × close from cash
/// 4. Set the position and open a trade
fn buy(bar_index: usize, bar: &Bar, portfolio: &mut Portfolio) -> FillResult {
    if !portfolio.is_flat() {
        return FillResult::Rejected(RejectReason::AlreadyInPosition);
    }

    let price = bar.close;
    let size = (portfolio.cash / price).floor() as u64;
    if size == 0 {
        return FillResult::Rejected(RejectReason::InsufficientCash);
    }

    let cost = size as f64 * price;
    if cost > portfolio.cash {
        return FillResult::Rejected(RejectReason::InsufficientCash);
    }

    portfolio.cash -= cost;
    portfolio.position = Position {
        size,
        average_entry_price: price,
    };
    portfolio
        .trades
        .push(Trade::open(bar_index, bar.date, price, size));

    FillResult::Bought { size, price, cost }
}

/// Sell the whole position and close the open trade.
fn close_all(bar_index: usize, bar: &Bar, portfolio: &mut Portfolio) -> FillResult {
    if portfolio.is_flat() {
        return FillResult::Rejected(RejectReason::NotInPosition);
    }

    let price = bar.close;
    let size = portfolio.position.size;
    let proceeds = size as f64 * price;

    portfolio.cash += proceeds;
    portfolio.position = Position::flat();

    let pnl = match portfolio.open_trade_mut() {
        Some(trade) => trade.close(bar_index, bar.date, price),
        None => {
            log::warn!("{}: position held without an open trade", bar.date);
            0.0
        }
    };

    FillResult::Closed {
        size,
        price,
        proceeds,
        pnl,
    }
}
