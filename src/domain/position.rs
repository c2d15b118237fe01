//! Position and trade records.

use chrono::NaiveDate;

/// Long-only holding. `size == 0` means flat.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub size: u64,
    pub average_entry_price: f64,
}

impl Position {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.size == 0
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.size as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.size as f64 * (price - self.average_entry_price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TradeState {
    Open,
    Closed {
        exit_bar: usize,
        exit_date: NaiveDate,
        exit_price: f64,
        pnl: f64,
    },
}

/// One round trip: opened by a filled Buy, closed by a filled CloseAll.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_bar: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub size: u64,
    pub state: TradeState,
}

impl Trade {
    pub fn open(entry_bar: usize, entry_date: NaiveDate, entry_price: f64, size: u64) -> Self {
        Trade {
            entry_bar,
            entry_date,
            entry_price,
            size,
            state: TradeState::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, TradeState::Open)
    }

    pub fn is_closed(&self) -> bool {
        !self.is_open()
    }

    /// Realised profit, `None` while the trade is open.
    pub fn pnl(&self) -> Option<f64> {
        match self.state {
            TradeState::Closed { pnl, .. } => Some(pnl),
            TradeState::Open => None,
        }
    }

    pub fn exit_price(&self) -> Option<f64> {
        match self.state {
            TradeState::Closed { exit_price, .. } => Some(exit_price),
            TradeState::Open => None,
        }
    }

    /// Close at `exit_price`; pnl = (exit - entry) × size.
    pub fn close(&mut self, exit_bar: usize, exit_date: NaiveDate, exit_price: f64) -> f64 {
        let pnl = (exit_price - self.entry_price) * self.size as f64;
        self.state = TradeState::Closed {
            exit_bar,
            exit_date,
            exit_price,
            pnl,
        };
        pnl
    }
}
