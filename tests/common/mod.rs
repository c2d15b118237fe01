#![allow(dead_code)]

use barsim::domain::error::BacktestError;
pub use barsim::domain::ohlcv::Bar;
use barsim::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::cell::Cell;

pub struct MockDataPort {
    pub bars: Vec<Bar>,
    pub error: Option<String>,
    pub fetches: Cell<usize>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            bars: Vec::new(),
            error: None,
            fetches: Cell::new(0),
        }
    }

    pub fn with_bars(mut self, bars: Vec<Bar>) -> Self {
        self.bars = bars;
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self) -> Result<Vec<Bar>, BacktestError> {
        self.fetches.set(self.fetches.get() + 1);
        if let Some(reason) = &self.error {
            return Err(BacktestError::MalformedData {
                row: 1,
                reason: reason.clone(),
            });
        }
        if self.bars.is_empty() {
            return Err(BacktestError::NoData {
                source_name: self.source_name(),
            });
        }
        Ok(self.bars.clone())
    }

    fn source_name(&self) -> String {
        "mock".to_string()
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: &str, close: f64) -> Bar {
    Bar {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000.0,
    }
}

/// One bar per day from 2024-01-01 with the given closes.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Linear ramp: close = start_price + i.
pub fn generate_bars(start_date: &str, count: usize, start_price: f64) -> Vec<Bar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| Bar {
            date: start + chrono::Duration::days(i as i64),
            open: start_price + i as f64,
            high: start_price + i as f64 + 1.0,
            low: start_price + i as f64 - 1.0,
            close: start_price + i as f64,
            volume: 1000.0,
        })
        .collect()
}

/// Smooth oscillation around `mid`, enough to trigger every default rule.
pub fn oscillating_bars(count: usize, mid: f64, amplitude: f64, period: f64) -> Vec<Bar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| mid + amplitude * (i as f64 * std::f64::consts::TAU / period).sin())
        .collect();
    bars_from_closes(&closes)
}

pub fn to_csv(bars: &[Bar]) -> String {
    let mut out = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    out
}
