//! Technical indicators, computed one bar at a time.
//!
//! This module provides:
//! - `IndicatorType`: indicator identity + parameters (serves as HashMap key)
//! - `IndicatorValue`: the output shapes an indicator can emit
//! - `IndicatorSnapshot`: every configured indicator's reading for one bar
//! - `IndicatorEngine`: owns the rolling state and produces snapshots
//!
//! A reading of `None` means "not ready"; it is never a zero.

pub mod bollinger;
pub mod crossover;
pub mod ring;
pub mod rsi;
pub mod sma;

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

use self::bollinger::{Bands, Bollinger};
use self::crossover::Crossover;
use self::rsi::Rsi;
use self::sma::Sma;
use super::error::BacktestError;
use super::ohlcv::Bar;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Bollinger { upper: f64, middle: f64, lower: f64 },
}

impl IndicatorValue {
    /// Single-line view: the value itself, or the Bollinger midline.
    pub fn line(&self) -> f64 {
        match *self {
            IndicatorValue::Simple(v) => v,
            IndicatorValue::Bollinger { middle, .. } => middle,
        }
    }
}

impl From<Bands> for IndicatorValue {
    fn from(b: Bands) -> Self {
        IndicatorValue::Bollinger {
            upper: b.upper,
            middle: b.middle,
            lower: b.lower,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
    Bollinger {
        period: usize,
        /// `f64::to_bits` of the deviation factor, so the key stays `Hash + Eq`.
        deviation_bits: u64,
    },
    Crossover {
        fast: Box<IndicatorType>,
        slow: Box<IndicatorType>,
    },
}

impl IndicatorType {
    pub fn bollinger(period: usize, deviation_factor: f64) -> Self {
        IndicatorType::Bollinger {
            period,
            deviation_bits: deviation_factor.to_bits(),
        }
    }

    pub fn crossover(fast: IndicatorType, slow: IndicatorType) -> Self {
        IndicatorType::Crossover {
            fast: Box::new(fast),
            slow: Box::new(slow),
        }
    }

    /// Number of bars observed before the first ready reading.
    pub fn warmup(&self) -> usize {
        match self {
            IndicatorType::Sma(period) => *period,
            IndicatorType::Rsi(period) => period + 1,
            IndicatorType::Bollinger { period, .. } => *period,
            IndicatorType::Crossover { fast, slow } => fast.warmup().max(slow.warmup()) + 1,
        }
    }

    fn validate(&self) -> Result<(), BacktestError> {
        match self {
            IndicatorType::Sma(0)
            | IndicatorType::Rsi(0)
            | IndicatorType::Bollinger { period: 0, .. } => Err(BacktestError::invalid(
                "strategy",
                "period",
                format!("{} needs a positive period", self),
            )),
            IndicatorType::Crossover { fast, slow } => {
                fast.validate()?;
                slow.validate()
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Bollinger {
                period,
                deviation_bits,
            } => write!(f, "BOLLINGER({},{})", period, f64::from_bits(*deviation_bits)),
            IndicatorType::Crossover { fast, slow } => write!(f, "CROSSOVER({},{})", fast, slow),
        }
    }
}

/// Readings of every configured indicator at one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub date: NaiveDate,
    pub close: f64,
    values: HashMap<IndicatorType, Option<IndicatorValue>>,
}

impl IndicatorSnapshot {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        IndicatorSnapshot {
            date,
            close,
            values: HashMap::new(),
        }
    }

    pub fn insert(&mut self, indicator: IndicatorType, value: Option<IndicatorValue>) {
        self.values.insert(indicator, value);
    }

    /// `None` when the indicator is unknown or not ready.
    pub fn get(&self, indicator: &IndicatorType) -> Option<IndicatorValue> {
        self.values.get(indicator).copied().flatten()
    }

    pub fn line(&self, indicator: &IndicatorType) -> Option<f64> {
        self.get(indicator).map(|v| v.line())
    }

    pub fn bands(&self, indicator: &IndicatorType) -> Option<Bands> {
        match self.get(indicator)? {
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            } => Some(Bands {
                upper,
                middle,
                lower,
            }),
            IndicatorValue::Simple(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
enum IndicatorState {
    Sma(Sma),
    Rsi(Rsi),
    Bollinger(Bollinger),
    Crossover(Crossover),
}

impl IndicatorState {
    fn for_type(indicator: &IndicatorType) -> Self {
        match indicator {
            IndicatorType::Sma(period) => IndicatorState::Sma(Sma::new(*period)),
            IndicatorType::Rsi(period) => IndicatorState::Rsi(Rsi::new(*period)),
            IndicatorType::Bollinger {
                period,
                deviation_bits,
            } => {
                let deviation_factor = f64::from_bits(*deviation_bits);
                IndicatorState::Bollinger(Bollinger::new(*period, deviation_factor))
            }
            IndicatorType::Crossover { .. } => IndicatorState::Crossover(Crossover::new()),
        }
    }
}

/// Owns the rolling state of each configured indicator.
///
/// Dependencies are registered before the indicators that read them, so a
/// single in-order pass per bar sees this bar's inputs.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    slots: Vec<(IndicatorType, IndicatorState)>,
}

impl IndicatorEngine {
    pub fn new(indicators: &[IndicatorType]) -> Result<Self, BacktestError> {
        let mut engine = IndicatorEngine { slots: Vec::new() };
        for indicator in indicators {
            indicator.validate()?;
            engine.register(indicator);
        }
        Ok(engine)
    }

    fn register(&mut self, indicator: &IndicatorType) {
        if self.slots.iter().any(|(t, _)| t == indicator) {
            return;
        }
        if let IndicatorType::Crossover { fast, slow } = indicator {
            self.register(fast);
            self.register(slow);
        }
        self.slots
            .push((indicator.clone(), IndicatorState::for_type(indicator)));
    }

    pub fn indicators(&self) -> impl Iterator<Item = &IndicatorType> {
        self.slots.iter().map(|(t, _)| t)
    }

    /// Advance every indicator by one bar. Call exactly once per bar, in order.
    pub fn update(&mut self, bar: &Bar) -> IndicatorSnapshot {
        let mut snapshot = IndicatorSnapshot::new(bar.date, bar.close);

        for (indicator, state) in &mut self.slots {
            let value = match state {
                IndicatorState::Sma(sma) => sma.update(bar.close).map(IndicatorValue::Simple),
                IndicatorState::Rsi(rsi) => rsi.update(bar.close).map(IndicatorValue::Simple),
                IndicatorState::Bollinger(b) => b.update(bar.close).map(IndicatorValue::from),
                IndicatorState::Crossover(cross) => {
                    let IndicatorType::Crossover { fast, slow } = &*indicator else {
                        continue;
                    };
                    cross
                        .update(snapshot.line(fast), snapshot.line(slow))
                        .map(IndicatorValue::Simple)
                }
            };
            snapshot.insert(indicator.clone(), value);
        }

        snapshot
    }
}
