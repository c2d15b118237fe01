//! Strategy configuration and the decision dispatcher.
//!
//! Every rule enters on one signal and exits on the opposite one. A rule
//! holds while its indicator is not ready, never enters while holding a
//! position and never exits while flat.

use std::fmt;

use crate::domain::error::BacktestError;
use crate::domain::indicator::{IndicatorSnapshot, IndicatorType};
use crate::domain::position::Position;

pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_OVERSOLD: f64 = 30.0;
pub const DEFAULT_OVERBOUGHT: f64 = 70.0;
pub const DEFAULT_BAND_PERIOD: usize = 20;
pub const DEFAULT_DEVIATION_FACTOR: f64 = 2.0;
pub const DEFAULT_FAST_PERIOD: usize = 10;
pub const DEFAULT_SLOW_PERIOD: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Hold,
    Buy,
    CloseAll,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecisionRule {
    /// RSI below `oversold` enters, above `overbought` exits.
    ThresholdReversion {
        period: usize,
        oversold: f64,
        overbought: f64,
    },
    /// Close below the lower band enters, above the upper band exits.
    BandBreakout { period: usize, deviation_factor: f64 },
    /// SMA(fast) crossing above SMA(slow) enters, crossing below exits.
    Crossover {
        fast_period: usize,
        slow_period: usize,
    },
}

impl DecisionRule {
    /// Config name of the rule kind.
    pub fn kind(&self) -> &'static str {
        match self {
            DecisionRule::ThresholdReversion { .. } => "threshold-reversion",
            DecisionRule::BandBreakout { .. } => "band-breakout",
            DecisionRule::Crossover { .. } => "crossover",
        }
    }

    /// The single indicator the rule reads.
    pub fn indicator(&self) -> IndicatorType {
        match *self {
            DecisionRule::ThresholdReversion { period, .. } => IndicatorType::Rsi(period),
            DecisionRule::BandBreakout {
                period,
                deviation_factor,
            } => IndicatorType::bollinger(period, deviation_factor),
            DecisionRule::Crossover {
                fast_period,
                slow_period,
            } => IndicatorType::crossover(
                IndicatorType::Sma(fast_period),
                IndicatorType::Sma(slow_period),
            ),
        }
    }

    pub fn validate(&self, section: &str) -> Result<(), BacktestError> {
        match *self {
            DecisionRule::ThresholdReversion {
                period,
                oversold,
                overbought,
            } => {
                require_period(section, "period", period)?;
                if !(0.0..=100.0).contains(&oversold) {
                    return Err(BacktestError::invalid(
                        section,
                        "oversold",
                        "oversold must be between 0 and 100",
                    ));
                }
                if !(0.0..=100.0).contains(&overbought) {
                    return Err(BacktestError::invalid(
                        section,
                        "overbought",
                        "overbought must be between 0 and 100",
                    ));
                }
                if oversold >= overbought {
                    return Err(BacktestError::invalid(
                        section,
                        "oversold",
                        "oversold must be below overbought",
                    ));
                }
            }
            DecisionRule::BandBreakout {
                period,
                deviation_factor,
            } => {
                require_period(section, "period", period)?;
                if !deviation_factor.is_finite() || deviation_factor <= 0.0 {
                    return Err(BacktestError::invalid(
                        section,
                        "deviation_factor",
                        "deviation_factor must be positive",
                    ));
                }
            }
            DecisionRule::Crossover {
                fast_period,
                slow_period,
            } => {
                require_period(section, "fast_period", fast_period)?;
                require_period(section, "slow_period", slow_period)?;
                if fast_period >= slow_period {
                    return Err(BacktestError::invalid(
                        section,
                        "fast_period",
                        "fast_period must be shorter than slow_period",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Pure decision for one bar.
    pub fn decide(&self, snapshot: &IndicatorSnapshot, position: &Position) -> Decision {
        let indicator = self.indicator();
        let (enter, exit) = match *self {
            DecisionRule::ThresholdReversion {
                oversold,
                overbought,
                ..
            } => match snapshot.line(&indicator) {
                Some(rsi) => (rsi < oversold, rsi > overbought),
                None => return Decision::Hold,
            },
            DecisionRule::BandBreakout { .. } => match snapshot.bands(&indicator) {
                Some(bands) => (snapshot.close < bands.lower, snapshot.close > bands.upper),
                None => return Decision::Hold,
            },
            DecisionRule::Crossover { .. } => match snapshot.line(&indicator) {
                Some(signal) => (signal > 0.0, signal < 0.0),
                None => return Decision::Hold,
            },
        };

        if position.is_flat() {
            if enter { Decision::Buy } else { Decision::Hold }
        } else if exit {
            Decision::CloseAll
        } else {
            Decision::Hold
        }
    }
}

fn require_period(section: &str, key: &str, period: usize) -> Result<(), BacktestError> {
    if period == 0 {
        return Err(BacktestError::invalid(
            section,
            key,
            format!("{key} must be positive"),
        ));
    }
    Ok(())
}

impl fmt::Display for DecisionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionRule::ThresholdReversion {
                period,
                oversold,
                overbought,
            } => write!(f, "RSI({}) {}/{}", period, oversold, overbought),
            DecisionRule::BandBreakout {
                period,
                deviation_factor,
            } => write!(f, "Bollinger({}, {})", period, deviation_factor),
            DecisionRule::Crossover {
                fast_period,
                slow_period,
            } => write!(f, "SMA({}) x SMA({})", fast_period, slow_period),
        }
    }
}

/// A named rule, one per backtest run.
#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    pub rule: DecisionRule,
}

impl Strategy {
    pub fn new(name: impl Into<String>, rule: DecisionRule) -> Self {
        Strategy {
            name: name.into(),
            rule,
        }
    }

    pub fn rsi() -> Self {
        Strategy::new(
            "RSI Strategy",
            DecisionRule::ThresholdReversion {
                period: DEFAULT_RSI_PERIOD,
                oversold: DEFAULT_OVERSOLD,
                overbought: DEFAULT_OVERBOUGHT,
            },
        )
    }

    pub fn bollinger_bands() -> Self {
        Strategy::new(
            "Bollinger Bands Strategy",
            DecisionRule::BandBreakout {
                period: DEFAULT_BAND_PERIOD,
                deviation_factor: DEFAULT_DEVIATION_FACTOR,
            },
        )
    }

    pub fn moving_average_crossover() -> Self {
        Strategy::new(
            "MA Crossover Strategy",
            DecisionRule::Crossover {
                fast_period: DEFAULT_FAST_PERIOD,
                slow_period: DEFAULT_SLOW_PERIOD,
            },
        )
    }

    /// File-name form of the name: lowercase ASCII alphanumerics joined by
    /// single underscores.
    pub fn slug(&self) -> String {
        let mut out = String::with_capacity(self.name.len());
        for c in self.name.chars() {
            if c.is_ascii_alphanumeric() {
                out.push(c.to_ascii_lowercase());
            } else if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
        }
        let trimmed = out.trim_end_matches('_');
        if trimmed.is_empty() {
            "strategy".to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// The three rules run when no strategy is configured.
    pub fn defaults() -> Vec<Strategy> {
        vec![
            Strategy::rsi(),
            Strategy::bollinger_bands(),
            Strategy::moving_average_crossover(),
        ]
    }
}
