//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: n closes.

use super::sma::Sma;

/// Band values for one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    sma: Sma,
    mult: f64,
}

impl Bollinger {
    pub fn new(period: usize, mult: f64) -> Self {
        Bollinger {
            sma: Sma::new(period),
            mult,
        }
    }

    pub fn update(&mut self, close: f64) -> Option<Bands> {
        let middle = self.sma.update(close)?;
        let window = self.sma.window();

        let variance: f64 = window
            .iter()
            .map(|c| {
                let diff = c - middle;
                diff * diff
            })
            .sum::<f64>()
            / window.capacity() as f64;

        let width = self.mult * variance.sqrt();
        Some(Bands {
            upper: middle + width,
            middle,
            lower: middle - width,
        })
    }
}
