//! Simple Moving Average.
//!
//! SMA(n) = mean of the last n closes. Not ready until n closes are seen.

use super::ring::RollingWindow;

#[derive(Debug, Clone)]
pub struct Sma {
    window: RollingWindow,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Sma {
            window: RollingWindow::new(period),
        }
    }

    pub fn update(&mut self, close: f64) -> Option<f64> {
        self.window.push(close);
        self.window.mean()
    }

    pub(crate) fn window(&self) -> &RollingWindow {
        &self.window
    }
}
