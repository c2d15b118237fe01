//! Crossover signal between two indicator lines.
//!
//! +1 on the bar `fast` moves above `slow`, -1 on the bar it moves below,
//! 0 otherwise. Needs both lines ready on the previous and current bar.

#[derive(Debug, Clone, Default)]
pub struct Crossover {
    prev: Option<(f64, f64)>,
}

impl Crossover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, fast: Option<f64>, slow: Option<f64>) -> Option<f64> {
        let (Some(fast), Some(slow)) = (fast, slow) else {
            self.prev = None;
            return None;
        };

        let signal = self.prev.map(|(prev_fast, prev_slow)| {
            if fast > slow && prev_fast <= prev_slow {
                1.0
            } else if fast < slow && prev_fast >= prev_slow {
                -1.0
            } else {
                0.0
            }
        });
        self.prev = Some((fast, slow));
        signal
    }
}
