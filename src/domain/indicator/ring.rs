//! Fixed-capacity rolling window over the most recent observations.

/// Ring buffer holding at most `capacity` values with a running sum.
///
/// Once full, every push evicts the oldest value, so updates stay O(1).
#[derive(Debug, Clone)]
pub struct RollingWindow {
    buf: Vec<f64>,
    capacity: usize,
    head: usize,
    sum: f64,
}

impl RollingWindow {
    /// `capacity` must be non-zero; callers validate periods up front.
    pub fn new(capacity: usize) -> Self {
        RollingWindow {
            buf: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            sum: 0.0,
        }
    }

    /// Push a value, returning the evicted one when the window was full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        if self.buf.len() < self.capacity {
            self.buf.push(value);
            self.sum += value;
            return None;
        }

        let evicted = std::mem::replace(&mut self.buf[self.head], value);
        self.head = (self.head + 1) % self.capacity;
        self.sum += value - evicted;
        Some(evicted)
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Arithmetic mean of the held values, `None` until full.
    pub fn mean(&self) -> Option<f64> {
        if self.is_full() {
            Some(self.sum / self.capacity as f64)
        } else {
            None
        }
    }

    /// Values from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let (newer, older) = self.buf.split_at(self.head);
        older.iter().chain(newer.iter()).copied()
    }
}
