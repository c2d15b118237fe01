//! Equity curve export, one CSV file per run.
//!
//! Rows are `date,equity`; the seed row before the first bar has an empty
//! date.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktestError;
use crate::domain::strategy::Strategy;
use crate::ports::report_port::ReportPort;

pub struct EquityCsvAdapter {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl EquityCsvAdapter {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            written: Vec::new(),
        }
    }

    /// Files written so far, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Target file for `strategy`. A slug already written by this adapter
    /// gets a numeric suffix instead of overwriting the earlier file.
    pub fn path_for(&self, strategy: &Strategy) -> PathBuf {
        let slug = strategy.slug();
        let mut candidate = self.dir.join(format!("{}_equity.csv", slug));
        let mut n = 2;
        while self.written.contains(&candidate) {
            candidate = self.dir.join(format!("{}_{}_equity.csv", slug, n));
            n += 1;
        }
        candidate
    }
}

fn write_curve(path: &Path, result: &BacktestResult) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["date", "equity"])?;
    for point in &result.portfolio.equity_curve {
        let date = point.date.map(|d| d.to_string()).unwrap_or_default();
        wtr.write_record([date, format!("{:.2}", point.equity)])?;
    }
    wtr.flush()?;
    Ok(())
}

impl ReportPort for EquityCsvAdapter {
    fn write(&mut self, result: &BacktestResult) -> Result<(), BacktestError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&result.strategy);
        if path != self.dir.join(format!("{}_equity.csv", result.strategy.slug())) {
            log::warn!(
                "{}: equity file name already used, writing {}",
                result.strategy.name,
                path.display()
            );
        }
        write_curve(&path, result).map_err(io::Error::from)?;
        log::info!(
            "{}: equity curve written to {}",
            result.strategy.name,
            path.display()
        );
        self.written.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::{run_backtest, BacktestConfig};
    use crate::domain::ohlcv::Bar;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_result() -> BacktestResult {
        let bars: Vec<Bar> = [10.0, 11.0, 12.5]
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: NaiveDate::from_ymd_opt(2024, 3, 1 + i as u32).unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 100.0,
            })
            .collect();
        run_backtest(&bars, &Strategy::rsi(), &BacktestConfig::default()).unwrap()
    }

    #[test]
    fn colliding_slugs_get_distinct_files() {
        let dir = TempDir::new().unwrap();
        let mut adapter = EquityCsvAdapter::new(dir.path().to_path_buf());
        let mut first = sample_result();
        first.strategy.name = "ma-1".to_string();
        let mut second = sample_result();
        second.strategy.name = "ma_1".to_string();
        let mut third = sample_result();
        third.strategy.name = "MA 1".to_string();

        adapter.write_all(&[first, second, third]).unwrap();
        assert_eq!(
            adapter.written(),
            &[
                dir.path().join("ma_1_equity.csv"),
                dir.path().join("ma_1_2_equity.csv"),
                dir.path().join("ma_1_3_equity.csv"),
            ]
        );
        for path in adapter.written() {
            assert!(path.exists());
        }
    }

    #[test]
    fn writes_seed_row_then_one_row_per_bar() {
        let dir = TempDir::new().unwrap();
        let mut adapter = EquityCsvAdapter::new(dir.path().join("out"));
        adapter.write(&sample_result()).unwrap();

        let path = dir.path().join("out").join("rsi_strategy_equity.csv");
        assert_eq!(adapter.written(), &[path.clone()]);

        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "date,equity",
                ",100000.00",
                "2024-03-01,100000.00",
                "2024-03-02,100000.00",
                "2024-03-03,100000.00",
            ]
        );
    }

    #[test]
    fn unwritable_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let mut adapter = EquityCsvAdapter::new(blocker);
        let err = adapter.write(&sample_result()).unwrap_err();
        assert!(matches!(err, BacktestError::Io(_)));
    }
}
