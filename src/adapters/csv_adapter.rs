//! CSV file bar series adapter.
//!
//! Expects a header row naming `date, open, high, low, close, volume` in any
//! order (case-insensitive); other columns are ignored.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::{self, Bar};
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Parse CSV text into a validated, time-ordered series.
    pub fn parse(content: &str, source_name: &str) -> Result<Vec<Bar>, BacktestError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| BacktestError::malformed(0, format!("unreadable header: {}", e)))?
            .clone();

        let mut index = [0usize; 6];
        for (slot, name) in index.iter_mut().zip(COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    BacktestError::malformed(0, format!("missing {} column", name))
                })?;
        }
        let [date_idx, open_idx, high_idx, low_idx, close_idx, volume_idx] = index;

        let mut bars = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let row = i + 1;
            let record = result
                .map_err(|e| BacktestError::malformed(row, format!("CSV parse error: {}", e)))?;

            bars.push(Bar {
                date: parse_date(field(&record, date_idx, row, "date")?)
                    .ok_or_else(|| BacktestError::malformed(row, "invalid date format"))?,
                open: number(&record, open_idx, row, "open")?,
                high: number(&record, high_idx, row, "high")?,
                low: number(&record, low_idx, row, "low")?,
                close: number(&record, close_idx, row, "close")?,
                volume: number(&record, volume_idx, row, "volume")?,
            });
        }

        ohlcv::validate_series(&bars, source_name)?;
        Ok(bars)
    }
}

fn field<'r>(
    record: &'r csv::StringRecord,
    idx: usize,
    row: usize,
    name: &str,
) -> Result<&'r str, BacktestError> {
    record
        .get(idx)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BacktestError::malformed(row, format!("missing {} value", name)))
}

fn number(
    record: &csv::StringRecord,
    idx: usize,
    row: usize,
    name: &str,
) -> Result<f64, BacktestError> {
    let raw = field(record, idx, row, name)?;
    let value: f64 = raw.parse().map_err(|e| {
        BacktestError::malformed(row, format!("invalid {} value '{}': {}", name, raw, e))
    })?;
    if !value.is_finite() {
        return Err(BacktestError::malformed(
            row,
            format!("{} value is not finite", name),
        ));
    }
    Ok(value)
}

/// `YYYY-MM-DD`, or a `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS` timestamp.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|t| t.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map(|t| t.date()))
        .ok()
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self) -> Result<Vec<Bar>, BacktestError> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            BacktestError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read {}: {}", self.path.display(), e),
            ))
        })?;
        Self::parse(&content, &self.source_name())
    }

    fn source_name(&self) -> String {
        self.path.display().to_string()
    }
}
