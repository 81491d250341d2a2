//! CSV-backed market-data provider.
//!
//! Expected columns: `timestamp,open,high,low,close`. Timestamps are either
//! `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`. Rows are loaded once and served
//! from memory, which makes the provider usable offline and in tests.

use super::provider::{FailureKind, FetchFailure, MarketDataProvider, TimeSeries};
use crate::domain::{BarWidth, PriceBar, SecurityId};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f32,
    high: f32,
    low: f32,
    close: f32,
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0))
}

/// Provider serving one security's bars from a CSV file.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    security: SecurityId,
    width: BarWidth,
    bars: Vec<PriceBar>,
}

impl CsvProvider {
    /// Load bars from a CSV file on disk.
    pub fn from_path(
        path: &Path,
        security: SecurityId,
        width: BarWidth,
    ) -> Result<Self, FetchFailure> {
        let file = std::fs::File::open(path).map_err(|e| {
            FetchFailure::new(FailureKind::NoComms, format!("open {}: {e}", path.display()))
        })?;
        Self::from_reader(file, security, width)
    }

    /// Load bars from any CSV source with a header row.
    pub fn from_reader<R: Read>(
        reader: R,
        security: SecurityId,
        width: BarWidth,
    ) -> Result<Self, FetchFailure> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut bars = Vec::new();

        for (line, row) in csv_reader.deserialize::<CsvRow>().enumerate() {
            let row = row.map_err(|e| {
                FetchFailure::new(FailureKind::NullResponse, format!("row {}: {e}", line + 1))
            })?;
            let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| {
                FetchFailure::new(
                    FailureKind::NullResponse,
                    format!("row {}: bad timestamp '{}'", line + 1, row.timestamp),
                )
            })?;
            bars.push(PriceBar::new(
                security.clone(),
                timestamp,
                width,
                row.open,
                row.high,
                row.low,
                row.close,
            ));
        }

        bars.sort_by(PriceBar::chronological);
        bars.dedup_by_key(|b| b.timestamp);
        debug!(security = %security, count = bars.len(), "loaded csv bars");

        Ok(Self { security, width, bars })
    }

    /// All loaded bars, ascending.
    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn security(&self) -> &SecurityId {
        &self.security
    }
}

impl MarketDataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch_time_series(
        &self,
        security: &SecurityId,
        width: BarWidth,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<TimeSeries, FetchFailure> {
        if *security != self.security || width != self.width {
            return Err(FetchFailure::no_data(format!("no {width} series for {security}")));
        }

        let bars: Vec<PriceBar> = self
            .bars
            .iter()
            .filter(|b| b.timestamp >= start && b.timestamp <= end)
            .cloned()
            .collect();

        if bars.is_empty() {
            return Err(FetchFailure::no_data(format!("no bars for {security} in [{start}, {end}]")));
        }
        Ok(TimeSeries::new(security.clone(), width, bars))
    }
}
