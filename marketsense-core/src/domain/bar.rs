//! PriceBar: the fundamental market data unit.

use super::security::SecurityId;
use super::width::BarWidth;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// OHLC bar for one security at one bar width.
///
/// Prices are single precision. Bars are never mutated once built; ordering
/// between bars is by timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub security: SecurityId,
    pub timestamp: NaiveDateTime,
    pub width: BarWidth,
    pub open: f32,
    pub high: f32,
    pub low: f32,
    pub close: f32,
}

impl PriceBar {
    pub fn new(
        security: SecurityId,
        timestamp: NaiveDateTime,
        width: BarWidth,
        open: f32,
        high: f32,
        low: f32,
        close: f32,
    ) -> Self {
        Self { security, timestamp, width, open, high, low, close }
    }

    /// Instant at which this bar's interval ends (exclusive).
    pub fn end(&self) -> NaiveDateTime {
        self.width.offset(self.timestamp, 1)
    }

    /// True when `instant` falls inside `[timestamp, timestamp + width)`.
    pub fn covers(&self, instant: NaiveDateTime) -> bool {
        self.timestamp <= instant && instant < self.end()
    }

    /// Basic OHLC sanity check: finite, positive, high >= low, open/close inside the range.
    pub fn is_sane(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.low > 0.0
    }

    /// Chronological comparison.
    pub fn chronological(a: &PriceBar, b: &PriceBar) -> Ordering {
        a.timestamp.cmp(&b.timestamp)
    }
}
