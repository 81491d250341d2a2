//! Market-data provider trait and structured failure types.
//!
//! The provider abstracts over remote data sources so universe completion
//! can be exercised against a CSV file or a test double. Failures carry a
//! closed set of kinds; universe completion branches on whether a kind is
//! fatal.

use crate::domain::{BarWidth, PriceBar, SecurityId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Closed set of provider failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Missing or rejected credentials.
    ApiKey,
    /// Request quota exhausted.
    CallLimit,
    /// Provider unreachable.
    NoComms,
    /// Response missing or malformed.
    NullResponse,
    /// The requested range genuinely has no bars.
    NoData,
}

impl FailureKind {
    /// Everything except `NoData` aborts universe completion.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, FailureKind::NoData)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::ApiKey => "API_KEY",
            FailureKind::CallLimit => "CALL_LIMIT",
            FailureKind::NoComms => "NO_COMMS",
            FailureKind::NullResponse => "NULL_RESPONSE",
            FailureKind::NoData => "NO_DATA",
        };
        f.write_str(s)
    }
}

/// A failed fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NoData, message)
    }

    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

/// Bars returned by a successful fetch, ascending by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub security: SecurityId,
    pub width: BarWidth,
    pub bars: Vec<PriceBar>,
}

impl TimeSeries {
    pub fn new(security: SecurityId, width: BarWidth, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by(PriceBar::chronological);
        Self { security, width, bars }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }
}

/// Remote market-data client.
pub trait MarketDataProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch bars for `security` with `start <= timestamp <= end`.
    fn fetch_time_series(
        &self,
        security: &SecurityId,
        width: BarWidth,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<TimeSeries, FetchFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_no_data_is_non_fatal() {
        assert!(FailureKind::ApiKey.is_fatal());
        assert!(FailureKind::CallLimit.is_fatal());
        assert!(FailureKind::NoComms.is_fatal());
        assert!(FailureKind::NullResponse.is_fatal());
        assert!(!FailureKind::NoData.is_fatal());
    }

    #[test]
    fn failure_display_includes_kind() {
        let f = FetchFailure::new(FailureKind::CallLimit, "8 calls per minute");
        assert_eq!(f.to_string(), "CALL_LIMIT: 8 calls per minute");
    }
}
