//! Archived session results and performance history.

use super::stats::{ConfidenceZscore, ScoreInterval};
use crate::domain::{BarWidth, SecurityId};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Snapshot of a training session, suitable for persisting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub security: SecurityId,
    pub width: BarWidth,
    pub sample_size: usize,
    pub sample_count: usize,
    pub max_lookback_months: u32,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub complete: bool,
    pub samples_scored: usize,
    pub score: f64,
    pub score_deviation: f64,
}

/// Filter over archived sessions. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceSample {
    pub security: Option<SecurityId>,
    /// Earliest session start date, inclusive.
    pub start_date: Option<NaiveDate>,
    /// Latest session start date, inclusive.
    pub end_date: Option<NaiveDate>,
    pub width: Option<BarWidth>,
    pub sample_size: Option<usize>,
    pub sample_count: Option<usize>,
}

impl PerformanceSample {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn security(mut self, security: SecurityId) -> Self {
        self.security = Some(security);
        self
    }

    pub fn between(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn width(mut self, width: BarWidth) -> Self {
        self.width = Some(width);
        self
    }

    pub fn sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = Some(sample_size);
        self
    }

    pub fn sample_count(mut self, sample_count: usize) -> Self {
        self.sample_count = Some(sample_count);
        self
    }

    pub fn matches(&self, record: &SessionRecord) -> bool {
        let date = record.start.date();
        self.security.as_ref().map_or(true, |s| *s == record.security)
            && self.start_date.map_or(true, |d| date >= d)
            && self.end_date.map_or(true, |d| date <= d)
            && self.width.map_or(true, |w| w == record.width)
            && self.sample_size.map_or(true, |n| n == record.sample_size)
            && self.sample_count.map_or(true, |n| n == record.sample_count)
    }

    /// Matching records as points, ordered by session start.
    pub fn points<'a>(&self, records: &'a [SessionRecord]) -> Vec<PerformancePoint<'a>> {
        let mut points: Vec<_> = records
            .iter()
            .filter(|r| self.matches(r))
            .map(PerformancePoint::new)
            .collect();
        points.sort_by_key(|p| p.record.start);
        points
    }
}

/// One session in a performance history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformancePoint<'a> {
    pub record: &'a SessionRecord,
}

impl<'a> PerformancePoint<'a> {
    pub fn new(record: &'a SessionRecord) -> Self {
        Self { record }
    }

    pub fn score(&self) -> f64 {
        self.record.score
    }

    pub fn deviation(&self) -> f64 {
        self.record.score_deviation
    }

    pub fn interval(&self, confidence: ConfidenceZscore) -> ScoreInterval {
        ScoreInterval::new(self.score(), self.deviation(), confidence)
    }
}
