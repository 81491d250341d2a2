//! Historical bar store.
//!
//! The store is the engine's view of persisted bar history. Range queries
//! never fail for "no rows": they return an empty vector. The sample
//! windower reads through [`BarStore::query`]; universe completion also
//! merges fetched bars through [`BarStore::insert`].

use crate::domain::{BarWidth, PriceBar, SecurityId};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

/// Result ordering of a range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Ascending,
    Descending,
}

/// Range query over one `(security, width)` series.
#[derive(Debug, Clone, PartialEq)]
pub struct BarQuery {
    pub security: SecurityId,
    pub width: BarWidth,
    pub lower: Bound<NaiveDateTime>,
    pub upper: Bound<NaiveDateTime>,
    pub order: Order,
    pub limit: Option<usize>,
}

impl BarQuery {
    /// Unbounded ascending query.
    pub fn new(security: SecurityId, width: BarWidth) -> Self {
        Self {
            security,
            width,
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
            order: Order::Ascending,
            limit: None,
        }
    }

    /// Bars with `timestamp >= instant`.
    pub fn from(mut self, instant: NaiveDateTime) -> Self {
        self.lower = Bound::Included(instant);
        self
    }

    /// Bars with `timestamp > instant`.
    pub fn after(mut self, instant: NaiveDateTime) -> Self {
        self.lower = Bound::Excluded(instant);
        self
    }

    /// Bars with `timestamp <= instant`.
    pub fn until(mut self, instant: NaiveDateTime) -> Self {
        self.upper = Bound::Included(instant);
        self
    }

    /// Bars with `timestamp < instant`.
    pub fn before(mut self, instant: NaiveDateTime) -> Self {
        self.upper = Bound::Excluded(instant);
        self
    }

    pub fn descending(mut self) -> Self {
        self.order = Order::Descending;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when no timestamp can satisfy both bounds.
    pub fn is_empty_range(&self) -> bool {
        match (self.lower, self.upper) {
            (Bound::Included(lo), Bound::Included(hi)) => lo > hi,
            (Bound::Included(lo), Bound::Excluded(hi))
            | (Bound::Excluded(lo), Bound::Included(hi))
            | (Bound::Excluded(lo), Bound::Excluded(hi)) => lo >= hi,
            _ => false,
        }
    }
}

/// Persistence collaborator holding bar history.
pub trait BarStore {
    /// Execute a range query. Returns an empty vector when nothing matches.
    fn query(&self, query: &BarQuery) -> Vec<PriceBar>;

    /// Merge bars into the store, replacing bars with the same key.
    ///
    /// Returns the number of bars that were not present before.
    fn insert(&mut self, bars: Vec<PriceBar>) -> usize;

    /// Earliest bar strictly after `instant`.
    fn first_after(
        &self,
        security: &SecurityId,
        width: BarWidth,
        instant: NaiveDateTime,
    ) -> Option<PriceBar> {
        self.query(&BarQuery::new(security.clone(), width).after(instant).limit(1))
            .into_iter()
            .next()
    }

    /// Latest bar strictly before `instant`.
    fn last_before(
        &self,
        security: &SecurityId,
        width: BarWidth,
        instant: NaiveDateTime,
    ) -> Option<PriceBar> {
        self.query(&BarQuery::new(security.clone(), width).before(instant).descending().limit(1))
            .into_iter()
            .next()
    }

    /// The bar whose interval contains `instant`, if stored.
    fn bar_covering(
        &self,
        security: &SecurityId,
        width: BarWidth,
        instant: NaiveDateTime,
    ) -> Option<PriceBar> {
        self.query(&BarQuery::new(security.clone(), width).until(instant).descending().limit(1))
            .into_iter()
            .next()
            .filter(|bar| bar.covers(instant))
    }
}

type SeriesKey = (SecurityId, BarWidth);

/// In-memory bar store keyed by timestamp per `(security, width)`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBarStore {
    series: HashMap<SeriesKey, BTreeMap<NaiveDateTime, PriceBar>>,
}

impl InMemoryBarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `bars`.
    pub fn with_bars(bars: Vec<PriceBar>) -> Self {
        let mut store = Self::new();
        store.insert(bars);
        store
    }

    /// Number of bars held for one series.
    pub fn len(&self, security: &SecurityId, width: BarWidth) -> usize {
        self.series
            .get(&(security.clone(), width))
            .map(|s| s.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.series.values().all(|s| s.is_empty())
    }
}

impl BarStore for InMemoryBarStore {
    fn query(&self, query: &BarQuery) -> Vec<PriceBar> {
        if query.is_empty_range() || query.limit == Some(0) {
            return Vec::new();
        }
        let Some(series) = self.series.get(&(query.security.clone(), query.width)) else {
            return Vec::new();
        };

        let range = series.range((query.lower, query.upper)).map(|(_, bar)| bar.clone());
        let limit = query.limit.unwrap_or(usize::MAX);
        match query.order {
            Order::Ascending => range.take(limit).collect(),
            Order::Descending => range.rev().take(limit).collect(),
        }
    }

    fn insert(&mut self, bars: Vec<PriceBar>) -> usize {
        let mut added = 0;
        for bar in bars {
            let series = self.series.entry((bar.security.clone(), bar.width)).or_default();
            if series.insert(bar.timestamp, bar).is_none() {
                added += 1;
            }
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn spy() -> SecurityId {
        SecurityId::new("SPY", "NYSE")
    }

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn bar(d: u32, close: f32) -> PriceBar {
        PriceBar::new(spy(), day(d), BarWidth::Day1, close, close, close, close)
    }

    fn store() -> InMemoryBarStore {
        InMemoryBarStore::with_bars(vec![bar(4, 10.0), bar(5, 11.0), bar(6, 12.0), bar(7, 13.0)])
    }

    #[test]
    fn ascending_range_is_inclusive() {
        let bars = store().query(&BarQuery::new(spy(), BarWidth::Day1).from(day(5)).until(day(6)));
        let closes: Vec<f32> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![11.0, 12.0]);
    }

    #[test]
    fn descending_with_limit_takes_latest() {
        let bars =
            store().query(&BarQuery::new(spy(), BarWidth::Day1).until(day(7)).descending().limit(2));
        let closes: Vec<f32> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![13.0, 12.0]);
    }

    #[test]
    fn empty_and_inverted_ranges_return_nothing() {
        let s = store();
        assert!(s.query(&BarQuery::new(spy(), BarWidth::Day1).after(day(5)).before(day(5))).is_empty());
        assert!(s.query(&BarQuery::new(spy(), BarWidth::Day1).from(day(7)).until(day(4))).is_empty());
        assert!(s.query(&BarQuery::new(spy(), BarWidth::Hour1)).is_empty());
    }

    #[test]
    fn neighbours_and_covering_bar() {
        let s = store();
        assert_eq!(s.first_after(&spy(), BarWidth::Day1, day(5)).unwrap().close, 12.0);
        assert_eq!(s.last_before(&spy(), BarWidth::Day1, day(5)).unwrap().close, 10.0);
        assert!(s.first_after(&spy(), BarWidth::Day1, day(7)).is_none());

        let noon = day(6) + chrono::Duration::hours(12);
        assert_eq!(s.bar_covering(&spy(), BarWidth::Day1, noon).unwrap().close, 12.0);
        assert!(s.bar_covering(&spy(), BarWidth::Day1, day(9)).is_none());
    }

    #[test]
    fn insert_replaces_same_timestamp() {
        let mut s = store();
        let added = s.insert(vec![bar(5, 99.0), bar(8, 14.0)]);
        assert_eq!(added, 1);
        assert_eq!(s.len(&spy(), BarWidth::Day1), 5);
        assert_eq!(s.bar_covering(&spy(), BarWidth::Day1, day(5)).unwrap().close, 99.0);
    }
}
