//! Universe completion: make the bar history a session samples from gap-free.
//!
//! A training session draws anchors from `[after, before]` and each window
//! reaches `sample_size` bars past its anchor, so the store must hold bars
//! over `[after, before + sample_size bars]`. Both ends are probed
//! independently. A missing end is fetched from the provider and merged
//! into the store, then the end is probed again. When the provider has no
//! bars for the range, or its bars stop short of the bound, the working
//! bound is narrowed to the nearest bar that does exist.
//! Any other provider failure aborts and leaves the bounds untouched.

use super::provider::{FetchFailure, MarketDataProvider};
use super::store::{BarQuery, BarStore};
use crate::domain::{backward_from_weekend, forward_from_weekend, BarWidth, SecurityId};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Earliest and latest permissible sample anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleBounds {
    pub after: NaiveDateTime,
    pub before: NaiveDateTime,
}

impl SampleBounds {
    pub fn new(after: NaiveDateTime, before: NaiveDateTime) -> Self {
        Self { after, before }
    }

    /// Whole hours between the bounds (zero when collapsed or inverted).
    pub fn span_hours(&self) -> i64 {
        (self.before - self.after).num_hours().max(0)
    }

    /// True when no anchor range remains.
    pub fn is_degenerate(&self) -> bool {
        self.after >= self.before
    }

    /// Last instant the universe must cover for windows of `sample_size` bars.
    pub fn universe_until(&self, width: BarWidth, sample_size: usize) -> NaiveDateTime {
        width.offset(self.before, sample_size as i64)
    }
}

/// What happened at one end of the universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideOutcome {
    /// A bar already covered the bound.
    Present,
    /// Missing bars were fetched and merged.
    Filled { bars: usize },
    /// The provider had no data; the bound moved to `to`.
    Narrowed { to: NaiveDateTime },
}

impl SideOutcome {
    pub fn is_narrowed(&self) -> bool {
        matches!(self, SideOutcome::Narrowed { .. })
    }
}

/// Summary of a completed (possibly narrowed) universe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniverseReport {
    pub lower: SideOutcome,
    pub upper: SideOutcome,
    pub bars_added: usize,
    pub bounds: SampleBounds,
}

impl UniverseReport {
    pub fn is_narrowed(&self) -> bool {
        self.lower.is_narrowed() || self.upper.is_narrowed()
    }

    /// Narrowing left no anchor range at all.
    pub fn is_degenerate(&self) -> bool {
        self.bounds.is_degenerate()
    }
}

#[derive(Debug, Error)]
pub enum UniverseError {
    /// Credentials, quota, connectivity or malformed response.
    #[error("universe completion aborted: {0}")]
    Fatal(FetchFailure),
}

impl UniverseError {
    pub fn failure(&self) -> &FetchFailure {
        match self {
            UniverseError::Fatal(f) => f,
        }
    }
}

/// Ensure the store covers the bars needed to sample within `bounds`.
///
/// On success `bounds` holds the (possibly narrowed) anchor range and the
/// returned report describes each end. On a fatal provider failure `bounds`
/// is left exactly as passed in; bars already merged by the other end stay
/// in the store.
pub fn complete_universe(
    store: &mut dyn BarStore,
    provider: &dyn MarketDataProvider,
    security: &SecurityId,
    width: BarWidth,
    bounds: &mut SampleBounds,
    sample_size: usize,
) -> Result<UniverseReport, UniverseError> {
    let lower = bounds.after;
    let upper = bounds.universe_until(width, sample_size);
    let mut after = bounds.after;
    let mut before = bounds.before;
    let mut bars_added = 0;

    info!(
        security = %security,
        width = %width,
        provider = provider.name(),
        %lower,
        %upper,
        "completing universe"
    );

    // lower end
    let lower_probe = probe_lower(width, lower);
    let lower_outcome = if store.bar_covering(security, width, lower_probe).is_some() {
        debug!(%lower, "lower bound present");
        SideOutcome::Present
    } else {
        let pre_last = store.first_after(security, width, lower).map(|b| b.timestamp);
        let fetch_end = width.offset(pre_last.unwrap_or(upper), -1);
        match fetch_range(store, provider, security, width, lower, fetch_end)? {
            Some(added) if store.bar_covering(security, width, lower_probe).is_some() => {
                bars_added += added;
                SideOutcome::Filled { bars: added }
            }
            fetched => {
                bars_added += fetched.unwrap_or(0);
                let first = store
                    .query(&BarQuery::new(security.clone(), width).from(lower).limit(1))
                    .into_iter()
                    .next()
                    .map(|b| b.timestamp);
                after = after.max(first.unwrap_or(before));
                warn!(to = %after, "history starts after lower bound; narrowing");
                SideOutcome::Narrowed { to: after }
            }
        }
    };

    // upper end
    let upper_probe = probe_upper(width, upper);
    let upper_outcome = if store.bar_covering(security, width, upper_probe).is_some() {
        debug!(%upper, "upper bound present");
        SideOutcome::Present
    } else {
        let post_first = store.last_before(security, width, upper).map(|b| b.timestamp);
        let fetch_start = post_first.map(|t| width.offset(t, 1)).unwrap_or(lower);
        match fetch_range(store, provider, security, width, fetch_start, upper)? {
            Some(added) if store.bar_covering(security, width, upper_probe).is_some() => {
                bars_added += added;
                SideOutcome::Filled { bars: added }
            }
            fetched => {
                bars_added += fetched.unwrap_or(0);
                let last_known = store
                    .last_before(security, width, upper)
                    .map(|b| b.timestamp)
                    .unwrap_or(after);
                before = before.min(width.offset(last_known, -(sample_size as i64)));
                if before < after {
                    before = after;
                }
                warn!(to = %before, "history ends before upper bound; narrowing");
                SideOutcome::Narrowed { to: before }
            }
        }
    };

    if before < after {
        before = after;
    }
    bounds.after = after;
    bounds.before = before;

    let report = UniverseReport {
        lower: lower_outcome,
        upper: upper_outcome,
        bars_added,
        bounds: *bounds,
    };
    if report.is_degenerate() {
        warn!(security = %security, "universe collapsed to a single anchor");
    } else {
        info!(bars_added, after = %bounds.after, before = %bounds.before, "universe complete");
    }
    Ok(report)
}

/// Fetch `[start, end]` and merge it. `Ok(None)` means the provider had no bars.
fn fetch_range(
    store: &mut dyn BarStore,
    provider: &dyn MarketDataProvider,
    security: &SecurityId,
    width: BarWidth,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Option<usize>, UniverseError> {
    if end < start {
        return Ok(None);
    }
    debug!(%start, %end, "fetching missing range");
    match provider.fetch_time_series(security, width, start, end) {
        Ok(series) if series.is_empty() => Ok(None),
        Ok(series) => Ok(Some(store.insert(series.bars))),
        Err(failure) if failure.is_fatal() => Err(UniverseError::Fatal(failure)),
        Err(failure) => {
            debug!(%failure, "provider reported no data");
            Ok(None)
        }
    }
}

fn skips_weekends(width: BarWidth) -> bool {
    width.duration() <= Duration::days(1)
}

fn probe_lower(width: BarWidth, instant: NaiveDateTime) -> NaiveDateTime {
    if skips_weekends(width) {
        forward_from_weekend(instant)
    } else {
        instant
    }
}

fn probe_upper(width: BarWidth, instant: NaiveDateTime) -> NaiveDateTime {
    if skips_weekends(width) {
        backward_from_weekend(instant)
    } else {
        instant
    }
}
