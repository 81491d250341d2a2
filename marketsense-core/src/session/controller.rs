//! Training session controller.
//!
//! A session is a finite run of `sample_count` samples. It is In-Progress
//! while `index < sample_count` and Complete once `index == sample_count`;
//! Complete is terminal. Each `next_sample` after the first draws for the
//! following index, so the transition to Complete happens on the call that
//! follows the last sample. Sampling starts once `prepare_universe` succeeds.
//!
//! Anchors are drawn uniformly over the whole hours in `[after, before)`
//! from an RNG derived from `(seed, security, index, attempt)`, which makes
//! a session replayable from its parameters alone.

use super::performance::SessionRecord;
use super::stats::{ConfidenceZscore, RunningScore, ScoreInterval};
use crate::data::{
    complete_universe, BarStore, MarketDataProvider, SampleBounds, UniverseError, UniverseReport,
};
use crate::domain::{BarWidth, SecurityId};
use crate::rng::RngHierarchy;
use crate::sample::{MarketSample, PreparedSample, SampleError, SampleOptions};
use crate::synth::MarketSynth;
use chrono::{Duration, Months, NaiveDateTime};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Anchors tried per sample before giving up.
pub const MAX_ANCHOR_ATTEMPTS: u32 = 8;
/// Gap kept between the latest anchor window and the session start.
pub const RECENT_MARGIN_DAYS: i64 = 2;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session parameters: {0}")]
    InvalidParams(String),

    #[error("no sample has been drawn")]
    NoActiveSample,

    #[error("sample {0} was already scored")]
    AlreadyScored(usize),

    #[error("session is complete")]
    Complete,

    #[error("score {0} outside [0, 1]")]
    InvalidScore(f64),

    #[error("no usable window after {attempts} anchors: {last}")]
    Exhausted { attempts: u32, last: SampleError },

    #[error(transparent)]
    Sample(SampleError),

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error("universe completion failed; sampling is disabled")]
    UniverseIncomplete,

    #[error("universe has not been prepared")]
    UniverseUnchecked,
}

/// Fixed configuration of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionParams {
    pub security: SecurityId,
    pub width: BarWidth,
    /// Visible bars per sample.
    pub sample_size: usize,
    /// Samples in the session.
    pub sample_count: usize,
    pub max_lookback_months: u32,
    pub options: SampleOptions,
    pub seed: u64,
}

impl SessionParams {
    pub fn new(
        security: SecurityId,
        width: BarWidth,
        sample_size: usize,
        sample_count: usize,
        max_lookback_months: u32,
    ) -> Self {
        Self {
            security,
            width,
            sample_size,
            sample_count,
            max_lookback_months,
            options: SampleOptions::default(),
            seed: 0,
        }
    }

    pub fn with_options(mut self, options: SampleOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.sample_size == 0 {
            return Err(SessionError::InvalidParams("sample_size must be positive".into()));
        }
        if self.sample_count == 0 {
            return Err(SessionError::InvalidParams("sample_count must be positive".into()));
        }
        if self.max_lookback_months == 0 {
            return Err(SessionError::InvalidParams(
                "max_lookback_months must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Anchor range for a session starting at `start`: from `max_lookback`
    /// months back, up to `sample_size` bars before `start − 2 days`.
    pub fn bounds(&self, start: NaiveDateTime) -> SampleBounds {
        let after = start
            .checked_sub_months(Months::new(self.max_lookback_months))
            .unwrap_or(NaiveDateTime::MIN);
        let before = self.width.offset(
            start - Duration::days(RECENT_MARGIN_DAYS),
            -(self.sample_size as i64),
        );
        SampleBounds::new(after, before)
    }
}

/// State change notification.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SampleReady { index: usize, label: f64 },
    ScoreUpdated { index: usize, score: f64, mean: f64, deviation: f64 },
    Completed { mean: f64, deviation: f64 },
}

type Observer = Box<dyn Fn(&SessionEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UniverseState {
    Unchecked,
    Ready,
    Failed,
}

pub struct TrainingSession {
    params: SessionParams,
    rng: RngHierarchy,
    start: NaiveDateTime,
    end: Option<NaiveDateTime>,
    bounds: SampleBounds,
    universe: UniverseState,
    index: usize,
    sample: Option<PreparedSample>,
    scored: bool,
    score: RunningScore,
    complete: bool,
    observers: Vec<Observer>,
}

impl fmt::Debug for TrainingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainingSession")
            .field("security", &self.params.security)
            .field("start", &self.start)
            .field("index", &self.index)
            .field("complete", &self.complete)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl TrainingSession {
    pub fn new(params: SessionParams, start: NaiveDateTime) -> Result<Self, SessionError> {
        params.validate()?;
        let bounds = params.bounds(start);
        Ok(Self {
            rng: RngHierarchy::new(params.seed),
            params,
            start,
            end: None,
            bounds,
            universe: UniverseState::Unchecked,
            index: 0,
            sample: None,
            scored: false,
            score: RunningScore::new(),
            complete: false,
            observers: Vec::new(),
        })
    }

    /// Session starting at the current local time.
    pub fn starting_now(params: SessionParams) -> Result<Self, SessionError> {
        Self::new(params, chrono::Local::now().naive_local())
    }

    /// Register an observer for state changes.
    pub fn subscribe(&mut self, observer: impl Fn(&SessionEvent) + Send + Sync + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn emit(&self, event: SessionEvent) {
        for observer in &self.observers {
            observer(&event);
        }
    }

    /// Ensure `store` holds the bars this session can sample, narrowing the
    /// anchor bounds if the provider has no data for part of the range.
    ///
    /// A fatal provider failure disables sampling for this session.
    pub fn prepare_universe(
        &mut self,
        store: &mut dyn BarStore,
        provider: &dyn MarketDataProvider,
    ) -> Result<UniverseReport, SessionError> {
        let result = complete_universe(
            store,
            provider,
            &self.params.security,
            self.params.width,
            &mut self.bounds,
            self.params.sample_size,
        );
        match result {
            Ok(report) => {
                self.universe = UniverseState::Ready;
                Ok(report)
            }
            Err(e) => {
                self.universe = UniverseState::Failed;
                Err(e.into())
            }
        }
    }

    /// Advance to the next sample.
    ///
    /// Returns `Ok(None)` once the session is complete; further calls keep
    /// returning `Ok(None)` without changing state.
    pub fn next_sample(
        &mut self,
        store: &dyn BarStore,
        synth: &MarketSynth,
    ) -> Result<Option<&PreparedSample>, SessionError> {
        if self.complete {
            return Ok(None);
        }
        match self.universe {
            UniverseState::Ready => {}
            UniverseState::Unchecked => return Err(SessionError::UniverseUnchecked),
            UniverseState::Failed => return Err(SessionError::UniverseIncomplete),
        }

        let next = if self.sample.is_some() { self.index + 1 } else { self.index };
        if next >= self.params.sample_count {
            self.index = next;
            self.sample = None;
            self.finish();
            return Ok(None);
        }

        // a failed draw leaves the index and the current sample as they were
        let prepared = self.draw(next, store, synth)?;
        self.index = next;
        self.scored = false;
        let label = prepared.label();
        debug!(index = self.index, id = %prepared.id_string(), label, "next sample");
        self.sample = Some(prepared);
        self.emit(SessionEvent::SampleReady { index: self.index, label });
        Ok(self.sample.as_ref())
    }

    fn draw(
        &self,
        index: usize,
        store: &dyn BarStore,
        synth: &MarketSynth,
    ) -> Result<PreparedSample, SessionError> {
        let params = &self.params;
        let span = self.bounds.span_hours();
        let mut last = None;

        for attempt in 0..MAX_ANCHOR_ATTEMPTS {
            let mut rng = self.rng.rng_for(&params.security, index as u64, attempt);
            let offset = if span > 0 { rng.gen_range(0..span) } else { 0 };
            let anchor = self.bounds.after + Duration::hours(offset);
            let end = params.width.offset(anchor, params.sample_size as i64);

            let sample =
                MarketSample::count(params.security.clone(), params.width, end, params.sample_size);
            match sample.prepare(store, synth, &params.options) {
                Ok(prepared) => return Ok(prepared),
                Err(e @ (SampleError::InsufficientData { .. } | SampleError::Degenerate(_))) => {
                    warn!(index, attempt, %anchor, error = %e, "anchor rejected");
                    last = Some(e);
                }
                Err(e) => return Err(SessionError::Sample(e)),
            }
        }

        Err(SessionError::Exhausted {
            attempts: MAX_ANCHOR_ATTEMPTS,
            last: last.unwrap_or(SampleError::InsufficientData {
                wanted: params.sample_size + 1,
                found: 0,
            }),
        })
    }

    fn finish(&mut self) {
        self.complete = true;
        self.end = Some(chrono::Local::now().naive_local());
        info!(
            security = %self.params.security,
            samples = self.score.count(),
            score = self.score.mean(),
            deviation = self.score.deviation(),
            "training session complete"
        );
        self.emit(SessionEvent::Completed {
            mean: self.score.mean(),
            deviation: self.score.deviation(),
        });
    }

    /// Fold the current sample's guess score into the running statistics.
    pub fn update_score(&mut self, score: f64) -> Result<(), SessionError> {
        if self.complete {
            return Err(SessionError::Complete);
        }
        if self.sample.is_none() {
            return Err(SessionError::NoActiveSample);
        }
        if self.scored {
            return Err(SessionError::AlreadyScored(self.index));
        }
        if !(0.0..=1.0).contains(&score) {
            return Err(SessionError::InvalidScore(score));
        }

        self.score.push(score);
        self.scored = true;
        self.emit(SessionEvent::ScoreUpdated {
            index: self.index,
            score,
            mean: self.score.mean(),
            deviation: self.score.deviation(),
        });
        Ok(())
    }

    /// Evaluate `guess` against the current sample and record the score.
    pub fn guess(&mut self, guess: f64) -> Result<f64, SessionError> {
        let score = self
            .sample
            .as_ref()
            .map(|s| s.eval_guess(guess))
            .ok_or(SessionError::NoActiveSample)?;
        self.update_score(score)?;
        Ok(score)
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Set when the session completes.
    pub fn end(&self) -> Option<NaiveDateTime> {
        self.end
    }

    pub fn duration(&self) -> Option<Duration> {
        self.end.map(|end| end - self.start)
    }

    pub fn bounds(&self) -> SampleBounds {
        self.bounds
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn current_sample(&self) -> Option<&PreparedSample> {
        self.sample.as_ref()
    }

    /// Mean guess score so far.
    pub fn score(&self) -> f64 {
        self.score.mean()
    }

    pub fn score_deviation(&self) -> f64 {
        self.score.deviation()
    }

    pub fn scores_recorded(&self) -> usize {
        self.score.count()
    }

    pub fn score_interval(&self, confidence: ConfidenceZscore) -> ScoreInterval {
        self.score.interval(confidence)
    }

    /// Snapshot for archiving.
    pub fn record(&self) -> SessionRecord {
        SessionRecord {
            security: self.params.security.clone(),
            width: self.params.width,
            sample_size: self.params.sample_size,
            sample_count: self.params.sample_count,
            max_lookback_months: self.params.max_lookback_months,
            start: self.start,
            end: self.end,
            complete: self.complete,
            samples_scored: self.score.count(),
            score: self.score.mean(),
            score_deviation: self.score.deviation(),
        }
    }
}
