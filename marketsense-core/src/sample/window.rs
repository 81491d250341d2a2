//! Sample windower.
//!
//! A `MarketSample` names a window of bars; `prepare` reads it from the
//! store, holds out the first bar after the window as the future bar,
//! labels the movement, synthesizes the visible closes, and colors the
//! label. Preparation either returns a complete `PreparedSample` or an
//! error; there is no partially prepared state.

use super::color::Rgb;
use super::movement::{DegeneratePolicy, MovementError, MovementFormula, NEUTRAL_LABEL};
use crate::data::{BarQuery, BarStore};
use crate::domain::{BarWidth, PriceBar, SecurityId};
use crate::synth::{AudioBuffer, MarketSynth, SynthError};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Bars scanned past an interval window when looking for the future bar.
pub const FUTURE_HORIZON_BARS: i64 = 8;
/// Minimum calendar span scanned for the future bar (covers long weekends).
pub const FUTURE_HORIZON_DAYS: i64 = 5;

/// How the visible window is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowSpec {
    /// All bars in `[start, end]`.
    Interval { start: NaiveDateTime, end: NaiveDateTime },
    /// The `count + 1` bars ending at or before `end`; the latest one is
    /// held out as the future bar. `count` must be positive.
    Count { end: NaiveDateTime, count: usize },
}

#[derive(Debug, Error, PartialEq)]
pub enum SampleError {
    #[error("insufficient bars: wanted {wanted}, found {found}")]
    InsufficientData { wanted: usize, found: usize },

    #[error("movement label undefined for this window ({0:?})")]
    Degenerate(MovementFormula),

    #[error(transparent)]
    Synth(#[from] SynthError),
}

/// Labeling and coloring choices for preparation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleOptions {
    pub movement: MovementFormula,
    pub degenerate_policy: DegeneratePolicy,
    pub low_color: Rgb,
    pub high_color: Rgb,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            movement: MovementFormula::default(),
            degenerate_policy: DegeneratePolicy::default(),
            low_color: Rgb::RED,
            high_color: Rgb::GREEN,
        }
    }
}

/// An unprepared window description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketSample {
    pub security: SecurityId,
    pub width: BarWidth,
    pub spec: WindowSpec,
}

impl MarketSample {
    pub fn new(security: SecurityId, width: BarWidth, spec: WindowSpec) -> Self {
        Self { security, width, spec }
    }

    pub fn interval(
        security: SecurityId,
        width: BarWidth,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Self::new(security, width, WindowSpec::Interval { start, end })
    }

    pub fn count(security: SecurityId, width: BarWidth, end: NaiveDateTime, count: usize) -> Self {
        Self::new(security, width, WindowSpec::Count { end, count })
    }

    /// Visible bars ascending, plus the future bar.
    fn load(&self, store: &dyn BarStore) -> Result<(Vec<PriceBar>, PriceBar), SampleError> {
        let query = BarQuery::new(self.security.clone(), self.width);

        match self.spec {
            WindowSpec::Interval { start, end } => {
                let visible = store.query(&query.clone().from(start).until(end));
                let horizon = self
                    .width
                    .offset(end, FUTURE_HORIZON_BARS)
                    .max(end + Duration::days(FUTURE_HORIZON_DAYS));
                let future = store
                    .query(&query.after(end).until(horizon).limit(1))
                    .into_iter()
                    .next();

                match future {
                    Some(future) if !visible.is_empty() => Ok((visible, future)),
                    future => Err(SampleError::InsufficientData {
                        wanted: visible.len().max(1) + 1,
                        found: visible.len() + usize::from(future.is_some()),
                    }),
                }
            }
            WindowSpec::Count { count: 0, .. } => {
                Err(SampleError::InsufficientData { wanted: 2, found: 0 })
            }
            WindowSpec::Count { end, count } => {
                let wanted = count + 1;
                let mut bars = store.query(&query.until(end).descending().limit(wanted));
                if bars.len() < wanted {
                    return Err(SampleError::InsufficientData { wanted, found: bars.len() });
                }
                bars.reverse();
                match bars.pop() {
                    Some(future) => Ok((bars, future)),
                    None => Err(SampleError::InsufficientData { wanted, found: 0 }),
                }
            }
        }
    }

    /// Fetch, label, synthesize and color this window.
    pub fn prepare(
        &self,
        store: &dyn BarStore,
        synth: &MarketSynth,
        options: &SampleOptions,
    ) -> Result<PreparedSample, SampleError> {
        let (bars, future) = self.load(store)?;
        let closes: Vec<f32> = bars.iter().map(|b| b.close).collect();

        let (label, degenerate) = match options.movement.compute(&closes, future.close) {
            Ok(label) => (label, false),
            Err(MovementError::Degenerate(formula)) => match options.degenerate_policy {
                DegeneratePolicy::Neutral => (NEUTRAL_LABEL, true),
                DegeneratePolicy::Reject => return Err(SampleError::Degenerate(formula)),
            },
            Err(MovementError::Empty) => {
                return Err(SampleError::InsufficientData { wanted: 2, found: 1 });
            }
        };

        let audio = synth.synthesize(&closes, true)?;
        let color = Rgb::interpolate(options.low_color, options.high_color, label);

        debug!(
            security = %self.security,
            bars = bars.len(),
            label,
            degenerate,
            %color,
            "prepared sample"
        );

        Ok(PreparedSample {
            security: self.security.clone(),
            width: self.width,
            spec: self.spec,
            movement: options.movement,
            bars,
            future,
            label,
            degenerate,
            color,
            audio,
        })
    }
}

/// A fully prepared training sample.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSample {
    security: SecurityId,
    width: BarWidth,
    spec: WindowSpec,
    movement: MovementFormula,
    bars: Vec<PriceBar>,
    future: PriceBar,
    label: f64,
    degenerate: bool,
    color: Rgb,
    audio: AudioBuffer,
}

impl PreparedSample {
    pub fn security(&self) -> &SecurityId {
        &self.security
    }

    pub fn width(&self) -> BarWidth {
        self.width
    }

    pub fn spec(&self) -> WindowSpec {
        self.spec
    }

    pub fn movement(&self) -> MovementFormula {
        self.movement
    }

    /// Visible bars, strictly ascending.
    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn closes(&self) -> Vec<f32> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// First bar after the visible window.
    pub fn future(&self) -> &PriceBar {
        &self.future
    }

    /// Movement label in `[0, 1]`.
    pub fn label(&self) -> f64 {
        self.label
    }

    /// The label fell back to neutral because the formula was undefined.
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn audio(&self) -> &AudioBuffer {
        &self.audio
    }

    pub fn start(&self) -> NaiveDateTime {
        self.bars[0].timestamp
    }

    pub fn end(&self) -> NaiveDateTime {
        self.bars[self.bars.len() - 1].timestamp
    }

    /// `1 − |guess − label|`. Guesses are clamped to `[0, 1]`.
    pub fn eval_guess(&self, guess: f64) -> f64 {
        eval_guess(guess, self.label)
    }

    /// Stable key for file names and logs:
    /// `SYMBOL_YYYYMMDDTHHMM_YYYYMMDDTHHMM_WIDTH_COUNT`.
    pub fn id_string(&self) -> String {
        let symbol: String = self
            .security
            .symbol
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        format!(
            "{}_{}_{}_{}_{}",
            symbol,
            self.start().format("%Y%m%dT%H%M"),
            self.end().format("%Y%m%dT%H%M"),
            self.width.code(),
            self.bars.len()
        )
    }
}

/// Score for `guess` against `label`; 1 for an exact match.
pub fn eval_guess(guess: f64, label: f64) -> f64 {
    1.0 - (guess.clamp(0.0, 1.0) - label).abs()
}
