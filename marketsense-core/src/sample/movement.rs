//! Future-movement label.
//!
//! Both formulas map a signed ratio `r` to `clamp01((r + 1) / 2)`, so the
//! label is 0.5 for no movement and saturates at 0 and 1 for `|r| >= 1`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementFormula {
    /// `r = (future − last) / last`.
    PercentOfLastPrice,
    /// `r = (future − last) / maxDelta`, where `maxDelta` is the largest
    /// absolute close-to-close change inside the visible window.
    #[default]
    DeltaSampleRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MovementError {
    #[error("no visible closes")]
    Empty,

    #[error("movement denominator is zero ({0:?})")]
    Degenerate(MovementFormula),
}

/// What to do with a window whose label is undefined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Use label 0.5 and flag the sample.
    #[default]
    Neutral,
    /// Fail preparation; the session draws another anchor.
    Reject,
}

pub const NEUTRAL_LABEL: f64 = 0.5;

pub fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

impl MovementFormula {
    pub fn label(&self) -> &'static str {
        match self {
            MovementFormula::PercentOfLastPrice => "percent_of_last_price",
            MovementFormula::DeltaSampleRange => "delta_sample_range",
        }
    }

    /// Clamped label for `future` following the visible `closes`.
    pub fn compute(&self, closes: &[f32], future: f32) -> Result<f64, MovementError> {
        let last = *closes.last().ok_or(MovementError::Empty)? as f64;
        let change = future as f64 - last;

        let denominator = match self {
            MovementFormula::PercentOfLastPrice => last,
            MovementFormula::DeltaSampleRange => max_delta(closes),
        };
        if denominator == 0.0 || !denominator.is_finite() {
            return Err(MovementError::Degenerate(*self));
        }

        let label = clamp01((change / denominator + 1.0) / 2.0);
        if label.is_nan() {
            return Err(MovementError::Degenerate(*self));
        }
        Ok(label)
    }
}

/// Largest absolute change between adjacent closes; zero for fewer than two.
pub fn max_delta(closes: &[f32]) -> f64 {
    closes
        .windows(2)
        .map(|pair| (pair[1] as f64 - pair[0] as f64).abs())
        .fold(0.0, f64::max)
}
