//! Running score statistics and confidence intervals.

use serde::{Deserialize, Serialize};

/// Confidence level for score intervals.
///
/// The z-scores assume a normal approximation with unbounded sample size;
/// there is no small-sample correction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceZscore {
    Ninety,
    #[default]
    NinetyFive,
    NinetyNine,
}

impl ConfidenceZscore {
    pub const ALL: [ConfidenceZscore; 3] = [
        ConfidenceZscore::Ninety,
        ConfidenceZscore::NinetyFive,
        ConfidenceZscore::NinetyNine,
    ];

    /// Confidence level as a fraction.
    pub fn confidence(&self) -> f64 {
        match self {
            ConfidenceZscore::Ninety => 0.90,
            ConfidenceZscore::NinetyFive => 0.95,
            ConfidenceZscore::NinetyNine => 0.99,
        }
    }

    pub fn zscore(&self) -> f64 {
        match self {
            ConfidenceZscore::Ninety => 1.645,
            ConfidenceZscore::NinetyFive => 1.96,
            ConfidenceZscore::NinetyNine => 2.576,
        }
    }

    /// Interval radius `z · deviation`.
    pub fn radius(&self, deviation: f64) -> f64 {
        self.zscore() * deviation
    }
}

/// Symmetric interval around a mean score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreInterval {
    pub low: f64,
    pub mean: f64,
    pub high: f64,
}

impl ScoreInterval {
    pub fn new(mean: f64, deviation: f64, confidence: ConfidenceZscore) -> Self {
        let radius = confidence.radius(deviation);
        Self { low: mean - radius, mean, high: mean + radius }
    }

    pub fn radius(&self) -> f64 {
        self.high - self.mean
    }
}

/// Incremental mean and population standard deviation (Welford).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningScore {
    count: usize,
    mean: f64,
    m2: f64,
}

impl RunningScore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, score: f64) {
        self.count += 1;
        let delta = score - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (score - self.mean);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population standard deviation; zero before two scores.
    pub fn deviation(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        (self.m2 / self.count as f64).max(0.0).sqrt()
    }

    pub fn interval(&self, confidence: ConfidenceZscore) -> ScoreInterval {
        ScoreInterval::new(self.mean, self.deviation(), confidence)
    }
}
