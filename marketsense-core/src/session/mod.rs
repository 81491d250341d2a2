//! Training sessions: sample sequencing and score statistics

pub mod controller;
pub mod performance;
pub mod stats;

pub use controller::{
    SessionError, SessionEvent, SessionParams, TrainingSession, MAX_ANCHOR_ATTEMPTS,
};
pub use performance::{PerformancePoint, PerformanceSample, SessionRecord};
pub use stats::{ConfidenceZscore, RunningScore, ScoreInterval};
