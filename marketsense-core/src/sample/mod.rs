//! Sample windower: bar windows, movement labels and colors

pub mod color;
pub mod movement;
pub mod window;

pub use color::Rgb;
pub use movement::{clamp01, max_delta, DegeneratePolicy, MovementError, MovementFormula};
pub use window::{eval_guess, MarketSample, PreparedSample, SampleError, SampleOptions, WindowSpec};
