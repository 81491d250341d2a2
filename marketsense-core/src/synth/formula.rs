//! Timbre and amplitude formulas.
//!
//! A timbre formula renders one pitch period of samples from the whole
//! normalized data sequence. The formula is fixed when the synthesizer is
//! built and applies to every note of every buffer it produces.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimbreFormula {
    /// Pure sine wave.
    Sine,
    /// The nearest data value is the sample amplitude directly; positive half only.
    AbsoluteAmplitude,
    /// Sine wave scaled by the nearest data value.
    Multiplicative,
    /// Fundamental sine plus one overtone per data point, with amplitudes
    /// reduced by overtone index.
    #[default]
    HarmonicReducedOvertone,
    /// `Multiplicative` amplitude applied to `HarmonicReducedOvertone`.
    MultiplicativeHarmonic,
}

impl TimbreFormula {
    pub const ALL: [TimbreFormula; 5] = [
        TimbreFormula::Sine,
        TimbreFormula::AbsoluteAmplitude,
        TimbreFormula::Multiplicative,
        TimbreFormula::HarmonicReducedOvertone,
        TimbreFormula::MultiplicativeHarmonic,
    ];

    /// Short label used in exported file names.
    pub fn label(&self) -> &'static str {
        match self {
            TimbreFormula::Sine => "sine",
            TimbreFormula::AbsoluteAmplitude => "absamp",
            TimbreFormula::Multiplicative => "mult",
            TimbreFormula::HarmonicReducedOvertone => "harmredoi",
            TimbreFormula::MultiplicativeHarmonic => "multharmroi",
        }
    }

    /// Render one period of `period` samples.
    ///
    /// `data` must be non-empty and normalized to `[0, 1]`.
    pub fn render(&self, data: &[f64], amplitude: f64, period: usize) -> Vec<f64> {
        let len = period as f64;
        let points = data.len();

        (0..period)
            .map(|t| {
                let phase = t as f64 / len;
                let theta = TAU * phase;
                let nearest = data[((phase * points as f64) as usize).min(points - 1)];

                match self {
                    TimbreFormula::Sine => theta.sin() * amplitude,
                    TimbreFormula::AbsoluteAmplitude => amplitude * nearest,
                    TimbreFormula::Multiplicative => theta.sin() * amplitude * nearest,
                    TimbreFormula::HarmonicReducedOvertone => harmonic(theta, amplitude, data),
                    TimbreFormula::MultiplicativeHarmonic => {
                        harmonic(theta, amplitude * nearest, data)
                    }
                }
            })
            .collect()
    }
}

impl fmt::Display for TimbreFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fundamental plus overtones. The first data point gets overtone index `M`,
/// the last gets `1`; overtone `k` has amplitude `A·k / 2M²`.
fn harmonic(theta: f64, amplitude: f64, data: &[f64]) -> f64 {
    let m = data.len() as f64;
    let den = 2.0 * m * m;

    let overtones: f64 = data
        .iter()
        .enumerate()
        .map(|(j, value)| {
            let index = m - j as f64;
            (theta + theta * value).sin() * amplitude * index / den
        })
        .sum();

    theta.sin() * amplitude + overtones
}

/// Loudness policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmplitudeFormula {
    /// Same amplitude for every note.
    #[default]
    Constant,
}

impl AmplitudeFormula {
    pub fn label(&self) -> &'static str {
        match self {
            AmplitudeFormula::Constant => "const",
        }
    }

    /// Amplitude for note `note` of `notes`, given the configured base level.
    pub fn level(&self, base: f64, _note: usize, _notes: usize) -> f64 {
        match self {
            AmplitudeFormula::Constant => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_period_starts_at_zero_and_peaks_at_quarter() {
        let period = TimbreFormula::Sine.render(&[0.5], 100.0, 8);
        assert_eq!(period.len(), 8);
        assert!(period[0].abs() < 1e-9);
        assert!((period[2] - 100.0).abs() < 1e-9);
        assert!((period[6] + 100.0).abs() < 1e-9);
    }

    #[test]
    fn absolute_amplitude_is_never_negative() {
        let data = [0.0, 0.25, 1.0, 0.5];
        let period = TimbreFormula::AbsoluteAmplitude.render(&data, 50.0, 16);
        assert!(period.iter().all(|v| *v >= 0.0));
        // first quarter of the period reads the first data point
        assert_eq!(period[0], 0.0);
        assert_eq!(period[8], 50.0);
    }

    #[test]
    fn multiplicative_with_unit_data_is_sine() {
        let data = [1.0, 1.0];
        let sine = TimbreFormula::Sine.render(&data, 10.0, 20);
        let mult = TimbreFormula::Multiplicative.render(&data, 10.0, 20);
        for (a, b) in sine.iter().zip(&mult) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn harmonic_stays_below_one_and_a_half_amplitude() {
        let data: Vec<f64> = (0..12).map(|i| i as f64 / 11.0).collect();
        for formula in [TimbreFormula::HarmonicReducedOvertone, TimbreFormula::MultiplicativeHarmonic] {
            let period = formula.render(&data, 1000.0, 97);
            assert!(period.iter().all(|v| v.abs() <= 1500.0), "{formula} exceeded bound");
        }
    }

    #[test]
    fn harmonic_single_point_matches_closed_form() {
        // M = 1: sin(θ)·A + sin(θ + θ·d)·A/2
        let d = 0.5;
        let period = TimbreFormula::HarmonicReducedOvertone.render(&[d], 2.0, 4);
        let theta = TAU * 0.25;
        let expected = theta.sin() * 2.0 + (theta + theta * d).sin() * 2.0 / 2.0;
        assert!((period[1] - expected).abs() < 1e-12);
    }

    #[test]
    fn constant_amplitude_ignores_note() {
        let f = AmplitudeFormula::Constant;
        assert_eq!(f.level(42.0, 0, 10), f.level(42.0, 9, 10));
    }
}
