//! Market synthesizer: turns a price sequence into a short melody.
//!
//! The buffer is split into one note per data point. Each note's pitch is
//! `PITCH_MIN + value · PITCH_RANGE`; at the start of each note a single
//! period of the configured timbre is rendered and then tiled across the
//! note. The last note absorbs any frames left over by the integer split.
//! The tiling cursor runs across note boundaries and wraps to zero only when
//! it passes the current period, so a new note usually starts mid-period and
//! a period that does not divide the note evenly leaves a phase
//! discontinuity.
//!
//! Synthesis is a pure function of the data, the normalize flag, and the
//! configuration.

use super::buffer::AudioBuffer;
use super::format::{AudioChannels, AudioFormat, SampleRate, SampleSize};
use super::formula::{AmplitudeFormula, TimbreFormula};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Lowest comfortable frequency, Hz.
pub const PITCH_MIN: f64 = 120.0;
/// Highest comfortable frequency, Hz.
pub const PITCH_MAX: f64 = 800.0;
pub const PITCH_RANGE: f64 = PITCH_MAX - PITCH_MIN;
/// Default melody length, seconds.
pub const SOUND_DURATION_DEFAULT: u32 = 2;
/// Default number of notes in a demo melody.
pub const SOUND_NOTE_COUNT_DEFAULT: usize = 10;
/// Default amplitude as a fraction of the sample type's maximum.
pub const AMPLITUDE_DEFAULT: f32 = 0.3;

#[derive(Debug, Error, PartialEq)]
pub enum SynthError {
    #[error("cannot synthesize an empty data sequence")]
    EmptyData,

    #[error("data point {index} is not finite")]
    NonFiniteData { index: usize },

    #[error("invalid synth config: {0}")]
    InvalidConfig(String),
}

/// Synthesizer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    pub sample_rate: SampleRate,
    pub sample_size: SampleSize,
    pub channels: AudioChannels,
    pub duration_secs: u32,
    /// Fraction of the sample type's maximum, in `(0, 1]`.
    pub amplitude: f32,
    pub timbre: TimbreFormula,
    pub amplitude_formula: AmplitudeFormula,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: SampleRate::default(),
            sample_size: SampleSize::default(),
            channels: AudioChannels::default(),
            duration_secs: SOUND_DURATION_DEFAULT,
            amplitude: AMPLITUDE_DEFAULT,
            timbre: TimbreFormula::default(),
            amplitude_formula: AmplitudeFormula::default(),
        }
    }
}

impl SynthConfig {
    pub fn with_timbre(mut self, timbre: TimbreFormula) -> Self {
        self.timbre = timbre;
        self
    }

    pub fn validate(&self) -> Result<(), SynthError> {
        if self.duration_secs == 0 {
            return Err(SynthError::InvalidConfig("duration_secs must be positive".into()));
        }
        if !(self.amplitude > 0.0 && self.amplitude <= 1.0) {
            return Err(SynthError::InvalidConfig(format!(
                "amplitude {} outside (0, 1]",
                self.amplitude
            )));
        }
        Ok(())
    }

    pub fn format(&self) -> AudioFormat {
        AudioFormat {
            sample_rate: self.sample_rate,
            sample_size: self.sample_size,
            channels: self.channels,
            duration_secs: self.duration_secs,
        }
    }
}

/// Min-max rescale to `[0, 1]`. A flat sequence maps every point to 0.5.
pub fn normalize(data: &[f32]) -> Vec<f64> {
    let (min, max) = data.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        let v = *v as f64;
        (lo.min(v), hi.max(v))
    });
    let range = max - min;
    if range <= 0.0 {
        return vec![0.5; data.len()];
    }
    data.iter().map(|v| (*v as f64 - min) / range).collect()
}

/// Random data for a demo melody, drawn from the caller's RNG.
pub fn demo_data<R: Rng + ?Sized>(rng: &mut R, notes: usize) -> Vec<f32> {
    (0..notes).map(|_| rng.gen::<f32>()).collect()
}

/// Sonification engine. Configuration is fixed at construction.
#[derive(Debug, Clone)]
pub struct MarketSynth {
    config: SynthConfig,
}

impl MarketSynth {
    pub fn new(config: SynthConfig) -> Result<Self, SynthError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    pub fn format(&self) -> AudioFormat {
        self.config.format()
    }

    /// Convert `data` to a melody.
    ///
    /// With `normalize` the data is min-max rescaled first; otherwise it is
    /// taken as already normalized and clamped to `[0, 1]`.
    pub fn synthesize(&self, data: &[f32], normalize: bool) -> Result<AudioBuffer, SynthError> {
        if data.is_empty() {
            return Err(SynthError::EmptyData);
        }
        if let Some(index) = data.iter().position(|v| !v.is_finite()) {
            return Err(SynthError::NonFiniteData { index });
        }

        let points = if normalize {
            self::normalize(data)
        } else {
            data.iter().map(|v| (*v as f64).clamp(0.0, 1.0)).collect()
        };

        let format = self.format();
        let rate = format.sample_rate.hz() as f64;
        let frames = format.frames();
        let channels = format.channels.count() as usize;
        let notes = points.len();
        let note_frames = (frames / notes).max(1);
        let base_amplitude = self.config.amplitude as f64 * format.sample_size.max_amplitude();

        debug!(
            notes,
            frames,
            timbre = %self.config.timbre,
            amplitude = base_amplitude,
            "synthesizing"
        );

        let mut out = Vec::with_capacity(format.byte_len());
        let mut period: Vec<f64> = Vec::new();
        let mut cursor = 0;
        let mut current_note = usize::MAX;

        for frame in 0..frames {
            let note = (frame / note_frames).min(notes - 1);
            if note != current_note {
                current_note = note;
                let pitch = PITCH_MIN + points[note] * PITCH_RANGE;
                let period_len = ((rate / pitch).round() as usize).max(1);
                let amplitude = self.config.amplitude_formula.level(base_amplitude, note, notes);
                period = self.config.timbre.render(&points, amplitude, period_len);
            }

            if cursor >= period.len() {
                cursor = 0;
            }
            let value = period[cursor];
            cursor += 1;

            for _ in 0..channels {
                push_sample(&mut out, value, format.sample_size);
            }
        }

        Ok(AudioBuffer::new(out, format, self.config.timbre))
    }
}

/// Truncate toward zero into the target width. Float-to-int casts saturate,
/// so out-of-range values clip at the representable bounds.
fn push_sample(out: &mut Vec<u8>, value: f64, size: SampleSize) {
    match size {
        SampleSize::Eight => out.push((value as i8) as u8),
        SampleSize::Sixteen => out.extend_from_slice(&(value as i16).to_le_bytes()),
    }
}
