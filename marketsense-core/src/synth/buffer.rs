use super::format::{AudioFormat, SampleSize};
use super::formula::TimbreFormula;
use std::time::Duration;

/// Raw synthesized PCM frames plus their format. Never mutated after synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    data: Vec<u8>,
    format: AudioFormat,
    timbre: TimbreFormula,
}

impl AudioBuffer {
    pub(crate) fn new(data: Vec<u8>, format: AudioFormat, timbre: TimbreFormula) -> Self {
        Self { data, format, timbre }
    }

    /// Interleaved signed little-endian samples.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    /// Timbre the buffer was rendered with.
    pub fn timbre(&self) -> TimbreFormula {
        self.timbre
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    pub fn frame_size(&self) -> usize {
        self.format.frame_size()
    }

    /// `byte_len / frame_size`.
    pub fn frame_count(&self) -> usize {
        self.data.len() / self.frame_size()
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_count() as f64 / self.format.sample_rate.hz() as f64)
    }

    /// Decoded sample values, interleaved by channel.
    pub fn sample_values(&self) -> Vec<i32> {
        match self.format.sample_size {
            SampleSize::Eight => self.data.iter().map(|b| *b as i8 as i32).collect(),
            SampleSize::Sixteen => self
                .data
                .chunks_exact(2)
                .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as i32)
                .collect(),
        }
    }
}
