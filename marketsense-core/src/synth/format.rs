//! Audio format parameters.

use serde::{Deserialize, Serialize};

/// Allowed sample rates. Higher rates reach higher frequencies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleRate {
    Lowest,
    Low,
    #[default]
    Medium,
    High,
    Highest,
}

impl SampleRate {
    /// Samples per second.
    pub fn hz(&self) -> u32 {
        match self {
            SampleRate::Lowest => 8000,
            SampleRate::Low => 11025,
            SampleRate::Medium => 16000,
            SampleRate::High => 22050,
            SampleRate::Highest => 44100,
        }
    }
}

/// Bits per sample. Samples are signed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleSize {
    Eight,
    #[default]
    Sixteen,
}

impl SampleSize {
    pub fn bits(&self) -> u16 {
        match self {
            SampleSize::Eight => 8,
            SampleSize::Sixteen => 16,
        }
    }

    pub fn bytes(&self) -> usize {
        self.bits() as usize / 8
    }

    /// Largest representable sample value.
    pub fn max_amplitude(&self) -> f64 {
        match self {
            SampleSize::Eight => i8::MAX as f64,
            SampleSize::Sixteen => i16::MAX as f64,
        }
    }

    /// Smallest representable sample value.
    pub fn min_amplitude(&self) -> f64 {
        match self {
            SampleSize::Eight => i8::MIN as f64,
            SampleSize::Sixteen => i16::MIN as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioChannels {
    #[default]
    Mono,
    Stereo,
}

impl AudioChannels {
    pub fn count(&self) -> u16 {
        match self {
            AudioChannels::Mono => 1,
            AudioChannels::Stereo => 2,
        }
    }
}

/// Descriptor of a synthesized buffer: signed little-endian PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: SampleRate,
    pub sample_size: SampleSize,
    pub channels: AudioChannels,
    pub duration_secs: u32,
}

impl AudioFormat {
    /// Bytes per frame (one sample for every channel).
    pub fn frame_size(&self) -> usize {
        self.sample_size.bytes() * self.channels.count() as usize
    }

    /// Frames in a buffer of this format's full duration.
    pub fn frames(&self) -> usize {
        self.sample_rate.hz() as usize * self.duration_secs as usize
    }

    pub fn byte_len(&self) -> usize {
        self.frames() * self.frame_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_format_sizes() {
        let fmt = AudioFormat {
            sample_rate: SampleRate::default(),
            sample_size: SampleSize::default(),
            channels: AudioChannels::default(),
            duration_secs: 2,
        };
        assert_eq!(fmt.frame_size(), 2);
        assert_eq!(fmt.frames(), 32_000);
        assert_eq!(fmt.byte_len(), 64_000);
    }

    #[test]
    fn stereo_eight_bit_frame() {
        let fmt = AudioFormat {
            sample_rate: SampleRate::Lowest,
            sample_size: SampleSize::Eight,
            channels: AudioChannels::Stereo,
            duration_secs: 1,
        };
        assert_eq!(fmt.frame_size(), 2);
        assert_eq!(fmt.byte_len(), 16_000);
    }
}
