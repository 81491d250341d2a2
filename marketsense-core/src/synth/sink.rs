//! Where finished melodies go.
//!
//! Playback through an audio device is outside this crate; callers plug in
//! their own sink. `WavFileSink` is the built-in one: it exports to disk and
//! records playback requests in the log.

use super::buffer::AudioBuffer;
use super::wav::{save_wav, ExportError};
use std::path::{Path, PathBuf};
use tracing::info;

pub trait AudioSink {
    /// Play `buffer` `repeats` times in a row.
    fn play(&self, buffer: &AudioBuffer, repeats: u32) -> Result<(), ExportError>;

    /// Persist `buffer` under `name`.
    fn save(&self, buffer: &AudioBuffer, name: &str) -> Result<PathBuf, ExportError>;
}

/// Saves WAV files into a sounds directory.
#[derive(Debug, Clone)]
pub struct WavFileSink {
    dir: PathBuf,
}

impl WavFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl AudioSink for WavFileSink {
    fn play(&self, buffer: &AudioBuffer, repeats: u32) -> Result<(), ExportError> {
        info!(
            timbre = %buffer.timbre(),
            seconds = buffer.duration().as_secs_f64(),
            repeats,
            "play"
        );
        Ok(())
    }

    fn save(&self, buffer: &AudioBuffer, name: &str) -> Result<PathBuf, ExportError> {
        save_wav(buffer, &self.dir, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{MarketSynth, SynthConfig};

    #[test]
    fn file_sink_saves_into_its_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sink = WavFileSink::new(dir.path());
        let buf = MarketSynth::new(SynthConfig::default())
            .unwrap()
            .synthesize(&[0.2, 0.8], false)
            .unwrap();

        sink.play(&buf, 2).unwrap();
        let path = sink.save(&buf, "two_notes").unwrap();
        assert_eq!(path.parent().unwrap(), dir.path());
    }
}
