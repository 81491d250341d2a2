//! Sonification: price sequences to PCM melodies

pub mod buffer;
pub mod engine;
pub mod format;
pub mod formula;
pub mod sink;
pub mod wav;

pub use buffer::AudioBuffer;
pub use engine::{
    demo_data, normalize, MarketSynth, SynthConfig, SynthError, PITCH_MAX, PITCH_MIN,
    PITCH_RANGE, SOUND_DURATION_DEFAULT, SOUND_NOTE_COUNT_DEFAULT,
};
pub use format::{AudioChannels, AudioFormat, SampleRate, SampleSize};
pub use formula::{AmplitudeFormula, TimbreFormula};
pub use sink::{AudioSink, WavFileSink};
pub use wav::{save_wav, write_wav, ExportError};
