//! MarketSense core: market price sonification and guess training.
//!
//! This crate contains the engine behind a training session:
//! - Domain types (securities, bar widths, price bars)
//! - Bar store and market-data provider interfaces, with universe completion
//! - Sample windower: visible window, held-out future bar, movement label, color
//! - Synthesis engine: price sequences to PCM melodies, WAV export
//! - Training session controller with running score statistics

pub mod config;
pub mod data;
pub mod domain;
pub mod rng;
pub mod sample;
pub mod session;
pub mod synth;

pub use config::{ConfigError, MarketSenseConfig};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: engine types can move to a worker thread.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceBar>();
        require_sync::<domain::PriceBar>();
        require_send::<domain::SecurityId>();
        require_sync::<domain::SecurityId>();

        require_send::<data::InMemoryBarStore>();
        require_sync::<data::InMemoryBarStore>();
        require_send::<data::TimeSeries>();
        require_sync::<data::TimeSeries>();
        require_send::<data::FetchFailure>();
        require_sync::<data::FetchFailure>();

        require_send::<synth::MarketSynth>();
        require_sync::<synth::MarketSynth>();
        require_send::<synth::AudioBuffer>();
        require_sync::<synth::AudioBuffer>();

        require_send::<sample::PreparedSample>();
        require_sync::<sample::PreparedSample>();

        require_send::<session::TrainingSession>();
        require_sync::<session::TrainingSession>();
        require_send::<session::SessionRecord>();
        require_sync::<session::SessionRecord>();

        require_send::<rng::RngHierarchy>();
        require_sync::<rng::RngHierarchy>();
        require_send::<MarketSenseConfig>();
        require_sync::<MarketSenseConfig>();
    }

    /// The session takes its collaborators as arguments; a store and a
    /// provider behind trait objects are enough to run it.
    #[test]
    fn collaborators_are_object_safe() {
        fn _drive(
            session: &mut session::TrainingSession,
            store: &mut dyn data::BarStore,
            provider: &dyn data::MarketDataProvider,
            synth: &synth::MarketSynth,
        ) -> Result<bool, session::SessionError> {
            session.prepare_universe(store, provider)?;
            Ok(session.next_sample(store, synth)?.is_some())
        }
    }
}
