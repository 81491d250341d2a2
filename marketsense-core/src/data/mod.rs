//! Bar history: store, provider, and universe completion

pub mod csv_provider;
pub mod provider;
pub mod store;
pub mod universe;

pub use csv_provider::CsvProvider;
pub use provider::{FailureKind, FetchFailure, MarketDataProvider, TimeSeries};
pub use store::{BarQuery, BarStore, InMemoryBarStore, Order};
pub use universe::{complete_universe, SampleBounds, SideOutcome, UniverseError, UniverseReport};
