//! End-to-end training sessions over the frozen SPY daily fixture.
//!
//! The fixture holds weekday bars from 2023-11-01 to 2024-06-28. Sessions
//! start 2024-06-01 with six months of lookback and ten-bar samples, so the
//! anchor range is 2023-12-01 .. 2024-05-20 and the universe must reach
//! 2024-05-30.

use chrono::{NaiveDate, NaiveDateTime};
use marketsense_core::data::{
    BarStore, CsvProvider, FailureKind, FetchFailure, InMemoryBarStore, MarketDataProvider,
    SideOutcome, TimeSeries,
};
use marketsense_core::domain::{BarWidth, SecurityId};
use marketsense_core::session::{SessionError, SessionParams, TrainingSession};
use marketsense_core::synth::{MarketSynth, SynthConfig};

const FIXTURE: &str = include_str!("fixtures/spy_daily.csv");

fn spy() -> SecurityId {
    SecurityId::new("SPY", "NYSE")
}

fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

/// Fixture rows whose date satisfies `keep`.
fn fixture_where(keep: impl Fn(&str) -> bool) -> String {
    let mut lines = FIXTURE.lines();
    let header = lines.next().unwrap();
    std::iter::once(header)
        .chain(lines.filter(|line| keep(&line[..10])))
        .collect::<Vec<_>>()
        .join("\n")
}

fn provider(csv: &str) -> CsvProvider {
    CsvProvider::from_reader(csv.as_bytes(), spy(), BarWidth::Day1).unwrap()
}

fn session(count: usize) -> TrainingSession {
    let params = SessionParams::new(spy(), BarWidth::Day1, 10, count, 6).with_seed(2024);
    TrainingSession::new(params, day(2024, 6, 1)).unwrap()
}

fn synth() -> MarketSynth {
    MarketSynth::new(SynthConfig::default()).unwrap()
}

#[test]
fn empty_store_is_completed_then_sampled() {
    let provider = provider(FIXTURE);
    let mut store = InMemoryBarStore::new();
    let synth = synth();
    let mut session = session(5);

    let report = session.prepare_universe(&mut store, &provider).unwrap();
    assert!(matches!(report.lower, SideOutcome::Filled { .. }));
    assert_eq!(report.upper, SideOutcome::Filled { bars: 1 });
    assert!(!report.is_narrowed());
    assert_eq!(session.bounds().after, day(2023, 12, 1));
    assert_eq!(session.bounds().before, day(2024, 5, 20));
    assert_eq!(store.len(&spy(), BarWidth::Day1), report.bars_added);

    let mut seen = 0;
    while let Some(sample) = session.next_sample(&store, &synth).unwrap() {
        assert_eq!(sample.bars().len(), 10);
        assert!(sample.future().timestamp > sample.end());
        assert!(sample.future().timestamp <= day(2024, 5, 30));
        let label = sample.label();
        assert!((0.0..=1.0).contains(&label));

        let score = session.guess(label).unwrap();
        assert_eq!(score, 1.0);
        seen += 1;
    }

    assert_eq!(seen, 5);
    assert!(session.is_complete());
    assert_eq!(session.score(), 1.0);
    assert_eq!(session.score_deviation(), 0.0);

    let record = session.record();
    assert!(record.complete);
    assert_eq!(record.samples_scored, 5);
    let json = serde_json::to_string(&record).unwrap();
    assert!(json.contains("\"SPY\""));
}

#[test]
fn missing_history_narrows_lower_bound() {
    let recent = fixture_where(|date| date >= "2024-02-01");
    let provider = provider(&recent);
    let mut store = InMemoryBarStore::with_bars(provider.bars().to_vec());
    let synth = synth();
    let mut session = session(4);

    let report = session.prepare_universe(&mut store, &provider).unwrap();
    assert_eq!(report.lower, SideOutcome::Narrowed { to: day(2024, 2, 1) });
    assert_eq!(report.upper, SideOutcome::Present);
    assert_eq!(report.bars_added, 0);
    assert_eq!(session.bounds().after, day(2024, 2, 1));

    while let Some(sample) = session.next_sample(&store, &synth).unwrap() {
        assert!(sample.start() >= day(2024, 2, 1));
        session.guess(0.5).unwrap();
    }
    assert!(session.is_complete());
}

#[test]
fn missing_recent_data_narrows_upper_bound() {
    let older = fixture_where(|date| date <= "2024-04-30");
    let provider = provider(&older);
    let mut store = InMemoryBarStore::with_bars(provider.bars().to_vec());
    let mut session = session(2);

    let report = session.prepare_universe(&mut store, &provider).unwrap();
    assert_eq!(report.lower, SideOutcome::Present);
    // ten daily bars before the last stored bar
    assert_eq!(report.upper, SideOutcome::Narrowed { to: day(2024, 4, 20) });
    assert_eq!(session.bounds().before, day(2024, 4, 20));

    let synth = synth();
    while let Some(sample) = session.next_sample(&store, &synth).unwrap() {
        assert!(sample.future().timestamp <= day(2024, 4, 30));
    }
}

#[test]
fn long_lookback_narrows_to_first_stored_bar() {
    // five years of lookback against a provider holding eight months
    let provider = provider(FIXTURE);
    let mut store = InMemoryBarStore::new();
    let synth = synth();
    let params = SessionParams::new(spy(), BarWidth::Day1, 10, 10, 60).with_seed(0);
    let mut session = TrainingSession::new(params, day(2024, 6, 1)).unwrap();
    assert_eq!(session.bounds().after, day(2019, 6, 1));

    let report = session.prepare_universe(&mut store, &provider).unwrap();
    assert_eq!(report.lower, SideOutcome::Narrowed { to: day(2023, 11, 1) });
    assert!(report.is_narrowed());
    assert_eq!(session.bounds().after, day(2023, 11, 1));
    assert_eq!(store.len(&spy(), BarWidth::Day1), report.bars_added);

    let mut seen = 0;
    while let Some(sample) = session.next_sample(&store, &synth).unwrap() {
        assert!(sample.start() >= day(2023, 11, 1));
        session.guess(0.5).unwrap();
        seen += 1;
    }
    assert_eq!(seen, 10);
}

#[test]
fn sampling_before_completion_is_rejected() {
    let provider = provider(FIXTURE);
    let mut store = InMemoryBarStore::with_bars(provider.bars().to_vec());
    let synth = synth();
    let mut session = session(2);

    assert!(matches!(
        session.next_sample(&store, &synth),
        Err(SessionError::UniverseUnchecked)
    ));
    session.prepare_universe(&mut store, &provider).unwrap();
    assert!(session.next_sample(&store, &synth).unwrap().is_some());
}

struct RateLimited;

impl MarketDataProvider for RateLimited {
    fn name(&self) -> &str {
        "rate-limited"
    }

    fn fetch_time_series(
        &self,
        _: &SecurityId,
        _: BarWidth,
        _: NaiveDateTime,
        _: NaiveDateTime,
    ) -> Result<TimeSeries, FetchFailure> {
        Err(FetchFailure::new(FailureKind::CallLimit, "5 calls per minute"))
    }
}

#[test]
fn fatal_failure_blocks_sampling() {
    let mut store = InMemoryBarStore::new();
    let mut session = session(3);
    let before = session.bounds();

    let err = session.prepare_universe(&mut store, &RateLimited).unwrap_err();
    match err {
        SessionError::Universe(e) => assert_eq!(e.failure().kind, FailureKind::CallLimit),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(session.bounds(), before);
    assert!(store.is_empty());

    // even with bars present, sampling stays disabled
    let provider = provider(FIXTURE);
    store.insert(provider.bars().to_vec());
    assert!(matches!(
        session.next_sample(&store, &synth()),
        Err(SessionError::UniverseIncomplete)
    ));
}

#[test]
fn sessions_replay_from_seed() {
    let provider = provider(FIXTURE);
    let store = InMemoryBarStore::with_bars(provider.bars().to_vec());
    let synth = synth();

    let ids = |mut s: TrainingSession| {
        let mut store = store.clone();
        s.prepare_universe(&mut store, &provider).unwrap();
        let mut ids = Vec::new();
        while let Some(sample) = s.next_sample(&store, &synth).unwrap() {
            ids.push(sample.id_string());
        }
        ids
    };

    let a = ids(session(6));
    let b = ids(session(6));
    assert_eq!(a.len(), 6);
    assert_eq!(a, b);
}
