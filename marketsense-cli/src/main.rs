//! MarketSense CLI: sonify price data and run training sessions.
//!
//! Commands:
//! - `synth`: render closes from a CSV file (or random demo data) to WAV
//! - `train`: run a training session over a CSV-backed provider, reading
//!   one guess per sample from stdin
//! - `config`: print the default configuration as TOML

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use marketsense_core::data::{CsvProvider, InMemoryBarStore};
use marketsense_core::domain::{BarWidth, SecurityId};
use marketsense_core::session::{ConfidenceZscore, TrainingSession};
use marketsense_core::synth::{
    demo_data, AudioSink, MarketSynth, TimbreFormula, WavFileSink, SOUND_NOTE_COUNT_DEFAULT,
};
use marketsense_core::MarketSenseConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "marketsense", about = "MarketSense: hear the market, guess the move")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render price closes to a WAV file.
    Synth {
        /// CSV with timestamp,open,high,low,close columns.
        #[arg(long, conflicts_with = "demo")]
        csv: Option<PathBuf>,

        /// Use random demo data instead of a CSV.
        #[arg(long, default_value_t = false)]
        demo: bool,

        /// Notes in the demo melody.
        #[arg(long, default_value_t = SOUND_NOTE_COUNT_DEFAULT)]
        notes: usize,

        /// Seed for demo data.
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Timbre label: sine, absamp, mult, harmredoi, multharmroi.
        #[arg(long)]
        timbre: Option<String>,

        /// Render once per timbre formula.
        #[arg(long, default_value_t = false)]
        all_timbres: bool,

        /// Sound name used in the output file name.
        #[arg(long)]
        name: Option<String>,

        /// Output directory.
        #[arg(long, default_value = "sounds")]
        out: PathBuf,
    },
    /// Run a training session.
    Train {
        /// CSV with timestamp,open,high,low,close columns.
        #[arg(long)]
        csv: PathBuf,

        #[arg(long, default_value = "SPY")]
        symbol: String,

        #[arg(long, default_value = "NYSE")]
        exchange: String,

        /// Bar width code, e.g. 1day or 1h. Defaults to the config value.
        #[arg(long)]
        width: Option<BarWidth>,

        #[arg(long)]
        sample_size: Option<usize>,

        #[arg(long)]
        sample_count: Option<usize>,

        #[arg(long)]
        lookback_months: Option<u32>,

        #[arg(long)]
        seed: Option<u64>,

        /// Session start date (YYYY-MM-DD). Defaults to now.
        #[arg(long)]
        start: Option<String>,

        /// Save each sample's melody into this directory.
        #[arg(long)]
        sounds: Option<PathBuf>,
    },
    /// Print the default configuration.
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => MarketSenseConfig::from_file(path)?,
        None => MarketSenseConfig::default(),
    };

    match cli.command {
        Commands::Synth {
            csv,
            demo,
            notes,
            seed,
            timbre,
            all_timbres,
            name,
            out,
        } => run_synth(&config, csv, demo, notes, seed, timbre, all_timbres, name, &out),
        Commands::Train {
            csv,
            symbol,
            exchange,
            width,
            sample_size,
            sample_count,
            lookback_months,
            seed,
            start,
            sounds,
        } => {
            let mut config = config;
            if let Some(width) = width {
                config.session.width = width;
            }
            if let Some(n) = sample_size {
                config.session.sample_size = n;
            }
            if let Some(n) = sample_count {
                config.session.sample_count = n;
            }
            if let Some(m) = lookback_months {
                config.session.max_lookback_months = m;
            }
            if let Some(seed) = seed {
                config.session.seed = seed;
            }
            config.validate()?;
            run_train(&config, &csv, SecurityId::new(symbol, exchange), start, sounds)
        }
        Commands::Config => {
            print!("{}", MarketSenseConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn parse_timbre(label: &str) -> Result<TimbreFormula> {
    match TimbreFormula::ALL.into_iter().find(|t| t.label() == label) {
        Some(timbre) => Ok(timbre),
        None => bail!("unknown timbre '{label}'. Valid: sine, absamp, mult, harmredoi, multharmroi"),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_synth(
    config: &MarketSenseConfig,
    csv: Option<PathBuf>,
    demo: bool,
    notes: usize,
    seed: u64,
    timbre: Option<String>,
    all_timbres: bool,
    name: Option<String>,
    out: &Path,
) -> Result<()> {
    let (data, default_name) = match (csv, demo) {
        (Some(path), _) => {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "prices".to_string());
            let provider = CsvProvider::from_path(&path, SecurityId::new(&stem, "CSV"), BarWidth::Day1)?;
            let closes: Vec<f32> = provider.bars().iter().map(|b| b.close).collect();
            (closes, stem)
        }
        (None, true) => {
            let mut rng = StdRng::seed_from_u64(seed);
            (demo_data(&mut rng, notes), "demo".to_string())
        }
        (None, false) => bail!("one of --csv or --demo is required"),
    };
    if data.is_empty() {
        bail!("no price data to synthesize");
    }

    let timbres = if all_timbres {
        TimbreFormula::ALL.to_vec()
    } else {
        vec![match timbre.as_deref() {
            Some(label) => parse_timbre(label)?,
            None => config.synth.timbre,
        }]
    };

    let name = name.unwrap_or(default_name);
    let sink = WavFileSink::new(out);
    for timbre in timbres {
        let synth = MarketSynth::new(config.synth.with_timbre(timbre))?;
        let buffer = synth.synthesize(&data, true)?;
        let path = sink.save(&buffer, &name)?;
        println!("{}", path.display());
    }
    Ok(())
}

fn run_train(
    config: &MarketSenseConfig,
    csv: &Path,
    security: SecurityId,
    start: Option<String>,
    sounds: Option<PathBuf>,
) -> Result<()> {
    let width = config.session.width;
    let provider = CsvProvider::from_path(csv, security.clone(), width)?;
    let mut store = InMemoryBarStore::new();
    let synth = MarketSynth::new(config.synth)?;

    let start: NaiveDateTime = match start {
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")?
            .and_hms_opt(0, 0, 0)
            .context("invalid start time")?,
        None => chrono::Local::now().naive_local(),
    };
    let mut session = TrainingSession::new(config.session_params(security), start)?;

    let report = session.prepare_universe(&mut store, &provider)?;
    if report.is_degenerate() {
        warn!("history collapsed to a single anchor; every sample will be the same window");
    } else if report.is_narrowed() {
        warn!(
            after = %report.bounds.after,
            before = %report.bounds.before,
            "history is incomplete; sampling from a narrower range"
        );
    }
    info!(bars = report.bars_added, "universe ready");

    let sink = sounds.map(WavFileSink::new);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let Some(sample) = session.next_sample(&store, &synth)? else {
            break;
        };
        let id = sample.id_string();
        let label = sample.label();
        let color = sample.color();
        let saved = match &sink {
            Some(sink) => {
                sink.play(sample.audio(), 1)?;
                Some(sink.save(sample.audio(), &id)?)
            }
            None => None,
        };

        println!(
            "sample {} of {}: {id}",
            session.index() + 1,
            config.session.sample_count
        );
        if let Some(path) = saved {
            println!("  melody: {}", path.display());
        }

        print!("guess [0-1]: ");
        io::stdout().flush()?;
        let line = match lines.next() {
            Some(line) => line?,
            None => bail!("stdin closed before the session completed"),
        };
        let guess: f64 = line
            .trim()
            .parse()
            .with_context(|| format!("invalid guess '{}'", line.trim()))?;

        let score = session.guess(guess)?;
        let interval = session.score_interval(ConfidenceZscore::NinetyFive);
        println!(
            "  movement {label:.3} ({color}), score {score:.3}, running {:.3} ± {:.3}",
            interval.mean,
            interval.radius()
        );
    }

    println!("{}", serde_json::to_string_pretty(&session.record())?);
    Ok(())
}
