//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::build_engine_config;
use crate::domain::engine::{CycleInput, Decision, MetaEngine};
use crate::domain::error::MetaEngineError;
use crate::domain::relative_strength::RsOutcome;
use crate::domain::signal::Horizon;
use crate::domain::tournament::TournamentOutcome;
use crate::ports::market_port::MarketStatePort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "metaengine", about = "Meta-decision engine for allocation signals")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate one cycle of signals and prices
    Evaluate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        signals: PathBuf,
        #[arg(long)]
        prices: PathBuf,
        /// Decision horizon, overrides [engine] horizon
        #[arg(long)]
        horizon: Option<String>,
        /// Rotation index for rotation-mode relative strength
        #[arg(long, default_value_t = 0)]
        rotation: usize,
        /// Evaluate at every horizon instead of one
        #[arg(long, conflicts_with = "horizon")]
        all_horizons: bool,
        /// Cycle date, YYYY-MM-DD
        #[arg(long)]
        as_of: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate an engine configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Installs the fmt subscriber on stderr. `RUST_LOG` overrides the
/// default `info` filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Evaluate {
            config,
            signals,
            prices,
            horizon,
            rotation,
            all_horizons,
            as_of,
            output,
        } => run_evaluate(&EvaluateArgs {
            config,
            signals,
            prices,
            horizon,
            rotation,
            all_horizons,
            as_of,
            output,
        }),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = MetaEngineError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        tracing::error!("{err}");
        ExitCode::from(&err)
    })
}

pub struct EvaluateArgs {
    pub config: PathBuf,
    pub signals: PathBuf,
    pub prices: PathBuf,
    pub horizon: Option<String>,
    pub rotation: usize,
    pub all_horizons: bool,
    pub as_of: Option<String>,
    pub output: Option<PathBuf>,
}

fn run_evaluate(args: &EvaluateArgs) -> ExitCode {
    // Stage 1: Load and validate config
    tracing::info!(path = %args.config.display(), "loading config");
    let adapter = match load_config(&args.config) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let engine_config = match build_engine_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    // Stage 2: Resolve cycle parameters
    let horizon = match args.horizon.as_deref().map(str::parse::<Horizon>) {
        Some(Ok(h)) => h,
        Some(Err(e)) => return fail(&e),
        None => engine_config.horizon,
    };
    let as_of = match parse_as_of(args.as_of.as_deref()) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };

    // Stage 3: Read market state
    let market = CsvAdapter::new(
        args.signals.clone(),
        args.prices.clone(),
        engine_config.registry.clone(),
    );
    let engine = MetaEngine::new(engine_config);
    let horizons: &[Horizon] = if args.all_horizons {
        &Horizon::ALL
    } else {
        std::slice::from_ref(&horizon)
    };

    // Stage 4: Evaluate
    let decisions = match evaluate_cycle(&engine, &market, horizons, as_of, args.rotation) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };

    // Stage 5: Summary and report
    for decision in &decisions {
        print_summary(decision);
    }

    let report = CsvReportAdapter::new();
    match &args.output {
        Some(path) => match report.write(&decisions, path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "report written");
                ExitCode::SUCCESS
            }
            Err(e) => fail(&e),
        },
        None => match report.render(&decisions) {
            Ok(csv) => {
                print!("{csv}");
                ExitCode::SUCCESS
            }
            Err(e) => fail(&e),
        },
    }
}

/// Reads one cycle of market state and evaluates it at each horizon.
pub fn evaluate_cycle(
    engine: &MetaEngine,
    market: &dyn MarketStatePort,
    horizons: &[Horizon],
    as_of: Option<NaiveDate>,
    rotation_index: usize,
) -> Result<Vec<Decision>, MetaEngineError> {
    let signals = market.fetch_signals()?;
    let prices = market.fetch_prices()?;
    tracing::info!(
        signals = signals.len(),
        prices = prices.len(),
        horizons = horizons.len(),
        "evaluating cycle"
    );

    let inputs: Vec<CycleInput> = horizons
        .iter()
        .map(|&horizon| CycleInput {
            as_of,
            horizon,
            signals: signals.clone(),
            prices: prices.clone(),
            rotation_index,
        })
        .collect();

    engine.evaluate_many(&inputs).into_iter().collect()
}

pub fn parse_as_of(value: Option<&str>) -> Result<Option<NaiveDate>, MetaEngineError> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
                MetaEngineError::input("--as-of", format!("invalid date {s:?} (expected YYYY-MM-DD)"))
            })
        })
        .transpose()
}

fn fail(err: &MetaEngineError) -> ExitCode {
    tracing::error!("{err}");
    err.into()
}

fn print_summary(decision: &Decision) {
    eprintln!("\n=== Decision ({}) ===", decision.horizon);
    if let Some(date) = decision.as_of {
        eprintln!("As of:            {date}");
    }
    eprintln!("Meta-Score:       {}", decision.meta_score);
    eprintln!(
        "Conviction:       {:.2} ({})",
        decision.conviction, decision.consensus
    );
    eprintln!("State:            {}", decision.allocation_state);
    eprintln!("Position Size:    {:.1}%", decision.position_size * 100.0);

    let diag = &decision.diagnostics;
    eprintln!(
        "Signals:          {} eligible of {} ({} other horizon)",
        diag.eligible, diag.supplied, diag.horizon_discarded
    );
    if !diag.unknown_systems.is_empty() {
        eprintln!("  unknown:        {}", diag.unknown_systems.join(", "));
    }
    if !diag.horizon_conflicts.is_empty() {
        eprintln!("  conflicting:    {}", diag.horizon_conflicts.join(", "));
    }

    if let RsOutcome::Active(snapshot) = &decision.relative_strength {
        eprintln!("\n--- Relative Strength ---");
        match &snapshot.dominant {
            Some(asset) => eprintln!("Dominant:         {asset}"),
            None => eprintln!("Dominant:         (none)"),
        }
        for edge in &snapshot.edges {
            let marker = if edge.dominant_link { "*" } else { " " };
            eprintln!("  {marker} {:<12} {:.4}", edge.label(), edge.ratio);
        }
        for (asset, ratio) in &snapshot.benchmark_ratios {
            eprintln!("  benchmark {asset}: {ratio:.4}");
        }
    }

    match &decision.tournament {
        TournamentOutcome::Decided(bracket) => {
            eprintln!("\n--- Tournament ---");
            eprintln!("Champion:         {}", bracket.champion());
            for m in bracket.path(bracket.champion()) {
                eprintln!("  round {}: {} beat {}", m.round + 1, m.winner, m.loser);
            }
        }
        TournamentOutcome::Incomplete { missing } => {
            let names: Vec<String> = missing.iter().map(|a| a.to_string()).collect();
            eprintln!("\nTournament skipped: no price for {}", names.join(", "));
        }
        TournamentOutcome::Dormant => {}
    }

    eprintln!(
        "\nExposure:         {:.1}% primary + {:.1}% tournament = {:.1}%",
        decision.primary_exposure * 100.0,
        decision.tournament_exposure * 100.0,
        decision.total_exposure * 100.0
    );
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    tracing::info!(path = %config_path.display(), "validating config");
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let config = match build_engine_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    let bands = &config.bands;
    eprintln!("Horizon:          {}", config.horizon);
    eprintln!(
        "Bands:            low {} -> {:.0}%, high {} -> {:.0}%",
        bands.threshold_low(),
        bands.size_low() * 100.0,
        bands.threshold_high(),
        bands.size_high() * 100.0
    );
    eprintln!("Composition:      {}", config.composition);
    eprintln!("Systems:          {}", config.registry.len());
    for (id, spec) in config.registry.iter() {
        eprintln!("  {id}: {} (weight {})", spec.horizon, spec.weight);
    }
    if let Some(net) = &config.relative_strength {
        let names: Vec<String> = net.candidates().iter().map(|a| a.to_string()).collect();
        eprintln!("Relative strength: {} ({})", names.join(", "), net.mode());
    }
    if let Some(selector) = &config.tournament {
        let names: Vec<String> = selector.candidates().iter().map(|a| a.to_string()).collect();
        eprintln!(
            "Tournament:       {} (slice {:.0}%)",
            names.join(", "),
            selector.slice() * 100.0
        );
    }

    eprintln!("\nEngine configuration is valid.");
    ExitCode::SUCCESS
}
