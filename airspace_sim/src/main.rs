//! Airspace Simulator CLI
//!
//! Run the concurrent simulation, step it deterministically, or attach a
//! read-only radar to a running simulation's published region.

use airspace_core::{AirspaceSchema, AirspaceStore, MonitorConfig, DEFAULT_CAPACITY};
use airspace_env::TokioContext;
use airspace_sim::{
    bootstrap, display, secs_duration, traffic, BootstrapReport, CommandAudit, HistoryLogger,
    LockstepWorld, OperatorConsole, RegionPublisher, RegionReader, RunSummary, SimConfig, SimError,
    Supervisor, TracingSink, DEFAULT_REGION_NAME,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Airspace conflict simulator
#[derive(Parser, Debug)]
#[command(name = "airspace-sim")]
#[command(about = "Simulate aircraft motion and separation conflicts", long_about = None)]
struct Cli {
    /// Verbose output (debug level unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the concurrent simulation until interrupted
    Run(RunArgs),

    /// Step the simulation deterministically on a virtual clock
    Step(StepArgs),

    /// Attach read-only to a published region and draw the radar
    Radar(RadarArgs),
}

/// Traffic and monitor options shared by `run` and `step`.
#[derive(Args, Debug)]
struct TrafficArgs {
    /// Bootstrap file of `id x y z vx vy vz` tuples
    #[arg(default_value = "aircraft_data.txt")]
    traffic: PathBuf,

    /// Generate N random aircraft instead of reading the bootstrap file
    #[arg(long, value_name = "N")]
    random: Option<usize>,

    /// Seed for random traffic
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Maximum number of aircraft
    #[arg(short, long, default_value_t = DEFAULT_CAPACITY)]
    capacity: u16,

    /// Prediction horizon in seconds
    #[arg(long, default_value = "30")]
    lookahead: f32,

    /// Predicted conflicts within this many seconds escalate to critical
    #[arg(long, default_value = "120")]
    critical_threshold: f32,

    /// Integration step per agent tick, in seconds
    #[arg(long, default_value = "1.0", value_parser = parse_time_step)]
    time_step: f32,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    traffic: TrafficArgs,

    /// Agent and monitor period in milliseconds
    #[arg(long, default_value = "1000")]
    tick_ms: u64,

    /// Display period in milliseconds
    #[arg(long, default_value = "2000")]
    display_ms: u64,

    /// History logging period in seconds
    #[arg(long, default_value = "20")]
    history_secs: u64,

    /// Path of the published region (defaults to the temp directory)
    #[arg(long)]
    region: Option<PathBuf>,

    /// Do not publish a region
    #[arg(long, conflicts_with = "region")]
    no_region: bool,

    /// History log path
    #[arg(long, default_value = "airspace_history.log")]
    history_log: PathBuf,

    /// Operator command audit log path
    #[arg(long, default_value = "commands_log.txt")]
    command_log: PathBuf,

    /// Stop after this many seconds
    #[arg(short, long, value_parser = parse_secs)]
    duration: Option<f64>,

    /// Read operator commands from stdin
    #[arg(long)]
    console: bool,

    /// JSON summary on stdout
    #[arg(long)]
    json: bool,

    /// Do not print the position listing
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Args, Debug)]
struct StepArgs {
    #[command(flatten)]
    traffic: TrafficArgs,

    /// Number of ticks to run
    #[arg(short, long, default_value = "60")]
    ticks: u64,

    /// Append history entries to this file on the virtual clock
    #[arg(long)]
    history_log: Option<PathBuf>,

    /// History logging period in simulated seconds
    #[arg(long, default_value = "20")]
    history_secs: u64,

    /// JSON summary on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct RadarArgs {
    /// Path of the published region
    #[arg(long)]
    region: Option<PathBuf>,

    /// Capacity the region was created with
    #[arg(short, long, default_value_t = DEFAULT_CAPACITY)]
    capacity: u16,

    /// Refresh interval in milliseconds
    #[arg(long, default_value = "1000")]
    interval_ms: u64,
}

impl TrafficArgs {
    fn monitor(&self) -> MonitorConfig {
        MonitorConfig::default()
            .with_lookahead(self.lookahead)
            .with_critical_threshold(self.critical_threshold)
    }

    /// Fills `store` from random traffic or the bootstrap file.
    fn populate(&self, store: &AirspaceStore) -> Result<BootstrapReport, SimError> {
        let report = match self.random {
            Some(count) => {
                info!("Generating {} aircraft (seed={})", count, self.seed);
                bootstrap::populate(store, traffic::generate(self.seed, count, Default::default()))
            }
            None => bootstrap::load_file(store, &self.traffic).map_err(|e| {
                SimError::initialization(format!("cannot read {}: {}", self.traffic.display(), e))
            })?,
        };

        info!(
            "Loaded {} aircraft ({} skipped, {} duplicates{})",
            report.created.len(),
            report.skipped,
            report.duplicates,
            if report.capacity_reached { ", capacity reached" } else { "" }
        );
        Ok(report)
    }
}

/// Seconds argument: finite and not negative.
fn parse_secs(value: &str) -> Result<f64, String> {
    let secs: f64 = value.parse().map_err(|e| format!("{}", e))?;
    secs_duration("seconds", secs).map_err(|e| e.to_string())?;
    Ok(secs)
}

fn parse_time_step(value: &str) -> Result<f32, String> {
    let secs: f32 = value.parse().map_err(|e| format!("{}", e))?;
    secs_duration("time step", f64::from(secs)).map_err(|e| e.to_string())?;
    Ok(secs)
}

fn default_region() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_REGION_NAME)
}

fn print_summary(summary: &RunSummary, json: bool) {
    if json {
        match summary.to_json() {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Failed to serialize summary: {}", e),
        }
    } else {
        summary.log();
    }
}

async fn run(args: RunArgs) -> Result<RunSummary, SimError> {
    let tick = Duration::from_millis(args.tick_ms);
    let max_duration = args
        .duration
        .map(|secs| secs_duration("duration", secs))
        .transpose()?;
    let region = if args.no_region {
        None
    } else {
        Some(args.region.clone().unwrap_or_else(default_region))
    };

    let config = SimConfig::default()
        .with_capacity(args.traffic.capacity)
        .with_monitor(args.traffic.monitor())
        .with_tick_period(tick)
        .with_time_step(args.traffic.time_step)
        .with_history(args.history_log.clone(), Duration::from_secs(args.history_secs))
        .with_display_period(Duration::from_millis(args.display_ms))
        .with_region(region)
        .with_audit_log(args.command_log.clone())
        .with_duration(max_duration)
        .with_print_positions(!args.quiet);

    let store = AirspaceStore::new(config.schema);
    args.traffic.populate(&store)?;

    let region = match &config.region_path {
        Some(path) => {
            let publisher = RegionPublisher::create(path, &store)?;
            info!("Region published at {}", publisher.path().display());
            Some(publisher)
        }
        None => None,
    };

    let audit = CommandAudit::new(config.audit_path.clone());
    let max_duration = config.max_duration;
    let mut supervisor = Supervisor::new(config, TokioContext::shared(), store.clone(), Arc::new(TracingSink));
    if let Some(publisher) = region {
        supervisor.attach_region(publisher);
    }
    supervisor.start();

    if args.console {
        let input = tokio::io::BufReader::new(tokio::io::stdin());
        supervisor.spawn_console(OperatorConsole::new(store, audit), input, std::io::stdout());
    }

    let reason = match max_duration {
        Some(limit) => tokio::select! {
            _ = tokio::signal::ctrl_c() => "interrupted",
            _ = tokio::time::sleep(limit) => "duration elapsed",
        },
        None => match tokio::signal::ctrl_c().await {
            Ok(()) => "interrupted",
            Err(e) => {
                warn!("Cannot listen for interrupt: {}", e);
                "signal handler unavailable"
            }
        },
    };
    info!("Stopping: {}", reason);

    Ok(supervisor.stop().await)
}

fn step(args: StepArgs) -> Result<RunSummary, SimError> {
    let store = AirspaceStore::new(AirspaceSchema::with_capacity(args.traffic.capacity));
    args.traffic.populate(&store)?;

    let mut world = LockstepWorld::new(store.clone(), Arc::new(TracingSink), args.traffic.monitor())
        .with_time_step(args.traffic.time_step)?;
    if let Some(path) = args.history_log {
        world = world.with_history(HistoryLogger::new(store, path), Duration::from_secs(args.history_secs));
    }
    world.run(args.ticks);

    if !args.json {
        print!("{}", display::render_radar(&world.store().snapshot()));
    }
    Ok(world.summary())
}

async fn radar(args: RadarArgs) -> Result<(), SimError> {
    let path = args.region.unwrap_or_else(default_region);
    let reader = RegionReader::attach(&path, AirspaceSchema::with_capacity(args.capacity))?;
    info!("Attached to {}", reader.path().display());

    let interval = Duration::from_millis(args.interval_ms);
    loop {
        match reader.read() {
            Ok(records) => print!("\x1b[2J\x1b[1;1H{}", display::render_radar(&records)),
            Err(SimError::Io(_)) => {
                info!("Region released, detaching");
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Command::Run(args) => {
            let json = args.json;
            info!("Airspace Simulator v{}", env!("CARGO_PKG_VERSION"));
            run(args).await.map(|summary| print_summary(&summary, json))
        }
        Command::Step(args) => {
            let json = args.json;
            step(args).map(|summary| print_summary(&summary, json))
        }
        Command::Radar(args) => radar(args).await,
    };

    // stdin readers may still be parked; exit explicitly
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
