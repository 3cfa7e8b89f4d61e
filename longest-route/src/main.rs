//! Longest one-day train route finder.
//!
//! Reads the trip catalog from stdin and the station list, transfer rules,
//! partner tracks and bound table from the data directory, then prints every
//! route that improves on the longest distance found so far.

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use longest_route::domain::Clock;
use longest_route::planner::{
    BoundTable, ConfigError, ConnectivityIndex, EngineConfig, RouteRecorder, SearchEngine,
    SearchError, SearchOptions, SearchState, history, write_speed_table,
};
use longest_route::timetable::{
    InputError, PartnerRuleSet, StationCatalog, TransferRuleSet, TripCatalog,
};

/// Recursion depth grows with route length, so the search gets its own stack.
const SEARCH_STACK_SIZE: usize = 64 * 1024 * 1024;

const STATIONS_FILE: &str = "stations";
const TRANSFERS_FILE: &str = "transfers";
const PARTNERS_FILE: &str = "partners";
const BOUNDS_FILE: &str = "time-distance";

/// Find the longest train route that fits in one travel day
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Abandon routes more than this many km behind the best known distance
    #[arg(short = 'b', long = "beam", default_value_t = 20.0)]
    beam_size: f64,

    /// Only start routes at this station
    #[arg(short = 'f', long = "first")]
    first_station: Option<String>,

    /// Resume from a route printed by an earlier run
    #[arg(short = 'H', long)]
    history: Option<PathBuf>,

    /// Ignore transfer, return and reserve times and the waypoint visit
    #[arg(short = 'i', long = "ignore-safety")]
    ignore_transfer_safety: bool,

    /// Start with an empty bound table instead of the saved one
    #[arg(short = 'n', long = "reset-bounds")]
    reset_bounds: bool,

    /// Start time (HH:MM); only start legs departing exactly then are used
    #[arg(short = 's', long = "start")]
    start_time: Option<String>,

    /// Print the average speeds per track and exit
    #[arg(short = 'S', long = "show-speeds")]
    show_speeds: bool,

    /// Use the previous edition's rules (midnight start, 24 hour day)
    #[arg(long, conflicts_with = "config")]
    legacy: bool,

    /// JSON file overriding the day rules
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the stations, transfers, partners and time-distance files
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,
}

/// Anything that stops a run.
#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("cannot write bound table {}: {source}", path.display())]
    SaveBounds { path: PathBuf, source: io::Error },

    #[error("cannot write output: {0}")]
    Output(#[from] io::Error),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("longest-route: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), AppError> {
    let config = engine_config(args)?;
    let stations = StationCatalog::load(&args.data_dir.join(STATIONS_FILE))?;
    let options = search_options(args, &config, &stations)?;

    let bounds_path = args.data_dir.join(BOUNDS_FILE);
    let mut bounds = if options.reset_bounds {
        BoundTable::new()
    } else {
        BoundTable::load(&bounds_path, &stations)?
    };

    let trips = TripCatalog::read(io::stdin().lock(), "stdin", &stations)?;
    let transfers = TransferRuleSet::load(&args.data_dir.join(TRANSFERS_FILE), &stations)?;
    let index = ConnectivityIndex::build(&trips, &transfers, &config, &options);
    let partners = PartnerRuleSet::load(&args.data_dir.join(PARTNERS_FILE), &stations)?;

    if args.show_speeds {
        write_speed_table(io::stdout().lock(), &index.speed_table())?;
        return Ok(());
    }

    let mut state = match &options.history {
        Some(path) => history::load(path, &stations)?,
        None => SearchState::new(),
    };

    thread::scope(|scope| {
        let search = thread::Builder::new()
            .name("search".to_string())
            .stack_size(SEARCH_STACK_SIZE)
            .spawn_scoped(scope, || {
                SearchEngine::new(
                    &index,
                    &transfers,
                    &partners,
                    &config,
                    &options,
                    &mut bounds,
                    RouteRecorder::new(io::stdout()),
                )
                .with_checkpoint(&bounds_path)
                .run(&mut state)
            })?;
        search
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            .map_err(AppError::from)
    })?;

    save_bounds(&bounds, &bounds_path)
}

/// The day rules: a JSON file, the legacy preset, or the current defaults.
fn engine_config(args: &Args) -> Result<EngineConfig, ConfigError> {
    match &args.config {
        Some(path) => EngineConfig::from_json_file(path),
        None if args.legacy => Ok(EngineConfig::legacy()),
        None => Ok(EngineConfig::default()),
    }
}

/// Check the command-line choices against the station list.
fn search_options(
    args: &Args,
    config: &EngineConfig,
    stations: &StationCatalog,
) -> Result<SearchOptions, ConfigError> {
    let first_station = args
        .first_station
        .as_deref()
        .map(|name| {
            stations
                .get(name)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownFirstStation(name.to_string()))
        })
        .transpose()?;
    let start_time = args.start_time.as_deref().map(Clock::parse_hhmm).transpose()?;

    if !args.ignore_transfer_safety
        && let Some(waypoint) = &config.waypoint
        && !stations.contains(&waypoint.station)
    {
        return Err(ConfigError::UnknownWaypoint(waypoint.station.clone()));
    }

    Ok(SearchOptions {
        beam_size: args.beam_size,
        first_station,
        start_time,
        ignore_transfer_safety: args.ignore_transfer_safety,
        reset_bounds: args.reset_bounds,
        history: args.history.clone(),
    })
}

fn save_bounds(bounds: &BoundTable, path: &Path) -> Result<(), AppError> {
    bounds.save(path).map_err(|source| AppError::SaveBounds {
        path: path.to_path_buf(),
        source,
    })?;
    info!(routes = bounds.len(), path = %path.display(), "Saved bound table");
    Ok(())
}
