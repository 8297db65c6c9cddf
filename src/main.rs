//! CLI entry point for the station leaderboard.
//!
//! Polls the public weather feed for a fixed set of stations and prints each
//! station's readings along with who leads every quantity.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use station_leaderboard::{
    components::COMPONENTS,
    cycle::{CycleContext, CycleOptions, run_cycle, watch},
    display::MemoryDisplay,
    fetch::{BasicClient, fetch_bytes},
    leaderboard::{TieStyle, format_value},
    output::{append_record, print_board, print_json},
    parser::{LastData, parse_last_data},
    source::{AmbientWeather, WeatherSource},
    stations::StationConfig,
};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "station_leaderboard")]
#[command(about = "Live readings and leaderboard for a group of weather stations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct BoardArgs {
    /// JSON file listing stations as [{"name": ..., "slug": ...}]
    #[arg(short, long, value_name = "FILE")]
    stations: Option<String>,

    /// Append the value to 3-way (or larger) ties
    #[arg(long, default_value_t = false)]
    tie_value: bool,

    /// Print the board as JSON instead of a table
    #[arg(long, default_value_t = false)]
    json: bool,

    /// CSV file to append leaderboard rows to
    #[arg(long, value_name = "FILE")]
    csv: Option<String>,

    /// Maximum number of concurrent station fetches
    #[arg(short, long, default_value_t = 3)]
    concurrency: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll all stations on a fixed interval
    Watch {
        #[command(flatten)]
        board: BoardArgs,

        /// Seconds between cycles
        #[arg(short, long, default_value_t = 10)]
        interval: u64,

        /// Number of cycles to run (0 = until Ctrl+C)
        #[arg(short = 'n', long, default_value_t = 0)]
        cycles: usize,
    },
    /// Run a single cycle and print the board
    Once {
        #[command(flatten)]
        board: BoardArgs,
    },
    /// Show the readings in one feed document from a file or URL
    Snapshot {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/station_leaderboard.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("station_leaderboard.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            board,
            interval,
            cycles,
        } => {
            let (config, options, source) = setup(&board)?;
            watch(
                source,
                &config,
                &options,
                Duration::from_secs(interval.max(1)),
                cycles,
                |ctx, display| publish(&board, ctx, display),
            )
            .await?;
        }
        Commands::Once { board } => {
            let (config, options, source) = setup(&board)?;
            let (ctx, display) = run_cycle(source, &config, &options).await;
            publish(&board, &ctx, &display)?;
        }
        Commands::Snapshot { source } => {
            let bytes = fetcher(&source).await?;
            let data = parse_last_data(&bytes)?;

            info!(observed_at = ?data.observed_at(), "Feed parsed");
            print!("{}", format_snapshot(&data));
        }
    }

    Ok(())
}

/// Resolves station config, cycle options and the feed client from CLI args.
fn setup(board: &BoardArgs) -> Result<(StationConfig, CycleOptions, Arc<dyn WeatherSource>)> {
    let config = match &board.stations {
        Some(path) => StationConfig::load(path)?,
        None => StationConfig::default(),
    };

    let options = CycleOptions {
        components: COMPONENTS,
        tie_style: if board.tie_value {
            TieStyle::WithValue
        } else {
            TieStyle::Plain
        },
        concurrency: board.concurrency,
    };

    let mut source = AmbientWeather::new(BasicClient::new()?);
    if let Ok(base_url) = std::env::var("AMBIENT_BASE_URL") {
        info!(base_url = %base_url, "Using feed endpoint override");
        source = source.with_base_url(&base_url);
    }

    let source: Arc<dyn WeatherSource> = Arc::new(source);
    info!(stations = config.stations().len(), "Stations configured");
    Ok((config, options, source))
}

/// Writes one cycle to stdout and, if requested, to the CSV history.
fn publish(board: &BoardArgs, ctx: &CycleContext, display: &MemoryDisplay) -> Result<()> {
    if board.json {
        print_json(ctx)?;
    } else {
        print_board(ctx, display, COMPONENTS);
    }

    if let Some(path) = &board.csv {
        append_record(path, ctx)?;
    }
    Ok(())
}

/// One line per component with current, low and high, then wind direction.
fn format_snapshot(data: &LastData) -> String {
    let mut out = String::new();
    for component in COMPONENTS {
        let value = |v: Option<f64>| {
            v.map(|v| format_value(v, component.decimals))
                .unwrap_or_else(|| "--".to_string())
        };
        out.push_str(&format!(
            "{:<14} {:>10} {:<6} low {:>10}  high {:>10}\n",
            component.name,
            value(data.current(component.quantity)),
            component.unit,
            value(data.low(component.quantity)),
            value(data.high(component.quantity)),
        ));
    }
    if let Some(dir) = data.winddir {
        out.push_str(&format!("{:<14} {:>10} °\n", "Wind Dir", dir));
    }
    out
}

/// Loads feed data from a local file path or fetches it over HTTP.
#[tracing::instrument(fields(source = %url))]
async fn fetcher(url: &str) -> Result<Vec<u8>> {
    let bytes = if url.starts_with("http") {
        let client = BasicClient::new()?;
        fetch_bytes(&client, url).await?
    } else {
        std::fs::read(url)?
    };
    Ok(bytes)
}
