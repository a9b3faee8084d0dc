//! CLI entry point for the stop departures monitor.
//!
//! Provides subcommands for printing a stop's departure board once and for
//! polling it on an interval until interrupted.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use stop_departures::{
    config::MonitorConfig,
    coordinator::PollCoordinator,
    fetch::BasicClient,
    infra::ztm::ZtmClient,
    output::{BoardAttributes, attributes_json, render_state},
};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "stop_departures")]
#[command(about = "Upcoming departures for a bus or tram stop", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch departures once and print the board
    Board {
        #[command(flatten)]
        monitor: MonitorArgs,

        /// Print the display attributes as JSON instead of the table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Poll departures on an interval and print the board after every cycle
    Watch {
        #[command(flatten)]
        monitor: MonitorArgs,
    },
}

#[derive(Args)]
struct MonitorArgs {
    /// JSON config file; the flags below override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Stop identifier (falls back to the STOP_ID environment variable)
    #[arg(short, long)]
    stop_id: Option<String>,

    /// Human-readable stop name included in the attributes
    #[arg(long)]
    stop_name: Option<String>,

    /// Number of departures to display (1-15)
    #[arg(short = 'n', long)]
    max_departures: Option<usize>,

    /// Departures endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Poll interval in seconds
    #[arg(short = 'r', long)]
    interval: Option<u64>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// IANA time zone of the feed's clock times
    #[arg(long)]
    timezone: Option<String>,
}

impl MonitorArgs {
    /// Merges flags over the config file (or defaults when there is none).
    fn into_config(self) -> Result<MonitorConfig> {
        let mut config = match &self.config {
            Some(path) => MonitorConfig::load(path)
                .with_context(|| format!("Failed to load config from {path}"))?,
            None => {
                let stop_id = self
                    .stop_id
                    .clone()
                    .or_else(|| std::env::var("STOP_ID").ok())
                    .context("No stop id: pass --stop-id, set STOP_ID or use --config")?;
                MonitorConfig::new(stop_id)
            }
        };

        if let Some(stop_id) = self.stop_id {
            config.stop_id = stop_id;
        }
        if let Some(stop_name) = self.stop_name {
            config.stop_name = Some(stop_name);
        }
        if let Some(max_departures) = self.max_departures {
            config.max_departures = max_departures;
        }
        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(interval) = self.interval {
            config.poll_interval_secs = interval;
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
        if let Some(timezone) = self.timezone {
            config.timezone = timezone;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/stop_departures.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("stop_departures.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("RUST_LOG")
                .from_env_lossy(),
        );

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::DEBUG.into())
                .with_env_var("RUST_LOG_JSON")
                .from_env_lossy(),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Board { monitor, json } => {
            show_board(monitor.into_config()?, json).await?;
        }
        Commands::Watch { monitor } => {
            watch(monitor.into_config()?).await?;
        }
    }

    Ok(())
}

/// Builds the coordinator for a validated config.
fn build_coordinator(config: &MonitorConfig) -> Result<PollCoordinator<ZtmClient>> {
    let settings = config.poll_settings()?;
    let http = BasicClient::with_timeout(settings.request_timeout)?;
    let api = ZtmClient::new(http, &config.endpoint)?;
    Ok(PollCoordinator::new(api, settings))
}

/// Runs a single poll cycle and prints the result.
#[tracing::instrument(skip_all, fields(stop_id = %config.stop_id))]
async fn show_board(config: MonitorConfig, json: bool) -> Result<()> {
    let coordinator = build_coordinator(&config)?;
    let tz = coordinator.settings().timezone;

    let refreshed = coordinator.refresh().await;
    let state = coordinator.snapshot().await;

    if json {
        let attributes =
            BoardAttributes::new(&config.stop_id, config.stop_name.as_deref(), &state);
        println!("{}", attributes_json(&attributes)?);
    } else {
        if let Some(name) = &config.stop_name {
            println!("{name}");
        }
        println!("{}", render_state(&state, tz));
    }

    refreshed.context("Failed to fetch departures")?;
    Ok(())
}

/// Polls until Ctrl+C, printing the board after every cycle.
#[tracing::instrument(skip_all, fields(stop_id = %config.stop_id, interval_secs = config.poll_interval_secs))]
async fn watch(config: MonitorConfig) -> Result<()> {
    let coordinator = Arc::new(build_coordinator(&config)?);
    let tz = coordinator.settings().timezone;

    let shutdown_handle = coordinator.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl+C received, stopping");
                shutdown_handle.shutdown().await;
            }
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl+C"),
        }
    });

    info!("Polling until Ctrl+C");

    let title = config.stop_name.as_deref().unwrap_or(&config.stop_id);
    coordinator
        .run(config.poll_interval(), |state| {
            println!("{title}\n{}\n", render_state(state, tz));
        })
        .await;

    Ok(())
}
