use affect_analysis_server::analysis_store::with_store;
use affect_analysis_server::components::build_components;
use affect_analysis_server::config::{AppConfig, CliConfig, FileConfig};
use affect_analysis_server::metrics;
use affect_analysis_server::server::{run_server, RequestsLoggingLevel, ServerConfig};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding the analysis database.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3002)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9092)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Directory downloads are written to while being analyzed.
    /// Defaults to <db-dir>/temp_audio.
    #[clap(long, value_parser = parse_path)]
    pub temp_audio_dir: Option<PathBuf>,

    /// Timeout in seconds for outbound HTTP requests.
    #[clap(long, default_value_t = 30)]
    pub request_timeout_sec: u64,

    /// Timeout in seconds for each external tool run.
    #[clap(long, default_value_t = 300)]
    pub tool_timeout_sec: u64,

    #[clap(long, env = "SPOTIFY_CLIENT_ID", hide_env_values = true)]
    pub spotify_client_id: Option<String>,

    #[clap(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub spotify_client_secret: Option<String>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_dir: self.db_dir.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
            logging_level: self.logging_level.clone(),
            temp_audio_dir: self.temp_audio_dir.clone(),
            request_timeout_sec: self.request_timeout_sec,
            tool_timeout_sec: self.tool_timeout_sec,
            spotify_client_id: self.spotify_client_id.clone(),
            spotify_client_secret: self.spotify_client_secret.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let components = build_components(&config)?;

    info!("Initializing metrics...");
    metrics::init_metrics();
    match with_store(&components.store, |store| store.count_records()).await {
        Ok(count) => {
            info!("Analysis database holds {} records", count);
            metrics::set_analysis_records(count);
        }
        Err(e) => warn!("Could not count stored records: {:#}", e),
    }

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level.clone(),
        port: config.port,
        metrics_port: config.metrics_port,
    };
    run_server(
        server_config,
        components.orchestrator,
        components.mood_predictor,
    )
    .await
}
