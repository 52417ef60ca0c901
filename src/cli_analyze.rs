//! Runs a single analysis from the command line and prints a short summary.

use affect_analysis_server::components::build_components;
use affect_analysis_server::config::{AppConfig, CliConfig, FileConfig};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Identifier of the track to analyze.
    pub track_id: String,

    /// Path to a TOML config file. Its values override the command line.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Directory holding the analysis database.
    #[clap(long)]
    pub db_dir: Option<PathBuf>,

    /// Directory downloads are written to while being analyzed.
    #[clap(long)]
    pub temp_audio_dir: Option<PathBuf>,

    #[clap(long, default_value_t = 30)]
    pub request_timeout_sec: u64,

    #[clap(long, default_value_t = 300)]
    pub tool_timeout_sec: u64,

    #[clap(long, env = "SPOTIFY_CLIENT_ID", hide_env_values = true)]
    pub spotify_client_id: Option<String>,

    #[clap(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub spotify_client_secret: Option<String>,
}

fn resolve_config(args: &CliArgs) -> Result<AppConfig> {
    let file_config = args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let cli = CliConfig {
        db_dir: args.db_dir.clone(),
        temp_audio_dir: args.temp_audio_dir.clone(),
        request_timeout_sec: args.request_timeout_sec,
        tool_timeout_sec: args.tool_timeout_sec,
        spotify_client_id: args.spotify_client_id.clone(),
        spotify_client_secret: args.spotify_client_secret.clone(),
        ..Default::default()
    };
    AppConfig::resolve(&cli, file_config)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = CliArgs::parse();

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

    let config = resolve_config(&args)?;
    let components = build_components(&config)?;

    match components.orchestrator.analyze(&args.track_id).await {
        Ok(record) => {
            println!("done");
            println!("valence: {:.4}", record.valence);
            println!("arousal: {:.4}", record.arousal);
            println!("descriptors: {}", record.descriptors.len());
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{}: {}", err.kind(), err);
            Ok(ExitCode::FAILURE)
        }
    }
}
