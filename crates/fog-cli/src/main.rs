mod analyze;
mod render;
mod upload;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fog_gateway::{GatewayConfig, GeminiGateway};
use fog_session::Session;
use fog_vision::SimulatedPerformance;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "fogvision",
    version,
    about = "FoggyVision - fog scoring, enhancement and object detection for foggy photos"
)]
struct Cli {
    #[arg(long)]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the full pipeline on one image and print the report.
    Analyze {
        image: PathBuf,
        /// Where to write the enhanced image (default: next to the input).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Sanity-check the configuration.
    Doctor,
}

#[derive(Debug, serde::Deserialize)]
struct Config {
    gateway: GatewayConfig,
    upload: UploadCfg,
}

#[derive(Debug, serde::Deserialize)]
struct UploadCfg {
    max_size_mb: u64,
}

fn load_config(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).context("read config")?;
    Ok(toml::from_str(&s).context("parse config toml")?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.cmd {
        Command::Doctor => doctor(&cfg)?,
        Command::Analyze { image, out } => run_analyze(&cfg, &image, out.as_deref()).await?,
    }
    Ok(())
}

fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");
    check_gateway(&cfg.gateway)?;
    anyhow::ensure!(
        (1..=64).contains(&cfg.upload.max_size_mb),
        "upload.max_size_mb should be 1..64"
    );
    info!("doctor: OK");
    Ok(())
}

fn check_gateway(g: &GatewayConfig) -> Result<()> {
    anyhow::ensure!(g.endpoint.starts_with("http"), "gateway.endpoint must be an http(s) URL");
    anyhow::ensure!(!g.api_key.is_empty(), "gateway.api_key missing");
    anyhow::ensure!(!g.text_model.is_empty(), "gateway.text_model missing");
    anyhow::ensure!(!g.image_model.is_empty(), "gateway.image_model missing");
    Ok(())
}

async fn run_analyze(cfg: &Config, image: &std::path::Path, out: Option<&std::path::Path>) -> Result<()> {
    let gateway = GeminiGateway::new(cfg.gateway.clone());
    let mut session = Session::new(SimulatedPerformance::from_entropy());
    let max_bytes = cfg.upload.max_size_mb * 1024 * 1024;

    if let Err(e) = analyze::run_upload(&gateway, &mut session, image, max_bytes).await {
        // Single user-visible banner; the session is already reset for the
        // next upload.
        anyhow::bail!("{e}");
    }

    let outcome = session.outcome().context("no analysis outcome after success")?;
    let dims = session.dimensions().context("no image dimensions after success")?;

    let report = render::render_report(outcome, dims, session.confidence(), session.performance());
    print!("{report}");

    let written = render::write_enhanced_image(outcome, image, out)?;
    info!("analyze: enhanced image written to {}", written.display());
    println!("\nenhanced image: {}", written.display());
    Ok(())
}
