//! imgedit command-line interface

use super::config::CliConfigBuilder;
use crate::{
    config::Settings,
    pipelines::{BackgroundRemovalPipeline, ColorTransformPipeline, RemovalJob},
    services::{OpenAiImageClient, PicsartClient},
    tracing_config::init_cli_tracing,
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

/// Image editing through hosted APIs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "imgedit")]
pub struct Cli {
    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Plain log output without colors
    #[arg(long, global = true)]
    pub compact_logs: bool,

    /// Settings file [default: <config dir>/imgedit/config.toml if present]
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Timeout in seconds applied to every API call
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub openai_api_key: Option<String>,

    /// Picsart API key
    #[arg(long, env = "PICSART_API_KEY", hide_env_values = true, global = true)]
    pub picsart_api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Recolor the object shared by all images with one edit request
    Recolor(RecolorArgs),
    /// Replace the background of one image with transparency
    RemoveBg(RemoveBgArgs),
}

#[derive(Args, Debug)]
pub struct RecolorArgs {
    /// Input images, all showing the same object
    #[arg(
        value_name = "IMAGE",
        default_values = [
            "taikoo_images/backpack.png",
            "taikoo_images/clothes.png",
            "taikoo_images/jeans.png",
        ]
    )]
    pub images: Vec<PathBuf>,

    /// Target color for the object
    #[arg(short, long, default_value = "blue")]
    pub colour: String,

    /// Output directory for `<stem>_modified.png` files
    #[arg(short, long, default_value = crate::config::DEFAULT_RECOLOR_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Image model [default: gpt-image-1]
    #[arg(short, long)]
    pub model: Option<String>,

    /// Stop at the first result that cannot be decoded or written
    #[arg(long)]
    pub abort_on_item_failure: bool,
}

#[derive(Args, Debug)]
pub struct RemoveBgArgs {
    /// Input image
    #[arg(value_name = "IMAGE", default_value = "taikoo_images/backpack.png")]
    pub image: PathBuf,

    /// Output directory (created if missing)
    #[arg(short, long, default_value = "taikoo_images_modified")]
    pub output_dir: PathBuf,

    /// Output file name inside the output directory
    #[arg(short, long, default_value = "Task4_result.png")]
    pub file_name: String,

    /// Buffer size in bytes used while saving the downloaded image
    #[arg(long, default_value_t = 8192)]
    pub chunk_size: usize,
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Command::Recolor(args) => {
            init_cli_tracing(cli.verbose, cli.compact_logs)
                .context("Failed to initialize tracing")?;
            let settings =
                Settings::resolve(cli.config.as_deref()).context("Failed to load settings")?;
            run_recolor(&cli, args, &settings).await
        },
        Command::RemoveBg(args) => {
            if let Err(e) = init_cli_tracing(cli.verbose, cli.compact_logs) {
                eprintln!("Failed to initialize tracing: {:#}", e);
            }
            match Settings::resolve(cli.config.as_deref()) {
                Ok(settings) => run_remove_bg(&cli, args, &settings).await,
                Err(e) => error!(error = %e, "Failed to load settings"),
            }
            Ok(())
        },
    }
}

/// Recolor pipeline; failures end the process with a non-zero status
async fn run_recolor(cli: &Cli, args: &RecolorArgs, settings: &Settings) -> Result<()> {
    let config = CliConfigBuilder::color_transform(cli, args, settings)
        .context("Invalid recolor configuration")?;
    let client =
        OpenAiImageClient::new(config.service.clone()).context("Failed to create OpenAI client")?;
    let pipeline = ColorTransformPipeline::new(client, config);

    let start_time = Instant::now();
    let report = pipeline
        .run(&args.images, &args.colour)
        .await
        .context("Recolor failed")?;

    info!(
        "Saved {} of {} image(s) in {:.2}s",
        report.saved.len(),
        args.images.len(),
        start_time.elapsed().as_secs_f64()
    );
    for failure in &report.failures {
        warn!(index = failure.index, "Result not saved: {}", failure.error);
    }

    Ok(())
}

/// Background removal pipeline; every failure is logged and the process exits 0
async fn run_remove_bg(cli: &Cli, args: &RemoveBgArgs, settings: &Settings) {
    let config = match CliConfigBuilder::background_removal(cli, args, settings) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid background removal configuration");
            return;
        },
    };

    let chunk_size = config.chunk_size;
    let client = match PicsartClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to create Picsart client");
            return;
        },
    };

    let job = RemovalJob::new(
        args.image.clone(),
        args.output_dir.clone(),
        args.file_name.clone(),
    );
    let pipeline = BackgroundRemovalPipeline::new(client).with_chunk_size(chunk_size);

    if let Some(path) = pipeline.run(&job).await {
        info!("Done: {}", path.display());
    }
}
