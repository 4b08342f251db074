// SPDX-License-Identifier: GPL-3.0-only

use camera_controls::{AppResult, Config};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "camera-controls")]
#[command(about = "Adjust V4L2 camera controls as an ordered effects pipeline")]
#[command(version = env!("CAMERA_CONTROLS_BUILD_VERSION"))]
struct Cli {
    /// Config file (default: ~/.config/camera-controls/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Control tool to run instead of the configured one
    #[arg(long, global = true)]
    tool: Option<String>,

    /// Timeout for each tool invocation in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List cameras with their supported effects
    List,

    /// Read one control value
    Get {
        /// Device path (default: configured device, then first camera)
        #[arg(short, long)]
        device: Option<String>,

        /// Control name (e.g., brightness)
        control: String,
    },

    /// Write one control value (clamped to the control's range)
    Set {
        #[arg(short, long)]
        device: Option<String>,

        control: String,

        #[arg(allow_negative_numbers = true)]
        value: i64,
    },

    /// Apply an ordered list of effects, e.g. `apply brightness=150 zoom_absolute=200`
    Apply {
        #[arg(short, long)]
        device: Option<String>,

        /// Effects as control=value, applied top to bottom
        #[arg(required = true)]
        effects: Vec<String>,
    },

    /// Walk through the effects pipeline on simulated cameras
    Demo,
}

fn main() -> AppResult<()> {
    // Set RUST_LOG to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=camera_controls=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(tool) = cli.tool {
        config.tool_command = vec![tool];
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.command_timeout_ms = timeout_ms;
    }

    match cli.command {
        Commands::List => cli::list_devices(&config),
        Commands::Get { device, control } => cli::get_control(&config, device, &control),
        Commands::Set {
            device,
            control,
            value,
        } => cli::set_control(&config, device, &control, value),
        Commands::Apply { device, effects } => cli::apply_effects(&config, device, &effects),
        Commands::Demo => cli::run_demo(),
    }
}
