//! Tapesat CLI - render audio files through the tape saturation pipeline.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tapesat")]
#[command(author, version, about = "Tape saturation pipeline CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a WAV file through the tape pipeline
    Process(commands::process::ProcessArgs),

    /// Print the display spectrum of a rendered file
    Scope(commands::scope::ScopeArgs),

    /// List, show and save presets
    Presets(commands::presets::PresetsArgs),

    /// Show pipeline parameters and latency, and optionally WAV file metadata
    Info(commands::info::InfoArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process(args) => commands::process::run(args),
        Commands::Scope(args) => commands::scope::run(args),
        Commands::Presets(args) => commands::presets::run(args),
        Commands::Info(args) => commands::info::run(args),
    }
}
