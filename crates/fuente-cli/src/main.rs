//! Fuente CLI - render and inspect SoundFont instruments from the command line.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fuente")]
#[command(author, version, about = "Fuente SoundFont engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a note list through the engine and write a stereo WAV
    Render(commands::render::RenderArgs),

    /// Show the presets, zones and generators of an instrument
    Info(commands::info::InfoArgs),

    /// Print the label and frequency of a MIDI note
    Note(commands::note::NoteArgs),

    /// Write or show the engine configuration
    Config(commands::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    tracing_log::LogTracer::init().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Note(args) => commands::note::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
