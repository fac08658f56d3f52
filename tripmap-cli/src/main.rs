//! Tripmap CLI
//!
//! Command-line front end for the tripmap library: replay GPS traces through
//! the live tracker, prefetch map tiles and manage configuration.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use console::style;
use tripmap::config::ConfigFile;
use tripmap::logging::init_logging;

use crate::commands::config::ConfigCommands;
use crate::commands::prefetch::PrefetchArgs;
use crate::commands::simulate::SimulateArgs;
use crate::error::CliError;

#[derive(Debug, Parser)]
#[command(name = "tripmap", version = tripmap::VERSION, about = "Offline-friendly trip map tools")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay a GPS script through the live tracker
    Simulate(SimulateArgs),

    /// Download map tiles for an area
    Prefetch(PrefetchArgs),

    /// View or change settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let (config, load_error) = match ConfigFile::load() {
        Ok(config) => (config, None),
        Err(e) => (ConfigFile::default(), Some(e)),
    };

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging = logging.with_level("debug");
    }
    let _guard = init_logging(&logging);

    if let Some(e) = load_error {
        tracing::warn!(error = %e, "Using default settings");
    }

    if let Err(e) = run(cli.command, config) {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

fn run(command: Commands, config: ConfigFile) -> Result<(), CliError> {
    match command {
        Commands::Simulate(args) => commands::simulate::run(args, &config),
        Commands::Prefetch(args) => commands::prefetch::run(args, &config),
        Commands::Config { command } => commands::config::run(command, config),
    }
}
