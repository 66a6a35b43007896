//! txmap CLI
//!
//! Runs scripted sessions against a transactional map, for demonstrating
//! and debugging transaction ownership.
//!
//! # Commands
//!
//! - `run` - Execute a script and print each step's outcome
//! - `check` - Parse a script without running it
//! - `version` - Show version information

mod commands;
mod error;
mod script;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Scripted sessions against a transactional map.
#[derive(Parser)]
#[command(name = "txmap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a script against a fresh map
    Run {
        /// Script file (`<session> <op> [args]` per line)
        script: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Include operation counters
        #[arg(short, long)]
        stats: bool,
    },

    /// Parse a script and report the first malformed line
    Check {
        /// Script file
        script: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            script,
            format,
            stats,
        } => {
            commands::run::run(&script, &format, stats)?;
        }
        Commands::Check { script } => {
            commands::check::run(&script)?;
        }
        Commands::Version => {
            println!("txmap CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("txmap Core v{}", txmap_core::VERSION);
        }
    }

    Ok(())
}
