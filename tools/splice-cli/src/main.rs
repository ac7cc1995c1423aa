//! Splice CLI — inspect and edit timeline documents from the shell.
//!
//! Usage:
//!   splice validate <PATH>            Check a document against the schema rules
//!   splice info <PATH>                Show tracks, clips and duration
//!   splice apply <PATH> <OPS>         Replay a JSONL operation log

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "splice",
    about = "Timeline document tools for the Splice editor",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a timeline document
    Validate {
        /// Path to the document JSON
        path: PathBuf,
    },

    /// Show document information
    Info {
        /// Path to the document JSON
        path: PathBuf,
    },

    /// Replay an operation log against a document
    Apply {
        /// Path to the document JSON
        path: PathBuf,

        /// Operation log, one wire operation per line
        ops: PathBuf,

        /// Write the resulting document here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Undo this many steps after replaying
        #[arg(long, default_value = "0")]
        undo: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = splice_common::config::AppConfig::load();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    splice_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Info { path } => commands::info::run(path),
        Commands::Apply {
            path,
            ops,
            output,
            undo,
        } => commands::apply::run(path, ops, output, undo, &config),
    }
}
