// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Repopick CLI - find every git repository under a directory and pick one

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use repopick::commands::{self, Output};
use repopick::config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "repopick")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "REPOPICK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(
        long,
        env = "NO_COLOR",
        global = true,
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every git repository under the scan root
    Scan {
        /// Directory to scan (defaults to the configured root, then home)
        root: Option<PathBuf>,

        /// Maximum depth to descend
        #[arg(long)]
        max_depth: Option<usize>,

        /// Fail on unreadable directories instead of skipping them
        #[arg(long)]
        strict: bool,

        /// Follow symbolic links while scanning
        #[arg(long)]
        follow_symlinks: bool,
    },

    /// Rank repositories against a fuzzy query
    Find {
        /// Query (words are joined; whitespace is ignored)
        query: Vec<String>,

        /// Directory to scan
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Show at most this many results
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Print each match's score
        #[arg(long)]
        scores: bool,
    },

    /// Print the best match for a query
    Pick {
        /// Query (words are joined; whitespace is ignored)
        #[arg(required = true)]
        query: Vec<String>,

        /// Directory to scan
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Print the configured open command instead of the path
        #[arg(long)]
        command: bool,
    },

    /// Launch the interactive picker
    View {
        /// Directory to scan
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Print the configured open command instead of the path
        #[arg(long)]
        command: bool,
    },

    /// Show the effective configuration
    Config,

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    init_logging(&cli, &config.log_level);

    let output = Output {
        json: cli.json,
        color: !cli.no_color,
    };

    match cli.command {
        Commands::Scan { root, max_depth, strict, follow_symlinks } => {
            let flags = commands::scan::ScanFlags { max_depth, strict, follow_symlinks };
            commands::scan::run(&config, root, flags, output)
        }
        Commands::Find { query, root, limit, scores } => {
            commands::find::run(&config, &query, root, limit, scores, output)
        }
        Commands::Pick { query, root, command } => {
            commands::pick::run(&config, &query, root, command, output)
        }
        Commands::View { root, command } => {
            commands::view::run(&config, root, command)
        }
        Commands::Config => {
            commands::config::run(&config, output)
        }
        Commands::Completions { shell } => {
            commands::completions::run(shell, &mut Cli::command())
        }
    }
}

/// Initialize logging on stderr; `RUST_LOG` overrides the flags.
///
/// The picker owns the terminal, so it only logs when `RUST_LOG` asks for it.
fn init_logging(cli: &Cli, configured: &str) {
    let level = match cli.verbose {
        0 if cli.quiet => "error",
        0 => configured,
        1 => "debug",
        _ => "trace",
    };

    let from_env = EnvFilter::try_from_default_env().ok();
    if from_env.is_none() && matches!(cli.command, Commands::View { .. }) {
        return;
    }
    let filter = from_env.unwrap_or_else(|| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
