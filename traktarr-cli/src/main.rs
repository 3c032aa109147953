// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Traktarr CLI - Trakt lists and the Sonarr library from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Authorize a Trakt account (device flow)
//! traktarr auth
//!
//! # Check the configured API keys
//! traktarr validate
//!
//! # Trending shows, as JSON
//! traktarr shows trending --format json --pretty
//!
//! # A user's watchlist
//! traktarr movies watchlist --user alice
//!
//! # Add a series to Sonarr
//! traktarr add-series --tvdb-id 81189 --title "Breaking Bad"
//! ```

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use traktarr_fetch::FetchError;
use traktarr_providers::MediaKind;

use commands::{auth, config, library, lists, validate};

// ============================================================================
// CLI Definition
// ============================================================================

/// Traktarr CLI - Trakt lists and the Sonarr library.
#[derive(Parser)]
#[command(name = "traktarr")]
#[command(about = "Trakt and Sonarr catalog CLI")]
#[command(long_about = r#"
Traktarr reads lists from Trakt and manages the Sonarr library.

Trakt lists:
  anticipated, trending, popular   public charts
  boxoffice                        weekend box office (movies only)
  watchlist                        the authorized user's watchlist
  <list id>                        a custom list of the authorized user

Examples:
  traktarr auth                    # Authorize a Trakt account
  traktarr shows trending          # Trending shows
  traktarr movies watchlist        # Watchlist of the first stored user
  traktarr series --format json    # Sonarr library as JSON
"#)]
#[command(version)]
#[command(author = "Traktarr Contributors")]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to the user config directory).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Authorize a Trakt account with the device flow.
    Auth,

    /// Check the Trakt and Sonarr API keys.
    Validate,

    /// Fetch a Trakt show list.
    #[command(visible_alias = "s")]
    Shows(lists::ListArgs),

    /// Fetch a Trakt movie list.
    #[command(visible_alias = "m")]
    Movies(lists::ListArgs),

    /// List the Sonarr library.
    Series,

    /// Look up a Sonarr quality profile id.
    Profile {
        /// Profile name (case-insensitive).
        name: String,
    },

    /// Add a series to Sonarr.
    AddSeries(library::AddSeriesArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// The upstream returned nothing usable.
    NoResult = 2,
    /// Trakt revoked the stored authorization.
    AuthorizationRevoked = 3,
}

impl ExitCode {
    /// Exit code for a failed command.
    fn for_error(e: &anyhow::Error) -> Self {
        match e.downcast_ref::<FetchError>() {
            Some(FetchError::AuthorizationRevoked { .. }) => ExitCode::AuthorizationRevoked,
            _ => ExitCode::Error,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let default = if verbose { "traktarr=debug,info" } else { "traktarr=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Auth => auth::run(&cli).await,
        Commands::Validate => validate::run(&cli).await,
        Commands::Shows(args) => lists::run(MediaKind::Shows, args, &cli).await,
        Commands::Movies(args) => lists::run(MediaKind::Movies, args, &cli).await,
        Commands::Series => library::series(&cli).await,
        Commands::Profile { name } => library::profile(name, &cli).await,
        Commands::AddSeries(args) => library::add_series(args, &cli).await,
        Commands::Config(args) => config::run(args, &cli).await,
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e:#}");
            }
            ExitCode::for_error(&e)
        }
    };

    std::process::exit(code as i32);
}
