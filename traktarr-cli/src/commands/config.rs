//! Config command - manage configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use tracing::info;
use traktarr_store::Config;

use super::config_path;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the configuration file path.
    Path,

    /// Show current configuration, with keys and tokens redacted.
    Show,

    /// Write a configuration file with default values.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<ExitCode> {
    match &args.action {
        ConfigAction::Path => show_path(cli),
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Init { force } => init_config(*force, cli).await,
    }
}

fn show_path(cli: &Cli) -> Result<ExitCode> {
    let path = config_path(cli);

    match cli.format {
        OutputFormat::Text => println!("{}", path.display()),
        OutputFormat::Json => {
            let output = serde_json::json!({
                "config_file": path.display().to_string(),
                "exists": path.exists(),
            });
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
    }

    Ok(ExitCode::Success)
}

async fn show_config(cli: &Cli) -> Result<ExitCode> {
    let path = config_path(cli);
    let config = Config::load_from(&path).await?;
    let shown = config.redacted();

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_heading("Traktarr Configuration"));
            println!("File: {}", path.display());
            println!();
            println!("Sonarr");
            println!("  url:          {}", or_unset(&shown.sonarr.url));
            println!("  api_key:      {}", or_unset(&shown.sonarr.api_key));
            println!("  profile:      {}", shown.sonarr.profile);
            println!("  root_folder:  {}", or_unset(&shown.sonarr.root_folder));
            println!();
            println!("Trakt");
            println!("  api_key:      {}", or_unset(&shown.trakt.api_key));
            println!("  api_secret:   {}", or_unset(&shown.trakt.api_secret));
            println!("  users:");
            if config.trakt.users.is_empty() {
                println!("    (none, run `traktarr auth`)");
            }
            for credential in config.trakt.users.values() {
                println!("  {}", formatter.format_credential(credential));
            }
            println!();
            println!("Fetch");
            println!("  request_timeout_secs:  {}", shown.fetch.request_timeout_secs);
            println!("  page_delay_secs:       {}", shown.fetch.page_delay_secs);
            println!("  retry_base_delay_secs: {}", shown.fetch.retry_base_delay_secs);
            println!("  retry_max_attempts:    {}", shown.fetch.retry_max_attempts);
            println!("  page_limit:            {}", shown.fetch.page_limit);
            println!("  languages:             {}", shown.fetch.languages.join(","));
        }
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format(&shown)?);
        }
    }

    Ok(ExitCode::Success)
}

async fn init_config(force: bool, cli: &Cli) -> Result<ExitCode> {
    let path = config_path(cli);

    if path.exists() && !force {
        eprintln!(
            "{} already exists; use --force to overwrite it",
            path.display()
        );
        return Ok(ExitCode::Error);
    }

    Config::default().save_to(&path).await?;
    info!(path = %path.display(), "Configuration initialized");
    println!("Wrote {}", path.display());

    Ok(ExitCode::Success)
}

fn or_unset(value: &str) -> &str {
    if value.is_empty() { "(unset)" } else { value }
}
