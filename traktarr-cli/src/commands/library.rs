//! Sonarr commands - list the library, look up profiles, add series.

use anyhow::{Result, bail};
use clap::Args;
use serde_json::json;
use tracing::info;
use traktarr_core::{Fetched, WriteOutcome};
use traktarr_providers::NewSeries;

use super::Session;
use super::lists::exit_code;
use crate::output::{JsonFormatter, ListOutput, TextFormatter, WriteOutput, status_label};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the add-series command.
#[derive(Args)]
pub struct AddSeriesArgs {
    /// TheTVDB id.
    #[arg(long)]
    pub tvdb_id: u64,

    /// Series title.
    #[arg(long)]
    pub title: String,

    /// URL slug (derived from the title when omitted).
    #[arg(long)]
    pub slug: Option<String>,

    /// Quality profile name (defaults to `sonarr.profile`).
    #[arg(long)]
    pub profile: Option<String>,

    /// Root folder (defaults to `sonarr.root_folder`).
    #[arg(long)]
    pub root_folder: Option<String>,

    /// Search for missing episodes after adding.
    #[arg(long)]
    pub search: bool,
}

/// Runs the series command.
pub async fn series(cli: &Cli) -> Result<ExitCode> {
    let session = Session::open(cli).await?;
    let fetched = session.sonarr()?.series().await?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_list("Sonarr series", "series", &fetched));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!(
                "{}",
                formatter.format(&ListOutput::new("sonarr", "series", &fetched))?
            );
        }
    }

    Ok(exit_code(&fetched))
}

/// Runs the profile command.
pub async fn profile(name: &str, cli: &Cli) -> Result<ExitCode> {
    let session = Session::open(cli).await?;
    let fetched = session.sonarr()?.profile_id(name).await?;

    match cli.format {
        OutputFormat::Text => match &fetched {
            Fetched::Found(id) => println!("{name}: {id}"),
            Fetched::Empty => println!("No quality profile named {name}"),
            Fetched::Unavailable => println!("Sonarr is unavailable, try again later"),
        },
        OutputFormat::Json => {
            let output = json!({
                "profile": name,
                "status": status_label(&fetched),
                "id": fetched.as_found(),
            });
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
    }

    Ok(exit_code(&fetched))
}

/// Runs the add-series command.
pub async fn add_series(args: &AddSeriesArgs, cli: &Cli) -> Result<ExitCode> {
    let session = Session::open(cli).await?;
    let sonarr = session.sonarr()?;

    let profile_name = args
        .profile
        .clone()
        .unwrap_or_else(|| session.config.sonarr.profile.clone());
    let root_folder = args
        .root_folder
        .clone()
        .unwrap_or_else(|| session.config.sonarr.root_folder.clone());
    if root_folder.is_empty() {
        bail!("no root folder given and sonarr.root_folder is not set");
    }

    let quality_profile_id = match sonarr.profile_id(&profile_name).await? {
        Fetched::Found(id) => id,
        Fetched::Empty => bail!("no quality profile named {profile_name}"),
        Fetched::Unavailable => {
            eprintln!("Sonarr is unavailable, try again later");
            return Ok(ExitCode::NoResult);
        }
    };

    let series = NewSeries {
        tvdb_id: args.tvdb_id,
        title: args.title.clone(),
        title_slug: args.slug.clone().unwrap_or_else(|| slugify(&args.title)),
        quality_profile_id,
        root_folder,
        search_missing: args.search,
    };

    info!(tvdb_id = series.tvdb_id, title = %series.title, "Adding series");
    let outcome = sonarr.add_series(&series).await?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_write(&series.title, &outcome));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&WriteOutput::new(series.tvdb_id, &outcome))?);
        }
    }

    Ok(match outcome {
        WriteOutcome::Created => ExitCode::Success,
        WriteOutcome::Rejected(_) => ExitCode::Error,
        WriteOutcome::Unavailable => ExitCode::NoResult,
    })
}

/// Lowercase, dash-separated slug of `title`.
fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Breaking Bad"), "breaking-bad");
        assert_eq!(slugify("Marvel's Agents of S.H.I.E.L.D."), "marvel-s-agents-of-s-h-i-e-l-d");
        assert_eq!(slugify("  The  Office (US) "), "the-office-us");
        assert_eq!(slugify("!!!"), "");
    }
}
