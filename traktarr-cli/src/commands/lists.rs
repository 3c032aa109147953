//! Shows and movies commands - fetch Trakt lists.

use anyhow::Result;
use clap::Args;
use tracing::info;
use traktarr_core::Fetched;
use traktarr_providers::MediaKind;
use traktarr_providers::trakt::ListKind;

use super::Session;
use crate::output::{JsonFormatter, ListOutput, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the shows and movies commands.
#[derive(Args)]
pub struct ListArgs {
    /// List: anticipated, trending, popular, boxoffice, watchlist or a list id.
    pub list: String,

    /// Trakt user whose credential is used (defaults to the first stored user).
    #[arg(long, short)]
    pub user: Option<String>,
}

/// Runs the shows or movies command.
pub async fn run(media: MediaKind, args: &ListArgs, cli: &Cli) -> Result<ExitCode> {
    let session = Session::open(cli).await?;
    let trakt = session.trakt()?;

    info!(list = %args.list, ?media, "Fetching Trakt list");
    let fetched = trakt.list(media, &args.list, args.user.as_deref()).await?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!(
                "{}",
                formatter.format_list(&heading(media, &args.list), wrapper(media), &fetched)
            );
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!(
                "{}",
                formatter.format(&ListOutput::new("trakt", &args.list, &fetched))?
            );
        }
    }

    Ok(exit_code(&fetched))
}

/// Exit code for a read: found is success, anything else is no result.
pub fn exit_code<T>(fetched: &Fetched<T>) -> ExitCode {
    if fetched.is_found() {
        ExitCode::Success
    } else {
        ExitCode::NoResult
    }
}

fn wrapper(media: MediaKind) -> &'static str {
    match media {
        MediaKind::Shows => "show",
        MediaKind::Movies => "movie",
    }
}

fn heading(media: MediaKind, list: &str) -> String {
    let noun = match media {
        MediaKind::Shows => "shows",
        MediaKind::Movies => "movies",
    };
    match ListKind::parse(list) {
        ListKind::Chart("boxoffice") => "Box office movies".to_string(),
        ListKind::Chart(chart) => format!("{}{} {noun}", chart[..1].to_uppercase(), &chart[1..]),
        ListKind::Watchlist => format!("Watchlist {noun}"),
        ListKind::User(id) => format!("List {id} {noun}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading() {
        assert_eq!(heading(MediaKind::Shows, "trending"), "Trending shows");
        assert_eq!(heading(MediaKind::Movies, "boxoffice"), "Box office movies");
        assert_eq!(heading(MediaKind::Movies, "watchlist"), "Watchlist movies");
        assert_eq!(heading(MediaKind::Shows, "favourites"), "List favourites shows");
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(exit_code(&Fetched::Found(vec![1])), ExitCode::Success);
        assert_eq!(exit_code::<Vec<u8>>(&Fetched::Empty), ExitCode::NoResult);
        assert_eq!(exit_code::<Vec<u8>>(&Fetched::Unavailable), ExitCode::NoResult);
    }
}
