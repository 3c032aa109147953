//! Auth command - authorize a Trakt account with the device flow.

use anyhow::Result;
use tracing::info;

use super::Session;
use crate::output::{AuthOutput, JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Runs the auth command.
pub async fn run(cli: &Cli) -> Result<ExitCode> {
    let session = Session::open(cli).await?;
    let trakt = session.trakt()?;
    let text = TextFormatter::new(!cli.no_color);

    info!(path = %session.path.display(), "Starting Trakt device authorization");

    // The prompt goes to stderr in JSON mode so stdout stays parseable.
    let outcome = trakt
        .oauth_authentication(|device| match cli.format {
            OutputFormat::Text => println!("{}", text.format_auth_prompt(device)),
            OutputFormat::Json => eprintln!("{}", text.format_auth_prompt(device)),
        })
        .await?;

    match cli.format {
        OutputFormat::Text => println!("{}", text.format_auth_outcome(&outcome)),
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&AuthOutput::from(&outcome))?);
        }
    }

    Ok(if outcome.is_success() {
        ExitCode::Success
    } else {
        ExitCode::Error
    })
}
