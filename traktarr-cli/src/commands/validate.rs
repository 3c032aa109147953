//! Validate command - check the configured API keys.

use anyhow::Result;
use traktarr_core::ServiceKind;

use super::Session;
use crate::output::{JsonFormatter, TextFormatter, ValidationOutput};
use crate::{Cli, ExitCode, OutputFormat};

/// Runs the validate command.
///
/// Services without configuration are reported and skipped.
pub async fn run(cli: &Cli) -> Result<ExitCode> {
    let session = Session::open(cli).await?;
    let mut results = Vec::new();

    for service in ServiceKind::all() {
        let check = match service {
            ServiceKind::Trakt => match session.trakt_public() {
                Ok(trakt) => Some(trakt.validate_api_key().await),
                Err(_) => None,
            },
            ServiceKind::Sonarr => match session.sonarr() {
                Ok(sonarr) => Some(sonarr.validate_api_key().await),
                Err(_) => None,
            },
        };

        results.push(ValidationOutput {
            service: service.display_name().to_string(),
            configured: check.is_some(),
            valid: check.unwrap_or(false),
        });
    }

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            for result in &results {
                println!(
                    "{}",
                    formatter.format_validation(&result.service, result.configured, result.valid)
                );
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&results)?);
        }
    }

    let failed = results.iter().any(|r| r.configured && !r.valid);
    Ok(if failed { ExitCode::Error } else { ExitCode::Success })
}
