//! Output formatting for CLI.

mod json;
mod text;

pub use json::{AuthOutput, JsonFormatter, ListOutput, ValidationOutput, WriteOutput};
pub use text::TextFormatter;

use traktarr_core::Fetched;

/// Label of a fetch result, shared by both formats.
pub fn status_label<T>(fetched: &Fetched<T>) -> &'static str {
    match fetched {
        Fetched::Found(_) => "found",
        Fetched::Empty => "empty",
        Fetched::Unavailable => "unavailable",
    }
}
