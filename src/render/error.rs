//! Error rendering.
//!
//! Text mode prints a short `Error [CODE]: message` block with an optional
//! hint; JSON mode prints a structured object so scripts can branch on the
//! code.

use colored::Colorize;
use serde::Serialize;

use crate::cli::args::OutputFormat;
use crate::error::StatusError;

/// Render an error for stderr.
#[must_use]
pub fn render_error(error: &StatusError, format: OutputFormat, color: bool, pretty: bool) -> String {
    match format {
        OutputFormat::Json => render_error_json(error, pretty),
        OutputFormat::Text => render_simple(error, color),
    }
}

fn render_simple(error: &StatusError, color: bool) -> String {
    let label = if color {
        "Error".red().bold().to_string()
    } else {
        "Error".to_string()
    };

    let mut lines = vec![format!("{label} [{}]: {error}", error.error_code())];
    if let Some(hint) = error.hint() {
        lines.push(format!("Hint: {hint}"));
    }
    lines.join("\n")
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorJson {
    error_code: String,
    category: String,
    message: String,
    exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

impl ErrorJson {
    fn from_error(error: &StatusError) -> Self {
        Self {
            error_code: error.error_code().to_string(),
            category: error.category().to_string(),
            message: error.to_string(),
            exit_code: error.exit_code().into(),
            hint: error.hint(),
        }
    }
}

/// Render error as structured JSON.
#[must_use]
pub fn render_error_json(error: &StatusError, pretty: bool) -> String {
    let body = ErrorJson::from_error(error);
    let json = if pretty {
        serde_json::to_string_pretty(&body)
    } else {
        serde_json::to_string(&body)
    };
    json.unwrap_or_else(|_| render_simple(error, false))
}
