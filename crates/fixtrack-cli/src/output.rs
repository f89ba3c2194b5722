//! Shared output layer for human/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: labeled text for humans, stable JSON for scripts and
//! agents. Errors render to stderr in the same mode, carrying the core's
//! stable `E####` code and remediation hint when one exists.

use fixtrack_core::TicketError;
use serde::Serialize;
use std::io::{self, Write};

/// The two output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable labeled text.
    Human,
    /// Machine-readable JSON (one object per result, or a JSON array).
    Json,
}

impl OutputMode {
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (e.g. "E2003").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Create a simple error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }

    /// Create an error with a suggestion and error code.
    pub fn with_details(
        message: impl Into<String>,
        suggestion: impl Into<String>,
        error_code: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            suggestion: Some(suggestion.into()),
            error_code: Some(error_code.into()),
        }
    }
}

impl From<&TicketError> for CliError {
    fn from(error: &TicketError) -> Self {
        let code = error.code();
        Self {
            message: error.to_string(),
            suggestion: code.hint().map(str::to_string),
            error_code: Some(code.code().to_string()),
        }
    }
}

/// Render a serializable value to stdout in the requested format.
///
/// In JSON mode, the value is serialized with `serde_json`. In human mode,
/// the provided `human_fn` closure is called to produce text output.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Human => {
            human_fn(value, &mut out)?;
        }
    }
    Ok(())
}

/// Render a success message (human) or `{"ok": true, "message": ...}` (JSON).
pub fn render_success(mode: OutputMode, message: &str) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({ "ok": true, "message": message });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Human => {
            writeln!(out, "{message}")?;
        }
    }
    Ok(())
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({ "error": error });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Human => {
            writeln!(out, "error: {}", error.message)?;
            if let Some(suggestion) = &error.suggestion {
                writeln!(out, "  hint: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// Render a core error and convert it into a process failure.
pub fn fail_with(mode: OutputMode, error: &TicketError) -> anyhow::Error {
    let cli_error = CliError::from(error);
    if let Err(render_failure) = render_error(mode, &cli_error) {
        return render_failure;
    }
    anyhow::anyhow!("{}", cli_error.message)
}

/// Render a left-aligned key/value line in human output.
pub fn kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<14} {}", format!("{key}:"), value.as_ref())
}
