//! Output formatting: table, JSON, plain.
//!
//! Renders data in the format selected by `--output`. Tables use `tabled`,
//! structured formats use serde, plain emits one record per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Section heading, bold when color is on.
pub fn heading(text: &str, color: bool) -> String {
    if color {
        text.bold().to_string()
    } else {
        text.to_owned()
    }
}

/// An on/off flag, green or dimmed when color is on.
pub fn flag(value: bool, on: &str, off: &str, color: bool) -> String {
    match (value, color) {
        (true, true) => on.green().to_string(),
        (false, true) => off.dimmed().to_string(),
        (true, false) => on.to_owned(),
        (false, false) => off.to_owned(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a serde-serializable value in the chosen format.
///
/// `table_fn` builds the human view, `plain_fn` the line-oriented one.
pub fn render<T>(
    format: OutputFormat,
    data: &T,
    table_fn: impl Fn(&T) -> String,
    plain_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    Ok(match format {
        OutputFormat::Table => table_fn(data),
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Plain => plain_fn(data),
    })
}

/// Build a rounded table from `Tabled` rows, or a dash when empty.
pub fn table<R: Tabled>(rows: &[R]) -> String {
    if rows.is_empty() {
        return "-".into();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}
