//! Output formatting utilities

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use octofhir_cohort_diagnostics::CohortError;
use serde_json::Value;
use std::fs;
use std::io::IsTerminal;
use std::path::Path;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON
    Json,
    /// Indented JSON
    #[default]
    Pretty,
    /// Human-readable tables
    Table,
}

/// Color mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// Set up color output based on user preference
pub fn setup_colors(mode: ColorMode) {
    let enabled = match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    };
    colored::control::set_override(enabled);
}

/// Format an error for display
///
/// Cohort errors anywhere in the chain are rendered as diagnostics with
/// their codes, filter nodes and help.
pub fn format_error(error: &anyhow::Error) -> String {
    let mut out = format!("{} {}", "Error:".red().bold(), error);
    if let Some(cohort_error) = error.chain().find_map(|e| e.downcast_ref::<CohortError>()) {
        for diagnostic in cohort_error.to_diagnostics() {
            out.push('\n');
            out.push_str(&diagnostic.render_colored());
        }
    }
    out
}

/// Format a warning for display
pub fn format_warning(warning: &str) -> String {
    format!("{} {}", "Warning:".yellow().bold(), warning)
}

/// Format a success message for display
pub fn format_success(message: &str) -> String {
    format!("{} {}", "Success:".green().bold(), message)
}

/// Write output to a file or stdout
pub fn write_output(content: &str, output_file: Option<&Path>) -> Result<()> {
    if let Some(path) = output_file {
        fs::write(path, content).with_context(|| format!("Failed to write output file: {}", path.display()))?;
        eprintln!("{}", format_success(&format!("Output written to {}", path.display())));
    } else {
        println!("{}", content);
    }
    Ok(())
}

/// Format JSON value for output
pub fn format_json(value: &Value, pretty: bool) -> Result<String> {
    if pretty {
        serde_json::to_string_pretty(value).context("Failed to serialize JSON")
    } else {
        serde_json::to_string(value).context("Failed to serialize JSON")
    }
}

/// Render a value in the chosen format
///
/// `table` renders the command-specific tables; it is only called for the
/// table format.
pub fn render(value: &Value, format: OutputFormat, table: impl FnOnce() -> String) -> Result<String> {
    match format {
        OutputFormat::Json => format_json(value, false),
        OutputFormat::Pretty => format_json(value, true),
        OutputFormat::Table => Ok(table()),
    }
}

/// Render and write a value
pub fn print_output(
    value: &Value,
    format: OutputFormat,
    output_file: Option<&Path>,
    table: impl FnOnce() -> String,
) -> Result<()> {
    let content = render(value, format, table)?;
    write_output(&content, output_file)
}

#[derive(Tabled)]
struct KeyValue {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Two-column table of an object's scalar fields
pub fn key_value_table(value: &Value) -> String {
    let rows: Vec<KeyValue> = match value {
        Value::Object(obj) => obj
            .iter()
            .map(|(k, v)| KeyValue {
                key: k.clone(),
                value: format_value(v),
            })
            .collect(),
        other => vec![KeyValue {
            key: "value".to_string(),
            value: format_value(other),
        }],
    };
    styled(Table::new(rows))
}

/// Apply the shared table style
pub fn styled(mut table: Table) -> String {
    table.with(Style::modern()).to_string()
}

/// Format a simple value for display
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) if arr.len() <= 5 => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}
