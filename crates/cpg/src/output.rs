//! Output formatting: table, JSON, YAML.
//!
//! Records arrive as untyped JSON from the console. Tables go through a
//! per-command `Tabled` row type; structured formats serialize the records
//! as received.

use std::io::{self, Write};

use serde_json::Value;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;
use crate::error::CliError;

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of records in the chosen format.
pub fn render_list<R: Tabled>(
    format: OutputFormat,
    data: &[Value],
    to_row: impl Fn(&Value) -> R,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(Table::new(rows).with(Style::rounded()).to_string())
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
    }
}

/// Render a single record; tables become a two-column key/value listing.
pub fn render_single(format: OutputFormat, data: &Value) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(render_detail(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
    }
}

pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Field helpers ────────────────────────────────────────────────────

/// Display text for `record[key]`: strings unquoted, null/missing as `-`.
pub fn field(record: &Value, key: &str) -> String {
    display(&record[key])
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => "-".into(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Format-specific renderers ────────────────────────────────────────

#[derive(Tabled)]
struct DetailRow {
    #[tabled(rename = "Field")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn render_detail(data: &Value) -> String {
    let Value::Object(map) = data else {
        return display(data);
    };
    let rows: Vec<DetailRow> = map
        .iter()
        .map(|(key, value)| DetailRow {
            key: key.clone(),
            value: display(value),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.map_err(|e| CliError::Render(e.to_string()))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Render(e.to_string()))
}
