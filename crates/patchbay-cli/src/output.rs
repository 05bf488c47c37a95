//! Output formatting: table or JSON.
//!
//! Table rendering uses `tabled`; JSON serializes the original data via
//! serde.

use std::collections::BTreeMap;
use std::io::{self, Write};

use tabled::{settings::Style, Table, Tabled};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Render a list of rows in the chosen format.
pub fn render_list<T>(format: &OutputFormat, data: &[T]) -> Result<String, CliError>
where
    T: serde::Serialize + Tabled,
{
    match format {
        OutputFormat::Table => Ok(render_table(data)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
    }
}

/// Render a key/value detail map in the chosen format.
pub fn render_details(
    format: &OutputFormat,
    details: &BTreeMap<String, String>,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => {
            let rows: Vec<FieldRow> = details
                .iter()
                .map(|(field, value)| FieldRow {
                    field: field.clone(),
                    value: value.clone(),
                })
                .collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(details)?),
    }
}

/// Print rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled, serde::Serialize)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}
