pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Render a command's envelope in the requested format.
///
/// Only the JSON writer reports failures; a closed pipe surfaces as an error
/// instead of a panic from `println!`.
pub fn format_output(format: &OutputFormat, value: &Value) -> std::io::Result<()> {
    match format {
        OutputFormat::Json => json::print_json(value)?,
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
    Ok(())
}
