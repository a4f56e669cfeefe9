// src/cli/handlers/commons.rs

// Helpers shared by the value handlers.

use anyhow::{Context, Result};
use dialoguer::{Confirm, theme::ColorfulTheme};

use crate::models::{Table, Value};

/// Reads a command line value as a TOML literal (`42`, `1.5`, `true`,
/// `"quoted"`, `[1, 2]`, `{ a = 1 }`). Anything that is not a valid literal
/// is taken as plain text.
pub fn parse_literal(raw: &str) -> Value {
    let document = format!("value = {}", raw);
    match toml::from_str::<toml::Table>(&document) {
        Ok(table) => match table.get("value") {
            Some(parsed) => Value::from_toml(parsed),
            None => Value::from(raw),
        },
        Err(_) => {
            log::debug!("'{}' is not a TOML literal; storing it as text.", raw);
            Value::from(raw)
        }
    }
}

/// Formats a value for terminal output. Strings are printed without quotes,
/// tables as a TOML document.
pub fn format_value(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Table(table) => format_table(table),
        scalar => Ok(scalar.to_string()),
    }
}

/// Formats a table as a TOML document.
pub fn format_table(table: &Table) -> Result<String> {
    toml::to_string(&table.to_toml()).context("Failed to render table as TOML")
}

/// Formats a table as pretty-printed JSON.
pub fn format_table_json(table: &Table) -> Result<String> {
    serde_json::to_string_pretty(&table.to_json()).context("Failed to render table as JSON")
}

/// Asks a yes/no question, defaulting to no. `assume_yes` skips the prompt.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}
