// src/cli/handlers/set.rs

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;

use crate::cli::{handlers::commons, session::Session};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Stores a value at a path.")]
struct SetArgs {
    /// Path of the value, e.g. `unitframes.player.width`.
    path: String,

    /// The value, read as a TOML literal when possible, else as text.
    #[arg(allow_hyphen_values = true)]
    value: String,

    /// Write to the global table instead of the current profile.
    #[arg(long, short)]
    global: bool,
}

pub fn handle(args: Vec<String>, session: &mut Session) -> Result<()> {
    let set_args = SetArgs::try_parse_from(&args)?;
    let view = session.target_view(set_args.global)?;
    let value = commons::parse_literal(&set_args.value);
    log::debug!("Parsed '{}' as {}.", set_args.value, value.type_name());

    view.set_path(&set_args.path, value.clone())
        .with_context(|| format!("Cannot write '{}'", set_args.path))?;

    println!(
        "{} {} = {}",
        view.namespace().to_string().dimmed(),
        set_args.path.cyan(),
        commons::format_value(&value)?
    );
    Ok(())
}
