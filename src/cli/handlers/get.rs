// src/cli/handlers/get.rs

use anyhow::{Context, Result, anyhow};
use clap::Parser;

use crate::cli::{handlers::commons, session::Session};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Prints the value at a path, resolving inherited and default values."
)]
struct GetArgs {
    /// Path of the value, e.g. `unitframes.player.width` or `bars[2]`.
    path: String,

    /// Read from the global table instead of the current profile.
    #[arg(long, short)]
    global: bool,
}

pub fn handle(args: Vec<String>, session: &mut Session) -> Result<()> {
    let get_args = GetArgs::try_parse_from(&args)?;
    let view = session.target_view(get_args.global)?;

    let value = view
        .lookup_value(&get_args.path)
        .with_context(|| format!("Cannot read '{}'", get_args.path))?
        .ok_or_else(|| anyhow!("No value at '{}' in '{}'.", get_args.path, view.namespace()))?;

    println!("{}", commons::format_value(&value)?);
    Ok(())
}
