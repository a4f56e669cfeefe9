// src/cli/handlers/show.rs

use anyhow::Result;
use clap::Parser;
use colored::*;

use crate::cli::{handlers::commons, session::Session};
use crate::models::Table;

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Prints the stored values of the current profile (or the global table)."
)]
struct ShowArgs {
    /// Print JSON instead of TOML.
    #[arg(long)]
    json: bool,

    /// Include inherited and default values.
    #[arg(long, short)]
    merged: bool,

    /// Show the global table instead of the current profile.
    #[arg(long, short)]
    global: bool,
}

pub fn handle(args: Vec<String>, session: &mut Session) -> Result<()> {
    let show_args = ShowArgs::try_parse_from(&args)?;
    let view = session.target_view(show_args.global)?;

    let table = if show_args.merged {
        view.to_merged_table()
    } else {
        view.to_own_table().unwrap_or_else(Table::new)
    };

    if show_args.json {
        println!("{}", commons::format_table_json(&table)?);
        return Ok(());
    }

    println!("{} {}", "#".dimmed(), view.namespace().to_string().dimmed());
    if table.is_empty() {
        println!("{}", "(empty)".dimmed());
    } else {
        print!("{}", commons::format_table(&table)?);
    }
    Ok(())
}
