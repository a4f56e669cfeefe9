// src/cli/handlers/unset.rs

use anyhow::{Result, anyhow};
use clap::Parser;
use colored::*;

use crate::cli::session::Session;
use crate::core::path_resolver;
use crate::models::render_path;

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Removes a stored value. Inherited and default values become visible again."
)]
struct UnsetArgs {
    /// Path of the value to remove.
    path: String,

    /// Remove from the global table instead of the current profile.
    #[arg(long, short)]
    global: bool,
}

pub fn handle(args: Vec<String>, session: &mut Session) -> Result<()> {
    let unset_args = UnsetArgs::try_parse_from(&args)?;
    let root = session.target_view(unset_args.global)?;

    let keys = path_resolver::parse_path(&unset_args.path)?;
    let Some((last, prefix)) = keys.split_last() else {
        return Err(anyhow!("Nothing to remove at an empty path."));
    };

    let owner = if prefix.is_empty() {
        Some(root.clone())
    } else {
        root.lookup(&render_path(prefix))?
            .and_then(|resolved| resolved.as_view().cloned())
    };

    match owner.and_then(|view| view.remove(last.clone())) {
        Some(_) => println!("{} {}", "Removed".green(), unset_args.path.cyan()),
        None => println!(
            "{}",
            format!("No stored value at '{}'.", unset_args.path).yellow()
        ),
    }
    Ok(())
}
