// src/bin/tierdb.rs

use anyhow::{Result, anyhow};
use clap::{CommandFactory, Parser};
use colored::*;
use tierdb::cli::{Cli, dispatcher, session::Session};

/// The main entry point of the `tierdb` application.
/// It sets up logging, parses arguments, dispatches to the correct handler,
/// and performs centralized error handling.
fn main() {
    env_logger::init();

    if let Err(e) = run_cli(Cli::parse()) {
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    let Some(command) = cli.command.clone() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    // Reject unknown commands before touching the store file.
    if !dispatcher::is_command(&command) {
        return Err(anyhow!("Unknown command '{}'. Run with --help for usage.", command));
    }

    let mut session = Session::open(&cli)?;
    dispatcher::dispatch(&command, cli.args, &mut session)?;
    session.finish()
}
