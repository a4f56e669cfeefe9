// src/cli/mod.rs

use clap::Parser;

pub mod dispatcher;
pub mod handlers;
pub mod session;

/// tierdb: a hierarchical settings store with profiles and defaults.
///
/// Values are addressed by path (`unitframes.player.width`, `bars[2].enabled`)
/// inside either the current profile of an identity or the shared global table.
///
/// Commands:
///   get <path>              Resolve a value (stored, inherited or default).
///   set <path> <value>      Store a value. The value is read as a TOML literal
///                           (`42`, `true`, `"text"`, `{ a = 1 }`), else as text.
///   unset <path>            Remove a stored override.
///   show [--json] [--merged]
///                           Print the stored (or merged) table.
///   profile <action>        current | list | use | remove | rename | copy | reset
///
/// `get`, `set`, `unset` and `show` accept `--global` to target the global table.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Store file to use instead of `<config dir>/tierdb/<namespace>.bin`.
    #[arg(long)]
    pub file: Option<String>,

    /// Name of the store.
    #[arg(long, default_value = "default")]
    pub namespace: String,

    /// Identity whose current profile is used. Defaults to `$TIERDB_IDENTITY`,
    /// then the login name.
    #[arg(long)]
    pub identity: Option<String>,

    /// TOML file with `[global]` and `[profile]` default values.
    #[arg(long)]
    pub defaults: Option<String>,

    /// The command to run.
    pub command: Option<String>,

    /// Arguments for the command.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}
