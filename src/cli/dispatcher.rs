// src/cli/dispatcher.rs

use anyhow::{Result, anyhow};

use crate::cli::{handlers, session::Session};

/// Defines a command, its aliases, and its handler.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>, &mut Session) -> Result<()>,
}

/// The single source of truth for all commands.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "get",
        aliases: &[],
        handler: handlers::get::handle,
    },
    CommandDefinition {
        name: "set",
        aliases: &[],
        handler: handlers::set::handle,
    },
    CommandDefinition {
        name: "unset",
        aliases: &["rm"],
        handler: handlers::unset::handle,
    },
    CommandDefinition {
        name: "show",
        aliases: &["dump"],
        handler: handlers::show::handle,
    },
    CommandDefinition {
        name: "profile",
        aliases: &["p"],
        handler: handlers::profile::handle,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Returns `true` if `name` is a known command or alias.
pub fn is_command(name: &str) -> bool {
    find_command(name).is_some()
}

/// Runs the named command against an open session.
pub fn dispatch(name: &str, args: Vec<String>, session: &mut Session) -> Result<()> {
    let command = find_command(name).ok_or_else(|| {
        let known: Vec<&str> = COMMAND_REGISTRY.iter().map(|c| c.name).collect();
        anyhow!(
            "Unknown command '{}'. Available commands: {}",
            name,
            known.join(", ")
        )
    })?;
    log::debug!("Dispatching '{}' with args {:?}", command.name, args);
    (command.handler)(args, session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_resolve_to_commands() {
        assert!(is_command("unset"));
        assert!(is_command("rm"));
        assert_eq!(find_command("p").map(|c| c.name), Some("profile"));
        assert!(!is_command("frobnicate"));
    }
}
