// src/cli/handlers/profile.rs

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use colored::*;

use crate::cli::{handlers::commons, session::Session};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, about = "Manages the named profiles of the store.")]
struct ProfileArgs {
    #[command(subcommand)]
    action: ProfileAction,
}

#[derive(Subcommand, Debug)]
enum ProfileAction {
    /// Prints the profile selected for the current identity.
    Current,
    /// Lists the profiles, marking the current one.
    #[command(alias = "ls")]
    List,
    /// Selects a profile, creating it if it does not exist.
    Use { name: String },
    /// Moves a profile to the bin. Identities using it fall back to `Default`.
    #[command(alias = "rm")]
    Remove {
        name: String,
        /// Do not ask for confirmation.
        #[arg(long, short)]
        yes: bool,
    },
    /// Renames a profile. A taken name gets a ` (2)` style suffix.
    Rename { old_name: String, new_name: String },
    /// Copies the values of one profile into another.
    Copy { source: String, target: String },
    /// Removes every stored value of a profile.
    Reset {
        name: String,
        /// Do not ask for confirmation.
        #[arg(long, short)]
        yes: bool,
    },
}

pub fn handle(args: Vec<String>, session: &mut Session) -> Result<()> {
    let profile_args = ProfileArgs::try_parse_from(&args)?;
    let identity = session.identity().to_string();

    match profile_args.action {
        ProfileAction::Current => {
            println!("{}", session.store()?.current_profile_name(&identity));
        }
        ProfileAction::List => {
            let store = session.store()?;
            let current = store.current_profile_name(&identity);
            for name in store.profiles() {
                if name == current {
                    println!("{} {}", "*".green().bold(), name.cyan());
                } else {
                    println!("  {}", name);
                }
            }
            for name in store.binned() {
                println!("  {} {}", name.dimmed(), "(binned)".dimmed());
            }
        }
        ProfileAction::Use { name } => {
            let store = session.store_mut()?;
            if store.current_profile_name(&identity) == name {
                println!("{}", format!("Already using '{}'.", name).yellow());
            } else {
                store.set_profile(&identity, &name);
            }
        }
        ProfileAction::Remove { name, yes } => {
            if !session.store()?.has_profile(&name) {
                return Err(anyhow!("Profile '{}' does not exist.", name));
            }
            println!(
                "{}",
                "A removed profile cannot be restored from the command line.".yellow()
            );
            let prompt = format!("Remove profile '{}'?", name);
            if !commons::confirm(&prompt, yes)? {
                println!("\nOperation cancelled.");
                return Ok(());
            }
            session.store_mut()?.remove_profile(&name);
            println!("{} profile '{}'.", "Removed".green(), name);
        }
        ProfileAction::Rename { old_name, new_name } => {
            let final_name = session
                .store_mut()?
                .rename_profile(&old_name, &new_name)
                .ok_or_else(|| anyhow!("Profile '{}' does not exist.", old_name))?;
            if final_name != new_name {
                println!(
                    "{}",
                    format!("'{}' is taken; using '{}'.", new_name, final_name).yellow()
                );
            }
            println!(
                "{} '{}' -> '{}'",
                "Renamed".green(),
                old_name,
                final_name.cyan()
            );
        }
        ProfileAction::Copy { source, target } => {
            if !session.store_mut()?.copy_profile(&source, &target) {
                return Err(anyhow!(
                    "Cannot copy '{}' into '{}': the source must exist and differ from the target.",
                    source,
                    target
                ));
            }
            println!("{} '{}' into '{}'.", "Copied".green(), source, target.cyan());
        }
        ProfileAction::Reset { name, yes } => {
            if !session.store()?.has_profile(&name) {
                return Err(anyhow!("Profile '{}' does not exist.", name));
            }
            let prompt = format!("Remove every stored value of '{}'?", name);
            if !commons::confirm(&prompt, yes)? {
                println!("\nOperation cancelled.");
                return Ok(());
            }
            session.store_mut()?.reset_profile(&name);
            println!("{} profile '{}'.", "Reset".green(), name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_actions_parse() {
        let args = ProfileArgs::try_parse_from(["rename", "A", "B"]).unwrap();
        assert!(matches!(
            args.action,
            ProfileAction::Rename { ref old_name, ref new_name } if old_name == "A" && new_name == "B"
        ));

        let args = ProfileArgs::try_parse_from(["rm", "Raid", "--yes"]).unwrap();
        assert!(matches!(args.action, ProfileAction::Remove { yes: true, .. }));

        assert!(ProfileArgs::try_parse_from(["bogus"]).is_err());
    }

    #[test]
    fn test_restore_is_not_offered() {
        // The bin dies with the process, so one invocation can never restore.
        assert!(ProfileArgs::try_parse_from(["restore", "Raid"]).is_err());
        assert!(ProfileArgs::try_parse_from(["remove", "Raid"]).is_ok());
    }
}
