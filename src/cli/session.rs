// src/cli/session.rs

use anyhow::{Context, Result};
use colored::*;
use std::env;
use std::fs;

use crate::cli::Cli;
use crate::core::defaults::Defaults;
use crate::core::lifecycle::Settings;
use crate::core::paths;
use crate::core::profile_store::ProfileStore;
use crate::core::storage::FileStorage;
use crate::core::view::View;

/// Environment variable naming the identity when `--identity` is not given.
pub const IDENTITY_ENV_VAR: &str = "TIERDB_IDENTITY";

/// An opened store plus the identity the command acts for.
#[derive(Debug)]
pub struct Session {
    settings: Settings,
    identity: String,
}

impl Session {
    /// Opens the store selected by the global options and starts it.
    pub fn open(cli: &Cli) -> Result<Self> {
        let defaults = match &cli.defaults {
            Some(raw) => load_defaults(raw)?,
            None => Defaults::new(),
        };
        let storage = match &cli.file {
            Some(raw) => FileStorage::from_user_path(raw)?,
            None => FileStorage::for_namespace(&cli.namespace)?,
        };
        log::debug!("Using store file '{}'.", storage.path().display());

        let mut settings = Settings::with_defaults(cli.namespace.clone(), defaults);
        settings.on_profile_changed(|new, old| {
            println!("  {} {} -> {}", "Profile:".blue(), old.dimmed(), new.cyan());
        });
        settings
            .attach(storage)
            .with_context(|| format!("Failed to open store '{}'", cli.namespace))?;
        settings.start()?;

        Ok(Self {
            settings,
            identity: resolve_identity(cli.identity.as_deref()),
        })
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn store(&self) -> Result<&ProfileStore> {
        Ok(self.settings.store()?)
    }

    pub fn store_mut(&mut self) -> Result<&mut ProfileStore> {
        Ok(self.settings.store_mut()?)
    }

    /// The root View a value command acts on.
    pub fn target_view(&self, global: bool) -> Result<View> {
        let store = self.store()?;
        Ok(if global {
            store.global_view()
        } else {
            store.current_view(&self.identity)
        })
    }

    /// Saves the store if anything changed.
    pub fn finish(mut self) -> Result<()> {
        if self.settings.needs_saving() {
            self.settings.save().context("Failed to save the store")?;
        } else {
            log::debug!("Store unchanged; nothing to save.");
        }
        Ok(())
    }
}

fn load_defaults(raw: &str) -> Result<Defaults> {
    let path = paths::expand_user_path(raw)?;
    let source = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read defaults file '{}'", path.display()))?;
    Defaults::from_toml_str(&source)
        .with_context(|| format!("Invalid defaults file '{}'", path.display()))
}

/// `--identity`, else `$TIERDB_IDENTITY`, else the login name, else `default`.
fn resolve_identity(explicit: Option<&str>) -> String {
    if let Some(identity) = explicit {
        return identity.to_string();
    }
    [IDENTITY_ENV_VAR, "USER", "USERNAME"]
        .iter()
        .find_map(|var| env::var(var).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "default".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_identity_wins() {
        assert_eq!(resolve_identity(Some("alice")), "alice");
    }

    #[test]
    fn test_identity_is_never_empty() {
        assert!(!resolve_identity(None).is_empty());
    }
}
