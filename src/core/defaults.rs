// src/core/defaults.rs

use crate::constants::{DEFAULTS_GLOBAL, DEFAULTS_PROFILE};
use crate::core::defaults_merge;
use crate::core::path_resolver::{self, PathError};
use crate::core::view::Namespace;
use crate::models::{Key, Table, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DefaultsError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(
        "Default path '{path}' must start with '{global}' or '{profile}'.",
        global = DEFAULTS_GLOBAL,
        profile = DEFAULTS_PROFILE
    )]
    UnknownNamespace { path: String },
    #[error("Default path '{path}' names a whole namespace; only a table can be registered there.")]
    NamespaceRoot { path: String },
    #[error("Error parsing defaults TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
}

pub type DefaultsResult<T> = Result<T, DefaultsError>;

/// The read-only fallback tree, one table per namespace kind.
///
/// Registered values are consulted after stored values and inherited values.
/// The tree is never persisted. Registration happens before the store is
/// attached; afterwards the tree is only read.
#[derive(Debug, Default)]
pub struct Defaults {
    global: Table,
    profile: Table,
}

impl Defaults {
    /// Creates an empty defaults tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value` under a path whose first segment picks the
    /// namespace, e.g. `profile.unitframes.player.width`.
    ///
    /// Registering a table at the namespace root (`profile`) merges it into
    /// what is already registered.
    pub fn register(&mut self, path: &str, value: impl Into<Value>) -> DefaultsResult<()> {
        let value = value.into();
        let keys = path_resolver::parse_path(path)?;
        let Some((first, rest)) = keys.split_first() else {
            return Err(DefaultsError::UnknownNamespace {
                path: path.to_string(),
            });
        };
        let target = self
            .table_for_key(first)
            .ok_or_else(|| DefaultsError::UnknownNamespace {
                path: path.to_string(),
            })?
            .clone();

        if rest.is_empty() {
            return match value {
                Value::Table(table) => {
                    defaults_merge::merge(&target, &table);
                    Ok(())
                }
                _ => Err(DefaultsError::NamespaceRoot {
                    path: path.to_string(),
                }),
            };
        }

        log::debug!("Registering default at '{}'.", path);
        path_resolver::set_keys(&target, rest, value.deep_clone())?;
        Ok(())
    }

    /// Builds a defaults tree from a TOML document with optional top-level
    /// `[global]` and `[profile]` tables. Other top-level keys are rejected.
    pub fn from_toml_str(source: &str) -> DefaultsResult<Self> {
        let document: toml::Table = toml::from_str(source)?;
        let mut defaults = Self::new();
        for (name, value) in &document {
            defaults.register(name, Value::from_toml(value))?;
        }
        Ok(defaults)
    }

    /// Defaults for the global table.
    pub fn global(&self) -> &Table {
        &self.global
    }

    /// Defaults shared by every profile table.
    pub fn profile(&self) -> &Table {
        &self.profile
    }

    /// The defaults subtree matching a View namespace.
    pub fn for_namespace(&self, namespace: &Namespace) -> &Table {
        match namespace {
            Namespace::Global => &self.global,
            Namespace::Profile(_) => &self.profile,
        }
    }

    fn table_for_key(&self, key: &Key) -> Option<&Table> {
        match key.as_name() {
            Some(DEFAULTS_GLOBAL) => Some(&self.global),
            Some(DEFAULTS_PROFILE) => Some(&self.profile),
            _ => None,
        }
    }
}
