// src/core/lifecycle.rs

//! The `Settings` object drives a store through its lifecycle:
//!
//! `Uninitialized` → (`attach`) → `Available` → (`start`) → `Started`
//!
//! Defaults are registered while uninitialized. `attach` loads the persisted
//! root through a [`Storage`] backend; from then on the [`ProfileStore`] can be
//! used. `start` fires the queued on-available callbacks exactly once.

use crate::constants::{APPENDED_KEY, GLOBAL_KEY, PROFILE_KEYS_KEY, PROFILES_KEY};
use crate::core::defaults::{Defaults, DefaultsError};
use crate::core::profile_store::{ProfileListener, ProfileStore};
use crate::core::storage::{Storage, StorageError};
use crate::models::{Key, Table, Value};
use crate::state::StoreJournal;
use std::fmt;
use std::mem;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("The store is not available yet; attach a storage backend first.")]
    Unavailable,
    #[error("The store is already attached.")]
    AlreadyAvailable,
    #[error("Defaults can only be registered before the store is attached.")]
    DefaultsSealed,
    #[error(transparent)]
    Defaults(#[from] DefaultsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Where a [`Settings`] object is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Available,
    Started,
}

type AvailableCallback = Box<dyn FnOnce(&mut ProfileStore, &str)>;

struct Attached {
    store: ProfileStore,
    storage: Box<dyn Storage>,
    journal: StoreJournal,
}

enum Phase {
    Uninitialized { defaults: Defaults },
    Available(Attached),
    Started(Attached),
}

/// A named settings store and its lifecycle.
pub struct Settings {
    namespace: String,
    phase: Phase,
    on_available: Vec<AvailableCallback>,
    pending_listeners: Vec<ProfileListener>,
}

impl Settings {
    /// Creates an uninitialized store with no defaults.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self::with_defaults(namespace, Defaults::new())
    }

    /// Creates an uninitialized store around an existing defaults tree.
    pub fn with_defaults(namespace: impl Into<String>, defaults: Defaults) -> Self {
        Self {
            namespace: namespace.into(),
            phase: Phase::Uninitialized { defaults },
            on_available: Vec::new(),
            pending_listeners: Vec::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn state(&self) -> LifecycleState {
        match self.phase {
            Phase::Uninitialized { .. } => LifecycleState::Uninitialized,
            Phase::Available(_) => LifecycleState::Available,
            Phase::Started(_) => LifecycleState::Started,
        }
    }

    /// Registers a default value (see [`Defaults::register`]).
    ///
    /// # Errors
    /// [`LifecycleError::DefaultsSealed`] once the store is attached.
    pub fn register_default(&mut self, path: &str, value: impl Into<Value>) -> LifecycleResult<()> {
        match &mut self.phase {
            Phase::Uninitialized { defaults } => Ok(defaults.register(path, value)?),
            _ => Err(LifecycleError::DefaultsSealed),
        }
    }

    /// Queues `callback` to run once the store is started. If it already is,
    /// the callback runs right away. The callback receives the store and the
    /// store's namespace name.
    pub fn on_available(&mut self, callback: impl FnOnce(&mut ProfileStore, &str) + 'static) {
        match &mut self.phase {
            Phase::Started(attached) => callback(&mut attached.store, &self.namespace),
            _ => self.on_available.push(Box::new(callback)),
        }
    }

    /// Registers a profile change listener. Listeners registered before the
    /// store is attached are handed to it on attach.
    pub fn on_profile_changed(&mut self, listener: impl FnMut(&str, &str) + 'static) {
        match &mut self.phase {
            Phase::Available(attached) | Phase::Started(attached) => {
                attached.store.on_profile_changed(listener);
            }
            Phase::Uninitialized { .. } => self.pending_listeners.push(Box::new(listener)),
        }
    }

    /// Loads the persisted root from `storage` and makes the store available.
    ///
    /// A missing root starts empty. Missing sub-namespaces and the `Default`
    /// profile are created.
    pub fn attach(&mut self, storage: impl Storage + 'static) -> LifecycleResult<()> {
        if !matches!(self.phase, Phase::Uninitialized { .. }) {
            return Err(LifecycleError::AlreadyAvailable);
        }
        // 1. Load the persisted root; the journal remembers what was on disk.
        let (root, journal) = match storage.load()? {
            Some(root) => {
                warn_missing_namespaces(&self.namespace, &root);
                let journal = StoreJournal::synced(&root);
                (root, journal)
            }
            None => (Table::new(), StoreJournal::fresh()),
        };

        // 2. Take the defaults out of the phase. They are sealed from here on.
        let placeholder = Phase::Uninitialized {
            defaults: Defaults::new(),
        };
        let Phase::Uninitialized { defaults } = mem::replace(&mut self.phase, placeholder) else {
            return Err(LifecycleError::AlreadyAvailable);
        };

        // 3. Build the store and hand it the listeners queued before attach.
        let mut store = ProfileStore::new(root, defaults);
        store.add_listeners(mem::take(&mut self.pending_listeners));
        self.phase = Phase::Available(Attached {
            store,
            storage: Box::new(storage),
            journal,
        });
        log::info!("Store '{}' is available.", self.namespace);
        Ok(())
    }

    /// Marks the store started and fires the queued on-available callbacks in
    /// registration order. Starting twice is a no-op.
    pub fn start(&mut self) -> LifecycleResult<()> {
        let attached = match mem::replace(
            &mut self.phase,
            Phase::Uninitialized {
                defaults: Defaults::new(),
            },
        ) {
            Phase::Available(attached) => attached,
            Phase::Started(attached) => {
                self.phase = Phase::Started(attached);
                return Ok(());
            }
            uninitialized @ Phase::Uninitialized { .. } => {
                self.phase = uninitialized;
                return Err(LifecycleError::Unavailable);
            }
        };
        self.phase = Phase::Started(attached);

        let callbacks = mem::take(&mut self.on_available);
        log::debug!(
            "Store '{}' started; firing {} on-available callback(s).",
            self.namespace,
            callbacks.len()
        );
        if let Phase::Started(attached) = &mut self.phase {
            for callback in callbacks {
                callback(&mut attached.store, &self.namespace);
            }
        }
        Ok(())
    }

    /// The profile store, once attached.
    pub fn store(&self) -> LifecycleResult<&ProfileStore> {
        match &self.phase {
            Phase::Available(attached) | Phase::Started(attached) => Ok(&attached.store),
            Phase::Uninitialized { .. } => Err(LifecycleError::Unavailable),
        }
    }

    /// Mutable access to the profile store, once attached.
    pub fn store_mut(&mut self) -> LifecycleResult<&mut ProfileStore> {
        match &mut self.phase {
            Phase::Available(attached) | Phase::Started(attached) => Ok(&mut attached.store),
            Phase::Uninitialized { .. } => Err(LifecycleError::Unavailable),
        }
    }

    /// Returns `true` if the root changed since it was last loaded or saved.
    pub fn needs_saving(&self) -> bool {
        match &self.phase {
            Phase::Available(attached) | Phase::Started(attached) => {
                attached.journal.needs_saving(attached.store.root())
            }
            Phase::Uninitialized { .. } => false,
        }
    }

    /// Persists the root through the attached storage.
    pub fn save(&mut self) -> LifecycleResult<()> {
        match &mut self.phase {
            Phase::Available(attached) | Phase::Started(attached) => {
                let root = attached.store.root().clone();
                attached.storage.save(&root)?;
                attached.journal.commit(&root);
                Ok(())
            }
            Phase::Uninitialized { .. } => Err(LifecycleError::Unavailable),
        }
    }
}

fn warn_missing_namespaces(namespace: &str, root: &Table) {
    for key in [PROFILES_KEY, GLOBAL_KEY, PROFILE_KEYS_KEY, APPENDED_KEY] {
        if root.get_table(&Key::from(key)).is_none() {
            log::warn!(
                "Store '{}' was missing its '{}' table; recreating it.",
                namespace,
                key
            );
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("namespace", &self.namespace)
            .field("state", &self.state())
            .field("queued_callbacks", &self.on_available.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::MemoryStorage;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_store_is_unavailable_before_attach() {
        let mut settings = Settings::new("Addon");
        assert_eq!(settings.state(), LifecycleState::Uninitialized);
        assert!(matches!(settings.store(), Err(LifecycleError::Unavailable)));
        assert!(matches!(settings.start(), Err(LifecycleError::Unavailable)));
        assert!(matches!(settings.save(), Err(LifecycleError::Unavailable)));
        assert!(!settings.needs_saving());
    }

    #[test]
    fn test_lifecycle_transitions_and_callback_order() {
        let mut settings = Settings::new("Addon");
        let fired = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second"] {
            let sink = fired.clone();
            settings.on_available(move |store, namespace| {
                assert!(store.has_profile("Default"));
                sink.borrow_mut().push(format!("{}:{}", tag, namespace));
            });
        }

        settings.attach(MemoryStorage::new()).unwrap();
        assert_eq!(settings.state(), LifecycleState::Available);
        assert!(fired.borrow().is_empty());
        assert!(matches!(
            settings.attach(MemoryStorage::new()),
            Err(LifecycleError::AlreadyAvailable)
        ));

        settings.start().unwrap();
        settings.start().unwrap();
        assert_eq!(settings.state(), LifecycleState::Started);
        assert_eq!(
            *fired.borrow(),
            vec!["first:Addon".to_string(), "second:Addon".to_string()]
        );

        let sink = fired.clone();
        settings.on_available(move |_, _| sink.borrow_mut().push("late".to_string()));
        assert_eq!(fired.borrow().len(), 3);
    }

    #[test]
    fn test_defaults_are_sealed_on_attach() {
        let mut settings = Settings::new("Addon");
        settings.register_default("profile.scale", 1).unwrap();
        settings.attach(MemoryStorage::new()).unwrap();

        assert!(matches!(
            settings.register_default("profile.other", 2),
            Err(LifecycleError::DefaultsSealed)
        ));
        let view = settings.store().unwrap().current_view("me");
        assert_eq!(view.value("scale"), Some(Value::from(1)));
    }

    #[test]
    fn test_listeners_registered_early_follow_the_store() {
        let mut settings = Settings::new("Addon");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        settings.on_profile_changed(move |new, old| {
            sink.borrow_mut().push(format!("{}<-{}", new, old));
        });
        settings.attach(MemoryStorage::new()).unwrap();

        settings.store_mut().unwrap().set_profile("me", "Raid");
        assert_eq!(*seen.borrow(), vec!["Raid<-Default".to_string()]);
    }

    #[test]
    fn test_save_and_reload_through_storage() {
        let storage = MemoryStorage::new();
        let mut settings = Settings::new("Addon");
        settings.attach(storage.clone()).unwrap();
        assert!(settings.needs_saving());

        settings
            .store()
            .unwrap()
            .global_view()
            .set("volume", Value::from(7))
            .unwrap();
        settings.save().unwrap();
        assert!(!settings.needs_saving());

        let mut reloaded = Settings::new("Addon");
        reloaded.attach(storage).unwrap();
        assert!(!reloaded.needs_saving());
        assert_eq!(
            reloaded.store().unwrap().global_view().value("volume"),
            Some(Value::from(7))
        );
    }
}
