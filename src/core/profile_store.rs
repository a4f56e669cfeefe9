// src/core/profile_store.rs

use crate::constants::{APPENDED_KEY, DEFAULT_PROFILE, GLOBAL_KEY, PROFILE_KEYS_KEY, PROFILES_KEY};
use crate::core::defaults::Defaults;
use crate::core::view::{Namespace, View, ViewResult};
use crate::models::{Key, Table, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Callback fired with `(new_name, old_name)` whenever an identity's current
/// profile changes.
pub type ProfileListener = Box<dyn FnMut(&str, &str)>;

/// Owns the named profile tables, the bin of removed profiles, the
/// identity → profile mapping and the append registry, all rooted in one
/// persisted [`Table`].
pub struct ProfileStore {
    root: Table,
    profiles: Table,
    global: Table,
    profile_keys: Table,
    appended: Table,
    /// Removed profiles. Lives only as long as the process.
    bin: BTreeMap<String, Table>,
    defaults: Defaults,
    listeners: Vec<ProfileListener>,
    views: RefCell<HashMap<Namespace, View>>,
}

impl ProfileStore {
    /// Wraps a persisted root, creating the sub-namespaces it lacks and the
    /// `Default` profile.
    pub fn new(root: Table, defaults: Defaults) -> Self {
        let profiles = ensure_namespace(&root, PROFILES_KEY);
        let global = ensure_namespace(&root, GLOBAL_KEY);
        let profile_keys = ensure_namespace(&root, PROFILE_KEYS_KEY);
        let appended = ensure_namespace(&root, APPENDED_KEY);

        let store = Self {
            root,
            profiles,
            global,
            profile_keys,
            appended,
            bin: BTreeMap::new(),
            defaults,
            listeners: Vec::new(),
            views: RefCell::new(HashMap::new()),
        };
        store.ensure_default();
        store
    }

    /// The persisted root, as handed to the storage backend.
    pub fn root(&self) -> &Table {
        &self.root
    }

    /// The registered defaults tree.
    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Registers a listener fired with `(new_name, old_name)` on every
    /// profile switch. Listeners run in registration order.
    pub fn on_profile_changed(&mut self, listener: impl FnMut(&str, &str) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub(crate) fn add_listeners(&mut self, listeners: Vec<ProfileListener>) {
        self.listeners.extend(listeners);
    }

    // --- PROFILE QUERIES ---

    /// The profile currently selected for `identity`, `Default` if none.
    pub fn current_profile_name(&self, identity: &str) -> String {
        self.profile_keys
            .get(&Key::from(identity))
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string())
    }

    /// Returns `true` if a profile with this name exists.
    pub fn has_profile(&self, name: &str) -> bool {
        self.profiles.contains_key(&Key::from(name))
    }

    /// Names of the existing profiles, sorted.
    pub fn profiles(&self) -> Vec<String> {
        self.profiles
            .keys()
            .into_iter()
            .filter_map(|k| k.as_name().map(str::to_string))
            .collect()
    }

    /// Names of the removed profiles that can still be restored, sorted.
    pub fn binned(&self) -> Vec<String> {
        self.bin.keys().cloned().collect()
    }

    // --- VIEWS ---

    /// The root View over the global table.
    pub fn global_view(&self) -> View {
        self.root_view(Namespace::Global, self.global.clone())
    }

    /// The root View over the named profile, creating the profile if needed.
    pub fn profile_view(&self, name: &str) -> View {
        let table = self.ensure_profile(name);
        self.root_view(Namespace::Profile(name.to_string()), table)
    }

    /// The root View over the profile currently selected for `identity`.
    pub fn current_view(&self, identity: &str) -> View {
        self.profile_view(&self.current_profile_name(identity))
    }

    /// Memoized root View. A cached View is replaced once the table it wraps
    /// is no longer the one stored for its namespace.
    fn root_view(&self, namespace: Namespace, table: Table) -> View {
        if let Some(view) = self.views.borrow().get(&namespace) {
            let still_current = view
                .to_own_table()
                .is_some_and(|own| own.ptr_eq(&table));
            if still_current {
                return view.clone();
            }
        }
        let defaults = self.defaults.for_namespace(&namespace).clone();
        let view = View::new_root(namespace.clone(), table, Some(defaults));
        self.views.borrow_mut().insert(namespace, view.clone());
        view
    }

    // --- PROFILE MUTATIONS ---

    /// Selects `name` as the current profile for `identity`, creating it empty
    /// if it does not exist. The previous profile's data is left untouched.
    pub fn set_profile(&mut self, identity: &str, name: &str) {
        self.ensure_profile(name);
        let old = self.current_profile_name(identity);
        self.profile_keys
            .insert(Key::from(identity), Value::from(name));

        if old != name {
            log::debug!(
                "Identity '{}' switched profile '{}' -> '{}'.",
                identity,
                old,
                name
            );
            self.notify(name, &old);
        }
    }

    /// Moves the profile into the bin. Every identity that had it selected
    /// falls back to `Default`. Removing a missing profile is a no-op.
    ///
    /// Listeners hear about identities whose selected name changes. Removing
    /// `Default` itself leaves every selection on `Default` (now empty), so it
    /// notifies no one, the same as [`ProfileStore::set_profile`] to the
    /// current name.
    ///
    /// # Returns
    /// `true` if a profile was removed.
    pub fn remove_profile(&mut self, name: &str) -> bool {
        // 1. Detach the table and park it in the bin.
        let Some(Value::Table(table)) = self.profiles.remove(&Key::from(name)) else {
            return false;
        };
        if self.bin.insert(name.to_string(), table).is_some() {
            log::warn!(
                "Bin already held a profile named '{}'; the older copy was dropped.",
                name
            );
        }
        self.views
            .borrow_mut()
            .remove(&Namespace::Profile(name.to_string()));
        log::info!("Profile '{}' moved to the bin.", name);

        // 2. `Default` must always exist, even right after removing it.
        self.ensure_default();
        if name == DEFAULT_PROFILE {
            return true;
        }

        // 3. Move the affected identities, one notification each.
        let reassigned = self.repoint_identities(name, DEFAULT_PROFILE);
        for _ in reassigned {
            self.notify(DEFAULT_PROFILE, name);
        }
        true
    }

    /// Moves a binned profile back, under a free name if its old name has
    /// been taken since.
    ///
    /// # Returns
    /// `true` if the profile was in the bin and has been restored.
    pub fn restore_profile(&mut self, name: &str) -> bool {
        let Some(table) = self.bin.remove(name) else {
            return false;
        };
        let final_name = self.free_name(name);
        self.profiles
            .insert(Key::from(final_name.as_str()), Value::Table(table));
        log::info!("Profile '{}' restored as '{}'.", name, final_name);
        true
    }

    /// Renames a profile, picking a free name derived from `new_name`.
    /// Identities that had the old profile selected follow the rename.
    ///
    /// # Returns
    /// The final name, or `None` if `old_name` does not exist.
    pub fn rename_profile(&mut self, old_name: &str, new_name: &str) -> Option<String> {
        if !self.has_profile(old_name) {
            return None;
        }
        if old_name == new_name {
            return Some(old_name.to_string());
        }

        // 1. Move the table under a free name and drop the stale root View.
        let final_name = self.free_name(new_name);
        let table = self.profiles.remove(&Key::from(old_name))?;
        self.profiles
            .insert(Key::from(final_name.as_str()), table);
        self.views
            .borrow_mut()
            .remove(&Namespace::Profile(old_name.to_string()));

        // 2. Carry the one-time seeds over so they are not replayed.
        let old_registry = Namespace::Profile(old_name.to_string()).registry_key();
        if let Some(seeded) = self.appended.remove(&Key::from(old_registry)) {
            let new_registry = Namespace::Profile(final_name.clone()).registry_key();
            self.appended.insert(Key::from(new_registry), seeded);
        }

        // 3. Identities follow the rename; only they are notified.
        log::info!("Profile '{}' renamed to '{}'.", old_name, final_name);
        self.ensure_default();
        let reassigned = self.repoint_identities(old_name, &final_name);
        for _ in reassigned {
            self.notify(&final_name, old_name);
        }
        Some(final_name)
    }

    /// Replaces the contents of `target` with a deep copy of `source`,
    /// creating `target` if needed.
    ///
    /// # Returns
    /// `false` if `source` does not exist or both names are the same.
    pub fn copy_profile(&mut self, source: &str, target: &str) -> bool {
        if source == target {
            return false;
        }
        let Some(source_table) = self.profiles.get_table(&Key::from(source)) else {
            return false;
        };
        let target_table = self.ensure_profile(target);
        target_table.clear();
        for (key, value) in source_table.entries() {
            target_table.insert(key, value.deep_clone());
        }
        log::info!("Profile '{}' copied into '{}'.", source, target);
        true
    }

    /// Empties a profile, keeping its name and selection. One-time seeds
    /// recorded for it are forgotten so they apply again.
    ///
    /// # Returns
    /// `false` if the profile does not exist.
    pub fn reset_profile(&mut self, name: &str) -> bool {
        let Some(table) = self.profiles.get_table(&Key::from(name)) else {
            return false;
        };
        table.clear();
        let registry = Namespace::Profile(name.to_string()).registry_key();
        self.appended.remove(&Key::from(registry));
        log::info!("Profile '{}' reset.", name);
        true
    }

    // --- APPEND REGISTRY ---

    /// Writes `value` at `path` below `view` unless that path has been seeded
    /// before in the View's namespace. The record survives restarts.
    ///
    /// # Returns
    /// `true` if the value was written, `false` if the path was already seeded.
    pub fn append_once(&self, view: &View, path: &str, value: Value) -> ViewResult<bool> {
        let registry_key = Key::from(view.namespace().registry_key());
        let seeded_path = match view.path() {
            Some(prefix) => format!("{}.{}", prefix, path),
            None => path.to_string(),
        };

        let registry = match self.appended.get_table(&registry_key) {
            Some(table) => table,
            None => {
                let table = Table::new();
                self.appended
                    .insert(registry_key, Value::Table(table.clone()));
                table
            }
        };
        let entry = Key::from(seeded_path.as_str());
        if registry.contains_key(&entry) {
            log::debug!("'{}' already seeded in '{}'.", seeded_path, view.namespace());
            return Ok(false);
        }

        view.set_path(path, value)?;
        registry.insert(entry, Value::Bool(true));
        Ok(true)
    }

    // --- INTERNALS ---

    fn ensure_default(&self) {
        self.ensure_profile(DEFAULT_PROFILE);
    }

    fn ensure_profile(&self, name: &str) -> Table {
        let key = Key::from(name);
        match self.profiles.get_table(&key) {
            Some(table) => table,
            None => {
                log::debug!("Creating profile '{}'.", name);
                let table = Table::new();
                self.profiles.insert(key, Value::Table(table.clone()));
                table
            }
        }
    }

    /// `name`, or `name (2)`, `name (3)`, ... whichever is not taken.
    fn free_name(&self, name: &str) -> String {
        if !self.has_profile(name) {
            return name.to_string();
        }
        (2..)
            .map(|n| format!("{} ({})", name, n))
            .find(|candidate| !self.has_profile(candidate))
            .unwrap_or_else(|| name.to_string())
    }

    /// Points every identity selecting `from` at `to`, returning those identities.
    fn repoint_identities(&self, from: &str, to: &str) -> Vec<String> {
        let mut moved = Vec::new();
        for (identity, selected) in self.profile_keys.entries() {
            if selected.as_str() == Some(from) {
                self.profile_keys.insert(identity.clone(), Value::from(to));
                moved.push(identity.to_string());
            }
        }
        moved
    }

    fn notify(&mut self, new_name: &str, old_name: &str) {
        for listener in self.listeners.iter_mut() {
            listener(new_name, old_name);
        }
    }
}

/// Returns the table stored under `key` in `root`, replacing anything else.
fn ensure_namespace(root: &Table, key: &str) -> Table {
    let key = Key::from(key);
    match root.get(&key) {
        Some(Value::Table(table)) => table,
        other => {
            if let Some(value) = other {
                log::warn!(
                    "Root entry '{}' held a {} instead of a table; replacing it.",
                    key,
                    value.type_name()
                );
            }
            let table = Table::new();
            root.insert(key, Value::Table(table.clone()));
            table
        }
    }
}

impl fmt::Debug for ProfileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileStore")
            .field("profiles", &self.profiles())
            .field("bin", &self.binned())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
