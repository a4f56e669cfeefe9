// src/core/view.rs

//! # Views
//!
//! A [`View`] is the resolving proxy over one node of a stored tree. Reads go
//! through three tiers, highest priority first:
//!
//! 1. the value stored under this View's own node,
//! 2. the value resolved by the parent binding (recursively),
//! 3. the matching value in the defaults tree.
//!
//! Nested containers are always handed out as child Views, memoized per key,
//! so state set on a child (its parent binding, its redirect) sticks.
//!
//! A child produced by tier 2 or 3 has no stored node of its own yet. It is
//! `Redirected`: it reads through the inherited data but every write it
//! receives is routed, by path, into this View's own namespace root. The first
//! such write materializes the local node and the View turns `Direct`. Parent
//! data is never written through a child.

use crate::constants::MAX_PARENT_DEPTH;
use crate::core::defaults_merge;
use crate::core::path_resolver::{self, PathError};
use crate::models::{Key, Table, Value, render_path};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("Cannot bind parent of '{path}': the binding would make the view its own ancestor.")]
    CircularParent { path: String },
}

pub type ViewResult<T> = Result<T, ViewError>;

/// Which top-level namespace a View belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// The shared `global` table.
    Global,
    /// The table of the named profile.
    Profile(String),
}

impl Namespace {
    /// Key used to namespace the append registry (`global` or `profile.<name>`).
    pub fn registry_key(&self) -> String {
        match self {
            Namespace::Global => "global".to_string(),
            Namespace::Profile(name) => format!("profile.{}", name),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.registry_key())
    }
}

/// The outcome of a successful read.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// A scalar (never [`Value::Table`]).
    Value(Value),
    /// A nested container, wrapped in a child View.
    View(View),
}

impl Resolved {
    /// The scalar, if this is one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Resolved::Value(v) => Some(v),
            Resolved::View(_) => None,
        }
    }

    /// The child View, if this is one.
    pub fn as_view(&self) -> Option<&View> {
        match self {
            Resolved::View(v) => Some(v),
            Resolved::Value(_) => None,
        }
    }

    /// Flattens into a [`Value`]; Views become their merged snapshot.
    pub fn into_value(self) -> Value {
        match self {
            Resolved::Value(v) => v,
            Resolved::View(v) => Value::Table(v.to_merged_table()),
        }
    }
}

/// Where a View's data lives.
enum Resolution {
    /// The View wraps an existing stored node.
    Direct { node: Table },
    /// No local node exists yet; writes go to `path` under `target`.
    Redirected { target: Table, path: Vec<Key> },
}

enum ParentBinding {
    /// Follow the owner's parent down to the same key. Roots inherit nothing.
    Inherit,
    /// Explicitly bound. The binding does not keep the parent alive.
    Bound(Weak<ViewInner>),
    /// Explicitly cleared.
    Detached,
}

struct Owner {
    view: Weak<ViewInner>,
    key: Key,
}

struct ViewInner {
    namespace: Namespace,
    /// Root of this View's namespace, target of every redirected write.
    root: Table,
    keys: Vec<Key>,
    owner: Option<Owner>,
    defaults: Option<Table>,
    state: RefCell<Resolution>,
    parent: RefCell<ParentBinding>,
    children: RefCell<HashMap<Key, View>>,
}

/// A cheap, clonable handle to a resolving proxy. Clones are the same View.
#[derive(Clone)]
pub struct View(Rc<ViewInner>);

impl View {
    /// Creates the root View of a namespace over `root`, falling back to
    /// `defaults` for missing values.
    pub fn new_root(namespace: Namespace, root: Table, defaults: Option<Table>) -> Self {
        Self(Rc::new(ViewInner {
            namespace,
            root: root.clone(),
            keys: Vec::new(),
            owner: None,
            defaults,
            state: RefCell::new(Resolution::Direct { node: root }),
            parent: RefCell::new(ParentBinding::Inherit),
            children: RefCell::new(HashMap::new()),
        }))
    }

    /// The namespace this View belongs to.
    pub fn namespace(&self) -> &Namespace {
        &self.0.namespace
    }

    /// The path from the namespace root, or `None` for a root View.
    pub fn path(&self) -> Option<String> {
        if self.0.keys.is_empty() {
            None
        } else {
            Some(render_path(&self.0.keys))
        }
    }

    /// The keys from the namespace root to this View.
    pub fn keys(&self) -> &[Key] {
        &self.0.keys
    }

    /// Returns `true` if both handles are the same View instance.
    pub fn same_view(&self, other: &View) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Returns `true` while the View has no stored node of its own.
    pub fn is_redirected(&self) -> bool {
        self.sync();
        matches!(&*self.0.state.borrow(), Resolution::Redirected { .. })
    }

    // --- READS ---

    /// Resolves `key` through the stored → parent → defaults tiers.
    ///
    /// Returns `None` when no tier has a value.
    pub fn get(&self, key: impl Into<Key>) -> Option<Resolved> {
        self.resolve_at(key.into(), 0)
    }

    /// [`View::get`] at a given inheritance depth. Past [`MAX_PARENT_DEPTH`]
    /// the parent tier is skipped, so a looping chain cannot recurse forever.
    fn resolve_at(&self, key: Key, depth: usize) -> Option<Resolved> {
        self.sync();

        match self.stored_value(&key) {
            Some(Value::Table(table)) => return Some(Resolved::View(self.direct_child(key, table))),
            Some(scalar) => {
                self.forget_child(&key);
                return Some(Resolved::Value(scalar));
            }
            None => {}
        }

        let inherited = self
            .parent_at(depth + 1)
            .and_then(|p| p.resolve_at(key.clone(), depth + 1));
        if let Some(inherited) = inherited {
            return Some(match inherited {
                Resolved::Value(v) => Resolved::Value(v),
                Resolved::View(_) => Resolved::View(self.redirected_child(key)),
            });
        }

        match self.0.defaults.as_ref().and_then(|d| d.get(&key)) {
            Some(Value::Table(_)) => Some(Resolved::View(self.redirected_child(key))),
            Some(scalar) => Some(Resolved::Value(scalar)),
            None => {
                self.forget_child(&key);
                None
            }
        }
    }

    /// Shorthand for [`View::get`] when a nested container is expected.
    pub fn view(&self, key: impl Into<Key>) -> Option<View> {
        match self.get(key) {
            Some(Resolved::View(v)) => Some(v),
            _ => None,
        }
    }

    /// Shorthand for [`View::get`] when a scalar is expected.
    pub fn value(&self, key: impl Into<Key>) -> Option<Value> {
        match self.get(key) {
            Some(Resolved::Value(v)) => Some(v),
            _ => None,
        }
    }

    /// Resolves a whole path, tier by tier at every level, without writing.
    ///
    /// Indexing through a scalar is a [`PathError::TypeMismatch`].
    pub fn lookup(&self, path: &str) -> ViewResult<Option<Resolved>> {
        let keys = path_resolver::parse_path(path)?;
        let mut current = Resolved::View(self.clone());
        for (depth, key) in keys.iter().enumerate() {
            current = match current {
                Resolved::View(view) => match view.get(key.clone()) {
                    Some(next) => next,
                    None => return Ok(None),
                },
                Resolved::Value(scalar) => {
                    let walked = keys.get(..depth).unwrap_or(&keys);
                    return Err(PathError::TypeMismatch {
                        path: render_path(walked),
                        found: scalar.type_name(),
                    }
                    .into());
                }
            };
        }
        Ok(Some(current))
    }

    /// Like [`View::lookup`], flattening a nested result into its merged snapshot.
    pub fn lookup_value(&self, path: &str) -> ViewResult<Option<Value>> {
        Ok(self.lookup(path)?.map(Resolved::into_value))
    }

    // --- WRITES ---

    /// Stores `value` at `key`. Parent and defaults are never consulted.
    ///
    /// On a redirected View the write lands at the redirect path under the
    /// namespace root, creating the missing tables on the way.
    pub fn set(&self, key: impl Into<Key>, value: Value) -> ViewResult<()> {
        let key = key.into();
        self.sync();
        {
            let state = self.0.state.borrow();
            match &*state {
                Resolution::Direct { node } => {
                    node.insert(key, value);
                }
                Resolution::Redirected { target, path } => {
                    let mut full = path.clone();
                    full.push(key);
                    log::debug!(
                        "Redirected write to '{}' in '{}'.",
                        render_path(&full),
                        self.0.namespace
                    );
                    path_resolver::set_keys(target, &full, value)?;
                }
            }
        }
        self.sync();
        Ok(())
    }

    /// Writes `value` at a path relative to this View, creating the missing
    /// intermediate tables in this View's own data.
    pub fn set_path(&self, path: &str, value: Value) -> ViewResult<()> {
        let keys = path_resolver::parse_path(path)?;
        self.sync();
        {
            let state = self.0.state.borrow();
            match &*state {
                Resolution::Direct { node } => path_resolver::set_keys(node, &keys, value)?,
                Resolution::Redirected { target, path } => {
                    let mut full = path.clone();
                    full.extend(keys);
                    path_resolver::set_keys(target, &full, value)?;
                }
            }
        }
        self.sync();
        Ok(())
    }

    /// Removes the stored override at `key`, returning it. Inherited and
    /// default values are untouched and become visible again.
    pub fn remove(&self, key: impl Into<Key>) -> Option<Value> {
        let key = key.into();
        self.sync();
        self.forget_child(&key);
        match &*self.0.state.borrow() {
            Resolution::Direct { node } => node.remove(&key),
            Resolution::Redirected { .. } => None,
        }
    }

    // --- INHERITANCE ---

    /// Rebinds (`Some`) or clears (`None`) the inheritance parent.
    ///
    /// Nothing is re-resolved now; later reads pick the binding up. A binding
    /// that would make this View, or any View below it, its own ancestor is
    /// rejected and the previous binding is kept.
    pub fn set_parent(&self, parent: Option<&View>) -> ViewResult<()> {
        let Some(candidate) = parent else {
            *self.0.parent.borrow_mut() = ParentBinding::Detached;
            return Ok(());
        };

        // 1. The candidate's effective chain must not pass through this subtree.
        if self.reaches(candidate) {
            return Err(ViewError::CircularParent {
                path: self.display_path(),
            });
        }

        // 2. Install the binding, then check that no cached descendant, whose
        //    inherited parent just changed, now loops back to itself.
        let previous = mem::replace(
            &mut *self.0.parent.borrow_mut(),
            ParentBinding::Bound(Rc::downgrade(&candidate.0)),
        );
        if self.subtree_loops() {
            *self.0.parent.borrow_mut() = previous;
            return Err(ViewError::CircularParent {
                path: self.display_path(),
            });
        }
        Ok(())
    }

    /// The View currently used as the inheritance parent, if any.
    ///
    /// Children that were never bound explicitly inherit the parent of their
    /// owner, descended to the same key.
    pub fn parent(&self) -> Option<View> {
        self.parent_at(0)
    }

    fn parent_at(&self, depth: usize) -> Option<View> {
        if depth > MAX_PARENT_DEPTH {
            log::warn!(
                "Parent chain of '{}' exceeds {} links; ignoring the rest.",
                self.display_path(),
                MAX_PARENT_DEPTH
            );
            return None;
        }
        let inherited_from = {
            let binding = self.0.parent.borrow();
            match &*binding {
                ParentBinding::Detached => return None,
                ParentBinding::Bound(weak) => {
                    let upgraded = weak.upgrade().map(View);
                    if upgraded.is_none() {
                        log::warn!(
                            "Parent of '{}' was dropped; ignoring the binding.",
                            self.display_path()
                        );
                    }
                    return upgraded;
                }
                ParentBinding::Inherit => self.owner(),
            }
        };
        let (owner, key) = inherited_from?;
        let owner_parent = owner.parent_at(depth + 1)?;
        match owner_parent.resolve_at(key, depth + 1) {
            Some(Resolved::View(view)) => Some(view),
            _ => None,
        }
    }

    /// Checks whether binding `candidate` as parent would loop back into this
    /// View or its subtree, following the effective parent at every step.
    fn reaches(&self, candidate: &View) -> bool {
        let mut current = Some(candidate.clone());
        for _ in 0..MAX_PARENT_DEPTH {
            // 1. The chain ended without touching this subtree.
            let Some(view) = current else {
                return false;
            };
            // 2. The link is this View or one of its descendants.
            if view.is_within(self) {
                return true;
            }
            // 3. Step to the effective parent, inherited ones included.
            current = view.parent();
        }
        log::warn!(
            "Parent chain of '{}' exceeds {} links; treating as circular.",
            self.display_path(),
            MAX_PARENT_DEPTH
        );
        true
    }

    /// Returns `true` if `ancestor` is this View or one of its owners.
    fn is_within(&self, ancestor: &View) -> bool {
        let mut cursor = Some(self.clone());
        while let Some(view) = cursor {
            if view.same_view(ancestor) {
                return true;
            }
            cursor = view.owner().map(|(owner, _)| owner);
        }
        false
    }

    /// Returns `true` if this View or any cached descendant inherits, through
    /// its effective chain, from itself.
    fn subtree_loops(&self) -> bool {
        if self.chain_loops() {
            return true;
        }
        let children: Vec<View> = self.0.children.borrow().values().cloned().collect();
        children.iter().any(View::subtree_loops)
    }

    fn chain_loops(&self) -> bool {
        let mut current = self.parent();
        for _ in 0..MAX_PARENT_DEPTH {
            let Some(view) = current else {
                return false;
            };
            if view.same_view(self) {
                return true;
            }
            current = view.parent();
        }
        true
    }

    // --- SNAPSHOTS ---

    /// The stored node of this View: no defaults, no parent. `None` while the
    /// View is redirected and nothing has been written locally.
    pub fn to_own_table(&self) -> Option<Table> {
        self.sync();
        match &*self.0.state.borrow() {
            Resolution::Direct { node } => Some(node.clone()),
            Resolution::Redirected { .. } => None,
        }
    }

    /// An independent snapshot merging, first writer wins: own stored values,
    /// then defaults, then the parent's merged snapshot. Creates no Views.
    pub fn to_merged_table(&self) -> Table {
        self.merged_at(0)
    }

    fn merged_at(&self, depth: usize) -> Table {
        let merged = Table::new();
        if let Some(own) = self.to_own_table() {
            defaults_merge::merge(&merged, &own);
        }
        if let Some(defaults) = &self.0.defaults {
            defaults_merge::merge(&merged, defaults);
        }
        if let Some(inherited) = self.inherited_snapshot(depth + 1) {
            defaults_merge::merge(&merged, &inherited);
        }
        merged
    }

    /// Merged snapshot of the parent, computed without materializing Views.
    fn inherited_snapshot(&self, depth: usize) -> Option<Table> {
        if depth > MAX_PARENT_DEPTH {
            log::warn!(
                "Parent chain of '{}' exceeds {} links; snapshot stops here.",
                self.display_path(),
                MAX_PARENT_DEPTH
            );
            return None;
        }
        let inherited_from = {
            let binding = self.0.parent.borrow();
            match &*binding {
                ParentBinding::Detached => return None,
                ParentBinding::Bound(weak) => {
                    return weak.upgrade().map(|p| View(p).merged_at(depth + 1));
                }
                ParentBinding::Inherit => self.owner(),
            }
        };
        let (owner, key) = inherited_from?;
        owner.inherited_snapshot(depth + 1)?.get_table(&key)
    }

    /// Iterates the merged snapshot. Each call recomputes the snapshot.
    pub fn iter(&self) -> impl Iterator<Item = (Key, Value)> + use<> {
        self.to_merged_table().entries().into_iter()
    }

    /// Number of entries in the merged snapshot.
    pub fn len(&self) -> usize {
        self.to_merged_table().len()
    }

    /// Returns `true` if the merged snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // --- INTERNALS ---

    fn owner(&self) -> Option<(View, Key)> {
        let owner = self.0.owner.as_ref()?;
        owner.view.upgrade().map(|v| (View(v), owner.key.clone()))
    }

    fn display_path(&self) -> String {
        match self.path() {
            Some(path) => format!("{}.{}", self.0.namespace, path),
            None => self.0.namespace.to_string(),
        }
    }

    fn child_keys(&self, key: &Key) -> Vec<Key> {
        let mut keys = self.0.keys.clone();
        keys.push(key.clone());
        keys
    }

    fn stored_value(&self, key: &Key) -> Option<Value> {
        match &*self.0.state.borrow() {
            Resolution::Direct { node } => node.get(key),
            Resolution::Redirected { .. } => None,
        }
    }

    /// Clears the redirect once a local node exists at the redirect path.
    fn sync(&self) {
        let materialized = match &*self.0.state.borrow() {
            Resolution::Direct { .. } => return,
            Resolution::Redirected { target, path } => {
                match path_resolver::get_keys(target, path) {
                    Ok(Some(Value::Table(node))) => node,
                    _ => return,
                }
            }
        };
        log::debug!(
            "Local table now exists for '{}'; clearing redirect.",
            self.display_path()
        );
        *self.0.state.borrow_mut() = Resolution::Direct { node: materialized };
    }

    fn cached_child(&self, key: &Key) -> Option<View> {
        self.0.children.borrow().get(key).cloned()
    }

    fn forget_child(&self, key: &Key) {
        self.0.children.borrow_mut().remove(key);
    }

    /// Memoized child over a stored table.
    fn direct_child(&self, key: Key, table: Table) -> View {
        if let Some(child) = self.cached_child(&key) {
            let reuse = {
                let mut state = child.0.state.borrow_mut();
                let same_node = match &*state {
                    Resolution::Direct { node } => Some(node.ptr_eq(&table)),
                    Resolution::Redirected { .. } => None,
                };
                match same_node {
                    Some(same) => same,
                    None => {
                        *state = Resolution::Direct {
                            node: table.clone(),
                        };
                        true
                    }
                }
            };
            if reuse {
                return child;
            }
            log::debug!(
                "Table at '{}' was replaced; discarding cached view.",
                child.display_path()
            );
        }
        self.insert_child(key, Resolution::Direct { node: table })
    }

    /// Memoized child for a key that only resolves through parent or defaults.
    fn redirected_child(&self, key: Key) -> View {
        if let Some(child) = self.cached_child(&key) {
            if matches!(&*child.0.state.borrow(), Resolution::Redirected { .. }) {
                return child;
            }
        }
        let path = self.child_keys(&key);
        log::debug!(
            "Installing redirect for '{}.{}'.",
            self.0.namespace,
            render_path(&path)
        );
        self.insert_child(
            key,
            Resolution::Redirected {
                target: self.0.root.clone(),
                path,
            },
        )
    }

    fn insert_child(&self, key: Key, state: Resolution) -> View {
        let child = View(Rc::new(ViewInner {
            namespace: self.0.namespace.clone(),
            root: self.0.root.clone(),
            keys: self.child_keys(&key),
            owner: Some(Owner {
                view: Rc::downgrade(&self.0),
                key: key.clone(),
            }),
            defaults: self.0.defaults.as_ref().and_then(|d| d.get_table(&key)),
            state: RefCell::new(state),
            parent: RefCell::new(ParentBinding::Inherit),
            children: RefCell::new(HashMap::new()),
        }));
        self.0.children.borrow_mut().insert(key, child.clone());
        child
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redirected = matches!(&*self.0.state.borrow(), Resolution::Redirected { .. });
        f.debug_struct("View")
            .field("namespace", &self.0.namespace)
            .field("path", &self.path())
            .field("redirected", &redirected)
            .finish()
    }
}
