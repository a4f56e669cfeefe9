//! tierdb: a hierarchical, path-addressed settings store.
//!
//! Stored values are resolved through three tiers: the View's own data, the
//! data of its parent binding, and registered defaults. A [`ProfileStore`]
//! keeps named profiles, a shared global table, and the identity → profile
//! mapping inside one persisted root.

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod state;

pub use crate::core::defaults::Defaults;
pub use crate::core::lifecycle::{LifecycleState, Settings};
pub use crate::core::profile_store::ProfileStore;
pub use crate::core::storage::{FileStorage, MemoryStorage, Storage};
pub use crate::core::view::{Namespace, Resolved, View};
pub use crate::models::{Key, Table, Value};
