// src/state.rs

use crate::models::Table;

/// Tracks whether the live root differs from what was last persisted.
enum JournalState {
    /// Nothing was loaded or saved yet; any root needs saving.
    Fresh,
    /// Holds a deep copy of the root as it was last loaded or saved.
    Synced(Table),
}

/// Pristine/dirty journal over a store's persisted root.
///
/// The live root is mutated in place through Views, so instead of guarding
/// mutable access the journal keeps one independent snapshot and compares
/// against it on demand.
pub struct StoreJournal {
    state: JournalState,
}

impl StoreJournal {
    /// A journal for a root that has never been persisted.
    pub fn fresh() -> Self {
        Self {
            state: JournalState::Fresh,
        }
    }

    /// A journal whose snapshot is the given, just-loaded root.
    pub fn synced(root: &Table) -> Self {
        Self {
            state: JournalState::Synced(root.deep_clone()),
        }
    }

    /// Checks if `current` needs saving by comparing it against the snapshot.
    pub fn needs_saving(&self, current: &Table) -> bool {
        match &self.state {
            JournalState::Fresh => true,
            JournalState::Synced(snapshot) => snapshot != current,
        }
    }

    /// Records `current` as persisted.
    pub fn commit(&mut self, current: &Table) {
        self.state = JournalState::Synced(current.deep_clone());
    }
}

impl std::fmt::Debug for StoreJournal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            JournalState::Fresh => "fresh",
            JournalState::Synced(_) => "synced",
        };
        f.debug_struct("StoreJournal").field("state", &state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::path_resolver::set_path;
    use crate::models::Value;

    #[test]
    fn test_fresh_journal_always_needs_saving() {
        let journal = StoreJournal::fresh();
        assert!(journal.needs_saving(&Table::new()));
    }

    #[test]
    fn test_synced_journal_detects_in_place_mutation() {
        let root = Table::new();
        set_path(&root, "global.a", Value::from(1)).unwrap();
        let mut journal = StoreJournal::synced(&root);
        assert!(!journal.needs_saving(&root));

        set_path(&root, "global.a", Value::from(2)).unwrap();
        assert!(journal.needs_saving(&root));

        journal.commit(&root);
        assert!(!journal.needs_saving(&root));

        // Writing back the same value leaves the root clean.
        set_path(&root, "global.a", Value::from(2)).unwrap();
        assert!(!journal.needs_saving(&root));
    }
}
