//! In-memory sync state

use chrono::{DateTime, Utc};

use crate::catalog::CatalogStore;

/// What the manager currently holds in memory
///
/// Two states: empty, or populated with the parsed store and the timestamp
/// of the file it was read from. A successful refresh invalidates it so the
/// next read reloads from disk.
#[derive(Debug, Default)]
pub struct SyncState {
    cached: Option<CatalogStore>,
    dataset_timestamp: Option<DateTime<Utc>>,
}

impl SyncState {
    pub fn populate(&mut self, store: CatalogStore, timestamp: Option<DateTime<Utc>>) {
        self.cached = Some(store);
        self.dataset_timestamp = timestamp;
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
        self.dataset_timestamp = None;
    }

    pub fn cached(&self) -> Option<&CatalogStore> {
        self.cached.as_ref()
    }

    pub fn dataset_timestamp(&self) -> Option<DateTime<Utc>> {
        self.dataset_timestamp
    }

    pub fn is_populated(&self) -> bool {
        self.cached.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_populate_then_invalidate() {
        let mut state = SyncState::default();
        assert!(!state.is_populated());

        let now = Utc::now();
        state.populate(CatalogStore::default(), Some(now));
        assert!(state.is_populated());
        assert_eq!(state.dataset_timestamp(), Some(now));

        state.invalidate();
        assert!(state.cached().is_none());
        assert!(state.dataset_timestamp().is_none());
    }
}
