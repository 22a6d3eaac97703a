//! The published "active context" view and the function computing it.

use super::mode::AggregationMode;
use crate::selection::{SelectionRecord, SelectionStore, SessionId};
use serde::{Deserialize, Serialize};

/// Ordered snapshot of the selections currently exposed as context.
///
/// A view is always rebuilt from scratch by [`recompute`]; it is never patched
/// in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveContextView {
    /// Mode the view was computed under
    pub mode: AggregationMode,
    /// Exposed records, in store order
    pub records: Vec<SelectionRecord>,
}

impl ActiveContextView {
    /// An empty view for `mode`.
    pub fn empty(mode: AggregationMode) -> Self {
        Self {
            mode,
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SelectionRecord> {
        self.records.iter()
    }

    pub fn first(&self) -> Option<&SelectionRecord> {
        self.records.first()
    }
}

/// Computes the active context view.
///
/// - `None`: always empty.
/// - `Current`: the record `current` points at, if it is still in the store.
/// - `Multiple`: every record with non-empty text, in store order.
///
/// Pure and idempotent: identical inputs give identical views.
pub fn recompute(
    mode: AggregationMode,
    store: &SelectionStore,
    current: Option<&SessionId>,
) -> ActiveContextView {
    let records = match mode {
        AggregationMode::None => Vec::new(),
        AggregationMode::Current => current
            .and_then(|id| store.get(id))
            .cloned()
            .into_iter()
            .collect(),
        AggregationMode::Multiple => store
            .all()
            .filter(|record| !record.text.is_empty())
            .cloned()
            .collect(),
    };

    ActiveContextView { mode, records }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated_store() -> SelectionStore {
        let mut store = SelectionStore::new();
        store.set(SessionId::new("tab-1"), "ls -la output", "Terminal: tab-1");
        store.set(SessionId::new("tab-2"), "error: linker failed", "Terminal: tab-2");
        store.set(SessionId::new("tab-3"), "git status", "Terminal: tab-3");
        store
    }

    #[test]
    fn test_none_mode_is_always_empty() {
        let store = populated_store();
        let current = SessionId::new("tab-1");

        let view = recompute(AggregationMode::None, &store, Some(&current));

        assert!(view.is_empty());
        assert_eq!(view.mode, AggregationMode::None);
    }

    #[test]
    fn test_current_mode_has_at_most_one_record() {
        let store = populated_store();
        let current = SessionId::new("tab-2");

        let view = recompute(AggregationMode::Current, &store, Some(&current));

        assert_eq!(view.len(), 1);
        assert_eq!(view.first().unwrap().text, "error: linker failed");
    }

    #[test]
    fn test_current_mode_without_pointer_is_empty() {
        let store = populated_store();
        assert!(recompute(AggregationMode::Current, &store, None).is_empty());

        let dangling = SessionId::new("closed-tab");
        assert!(recompute(AggregationMode::Current, &store, Some(&dangling)).is_empty());
    }

    #[test]
    fn test_multiple_mode_lists_every_session() {
        let store = populated_store();

        let view = recompute(AggregationMode::Multiple, &store, None);

        assert_eq!(view.len(), store.len());
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let store = populated_store();
        let current = SessionId::new("tab-3");

        for mode in [
            AggregationMode::Current,
            AggregationMode::Multiple,
            AggregationMode::None,
        ] {
            let first = recompute(mode, &store, Some(&current));
            let second = recompute(mode, &store, Some(&current));
            assert_eq!(first, second);
        }
    }
}
