use super::model::{SelectionRecord, SessionId};
use std::collections::BTreeMap;

/// Minimum number of characters a selection must have to be recorded.
///
/// Shorter selections are almost always stray clicks or single keystrokes.
pub const DEFAULT_MIN_SELECTION_LEN: usize = 3;

/// Keyed map from session id to that session's latest selection.
///
/// This is the single source of truth for "what is selected, where". Every
/// mutating method reports whether the store actually changed; callers use
/// that as the "store changed" signal. [`SelectionStore::revision`] counts
/// those signals.
///
/// Iteration order is by session id, so it never depends on the order in
/// which selections arrived.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    records: BTreeMap<SessionId, SelectionRecord>,
    min_len: usize,
    revision: u64,
}

impl SelectionStore {
    /// Creates an empty store with the default minimum selection length.
    pub fn new() -> Self {
        Self::with_min_len(DEFAULT_MIN_SELECTION_LEN)
    }

    /// Creates an empty store rejecting selections shorter than `min_len`
    /// characters. A `min_len` of zero still rejects empty text.
    pub fn with_min_len(min_len: usize) -> Self {
        Self {
            records: BTreeMap::new(),
            min_len,
            revision: 0,
        }
    }

    /// Records `text` as the selection of `session_id`.
    ///
    /// Ignored when the text is empty, shorter than the minimum length, or
    /// byte-identical to what is already stored for the session. Otherwise the
    /// record is replaced with a fresh timestamp and `collapsed = false`.
    ///
    /// # Returns
    ///
    /// `true` if the store changed.
    pub fn set(&mut self, session_id: SessionId, text: &str, source: &str) -> bool {
        if text.is_empty() || text.chars().count() < self.min_len {
            return false;
        }

        if self
            .records
            .get(&session_id)
            .is_some_and(|existing| existing.text == text)
        {
            return false;
        }

        let record = SelectionRecord::new(session_id.clone(), text, source);
        self.records.insert(session_id, record);
        self.bump()
    }

    /// Deletes the record of `session_id`.
    ///
    /// # Returns
    ///
    /// `true` only if a record was actually removed.
    pub fn remove(&mut self, session_id: &SessionId) -> bool {
        if self.records.remove(session_id).is_some() {
            self.bump()
        } else {
            false
        }
    }

    /// Empties the whole store. Always reports a change.
    pub fn clear(&mut self) -> bool {
        self.records.clear();
        self.bump()
    }

    /// Flips the `collapsed` flag of the record of `session_id`.
    ///
    /// # Returns
    ///
    /// `true` if a record existed and was toggled.
    pub fn toggle_collapsed(&mut self, session_id: &SessionId) -> bool {
        match self.records.get_mut(session_id) {
            Some(record) => {
                record.collapsed = !record.collapsed;
                self.bump()
            }
            None => false,
        }
    }

    pub fn get(&self, session_id: &SessionId) -> Option<&SelectionRecord> {
        self.records.get(session_id)
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.records.contains_key(session_id)
    }

    /// All records in the store's natural order.
    pub fn all(&self) -> impl Iterator<Item = &SelectionRecord> {
        self.records.values()
    }

    /// First record in natural order, used when a new current record has to
    /// be picked arbitrarily.
    pub fn first(&self) -> Option<&SelectionRecord> {
        self.records.values().next()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn min_len(&self) -> usize {
        self.min_len
    }

    /// Number of "store changed" signals emitted so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump(&mut self) -> bool {
        self.revision += 1;
        true
    }
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> SessionId {
        SessionId::new(s)
    }

    #[test]
    fn test_short_or_empty_text_is_ignored() {
        let mut store = SelectionStore::new();

        for text in ["", "a", "ab", "é!"] {
            assert!(!store.set(id("s1"), text, "Terminal: bash"));
        }

        assert!(store.is_empty());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_minimum_length_counts_characters_not_bytes() {
        let mut store = SelectionStore::new();
        // three characters, nine bytes
        assert!(store.set(id("s1"), "日本語", "Terminal: zsh"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_same_text_signals_once() {
        let mut store = SelectionStore::new();

        assert!(store.set(id("s1"), "cargo test", "Terminal: bash"));
        assert!(!store.set(id("s1"), "cargo test", "Terminal: bash"));

        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn test_overwrite_resets_collapse_flag() {
        let mut store = SelectionStore::new();
        store.set(id("s1"), "first selection", "Terminal: bash");
        assert!(store.toggle_collapsed(&id("s1")));
        assert!(store.get(&id("s1")).unwrap().collapsed);

        assert!(store.set(id("s1"), "second selection", "Terminal: bash"));

        let record = store.get(&id("s1")).unwrap();
        assert_eq!(record.text, "second selection");
        assert!(!record.collapsed);
    }

    #[test]
    fn test_remove_signals_only_when_present() {
        let mut store = SelectionStore::new();
        assert!(!store.remove(&id("missing")));
        assert_eq!(store.revision(), 0);

        store.set(id("s1"), "some text", "Terminal: bash");
        assert!(store.remove(&id("s1")));
        assert!(store.is_empty());
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn test_clear_always_signals() {
        let mut store = SelectionStore::new();
        assert!(store.clear());
        store.set(id("s1"), "some text", "Terminal: bash");
        assert!(store.clear());
        assert!(store.is_empty());
        assert_eq!(store.revision(), 3);
    }

    #[test]
    fn test_toggle_missing_record_is_noop() {
        let mut store = SelectionStore::new();
        assert!(!store.toggle_collapsed(&id("nope")));
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_order_is_independent_of_insertion() {
        let mut a = SelectionStore::new();
        a.set(id("b"), "text b", "B");
        a.set(id("a"), "text a", "A");

        let mut b = SelectionStore::new();
        b.set(id("a"), "text a", "A");
        b.set(id("b"), "text b", "B");

        let order_a: Vec<_> = a.all().map(|r| r.session_id.clone()).collect();
        let order_b: Vec<_> = b.all().map(|r| r.session_id.clone()).collect();
        assert_eq!(order_a, order_b);
    }
}
