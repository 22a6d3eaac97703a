//! Context aggregation state machine.
//!
//! `ContextAggregator` owns the [`SelectionStore`], the aggregation mode, the
//! focused session and the "current" pointer. Every transition runs to
//! completion and then republishes the view computed by [`recompute`].
//! Receivers obtained from [`ContextAggregator::subscribe`] observe views in
//! transition order.

use shellmate_core::config::ContextConfig;
use shellmate_core::context::{ActiveContextView, AggregationMode, recompute};
use shellmate_core::selection::{SelectionStore, SessionId, truncate_chars};
use tokio::sync::watch;

/// Characters of selected text that may appear in a log line.
const LOG_PREVIEW_CHARS: usize = 40;

pub struct ContextAggregator {
    mode: AggregationMode,
    store: SelectionStore,
    /// Record exposed in `Current` mode
    current: Option<SessionId>,
    /// Session holding UI focus, as last reported by the host
    focused: Option<SessionId>,
    view_tx: watch::Sender<ActiveContextView>,
}

impl ContextAggregator {
    pub fn new(mode: AggregationMode, min_selection_len: usize) -> Self {
        let (view_tx, _) = watch::channel(ActiveContextView::empty(mode));
        Self {
            mode,
            store: SelectionStore::with_min_len(min_selection_len),
            current: None,
            focused: None,
            view_tx,
        }
    }

    pub fn from_config(config: &ContextConfig) -> Self {
        Self::new(config.default_mode, config.min_selection_len)
    }

    /// Subscribes to published views. The receiver starts at the latest view.
    pub fn subscribe(&self) -> watch::Receiver<ActiveContextView> {
        self.view_tx.subscribe()
    }

    /// The most recently published view.
    pub fn view(&self) -> ActiveContextView {
        self.view_tx.borrow().clone()
    }

    pub fn mode(&self) -> AggregationMode {
        self.mode
    }

    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    pub fn current(&self) -> Option<&SessionId> {
        self.current.as_ref()
    }

    pub fn focused(&self) -> Option<&SessionId> {
        self.focused.as_ref()
    }

    /// Records a (debounced) selection from `session`.
    ///
    /// In `Current` mode the session becomes current when it holds focus or
    /// when no current record exists yet.
    pub fn on_selection(&mut self, session: SessionId, text: &str, source: &str) {
        if !self.store.set(session.clone(), text, source) {
            return;
        }

        tracing::debug!(
            "[ContextAggregator] Selection in {}: '{}'",
            session,
            truncate_chars(text, LOG_PREVIEW_CHARS)
        );

        if self.mode == AggregationMode::Current {
            let is_focused = self.focused.as_ref() == Some(&session);
            let has_current = self
                .current
                .as_ref()
                .is_some_and(|id| self.store.contains(id));
            if is_focused || !has_current {
                self.current = Some(session);
            }
        }

        self.publish();
    }

    /// Host focus moved to `session` (or away from every session).
    pub fn on_focus_changed(&mut self, session: Option<SessionId>) {
        self.focused = session;
        if self.mode == AggregationMode::Current {
            self.follow_focus();
        }
        self.publish();
    }

    /// Switches the aggregation mode.
    ///
    /// Entering `Current` re-resolves the current record against the focused
    /// session. `None` empties the view but leaves the store untouched.
    pub fn set_mode(&mut self, mode: AggregationMode) {
        if mode == self.mode {
            return;
        }
        tracing::info!("[ContextAggregator] Mode {} -> {}", self.mode, mode);

        self.mode = mode;
        if mode.follows_focus() {
            self.follow_focus();
        }
        self.publish();
    }

    /// Forgets everything tied to a closed session.
    pub fn on_session_destroyed(&mut self, session: &SessionId) {
        if self.focused.as_ref() == Some(session) {
            self.focused = None;
        }
        self.remove_record(session);
    }

    /// Stores text supplied directly by the chat layer under a fresh manual id.
    ///
    /// Returns the id, or `None` when the text was rejected. A manual selection
    /// is an explicit user action, so in `Current` mode it becomes current.
    pub fn capture_manual(&mut self, text: &str, source: &str) -> Option<SessionId> {
        let id = SessionId::manual();
        if !self.store.set(id.clone(), text, source) {
            return None;
        }

        tracing::debug!("[ContextAggregator] Manual selection {} from '{}'", id, source);
        if self.mode == AggregationMode::Current {
            self.current = Some(id.clone());
        }
        self.publish();
        Some(id)
    }

    /// Clears one record, or everything when `session` is `None`.
    pub fn clear(&mut self, session: Option<&SessionId>) {
        match session {
            Some(id) => self.remove_record(id),
            None => {
                self.store.clear();
                self.current = None;
                tracing::debug!("[ContextAggregator] Cleared all selections");
                self.publish();
            }
        }
    }

    /// Flips the collapsed flag of `session`'s record, or of the current record.
    pub fn toggle_collapsed(&mut self, session: Option<&SessionId>) -> bool {
        let Some(id) = session.or(self.current.as_ref()).cloned() else {
            return false;
        };
        let toggled = self.store.toggle_collapsed(&id);
        if toggled {
            self.publish();
        }
        toggled
    }

    /// Drops every record and the current pointer. Used when listening is
    /// switched off; the mode is kept.
    pub fn reset(&mut self) {
        self.store.clear();
        self.current = None;
        self.publish();
    }

    fn remove_record(&mut self, session: &SessionId) {
        let removed = self.store.remove(session);
        let was_current = self.current.as_ref() == Some(session);

        if was_current {
            self.current = self.store.first().map(|record| record.session_id.clone());
            tracing::debug!(
                "[ContextAggregator] Current record {} removed, promoted {:?}",
                session,
                self.current.as_ref().map(SessionId::as_str)
            );
        }

        if removed || was_current {
            self.publish();
        }
    }

    fn follow_focus(&mut self) {
        self.current = self
            .focused
            .as_ref()
            .filter(|id| self.store.contains(id))
            .cloned();
    }

    fn publish(&mut self) {
        let view = recompute(self.mode, &self.store, self.current.as_ref());
        self.view_tx.send_if_modified(|published| {
            if *published == view {
                false
            } else {
                *published = view;
                true
            }
        });
    }
}

impl Default for ContextAggregator {
    fn default() -> Self {
        Self::from_config(&ContextConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(id: &str) -> SessionId {
        SessionId::new(id)
    }

    fn view_texts(view: &ActiveContextView) -> Vec<&str> {
        view.iter().map(|record| record.text.as_str()).collect()
    }

    fn aggregator(mode: AggregationMode) -> ContextAggregator {
        ContextAggregator::new(mode, 3)
    }

    #[test]
    fn test_short_selection_leaves_view_unchanged() {
        let mut agg = aggregator(AggregationMode::Current);
        let rx = agg.subscribe();

        agg.on_selection(sid("a"), "ab", "Terminal: a");

        assert!(agg.view().is_empty());
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_same_text_publishes_once() {
        let mut agg = aggregator(AggregationMode::Current);
        let mut rx = agg.subscribe();

        agg.on_selection(sid("a"), "cargo build", "Terminal: a");
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        agg.on_selection(sid("a"), "cargo build", "Terminal: a");
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_first_selection_bootstraps_current() {
        let mut agg = aggregator(AggregationMode::Current);

        agg.on_selection(sid("a"), "first output", "Terminal: a");

        assert_eq!(agg.current(), Some(&sid("a")));
        assert_eq!(view_texts(&agg.view()), vec!["first output"]);
    }

    #[test]
    fn test_unfocused_selection_does_not_steal_current() {
        let mut agg = aggregator(AggregationMode::Current);
        agg.on_focus_changed(Some(sid("a")));
        agg.on_selection(sid("a"), "focused text", "Terminal: a");

        agg.on_selection(sid("b"), "background text", "Terminal: b");

        assert_eq!(view_texts(&agg.view()), vec!["focused text"]);
        assert_eq!(agg.store().len(), 2);
    }

    #[test]
    fn test_focus_to_session_without_record_empties_view() {
        let mut agg = aggregator(AggregationMode::Current);
        agg.on_focus_changed(Some(sid("a")));
        agg.on_selection(sid("a"), "some text", "Terminal: a");

        agg.on_focus_changed(Some(sid("b")));

        assert!(agg.view().is_empty());
        assert!(agg.current().is_none());

        agg.on_focus_changed(Some(sid("a")));
        assert_eq!(view_texts(&agg.view()), vec!["some text"]);
    }

    #[test]
    fn test_multiple_mode_lists_every_record() {
        let mut agg = aggregator(AggregationMode::Multiple);
        agg.on_selection(sid("a"), "alpha", "Terminal: a");
        agg.on_selection(sid("b"), "bravo", "Terminal: b");
        agg.on_selection(sid("c"), "charlie", "Terminal: c");

        assert_eq!(agg.view().len(), 3);

        agg.on_focus_changed(Some(sid("b")));
        assert_eq!(agg.view().len(), 3);
    }

    #[test]
    fn test_switch_to_current_follows_focus() {
        let mut agg = aggregator(AggregationMode::Multiple);
        agg.on_selection(sid("a"), "alpha", "Terminal: a");
        agg.on_selection(sid("b"), "bravo", "Terminal: b");
        agg.on_focus_changed(Some(sid("b")));

        agg.set_mode(AggregationMode::Current);

        assert_eq!(view_texts(&agg.view()), vec!["bravo"]);
    }

    #[test]
    fn test_none_mode_keeps_store() {
        let mut agg = aggregator(AggregationMode::Multiple);
        agg.on_selection(sid("a"), "alpha", "Terminal: a");

        agg.set_mode(AggregationMode::None);
        assert!(agg.view().is_empty());
        assert_eq!(agg.store().len(), 1);

        agg.on_selection(sid("b"), "bravo", "Terminal: b");
        assert!(agg.view().is_empty());

        agg.set_mode(AggregationMode::Multiple);
        assert_eq!(agg.view().len(), 2);
    }

    #[test]
    fn test_destroying_current_promotes_remaining_record() {
        let mut agg = aggregator(AggregationMode::Current);
        agg.on_selection(sid("a"), "alpha", "Terminal: a");
        agg.on_selection(sid("b"), "bravo", "Terminal: b");
        assert_eq!(agg.current(), Some(&sid("a")));

        agg.on_session_destroyed(&sid("a"));

        assert_eq!(agg.current(), Some(&sid("b")));
        assert_eq!(view_texts(&agg.view()), vec!["bravo"]);

        agg.on_session_destroyed(&sid("b"));
        assert!(agg.view().is_empty());
        assert!(agg.store().is_empty());
    }

    #[test]
    fn test_destroying_unknown_session_publishes_nothing() {
        let mut agg = aggregator(AggregationMode::Current);
        agg.on_selection(sid("a"), "alpha", "Terminal: a");
        let rx = agg.subscribe();

        agg.on_session_destroyed(&sid("zzz"));

        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_manual_capture_becomes_current() {
        let mut agg = aggregator(AggregationMode::Current);
        agg.on_selection(sid("a"), "alpha", "Terminal: a");

        let id = agg.capture_manual("pasted log", "Chat").unwrap();

        assert!(id.is_manual());
        assert_eq!(agg.current(), Some(&id));
        assert_eq!(agg.view().first().unwrap().source, "Chat");
        assert!(agg.capture_manual("x", "Chat").is_none());
    }

    #[test]
    fn test_clear_single_and_all() {
        let mut agg = aggregator(AggregationMode::Multiple);
        agg.on_selection(sid("a"), "alpha", "Terminal: a");
        agg.on_selection(sid("b"), "bravo", "Terminal: b");

        agg.clear(Some(&sid("a")));
        assert_eq!(view_texts(&agg.view()), vec!["bravo"]);

        agg.clear(None);
        assert!(agg.view().is_empty());
        assert!(agg.current().is_none());
    }

    #[test]
    fn test_toggle_collapsed_defaults_to_current() {
        let mut agg = aggregator(AggregationMode::Current);
        assert!(!agg.toggle_collapsed(None));

        agg.on_selection(sid("a"), "alpha", "Terminal: a");
        assert!(agg.toggle_collapsed(None));
        assert!(agg.view().first().unwrap().collapsed);

        assert!(agg.toggle_collapsed(Some(&sid("a"))));
        assert!(!agg.view().first().unwrap().collapsed);
    }

    #[test]
    fn test_reset_keeps_mode() {
        let mut agg = aggregator(AggregationMode::Multiple);
        agg.on_selection(sid("a"), "alpha", "Terminal: a");

        agg.reset();

        assert!(agg.view().is_empty());
        assert!(agg.store().is_empty());
        assert_eq!(agg.mode(), AggregationMode::Multiple);
    }
}
