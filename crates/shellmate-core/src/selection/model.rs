//! Selection domain model.
//!
//! This module contains the identifier for a terminal session and the
//! record describing the text last selected inside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, opaque identifier of one terminal session (a tab or a split pane).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a session id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a fresh id for text injected by the chat layer rather than
    /// captured from a terminal.
    pub fn manual() -> Self {
        Self(format!("manual-{}", uuid::Uuid::new_v4()))
    }

    /// Returns true if this id was produced by [`SessionId::manual`].
    pub fn is_manual(&self) -> bool {
        self.0.starts_with("manual-")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The most recent selection captured in one terminal session.
///
/// Records are owned by [`super::SelectionStore`]; everything handed out to
/// callers is a snapshot clone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRecord {
    /// Session the text was selected in
    pub session_id: SessionId,
    /// Selected text, as captured
    pub text: String,
    /// Human-readable label, e.g. `Terminal: bash`
    pub source: String,
    /// Capture time
    pub captured_at: DateTime<Utc>,
    /// Whether the UI shows this record folded
    pub collapsed: bool,
}

impl SelectionRecord {
    /// Creates a fresh, expanded record stamped with the current time.
    pub fn new(session_id: SessionId, text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            session_id,
            text: text.into(),
            source: source.into(),
            captured_at: Utc::now(),
            collapsed: false,
        }
    }

    /// Returns at most `max_chars` characters of the text, followed by `...`
    /// when something was cut off.
    pub fn preview(&self, max_chars: usize) -> String {
        truncate_chars(&self.text, max_chars)
    }
}

/// Truncates on a character boundary and appends `...` if anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}
