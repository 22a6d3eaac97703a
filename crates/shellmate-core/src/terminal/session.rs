//! Terminal session source contract.
//!
//! The host application owns the terminals. It describes them with
//! [`TerminalSessionInfo`] and pushes [`TerminalEvent`]s into a channel for
//! every session someone subscribed to. A [`Subscription`] ends the moment it
//! is dropped.

use crate::selection::SessionId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Channel end the host pushes terminal events into.
pub type TerminalEventSender = mpsc::UnboundedSender<TerminalEvent>;

/// Description of one session as reported by the host.
///
/// A session with children is a split container; the children are the panes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalSessionInfo {
    pub id: SessionId,
    pub title: String,
    /// Whether the host considers this a terminal whose selections can be captured
    pub capturable: bool,
    #[serde(default)]
    pub children: Vec<TerminalSessionInfo>,
}

impl TerminalSessionInfo {
    /// A plain, capturable terminal.
    pub fn terminal(id: impl Into<SessionId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            capturable: true,
            children: Vec::new(),
        }
    }

    /// A split container holding `children`.
    pub fn container(
        id: impl Into<SessionId>,
        title: impl Into<String>,
        children: Vec<TerminalSessionInfo>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            capturable: false,
            children,
        }
    }

    pub fn is_container(&self) -> bool {
        !self.children.is_empty()
    }

    /// Label stored with selections captured in this session.
    pub fn source_label(&self) -> String {
        format!("Terminal: {}", self.title)
    }

    /// This session and all nested panes that are capturable, depth first.
    pub fn capturable_sessions(&self) -> Vec<&TerminalSessionInfo> {
        let mut found = Vec::new();
        self.collect_capturable(&mut found);
        found
    }

    fn collect_capturable<'a>(&'a self, found: &mut Vec<&'a TerminalSessionInfo>) {
        if self.capturable {
            found.push(self);
        }
        for child in &self.children {
            child.collect_capturable(found);
        }
    }
}

/// Events flowing from the host into the context service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerminalEvent {
    /// Raw selection change; may fire many times while the user drags.
    SelectionChanged { session: SessionId, text: String },
    /// The user copied text to the clipboard from a terminal.
    ClipboardCopied { session: SessionId, text: String },
    /// UI focus moved to another session (or to nothing).
    FocusChanged { session: Option<SessionId> },
    /// A new top-level tab appeared.
    SessionOpened { info: TerminalSessionInfo },
    /// A pane was added to a split container.
    ChildAdded {
        container: SessionId,
        child: TerminalSessionInfo,
    },
    /// A pane was removed from a split container.
    ChildRemoved { container: SessionId, child: SessionId },
    /// The session was closed.
    Destroyed { session: SessionId },
}

impl TerminalEvent {
    /// The session the event belongs to, if it is tied to one.
    pub fn session(&self) -> Option<&SessionId> {
        match self {
            Self::SelectionChanged { session, .. }
            | Self::ClipboardCopied { session, .. }
            | Self::Destroyed { session } => Some(session),
            Self::FocusChanged { session } => session.as_ref(),
            Self::SessionOpened { info } => Some(&info.id),
            Self::ChildAdded { child, .. } => Some(&child.id),
            Self::ChildRemoved { child, .. } => Some(child),
        }
    }
}

/// Live registration of an event listener.
///
/// The host checks [`Subscription::is_active`] (or awaits the token) before
/// delivering. Dropping the handle cancels it.
#[derive(Debug)]
pub struct Subscription {
    target: Option<SessionId>,
    token: CancellationToken,
}

impl Subscription {
    /// Subscription to the events of one session.
    pub fn for_session(session: SessionId, token: CancellationToken) -> Self {
        Self {
            target: Some(session),
            token,
        }
    }

    /// Subscription to host-wide events (focus, new tabs).
    pub fn for_host(token: CancellationToken) -> Self {
        Self {
            target: None,
            token,
        }
    }

    pub fn target(&self) -> Option<&SessionId> {
        self.target.as_ref()
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Terminal session source implemented by the host adapter.
pub trait SessionSource: Send + Sync {
    /// All open top-level sessions; split containers carry their panes.
    fn sessions(&self) -> Vec<TerminalSessionInfo>;

    /// The session currently receiving keyboard input, if any.
    fn focused_session(&self) -> Option<SessionId>;

    /// Starts delivering host-wide events (`FocusChanged`, `SessionOpened`).
    fn watch_host(&self, events: TerminalEventSender) -> Subscription;

    /// Starts delivering the events of `session`.
    ///
    /// For a split container this covers `ChildAdded`/`ChildRemoved`; for a
    /// terminal it covers selection, clipboard and `Destroyed` events.
    fn subscribe(&self, session: &TerminalSessionInfo, events: TerminalEventSender)
    -> Subscription;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capturable_sessions_flattens_split_containers() {
        let mut editor = TerminalSessionInfo::terminal("pane-editor", "vim");
        editor.capturable = false;
        let split = TerminalSessionInfo::container(
            "split-1",
            "Split",
            vec![
                TerminalSessionInfo::terminal("pane-a", "bash"),
                editor,
                TerminalSessionInfo::container(
                    "split-2",
                    "Nested",
                    vec![TerminalSessionInfo::terminal("pane-b", "zsh")],
                ),
            ],
        );

        let ids: Vec<_> = split
            .capturable_sessions()
            .into_iter()
            .map(|s| s.id.as_str().to_string())
            .collect();

        assert_eq!(ids, vec!["pane-a", "pane-b"]);
        assert!(split.is_container());
    }

    #[test]
    fn test_dropping_subscription_cancels_token() {
        let token = CancellationToken::new();
        let observer = token.clone();

        let subscription = Subscription::for_session(SessionId::new("s1"), token);
        assert!(subscription.is_active());
        drop(subscription);

        assert!(observer.is_cancelled());
    }

    #[test]
    fn test_event_session_lookup() {
        let event = TerminalEvent::ChildRemoved {
            container: SessionId::new("split"),
            child: SessionId::new("pane"),
        };
        assert_eq!(event.session().unwrap().as_str(), "pane");
        assert!(TerminalEvent::FocusChanged { session: None }.session().is_none());
    }
}
