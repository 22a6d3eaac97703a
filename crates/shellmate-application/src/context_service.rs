//! Event-driven front of the [`ContextAggregator`].
//!
//! A background task owns the aggregator together with the terminal
//! subscriptions and the per-session debounce timers, so every state change
//! runs to completion on one owner. Callers talk to it through
//! [`ContextService`]; views are read from a watch channel without a round
//! trip.

use crate::context_aggregator::ContextAggregator;
use crate::query::{ContextSnapshot, has_selection, preview};
use futures::StreamExt;
use shellmate_core::config::ContextConfig;
use shellmate_core::context::{ActiveContextView, AggregationMode};
use shellmate_core::error::{Result, ShellmateError};
use shellmate_core::selection::SessionId;
use shellmate_core::terminal::{
    SessionSource, Subscription, TerminalEvent, TerminalEventSender, TerminalSessionInfo,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::time::{DelayQueue, delay_queue};

/// Clipboard copies must be longer than this to count as a selection.
const MIN_CLIPBOARD_CHARS: usize = 2;

/// Observable state of the service, mostly for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextStatus {
    pub listening: bool,
    pub mode: AggregationMode,
    /// Attached sessions, sorted
    pub attached: Vec<SessionId>,
    /// Sessions with a selection waiting for its debounce window
    pub pending_selections: usize,
}

enum ContextCommand {
    SetMode(AggregationMode, oneshot::Sender<()>),
    SetListening(bool, oneshot::Sender<()>),
    CaptureManual {
        text: String,
        source: String,
        reply: oneshot::Sender<Option<SessionId>>,
    },
    Clear(Option<SessionId>, oneshot::Sender<()>),
    ToggleCollapsed(Option<SessionId>, oneshot::Sender<bool>),
    Status(oneshot::Sender<ContextStatus>),
    Shutdown,
}

/// Handle to the context background task.
pub struct ContextService {
    commands: mpsc::UnboundedSender<ContextCommand>,
    view: watch::Receiver<ActiveContextView>,
    preview_len: usize,
    handle: JoinHandle<()>,
}

impl ContextService {
    /// Spawns the background task. Must be called inside a tokio runtime.
    ///
    /// Listening starts right away when `config.enabled` is set.
    pub fn spawn(source: Arc<dyn SessionSource>, config: &ContextConfig) -> Self {
        let aggregator = ContextAggregator::from_config(config);
        let view = aggregator.subscribe();
        let (commands, rx) = mpsc::unbounded_channel();

        let mut worker = ContextWorker::new(source, aggregator, config.debounce());
        if config.enabled {
            worker.enable();
        }

        let handle = tokio::spawn(worker.run(rx));
        tracing::info!(
            "[ContextService] Started (mode: {}, listening: {})",
            config.default_mode,
            config.enabled
        );

        Self {
            commands,
            view,
            preview_len: config.preview_len,
            handle,
        }
    }

    /// The latest published view.
    pub fn view(&self) -> ActiveContextView {
        self.view.borrow().clone()
    }

    /// A receiver notified on every published view.
    pub fn subscribe(&self) -> watch::Receiver<ActiveContextView> {
        self.view.clone()
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot::from_view(&self.view.borrow())
    }

    /// Preview using the configured length.
    pub fn preview(&self) -> String {
        preview(&self.view.borrow(), self.preview_len)
    }

    pub fn has_selection(&self) -> bool {
        has_selection(&self.view.borrow())
    }

    pub async fn set_mode(&self, mode: AggregationMode) -> Result<()> {
        self.request(|reply| ContextCommand::SetMode(mode, reply))
            .await
    }

    /// Master switch. Returns once every subscription and pending timer is
    /// gone (when disabling) or every open session is attached (when enabling).
    pub async fn set_listening(&self, enabled: bool) -> Result<()> {
        self.request(|reply| ContextCommand::SetListening(enabled, reply))
            .await
    }

    /// Injects text from the chat layer; returns the generated manual id.
    pub async fn capture_manual(
        &self,
        text: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<Option<SessionId>> {
        let text = text.into();
        let source = source.into();
        self.request(|reply| ContextCommand::CaptureManual {
            text,
            source,
            reply,
        })
        .await
    }

    pub async fn clear(&self, session: Option<SessionId>) -> Result<()> {
        self.request(|reply| ContextCommand::Clear(session, reply))
            .await
    }

    pub async fn toggle_collapsed(&self, session: Option<SessionId>) -> Result<bool> {
        self.request(|reply| ContextCommand::ToggleCollapsed(session, reply))
            .await
    }

    pub async fn status(&self) -> Result<ContextStatus> {
        self.request(ContextCommand::Status).await
    }

    /// Stops the task, dropping every subscription.
    pub async fn shutdown(self) {
        let _ = self.commands.send(ContextCommand::Shutdown);
        if let Err(e) = self.handle.await {
            tracing::warn!("[ContextService] Task ended abnormally: {}", e);
        }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> ContextCommand,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(command(reply))
            .map_err(|_| ShellmateError::internal("context service is not running"))?;
        rx.await
            .map_err(|_| ShellmateError::internal("context service dropped the request"))
    }
}

struct AttachedSession {
    /// Label stored with selections from this session
    source_label: String,
    /// Panes attached through this container
    children: Vec<SessionId>,
    _subscription: Subscription,
}

struct PendingSelection {
    key: delay_queue::Key,
    text: String,
}

struct ContextWorker {
    source: Arc<dyn SessionSource>,
    aggregator: ContextAggregator,
    debounce: Duration,
    listening: bool,
    /// Replaced on every enable, so events queued before a disable are dropped
    /// together with the old receiver.
    events: Option<(TerminalEventSender, mpsc::UnboundedReceiver<TerminalEvent>)>,
    host_subscription: Option<Subscription>,
    attached: HashMap<SessionId, AttachedSession>,
    timers: DelayQueue<SessionId>,
    pending: HashMap<SessionId, PendingSelection>,
}

impl ContextWorker {
    fn new(source: Arc<dyn SessionSource>, aggregator: ContextAggregator, debounce: Duration) -> Self {
        Self {
            source,
            aggregator,
            debounce,
            listening: false,
            events: None,
            host_subscription: None,
            attached: HashMap::new(),
            timers: DelayQueue::new(),
            pending: HashMap::new(),
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<ContextCommand>) {
        loop {
            tokio::select! {
                biased;

                Some(event) = next_event(&mut self.events) => self.handle_event(event),
                Some(expired) = self.timers.next(), if !self.timers.is_empty() => {
                    self.flush_selection(expired.into_inner());
                }
                command = commands.recv() => match command {
                    Some(ContextCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
            }
        }

        self.disable();
        tracing::info!("[ContextService] Stopped");
    }

    fn handle_command(&mut self, command: ContextCommand) {
        match command {
            ContextCommand::SetMode(mode, reply) => {
                self.aggregator.set_mode(mode);
                let _ = reply.send(());
            }
            ContextCommand::SetListening(enabled, reply) => {
                if enabled {
                    self.enable();
                } else {
                    self.disable();
                }
                let _ = reply.send(());
            }
            ContextCommand::CaptureManual {
                text,
                source,
                reply,
            } => {
                let _ = reply.send(self.aggregator.capture_manual(&text, &source));
            }
            ContextCommand::Clear(session, reply) => {
                self.aggregator.clear(session.as_ref());
                let _ = reply.send(());
            }
            ContextCommand::ToggleCollapsed(session, reply) => {
                let _ = reply.send(self.aggregator.toggle_collapsed(session.as_ref()));
            }
            ContextCommand::Status(reply) => {
                let _ = reply.send(self.status());
            }
            ContextCommand::Shutdown => {}
        }
    }

    fn handle_event(&mut self, event: TerminalEvent) {
        match event {
            TerminalEvent::SelectionChanged { session, text } => {
                if self.attached.contains_key(&session) {
                    self.schedule_selection(session, text);
                }
            }
            TerminalEvent::ClipboardCopied { session, text } => self.capture_clipboard(session, &text),
            TerminalEvent::FocusChanged { session } => self.aggregator.on_focus_changed(session),
            TerminalEvent::SessionOpened { info } => self.attach(&info),
            TerminalEvent::ChildAdded { container, child } => {
                if let Some(parent) = self.attached.get_mut(&container) {
                    parent.children.push(child.id.clone());
                }
                self.attach(&child);
            }
            TerminalEvent::ChildRemoved { container, child } => {
                if let Some(parent) = self.attached.get_mut(&container) {
                    parent.children.retain(|id| id != &child);
                }
                self.detach(&child);
            }
            TerminalEvent::Destroyed { session } => self.detach(&session),
        }
    }

    fn enable(&mut self) {
        if self.listening {
            return;
        }
        self.listening = true;

        let (tx, rx) = mpsc::unbounded_channel();
        self.host_subscription = Some(self.source.watch_host(tx.clone()));
        self.events = Some((tx, rx));

        for info in self.source.sessions() {
            self.attach(&info);
        }
        self.aggregator
            .on_focus_changed(self.source.focused_session());

        tracing::info!(
            "[ContextService] Listening enabled, {} session(s) attached",
            self.attached.len()
        );
    }

    fn disable(&mut self) {
        if !self.listening {
            return;
        }
        self.listening = false;

        self.attached.clear();
        self.host_subscription = None;
        self.events = None;
        self.timers.clear();
        self.pending.clear();
        self.aggregator.reset();

        tracing::info!("[ContextService] Listening disabled");
    }

    fn attach(&mut self, info: &TerminalSessionInfo) {
        let Some((tx, _)) = self.events.as_ref() else {
            return;
        };
        if self.attached.contains_key(&info.id) || !(info.capturable || info.is_container()) {
            return;
        }

        let subscription = self.source.subscribe(info, tx.clone());
        self.attached.insert(
            info.id.clone(),
            AttachedSession {
                source_label: info.source_label(),
                children: info.children.iter().map(|child| child.id.clone()).collect(),
                _subscription: subscription,
            },
        );
        tracing::debug!("[ContextService] Attached {} ({})", info.id, info.title);

        for child in &info.children {
            self.attach(child);
        }
    }

    fn detach(&mut self, session: &SessionId) {
        if let Some(pending) = self.pending.remove(session) {
            self.timers.remove(&pending.key);
        }

        if let Some(detached) = self.attached.remove(session) {
            tracing::debug!("[ContextService] Detached {}", session);
            for child in &detached.children {
                self.detach(child);
            }
        }

        self.aggregator.on_session_destroyed(session);
    }

    /// Starts or restarts the quiescence window for `session`.
    fn schedule_selection(&mut self, session: SessionId, text: String) {
        let text = text.trim().to_string();
        match self.pending.get_mut(&session) {
            Some(pending) => {
                self.timers.reset(&pending.key, self.debounce);
                pending.text = text;
            }
            None => {
                let key = self.timers.insert(session.clone(), self.debounce);
                self.pending.insert(session, PendingSelection { key, text });
            }
        }
    }

    fn flush_selection(&mut self, session: SessionId) {
        let Some(pending) = self.pending.remove(&session) else {
            return;
        };
        let Some(label) = self.attached.get(&session).map(|s| s.source_label.clone()) else {
            return;
        };
        self.aggregator.on_selection(session, &pending.text, &label);
    }

    /// Copies are discrete actions, so they bypass the debounce window.
    fn capture_clipboard(&mut self, session: SessionId, text: &str) {
        let text = text.trim();
        if text.chars().count() <= MIN_CLIPBOARD_CHARS {
            return;
        }

        let focused = self
            .aggregator
            .focused()
            .cloned()
            .or_else(|| self.source.focused_session());
        if focused.as_ref() != Some(&session) {
            return;
        }

        let Some(label) = self.attached.get(&session).map(|s| s.source_label.clone()) else {
            return;
        };
        if let Some(pending) = self.pending.remove(&session) {
            self.timers.remove(&pending.key);
        }
        self.aggregator.on_selection(session, text, &label);
    }

    fn status(&self) -> ContextStatus {
        let mut attached: Vec<_> = self.attached.keys().cloned().collect();
        attached.sort();
        ContextStatus {
            listening: self.listening,
            mode: self.aggregator.mode(),
            attached,
            pending_selections: self.pending.len(),
        }
    }
}

async fn next_event(
    events: &mut Option<(TerminalEventSender, mpsc::UnboundedReceiver<TerminalEvent>)>,
) -> Option<TerminalEvent> {
    match events {
        Some((_, rx)) => rx.recv().await,
        None => std::future::pending().await,
    }
}
