//! Tracing layer streaming assistant events to a frontend panel.
//!
//! Events from `shellmate*` targets are converted to [`AssistantEvent`]s and
//! pushed into a tokio channel, so a UI can show what the context service
//! and the execution gateway are doing without tailing log files.

use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

/// Target prefix of the events this layer forwards.
pub const DEFAULT_TARGET_PREFIX: &str = "shellmate";

/// Event data sent to the frontend
#[derive(Debug, Clone, serde::Serialize)]
pub struct AssistantEvent {
    /// Event target (e.g., "shellmate_execution::gateway")
    pub target: String,
    /// Log level (INFO, DEBUG, WARN, ERROR)
    pub level: String,
    /// Human-readable message
    pub message: String,
    /// Structured fields from the event
    pub fields: HashMap<String, Value>,
    /// Fields of the enclosing span
    pub span: HashMap<String, Value>,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

/// A tracing layer that sends matching events to a channel
pub struct AssistantEventLayer {
    sender: mpsc::UnboundedSender<AssistantEvent>,
    target_prefix: String,
}

impl AssistantEventLayer {
    /// Create a new layer forwarding `shellmate*` events to `sender`
    pub fn new(sender: mpsc::UnboundedSender<AssistantEvent>) -> Self {
        Self {
            sender,
            target_prefix: DEFAULT_TARGET_PREFIX.to_string(),
        }
    }

    /// Forward events whose target starts with `prefix` instead.
    pub fn with_target_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.target_prefix = prefix.into();
        self
    }
}

/// Span fields recorded at span creation.
struct SpanFields(HashMap<String, Value>);

impl<S> Layer<S> for AssistantEventLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        if !attrs.metadata().target().starts_with(&self.target_prefix) {
            return;
        }
        let mut fields = HashMap::new();
        attrs.record(&mut FieldVisitor(&mut fields));
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanFields(fields));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with(&self.target_prefix) {
            return;
        }

        let mut fields = HashMap::new();
        event.record(&mut FieldVisitor(&mut fields));

        let span = ctx
            .event_span(event)
            .and_then(|span| span.extensions().get::<SpanFields>().map(|f| f.0.clone()))
            .unwrap_or_default();

        let message = fields
            .remove("message")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        let assistant_event = AssistantEvent {
            target: metadata.target().to_string(),
            level: metadata.level().to_string(),
            message,
            fields,
            span,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        // Non-blocking send - if the receiver is dropped, we just skip
        let _ = self.sender.send(assistant_event);
    }
}

/// Field visitor that extracts tracing fields into a HashMap
struct FieldVisitor<'a>(&'a mut HashMap<String, Value>);

impl tracing::field::Visit for FieldVisitor<'_> {
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(
            field.name().to_string(),
            serde_json::json!(format!("{:?}", value)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_forwards_only_matching_targets() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscriber = tracing_subscriber::registry().with(AssistantEventLayer::new(tx));

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!(target: "shellmate_execution", "execute", tier = "DANGER");
            let _guard = span.enter();
            tracing::info!(target: "shellmate_execution::gateway", exit_code = 0u64, "Command sent");
            tracing::info!(target: "hyper::client", "unrelated");
        });

        let event = rx.try_recv().expect("gateway event forwarded");
        assert_eq!(event.target, "shellmate_execution::gateway");
        assert_eq!(event.level, "INFO");
        assert_eq!(event.message, "Command sent");
        assert_eq!(event.fields.get("exit_code"), Some(&serde_json::json!(0)));
        assert_eq!(event.span.get("tier"), Some(&serde_json::json!("DANGER")));

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_custom_prefix() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let layer = AssistantEventLayer::new(tx).with_target_prefix("host");
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "host::bridge", "bridge lagging");
            tracing::warn!(target: "shellmate_core", "ignored");
        });

        let event = rx.try_recv().unwrap();
        assert_eq!(event.level, "WARN");
        assert!(rx.try_recv().is_err());
    }
}
