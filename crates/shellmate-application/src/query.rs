//! Turning the active context view into text for the assistant.

use chrono::{DateTime, Utc};
use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};
use shellmate_core::config::{DEFAULT_CONTEXT_TEMPLATE, QueryConfig};
use shellmate_core::context::{ActiveContextView, AggregationMode};
use shellmate_core::error::{Result, ShellmateError};

/// Flattened context ready to be attached to a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub text: String,
    pub source: String,
    /// Capture time of the single record; absent for aggregated snapshots
    pub captured_at: Option<DateTime<Utc>>,
}

impl ContextSnapshot {
    /// Builds the snapshot for `view`.
    ///
    /// In `Multiple` mode every record becomes a `=== source ===` section;
    /// otherwise the first record is used as is.
    pub fn from_view(view: &ActiveContextView) -> Self {
        let Some(first) = view.first() else {
            return Self::default();
        };

        if view.mode == AggregationMode::Multiple {
            let text = view
                .iter()
                .map(|record| format!("=== {} ===\n{}", record.source, record.text))
                .collect::<Vec<_>>()
                .join("\n\n");
            return Self {
                text,
                source: format!("Multiple terminals ({})", view.len()),
                captured_at: None,
            };
        }

        Self {
            text: first.text.clone(),
            source: first.source.clone(),
            captured_at: Some(first.captured_at),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Short description of the view for a status line.
pub fn preview(view: &ActiveContextView, max_chars: usize) -> String {
    match view.len() {
        0 => String::new(),
        1 => view
            .first()
            .map(|record| record.preview(max_chars))
            .unwrap_or_default(),
        n => format!("{} terminal selections", n),
    }
}

pub fn has_selection(view: &ActiveContextView) -> bool {
    !view.is_empty()
}

/// Combines user queries with the selected context through a Jinja template.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    template: String,
}

impl QueryBuilder {
    /// Creates a builder after checking that `template` compiles.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        let env = Environment::new();
        env.template_from_str(&template)
            .map_err(|e| ShellmateError::template(e.to_string()))?;
        Ok(Self { template })
    }

    pub fn from_config(config: &QueryConfig) -> Result<Self> {
        Self::new(config.context_template.clone())
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Renders the query with `snapshot`, or returns it unchanged when there
    /// is no context.
    pub fn build(&self, query: &str, snapshot: &ContextSnapshot) -> Result<String> {
        if snapshot.is_empty() {
            return Ok(query.to_string());
        }

        Environment::new()
            .render_str(
                &self.template,
                context! {
                    context => snapshot.text,
                    query => query,
                    source => snapshot.source,
                },
            )
            .map_err(|e| ShellmateError::template(e.to_string()))
    }

    /// Shorthand for [`QueryBuilder::build`] on a view.
    pub fn build_from_view(&self, query: &str, view: &ActiveContextView) -> Result<String> {
        self.build(query, &ContextSnapshot::from_view(view))
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self {
            template: DEFAULT_CONTEXT_TEMPLATE.to_string(),
        }
    }
}
