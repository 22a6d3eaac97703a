//! Configuration model persisted as `config.toml`.
//!
//! Every field has a default so partial files load cleanly.

use crate::command::{DEFAULT_NULL_DEVICE_TIER, DEFAULT_SHELL_LANGUAGES, SafetyTier};
use crate::context::AggregationMode;
use crate::selection::DEFAULT_MIN_SELECTION_LEN;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default quiescence window for selection events.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Default character limit for selection previews.
pub const DEFAULT_PREVIEW_LEN: usize = 100;

/// Default template combining a query with the selected context.
pub const DEFAULT_CONTEXT_TEMPLATE: &str =
    "Selected content:\n{{ context }}\n\nQuestion: {{ query }}";

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct AssistantConfig {
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Selection capture settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ContextConfig {
    /// Master switch for selected-text capture
    pub enabled: bool,
    pub default_mode: AggregationMode,
    pub min_selection_len: usize,
    pub debounce_ms: u64,
    pub preview_len: usize,
}

impl ContextConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_mode: AggregationMode::default(),
            min_selection_len: DEFAULT_MIN_SELECTION_LEN,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            preview_len: DEFAULT_PREVIEW_LEN,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SafetyConfig {
    /// Fenced block languages scanned for commands
    pub shell_languages: Vec<String>,
    /// Tier for redirects into `/dev/null` or `/dev/zero`; `SAFE` disables the rule
    pub null_device_redirect_tier: SafetyTier,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            shell_languages: DEFAULT_SHELL_LANGUAGES
                .iter()
                .map(|lang| lang.to_string())
                .collect(),
            null_device_redirect_tier: DEFAULT_NULL_DEVICE_TIER,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct QueryConfig {
    /// Jinja template with `context` and `query` variables
    pub context_template: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            context_template: DEFAULT_CONTEXT_TEMPLATE.to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, overridden by `SHELLMATE_LOG`
    pub level: String,
    pub json: bool,
    /// Also write a daily-rolling log file
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: AssistantConfig = toml::from_str("").unwrap();

        assert_eq!(config, AssistantConfig::default());
        assert!(config.context.enabled);
        assert_eq!(config.context.debounce(), Duration::from_millis(300));
        assert_eq!(config.context.min_selection_len, 3);
        assert_eq!(config.safety.null_device_redirect_tier, SafetyTier::Caution);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: AssistantConfig = toml::from_str(
            r#"
            [context]
            default_mode = "multiple"

            [safety]
            null_device_redirect_tier = "danger"
            "#,
        )
        .unwrap();

        assert_eq!(config.context.default_mode, AggregationMode::Multiple);
        assert_eq!(config.context.preview_len, DEFAULT_PREVIEW_LEN);
        assert_eq!(config.safety.null_device_redirect_tier, SafetyTier::Danger);
        assert_eq!(config.safety.shell_languages.len(), 6);
        assert_eq!(config.query.context_template, DEFAULT_CONTEXT_TEMPLATE);
    }

    #[test]
    fn test_round_trips_through_toml() {
        let mut config = AssistantConfig::default();
        config.logging.json = true;

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: AssistantConfig = toml::from_str(&text).unwrap();

        assert_eq!(parsed, config);
    }
}
